//! Entry point for the scadalink gateway.

mod config;
mod server;

use anyhow::Context as _;
use clap::Parser as _;
use config::GatewayArgs;
use scadalink_rest_tools::catalog::scada_tools;
use scadalink_rest_tools::client::{ClientOptions, RestClient};
use scadalink_rest_tools::runtime::ToolCatalog;
use scadalink_rest_tools::session::Session;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = GatewayArgs::parse();
    init_tracing(args.debug);
    args.log_effective();

    let session = Arc::new(Session::new(
        args.username.clone(),
        args.password.clone(),
        args.bearer_token.clone(),
    ));
    let options = ClientOptions {
        accept_invalid_certs: args.insecure_tls,
        timeout: args.request_timeout(),
    };
    let client = RestClient::new(args.base_url.clone(), session, &options)
        .context("build backend client")?;
    let catalog = ToolCatalog::new(client, scada_tools()).context("register tool catalog")?;

    let router = server::build_router(catalog, args.cors_origin.as_deref());
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!(%addr, "gateway listening, MCP endpoint at /mcp");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    Ok(())
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
