//! MCP server surface: one `ServerHandler` backed by the tool catalog, hosted
//! behind rmcp's streamable HTTP transport inside an axum router.
//!
//! The transport framing (session ids, SSE streaming, 405s for unsupported
//! methods on the MCP path) is owned by the rmcp SDK; this module only wires
//! the catalog into it and adds CORS + a health probe.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::get;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ErrorData, RoleServer, ServerHandler};
use scadalink_rest_tools::runtime::ToolCatalog;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

#[derive(Clone)]
pub struct GatewayService {
    catalog: ToolCatalog,
}

impl GatewayService {
    #[must_use]
    pub fn new(catalog: ToolCatalog) -> Self {
        Self { catalog }
    }
}

impl ServerHandler for GatewayService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Gateway to a SCADA system's REST API. Tools read and write process \
                 tags, query historical archive values and alarm messages, and manage \
                 named REST filters. Call `login` first if no default credentials \
                 were configured. Tool failures are reported in the result text."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: self.catalog.list_tools(),
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        // The catalog converts every failure into a tool result; nothing here
        // can surface as an MCP protocol error.
        Ok(self
            .catalog
            .call_tool(&request.name, request.arguments.as_ref())
            .await)
    }
}

/// Build the axum router hosting the MCP endpoint at `/mcp` and a health
/// probe at `/healthz`.
pub fn build_router(catalog: ToolCatalog, cors_origin: Option<&str>) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(GatewayService::new(catalog.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest_service("/mcp", service)
        .layer(cors_layer(cors_origin))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allowed_headers = [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static("mcp-session-id"),
        HeaderName::from_static("mcp-protocol-version"),
        HeaderName::from_static("last-event-id"),
    ];
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let exposed = [HeaderName::from_static("mcp-session-id")];

    match origin {
        None => CorsLayer::new(),
        Some("*") => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(allowed_headers)
            .expose_headers(exposed),
        Some(o) => match o.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(methods)
                .allow_headers(allowed_headers)
                .expose_headers(exposed),
            Err(e) => {
                warn!(origin = o, error = %e, "invalid CORS origin, CORS disabled");
                CorsLayer::new()
            }
        },
    }
}
