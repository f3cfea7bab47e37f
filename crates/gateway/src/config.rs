//! Process configuration: CLI flags with environment fallbacks.
//!
//! Every setting can come from a `SCADALINK_*` environment variable or the
//! matching command-line flag; the flag wins. An invalid `--port` (or env
//! value) fails argument parsing and terminates the process with a non-zero
//! status before any listener is opened.

use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "scadalink-gateway",
    version,
    about = "Expose a SCADA system's REST API as MCP tools over streamable HTTP"
)]
pub struct GatewayArgs {
    /// Base URL of the SCADA REST service, e.g. `https://scada-host/WinCCRestService`.
    #[arg(long, env = "SCADALINK_BASE_URL")]
    pub base_url: String,

    /// Default backend username (replaceable at runtime via the `login` tool).
    #[arg(long, env = "SCADALINK_USERNAME")]
    pub username: Option<String>,

    /// Default backend password.
    #[arg(long, env = "SCADALINK_PASSWORD")]
    pub password: Option<String>,

    /// Bearer token; takes precedence over username/password when set.
    #[arg(long, env = "SCADALINK_BEARER_TOKEN")]
    pub bearer_token: Option<String>,

    /// Port to listen on for MCP clients.
    #[arg(long, env = "SCADALINK_PORT", default_value_t = 8465)]
    pub port: u16,

    /// CORS allowed origin for browser-based MCP clients ('*' allows any).
    #[arg(long, env = "SCADALINK_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Accept self-signed or otherwise invalid backend TLS certificates.
    #[arg(long, env = "SCADALINK_INSECURE_TLS")]
    pub insecure_tls: bool,

    /// Per-call timeout for backend requests, in seconds; 0 waits indefinitely.
    #[arg(long, env = "SCADALINK_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(long, env = "SCADALINK_DEBUG")]
    pub debug: bool,
}

impl GatewayArgs {
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }

    /// Log the effective configuration for operator diagnostics, with
    /// secrets redacted to a short suffix.
    pub fn log_effective(&self) {
        tracing::info!(
            base_url = %self.base_url,
            username = %redact(self.username.as_deref()),
            password = %redact(self.password.as_deref()),
            bearer_token = %redact(self.bearer_token.as_deref()),
            port = self.port,
            cors_origin = self.cors_origin.as_deref().unwrap_or("<disabled>"),
            insecure_tls = self.insecure_tls,
            timeout_secs = self.timeout_secs,
            debug = self.debug,
            "effective configuration"
        );
    }
}

fn redact(secret: Option<&str>) -> String {
    match secret {
        None => "<unset>".to_string(),
        Some(s) if s.chars().count() <= 4 => "***".to_string(),
        Some(s) => {
            let suffix: String = s.chars().skip(s.chars().count() - 3).collect();
            format!("***{suffix}")
        }
    }
}
