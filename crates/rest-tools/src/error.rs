//! Error types for the REST dispatch layer and tool runtime.

use thiserror::Error;

/// Classification of a transport-level failure, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request exceeded the configured per-call timeout.
    Timeout,
    /// Connection could not be established (refused, DNS, reset).
    Connect,
    /// TLS handshake / certificate problem.
    Certificate,
    /// Anything reqwest reports that doesn't fit the above.
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connection",
            Self::Certificate => "certificate",
            Self::Other => "transport",
        };
        f.write_str(s)
    }
}

/// Main error type for catalog construction and dispatch.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Invalid catalog or client configuration (bad base URL, duplicate tool
    /// names, duplicate parameters). Fails fast at startup.
    #[error("config error: {0}")]
    Config(String),

    /// A tool argument failed its declared shape/constraint. Rejected before
    /// any outbound call is attempted.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The backend answered with a non-success status. The response body is
    /// not parsed in this case.
    #[error("backend returned {status} {reason}")]
    Status { status: u16, reason: String },

    /// Transport-level failure (connection refused, timeout, TLS failure).
    #[error("{kind} error: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    /// The backend returned non-JSON where JSON was expected.
    #[error("invalid JSON in response: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, RequestError>;

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Json(sanitize_reqwest_error(&e));
        }

        let kind = classify(&e);
        Self::Transport {
            kind,
            message: sanitize_reqwest_error(&e),
        }
    }
}

fn classify(e: &reqwest::Error) -> TransportErrorKind {
    if e.is_timeout() {
        return TransportErrorKind::Timeout;
    }

    // reqwest folds TLS failures into connect errors; sniff the error chain
    // so operators can tell a bad certificate from an unreachable host.
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(e);
    while let Some(s) = source {
        let msg = s.to_string().to_ascii_lowercase();
        if msg.contains("certificate") || msg.contains("tls") {
            return TransportErrorKind::Certificate;
        }
        source = s.source();
    }

    if e.is_connect() {
        return TransportErrorKind::Connect;
    }

    TransportErrorKind::Other
}

/// Strip credentials/query from any URL embedded in a reqwest error message.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        let mut redacted = u.clone();
        let _ = redacted.set_username("");
        let _ = redacted.set_password(None);
        redacted.set_query(None);
        redacted.set_fragment(None);
        msg = msg.replace(u.as_str(), redacted.as_str());
    }
    msg
}
