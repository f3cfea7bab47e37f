//! The dispatch layer: one authenticated outbound REST call per invocation.
//!
//! A `RestClient` is built once at startup from the gateway configuration and
//! shared by every tool. Each dispatch is independent and stateless; there is
//! no retry, no backoff, and no caching. The only shared mutable state is the
//! credential [`Session`](crate::session::Session).

use crate::error::{RequestError, Result};
use crate::session::Session;
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Connection-level options applied uniformly to all dispatches.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Accept self-signed / otherwise invalid server certificates. Applies to
    /// every dispatch while active; never negotiated per call.
    pub accept_invalid_certs: bool,
    /// Per-call timeout. `None` = wait indefinitely.
    pub timeout: Option<Duration>,
}

#[derive(Debug)]
pub struct RestClient {
    base_url: String,
    client: Client,
    session: Arc<Session>,
    timeout: Option<Duration>,
}

impl RestClient {
    /// Build a client against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a config error if the base URL does not parse or the
    /// underlying HTTP client cannot be built for the requested options.
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<Session>,
        options: &ClientOptions,
    ) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url)
            .map_err(|e| RequestError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        let client = Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()
            .map_err(|e| RequestError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session,
            timeout: options.timeout,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Perform one authenticated call against the backend and normalize the
    /// result.
    ///
    /// `path` must start with `/` and already be percent-encoded; it is
    /// concatenated verbatim onto the base URL. `extra_headers` entries with
    /// empty values are dropped. A body is attached only for POST/PUT; GET
    /// never carries one even if supplied in error.
    ///
    /// # Errors
    ///
    /// - non-2xx status → [`RequestError::Status`] (body not parsed)
    /// - connection/TLS/timeout failure → [`RequestError::Transport`]
    /// - non-JSON success body → [`RequestError::Json`]
    pub async fn dispatch(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
        extra_headers: &[(String, String)],
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json");

        // Snapshot the credentials once per dispatch; a concurrent login
        // means the call uses either the old or the new identity, whole.
        if let Some(auth) = self.session.authorization_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        for (name, value) in extra_headers {
            if value.is_empty() {
                continue;
            }
            request = request.header(name, value);
        }

        if let Some(payload) = body {
            if method == Method::POST || method == Method::PUT {
                request = request.json(payload);
            } else {
                debug!(%method, path, "ignoring body on non-POST/PUT dispatch");
            }
        }

        if let Some(t) = self.timeout {
            request = request.timeout(t);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(RequestError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Percent-encode one path segment so identifiers containing `/`, spaces, or
/// reserved characters cannot corrupt routing.
#[must_use]
pub fn encode_path_segment(s: &str) -> String {
    encode(s, is_unreserved)
}

/// Percent-encode one query key or value. Also encodes `&` and `=` so joined
/// pairs stay unambiguous.
#[must_use]
pub fn encode_query_component(s: &str) -> String {
    encode(s, is_unreserved)
}

fn encode(s: &str, keep: fn(u8) -> bool) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if keep(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}
