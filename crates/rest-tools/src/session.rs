//! The process-wide credential record.
//!
//! One `Session` is constructed at startup and threaded (via `Arc`) into the
//! dispatch layer and the `login` tool. Last write wins: a login racing an
//! in-flight dispatch means that dispatch uses either the old or the new
//! credentials, but the header is always computed under a single read lock,
//! so it is never a torn mix of the two.

use crate::error::{RequestError, Result};
use base64::Engine as _;
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct Credentials {
    username: Option<String>,
    password: Option<String>,
    bearer_token: Option<String>,
}

/// The single mutable authentication identity used for all outbound calls.
#[derive(Debug, Default)]
pub struct Session {
    creds: RwLock<Credentials>,
}

impl Session {
    /// Seed the session from startup configuration. Any of the pieces may be
    /// absent; a bearer token takes precedence over username/password when
    /// both are configured.
    #[must_use]
    pub fn new(
        username: Option<String>,
        password: Option<String>,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            creds: RwLock::new(Credentials {
                username: username.filter(|s| !s.is_empty()),
                password: password.filter(|s| !s.is_empty()),
                bearer_token: bearer_token.filter(|s| !s.is_empty()),
            }),
        }
    }

    /// Replace the stored username/password and clear any bearer token.
    ///
    /// No network call is made; the credentials are only verified when the
    /// next outbound call is attempted.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either value is empty.
    pub fn set_basic_credentials(&self, username: &str, password: &str) -> Result<()> {
        if username.is_empty() {
            return Err(RequestError::Validation(
                "username must not be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(RequestError::Validation(
                "password must not be empty".to_string(),
            ));
        }

        let mut creds = self.creds.write();
        creds.username = Some(username.to_string());
        creds.password = Some(password.to_string());
        creds.bearer_token = None;
        Ok(())
    }

    /// Compute the `Authorization` header value for the current credentials.
    ///
    /// Precedence: `Bearer <token>` if a token is set; else
    /// `Basic <base64(username:password)>` if both are set; else `None`
    /// (the request carries no `Authorization` header at all).
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        let creds = self.creds.read();

        if let Some(token) = &creds.bearer_token {
            return Some(format!("Bearer {token}"));
        }

        match (&creds.username, &creds.password) {
            (Some(u), Some(p)) => {
                let encoded =
                    base64::engine::general_purpose::STANDARD.encode(format!("{u}:{p}"));
                Some(format!("Basic {encoded}"))
            }
            _ => None,
        }
    }
}
