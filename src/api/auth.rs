//! Session gate run before every remote call.
//!
//! The gate remembers when the session was last confirmed and skips the probe
//! while that confirmation is younger than the TTL. A 401 from any endpoint
//! drops the cached confirmation so the next call probes again.

use super::error::ApiError;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a successful session probe is trusted.
pub const DEFAULT_AUTH_TTL: Duration = Duration::from_secs(300);

/// Credentials attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionCredentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Cookie: <name>=<value>`
    Cookie { name: String, value: String },
}

impl SessionCredentials {
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            SessionCredentials::Bearer(token) => {
                request.header("Authorization", format!("Bearer {token}"))
            }
            SessionCredentials::Cookie { name, value } => {
                request.header("Cookie", format!("{name}={value}"))
            }
        }
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionCredentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            SessionCredentials::Cookie { name, .. } => {
                write!(f, "Cookie {{ name: {name:?}, value: <redacted> }}")
            }
        }
    }
}

#[derive(Debug)]
pub struct AuthGate {
    credentials: Option<SessionCredentials>,
    ttl: Duration,
    verified_at: Mutex<Option<Instant>>,
}

impl AuthGate {
    pub fn new(credentials: Option<SessionCredentials>, ttl: Duration) -> Self {
        Self {
            credentials,
            ttl,
            verified_at: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> Option<&SessionCredentials> {
        self.credentials.as_ref()
    }

    /// True while a previous confirmation is still within the TTL.
    pub fn is_fresh(&self) -> bool {
        self.verified_at()
            .is_some_and(|verified| verified.elapsed() < self.ttl)
    }

    /// Forgets the cached confirmation.
    pub fn invalidate(&self) {
        *self.slot() = None;
    }

    pub(crate) fn mark_verified(&self) {
        *self.slot() = Some(Instant::now());
    }

    /// Fails with [`ApiError::Authentication`] when no credentials are
    /// configured, without touching the network.
    pub(crate) fn require_credentials(&self) -> Result<&SessionCredentials, ApiError> {
        self.credentials.as_ref().ok_or_else(|| {
            ApiError::Authentication("no session credentials configured".to_string())
        })
    }

    /// Confirms the session, probing `session_url` only when the cached
    /// confirmation is missing or stale.
    pub(crate) async fn check(&self, http: &Client, session_url: Url) -> Result<(), ApiError> {
        let credentials = self.require_credentials()?;
        if self.is_fresh() {
            return Ok(());
        }

        debug!(url = %session_url, "Probing session");
        let response = credentials.apply(http.get(session_url)).send().await?;
        let status = response.status();
        if status.is_success() {
            self.mark_verified();
            return Ok(());
        }

        self.invalidate();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication(format!(
                "session rejected with status {}",
                status.as_u16()
            )));
        }
        let body = response.bytes().await?;
        Err(ApiError::from_response(
            status.as_u16(),
            status.canonical_reason(),
            &body,
        ))
    }

    fn verified_at(&self) -> Option<Instant> {
        *self.slot()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.verified_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
