use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by [`super::ApiClient`]. Nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The session gate refused before any request was sent.
    #[error("not authenticated: {0}")]
    Authentication(String),

    /// No response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote answered with a non-2xx status.
    #[error("API request failed with status {status}: {message}")]
    Api {
        status: u16,
        message: String,
        /// Error payload sent by the remote, when it was JSON.
        body: Option<Value>,
    },

    /// A single-item endpoint answered 404.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The response body did not match the expected remote schema.
    #[error("unexpected {entity} payload: {source}")]
    Mapping {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
            || matches!(self, ApiError::Api { status: 404, .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Network(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Builds an [`ApiError::Api`] from a status and raw body, pulling a
    /// human-readable message out of common error payload shapes.
    pub(crate) fn from_response(status: u16, reason: Option<&str>, raw_body: &[u8]) -> Self {
        let body = serde_json::from_slice::<Value>(raw_body).ok();
        let message = body
            .as_ref()
            .and_then(error_message)
            .or_else(|| {
                let text = String::from_utf8_lossy(raw_body).trim().to_string();
                (!text.is_empty() && body.is_none()).then_some(text)
            })
            .unwrap_or_else(|| reason.unwrap_or("Unknown error").to_string());
        ApiError::Api {
            status,
            message,
            body,
        }
    }
}

fn error_message(body: &Value) -> Option<String> {
    ["error", "message", "detail"].iter().find_map(|key| {
        let field = body.get(*key)?;
        field
            .as_str()
            .map(str::to_string)
            .or_else(|| error_message(field))
    })
}
