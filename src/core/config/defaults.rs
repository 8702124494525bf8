use super::data::{AuthScheme, Config};
use super::io::ConfigError;
use crate::api::{ApiSettings, SessionCredentials, DEFAULT_AUTH_TTL, DEFAULT_REQUEST_TIMEOUT};
use crate::core::store::FileStore;
use crate::utils::url::parse_base_url;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "CHATSHELF_BASE_URL";
pub const ENV_SESSION_TOKEN: &str = "CHATSHELF_SESSION_TOKEN";

/// Cookie name used with the `cookie` scheme when none is configured.
pub const DEFAULT_SESSION_COOKIE: &str = "sessionKey";

/// Keys accepted by [`Config::set_value`] and [`Config::unset_value`].
pub const CONFIG_KEYS: [&str; 7] = [
    "base_url",
    "session_token",
    "auth_scheme",
    "session_cookie",
    "auth_cache_secs",
    "request_timeout_secs",
    "state_path",
];

impl Config {
    pub fn auth_scheme(&self) -> AuthScheme {
        self.auth_scheme.unwrap_or_default()
    }

    pub fn session_cookie(&self) -> &str {
        self.session_cookie
            .as_deref()
            .unwrap_or(DEFAULT_SESSION_COOKIE)
    }

    pub fn auth_ttl(&self) -> Duration {
        self.auth_cache_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_AUTH_TTL)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Explicit `state_path`, else the platform data directory.
    pub fn state_file(&self) -> Option<PathBuf> {
        self.state_path.clone().or_else(FileStore::default_path)
    }

    /// Applies `CHATSHELF_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    pub(crate) fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(base_url) = present(ENV_BASE_URL) {
            self.base_url = Some(base_url);
        }
        if let Some(token) = present(ENV_SESSION_TOKEN) {
            self.session_token = Some(token);
        }
        self
    }

    pub fn credentials(&self) -> Option<SessionCredentials> {
        let token = self.session_token.clone()?;
        Some(match self.auth_scheme() {
            AuthScheme::Bearer => SessionCredentials::Bearer(token),
            AuthScheme::Cookie => SessionCredentials::Cookie {
                name: self.session_cookie().to_string(),
                value: token,
            },
        })
    }

    /// Settings for [`crate::api::ApiClient`]. Requires `base_url`.
    pub fn api_settings(&self) -> Result<ApiSettings, ConfigError> {
        let base_url = self
            .base_url
            .clone()
            .ok_or(ConfigError::Missing("base_url"))?;
        Ok(ApiSettings {
            base_url,
            credentials: self.credentials(),
            auth_ttl: self.auth_ttl(),
            request_timeout: self.request_timeout(),
        })
    }

    /// Sets `key` from its textual form, validating the value.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "base_url" => {
                let url = parse_base_url(value).map_err(|reason| ConfigError::InvalidValue {
                    key: "base_url",
                    reason,
                })?;
                self.base_url = Some(url.to_string());
            }
            "session_token" => self.session_token = Some(non_empty("session_token", value)?),
            "auth_scheme" => {
                let scheme = value
                    .parse::<AuthScheme>()
                    .map_err(|reason| ConfigError::InvalidValue {
                        key: "auth_scheme",
                        reason,
                    })?;
                self.auth_scheme = Some(scheme);
            }
            "session_cookie" => {
                self.session_cookie = Some(non_empty("session_cookie", value)?)
            }
            "auth_cache_secs" => self.auth_cache_secs = Some(seconds("auth_cache_secs", value)?),
            "request_timeout_secs" => {
                let secs = seconds("request_timeout_secs", value)?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "request_timeout_secs",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                self.request_timeout_secs = Some(secs);
            }
            "state_path" => {
                self.state_path = Some(PathBuf::from(non_empty("state_path", value)?))
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "base_url" => self.base_url = None,
            "session_token" => self.session_token = None,
            "auth_scheme" => self.auth_scheme = None,
            "session_cookie" => self.session_cookie = None,
            "auth_cache_secs" => self.auth_cache_secs = None,
            "request_timeout_secs" => self.request_timeout_secs = None,
            "state_path" => self.state_path = None,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn non_empty(key: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            key,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn seconds(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            reason: format!("expected a number of seconds: {err}"),
        })
}
