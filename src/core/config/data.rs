use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the session credential is presented to the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Bearer <session_token>`
    #[default]
    Bearer,
    /// `Cookie: <session_cookie>=<session_token>`
    Cookie,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "bearer",
            AuthScheme::Cookie => "cookie",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthScheme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(AuthScheme::Bearer),
            "cookie" => Ok(AuthScheme::Cookie),
            other => Err(format!("expected 'bearer' or 'cookie', got '{other}'")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Root of the host application's API, e.g. `https://chat.example.com/api`
    pub base_url: Option<String>,
    pub session_token: Option<String>,
    pub auth_scheme: Option<AuthScheme>,
    /// Cookie name used with the `cookie` scheme
    pub session_cookie: Option<String>,
    /// Seconds a successful session check is trusted
    pub auth_cache_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    /// Where persisted extension state lives; defaults to the data dir
    pub state_path: Option<PathBuf>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/chatshelf/config.toml` → `~/.config/chatshelf/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
