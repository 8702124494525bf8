//! Endpoint URL construction for the remote API.
//!
//! Base URLs come from user configuration and frequently carry trailing
//! slashes; endpoints are joined without producing `//`.

use reqwest::Url;

/// Strip trailing slashes from a base URL.
///
/// ```
/// use chatshelf::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://chat.example.com/api/"), "https://chat.example.com/api");
/// assert_eq!(normalize_base_url("https://chat.example.com/api///"), "https://chat.example.com/api");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join an endpoint path onto a base URL.
///
/// ```
/// use chatshelf::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://chat.example.com/api/", "/auth/session"),
///     "https://chat.example.com/api/auth/session"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Parse a configured base URL, accepting only absolute `http`/`https` URLs.
pub fn parse_base_url(base_url: &str) -> Result<Url, String> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err("base URL is empty".to_string());
    }
    let url = Url::parse(&normalize_base_url(trimmed)).map_err(|err| err.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{other}'")),
    }
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }
    Ok(url)
}

/// Append `id` as a single percent-encoded path segment.
///
/// ```
/// use chatshelf::utils::url::with_path_segment;
/// use reqwest::Url;
///
/// let url = Url::parse("https://chat.example.com/api/conversations").unwrap();
/// assert_eq!(
///     with_path_segment(url, "a b/c").as_str(),
///     "https://chat.example.com/api/conversations/a%20b%2Fc"
/// );
/// ```
pub fn with_path_segment(mut url: Url, id: &str) -> Url {
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(id);
    }
    url
}
