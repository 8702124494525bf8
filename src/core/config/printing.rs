use crate::core::config::data::{path_display, Config};

impl Config {
    /// One `key: value` line per setting, with effective defaults and the
    /// session token masked.
    pub fn display_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.base_url {
            Some(url) => lines.push(format!("  base_url: {url}")),
            None => lines.push("  base_url: (unset)".to_string()),
        }
        match &self.session_token {
            Some(token) => lines.push(format!("  session_token: {}", mask(token))),
            None => lines.push("  session_token: (unset)".to_string()),
        }
        lines.push(format!("  auth_scheme: {}", self.auth_scheme()));
        lines.push(format!("  session_cookie: {}", self.session_cookie()));
        lines.push(format!("  auth_cache_secs: {}", self.auth_ttl().as_secs()));
        lines.push(format!(
            "  request_timeout_secs: {}",
            self.request_timeout().as_secs()
        ));
        match self.state_file() {
            Some(path) => lines.push(format!("  state_path: {}", path_display(path))),
            None => lines.push("  state_path: (unavailable)".to_string()),
        }
        lines
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.display_lines() {
            println!("{line}");
        }
    }
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("********{tail}")
}
