use super::data::{AuthScheme, Config};
use super::defaults::{CONFIG_KEYS, DEFAULT_SESSION_COOKIE, ENV_BASE_URL, ENV_SESSION_TOKEN};
use super::io::ConfigError;
use crate::api::{SessionCredentials, DEFAULT_AUTH_TTL, DEFAULT_REQUEST_TIMEOUT};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config
        .set_value("base_url", "https://chat.example.com/api/")
        .expect("base_url");
    config
        .set_value("session_token", "tok-123")
        .expect("session_token");
    config.set_value("auth_scheme", "Cookie").expect("scheme");
    config.set_value("auth_cache_secs", "60").expect("ttl");
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");

    let mut loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);
    assert_eq!(loaded.base_url.as_deref(), Some("https://chat.example.com/api"));
    assert_eq!(loaded.auth_scheme, Some(AuthScheme::Cookie));

    loaded.unset_value("session_token").expect("unset");
    loaded
        .save_to_path(&config_path)
        .expect("Failed to save config");
    let reloaded = Config::load_from_path(&config_path).expect("Failed to reload config");
    assert_eq!(reloaded.session_token, None);
    assert_eq!(reloaded.auth_cache_secs, Some(60));
}

#[test]
fn test_invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "base_url = [unterminated").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("should not parse");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn test_wrong_value_type_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "auth_scheme = \"basic\"\n").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("should not parse");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_effective_defaults() {
    let config = Config::default();
    assert_eq!(config.auth_scheme(), AuthScheme::Bearer);
    assert_eq!(config.session_cookie(), DEFAULT_SESSION_COOKIE);
    assert_eq!(config.auth_ttl(), DEFAULT_AUTH_TTL);
    assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    assert_eq!(config.credentials(), None);
}

#[test]
fn test_explicit_state_path_wins() {
    let config = Config {
        state_path: Some(PathBuf::from("/tmp/chatshelf-state.json")),
        ..Default::default()
    };
    assert_eq!(
        config.state_file(),
        Some(PathBuf::from("/tmp/chatshelf-state.json"))
    );
}

#[test]
fn test_set_value_validation() {
    let mut config = Config::default();

    let err = config
        .set_value("base_url", "ftp://example.com")
        .expect_err("scheme should be rejected");
    assert!(matches!(err, ConfigError::InvalidValue { key: "base_url", .. }));

    let err = config
        .set_value("auth_scheme", "basic")
        .expect_err("scheme should be rejected");
    assert!(matches!(err, ConfigError::InvalidValue { key: "auth_scheme", .. }));

    let err = config
        .set_value("auth_cache_secs", "soon")
        .expect_err("not a number");
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    let err = config
        .set_value("request_timeout_secs", "0")
        .expect_err("zero timeout");
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    let err = config
        .set_value("session_token", "   ")
        .expect_err("empty token");
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    let err = config.set_value("theme", "dark").expect_err("unknown key");
    assert!(matches!(err, ConfigError::UnknownKey(key) if key == "theme"));
    let err = config.unset_value("theme").expect_err("unknown key");
    assert!(matches!(err, ConfigError::UnknownKey(_)));

    assert_eq!(config, Config::default());
}

#[test]
fn test_every_listed_key_can_be_set_and_unset() {
    let values: HashMap<&str, &str> = HashMap::from([
        ("base_url", "http://localhost:3000"),
        ("session_token", "secret"),
        ("auth_scheme", "bearer"),
        ("session_cookie", "sid"),
        ("auth_cache_secs", "0"),
        ("request_timeout_secs", "5"),
        ("state_path", "state.json"),
    ]);

    let mut config = Config::default();
    for key in CONFIG_KEYS {
        config
            .set_value(key, values[key])
            .unwrap_or_else(|err| panic!("set {key}: {err}"));
    }
    assert_eq!(config.auth_ttl(), Duration::ZERO);
    assert_eq!(config.request_timeout(), Duration::from_secs(5));

    for key in CONFIG_KEYS {
        config
            .unset_value(key)
            .unwrap_or_else(|err| panic!("unset {key}: {err}"));
    }
    assert_eq!(config, Config::default());
}

#[test]
fn test_env_overrides_replace_file_values() {
    let config = Config {
        base_url: Some("https://file.example.com".to_string()),
        session_token: Some("from-file".to_string()),
        ..Default::default()
    };

    let overridden = config.clone().with_overrides_from(|name| match name {
        ENV_BASE_URL => Some("https://env.example.com".to_string()),
        ENV_SESSION_TOKEN => Some("  ".to_string()),
        _ => None,
    });

    assert_eq!(
        overridden.base_url.as_deref(),
        Some("https://env.example.com")
    );
    assert_eq!(overridden.session_token.as_deref(), Some("from-file"));

    let untouched = config.clone().with_overrides_from(|_| None);
    assert_eq!(untouched, config);
}

#[test]
fn test_api_settings_from_config() {
    let err = Config::default()
        .api_settings()
        .expect_err("base_url is required");
    assert!(matches!(err, ConfigError::Missing("base_url")));

    let config = Config {
        base_url: Some("https://chat.example.com/api".to_string()),
        session_token: Some("tok".to_string()),
        auth_scheme: Some(AuthScheme::Cookie),
        session_cookie: Some("sid".to_string()),
        auth_cache_secs: Some(30),
        request_timeout_secs: Some(10),
        state_path: None,
    };
    let settings = config.api_settings().expect("settings");
    assert_eq!(settings.base_url, "https://chat.example.com/api");
    assert_eq!(
        settings.credentials,
        Some(SessionCredentials::Cookie {
            name: "sid".to_string(),
            value: "tok".to_string(),
        })
    );
    assert_eq!(settings.auth_ttl, Duration::from_secs(30));
    assert_eq!(settings.request_timeout, Duration::from_secs(10));
}

#[test]
fn test_display_lines_mask_the_token() {
    let config = Config {
        base_url: Some("https://chat.example.com".to_string()),
        session_token: Some("sk-abcdefghijklmnop".to_string()),
        ..Default::default()
    };
    let lines = config.display_lines();

    assert!(lines.contains(&"  base_url: https://chat.example.com".to_string()));
    assert!(lines.contains(&"  session_token: ********mnop".to_string()));
    assert!(lines.contains(&"  auth_scheme: bearer".to_string()));
    assert!(!lines.iter().any(|line| line.contains("abcdefgh")));
}
