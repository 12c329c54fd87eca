//! Tests for configuration loading.

use std::time::Duration;

use flightbox_auth::config::{
    DEFAULT_MIN_REFRESH_INTERVAL, DEFAULT_REFRESH_MARGIN, DEFAULT_REFRESH_TIMEOUT,
    DEFAULT_TOKEN_URL,
};
use flightbox_auth::{AuthConfig, ConfigError};
use pretty_assertions::assert_eq;

#[test]
fn test_defaults() {
    let config = AuthConfig::new("id", "secret");

    assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
    assert_eq!(config.refresh_margin, Duration::from_secs(300));
    assert_eq!(config.refresh_timeout, Duration::from_secs(30));
    assert_eq!(config.min_refresh_interval, Duration::from_secs(30));
}

#[test]
fn test_from_yaml() {
    let yaml = r#"
client_id: my-app
client_secret: s3cr3t
token_url: https://auth.example.com/token
refresh_margin: 2m
refresh_timeout: 10s
"#;

    let config = AuthConfig::from_yaml_str(yaml).unwrap();

    assert_eq!(
        config,
        AuthConfig::new("my-app", "s3cr3t")
            .token_url("https://auth.example.com/token")
            .refresh_margin(Duration::from_secs(120))
            .refresh_timeout(Duration::from_secs(10))
    );
    assert_eq!(config.min_refresh_interval, DEFAULT_MIN_REFRESH_INTERVAL);
}

#[test]
fn test_from_json_object() {
    let json = r#"{"client_id": "my-app", "client_secret": "s3cr3t", "refresh_margin": "1m"}"#;

    let config = AuthConfig::from_json_str(json).unwrap();

    assert_eq!(
        config,
        AuthConfig::new("my-app", "s3cr3t").refresh_margin(Duration::from_secs(60))
    );
}

#[test]
fn test_from_settings_document() {
    let json = r#"{
        "Logging": { "LogLevel": { "Default": "Information" } },
        "APS": {
            "ClientId": "my-app",
            "ClientSecret": "s3cr3t",
            "CallbackUrl": "http://localhost:8080/callback"
        }
    }"#;

    let config = AuthConfig::from_json_str(json).unwrap();

    assert_eq!(config, AuthConfig::new("my-app", "s3cr3t"));
    assert_eq!(config.refresh_margin, DEFAULT_REFRESH_MARGIN);
    assert_eq!(config.refresh_timeout, DEFAULT_REFRESH_TIMEOUT);
}

#[test]
fn test_missing_secret_is_an_error() {
    let err = AuthConfig::from_json_str(r#"{"APS": {"ClientId": "my-app"}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));

    let err = AuthConfig::from_yaml_str("client_id: my-app").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn test_from_path_by_extension() {
    let dir = std::env::temp_dir().join(format!("flightbox-auth-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let json = dir.join("appsettings.json");
    std::fs::write(&json, r#"{"APS": {"ClientId": "a", "ClientSecret": "b"}}"#).unwrap();
    let yaml = dir.join("auth.yml");
    std::fs::write(&yaml, "client_id: a\nclient_secret: b\n").unwrap();

    assert_eq!(AuthConfig::from_path(&json).unwrap(), AuthConfig::new("a", "b"));
    assert_eq!(AuthConfig::from_path(&yaml).unwrap(), AuthConfig::new("a", "b"));

    assert!(matches!(
        AuthConfig::from_path(dir.join("auth.toml")),
        Err(ConfigError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        AuthConfig::from_path(dir.join("missing.json")),
        Err(ConfigError::Io { .. })
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_debug_redacts_secret() {
    let config = AuthConfig::new("my-app", "s3cr3t");

    let rendered = format!("{config:?} {:?}", config.client_credentials());

    assert!(rendered.contains("my-app"));
    assert!(!rendered.contains("s3cr3t"));
}
