//! Configuration parsing, defaults, validation, and credential loading.

use std::time::Duration;

use serial_test::serial;

use copydesk::config::GlobalConfig;

#[test]
fn empty_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("defaults parse");

    assert_eq!(config.http_port, 3000);
    assert_eq!(config.agent.turn_ceiling, 15);
    assert_eq!(config.workflow.progress_ttl_seconds, 300);
    assert_eq!(config.gateway.model, "anthropic/claude-sonnet-4.5");
    assert!(config.gateway.api_key.is_empty());
}

#[test]
fn sections_override_defaults() {
    let toml = r#"
http_port = 8080
db_path = "/tmp/copydesk-test.db"

[gateway]
base_url = "https://gateway.example/v2"
model = "openai/gpt-4o"

[agent]
turn_ceiling = 5

[workflow]
progress_ttl_seconds = 60
"#;
    let config = GlobalConfig::from_toml_str(toml).expect("parse");

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.gateway.base_url, "https://gateway.example/v2");
    assert_eq!(config.agent.turn_ceiling, 5);
    assert_eq!(config.progress_ttl(), Duration::from_secs(60));
}

#[test]
fn zero_turn_ceiling_is_rejected() {
    let err = GlobalConfig::from_toml_str("[agent]\nturn_ceiling = 0").expect_err("invalid");
    assert!(err.to_string().contains("turn_ceiling"));
}

#[test]
fn zero_progress_ttl_is_rejected() {
    let err =
        GlobalConfig::from_toml_str("[workflow]\nprogress_ttl_seconds = 0").expect_err("invalid");
    assert!(err.to_string().contains("progress_ttl_seconds"));
}

#[test]
fn empty_base_url_is_rejected() {
    let err = GlobalConfig::from_toml_str("[gateway]\nbase_url = \"\"").expect_err("invalid");
    assert!(err.to_string().contains("base_url"));
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = GlobalConfig::from_toml_str("http_port = \"not a port\"").expect_err("invalid");
    assert!(err.to_string().starts_with("config:"));
}

#[test]
fn config_file_loads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("copydesk.toml");
    std::fs::write(&path, "http_port = 9090\n").expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("load");
    assert_eq!(config.http_port, 9090);
}

#[test]
fn missing_config_file_is_a_config_error() {
    let err = GlobalConfig::load_from_path("/nonexistent/copydesk.toml").expect_err("missing");
    assert!(err.to_string().contains("failed to read config"));
}

#[test]
#[serial]
fn credentials_load_from_environment() {
    std::env::set_var("GATEWAY_API_KEY", "sk-test-key");
    let mut config = GlobalConfig::from_toml_str("").expect("parse");
    config.load_credentials().expect("credentials");
    assert_eq!(config.gateway.api_key, "sk-test-key");
    std::env::remove_var("GATEWAY_API_KEY");
}

#[test]
#[serial]
fn missing_api_key_is_rejected() {
    std::env::remove_var("GATEWAY_API_KEY");
    let mut config = GlobalConfig::from_toml_str("").expect("parse");
    let err = config.load_credentials().expect_err("no key");
    assert!(err.to_string().contains("GATEWAY_API_KEY"));
}
