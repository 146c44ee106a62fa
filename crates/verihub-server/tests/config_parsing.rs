use std::fs;
use std::time::Duration;

use config::Map;
use verihub_server::config::loader::load_config_with_env;

fn env(pairs: &[(&str, &str)]) -> Map<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const TOML: &str = r#"
[server]
host = "127.0.0.1"
port = 8081
body_limit_bytes = 1024

[logging]
level = "debug"

[auth.token]
secret = "file-secret"
ttl = "12h"
base_url = "https://verify.example.com"

[auth.caller]
api_key = "file-key"

[auth.checkpoint]
window = "5m"
"#;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("verihub.toml");
    fs::write(&path, TOML).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config_with_env(path.to_str(), &env(&[])).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.body_limit_bytes, 1024);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.auth.token.secret.as_ref().unwrap().expose(), "file-secret");
    assert_eq!(cfg.auth.token.ttl, Duration::from_secs(12 * 3600));
    assert_eq!(cfg.auth.token.base_url(), Some("https://verify.example.com"));
    assert_eq!(cfg.auth.caller.api_key.as_ref().unwrap().expose(), "file-key");
    assert_eq!(cfg.auth.checkpoint.window, Duration::from_secs(300));

    // 2) Prefixed env overrides the file
    let cfg = load_config_with_env(
        path.to_str(),
        &env(&[
            ("VERIHUB__SERVER__PORT", "9090"),
            ("VERIHUB__AUTH__TOKEN__SECRET", "env-secret"),
        ]),
    )
    .expect("should parse config with env overrides");
    assert_eq!(cfg.server.port, 9090);
    assert_eq!(cfg.auth.token.secret.as_ref().unwrap().expose(), "env-secret");

    // 3) Flat names win over both
    let cfg = load_config_with_env(
        path.to_str(),
        &env(&[
            ("VERIHUB__AUTH__TOKEN__SECRET", "env-secret"),
            ("TOKEN_SECRET", "flat-secret"),
            ("GENERATOR_KEY", "flat-key"),
            ("TOKEN_EXPIRES", "1d"),
        ]),
    )
    .expect("should parse flat overrides");
    assert_eq!(cfg.auth.token.secret.as_ref().unwrap().expose(), "flat-secret");
    assert_eq!(cfg.auth.caller.api_key.as_ref().unwrap().expose(), "flat-key");
    assert_eq!(cfg.auth.token.ttl, Duration::from_secs(86_400));

    // 4) Invalid values fail validation
    let err = load_config_with_env(path.to_str(), &env(&[("TOKEN_EXPIRES", "0s")])).unwrap_err();
    assert!(err.contains("ttl"), "{err}");

    let err = load_config_with_env(path.to_str(), &env(&[("VERIHUB__LOGGING__LEVEL", "loud")]))
        .unwrap_err();
    assert!(err.contains("logging.level"), "{err}");
}

#[test]
fn base_url_precedence() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let missing = dir.path().join("absent.toml");

    let cfg = load_config_with_env(missing.to_str(), &env(&[("BASE_URL", "https://a.example")]))
        .unwrap();
    assert_eq!(cfg.auth.token.base_url(), Some("https://a.example"));

    let cfg = load_config_with_env(
        missing.to_str(),
        &env(&[
            ("BASE_URL", "https://a.example"),
            ("VERCEL_BASE_URL", "https://b.example"),
        ]),
    )
    .unwrap();
    assert_eq!(cfg.auth.token.base_url(), Some("https://b.example"));

    // Blank values are ignored
    let cfg = load_config_with_env(
        missing.to_str(),
        &env(&[("VERCEL_BASE_URL", "  "), ("BASE_URL", "https://a.example")]),
    )
    .unwrap();
    assert_eq!(cfg.auth.token.base_url(), Some("https://a.example"));
}

#[test]
fn missing_file_uses_defaults_and_secrets_stay_strings() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let missing = dir.path().join("absent.toml");

    let cfg = load_config_with_env(missing.to_str(), &env(&[])).unwrap();
    assert_eq!(cfg.server.port, 3000);
    assert!(cfg.auth.token.secret.is_none());
    assert_eq!(cfg.auth.token.ttl, Duration::from_secs(7 * 86_400));

    // Numeric-looking secrets keep their exact text
    let cfg = load_config_with_env(missing.to_str(), &env(&[("TOKEN_SECRET", "007")])).unwrap();
    assert_eq!(cfg.auth.token.secret.unwrap().expose(), "007");
}
