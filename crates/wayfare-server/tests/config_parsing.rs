use std::{env, fs};

use wayfare_server::config::StorageBackend;
use wayfare_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("wayfare.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
request_timeout_ms = 2000
body_limit_bytes = 1024

[storage]
backend = "postgres"

[storage.postgres]
host = "localhost"
port = 5432
database = "wayfare"
user = "test"
password = "test"
run_migrations = true

[redis]
enabled = false

[countries]
default_page_size = 5
max_page_size = 10

[auth]
enabled = true
jwt_secret = "file-secret"

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.request_timeout_ms, 2000);
    assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
    assert!(cfg.storage.postgres.run_migrations);
    assert_eq!(cfg.countries.default_page_size, 5);
    assert_eq!(cfg.countries.max_page_size, 10);
    assert_eq!(cfg.auth.jwt_secret.as_deref(), Some("file-secret"));
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("WAYFARE__COUNTRIES__DEFAULT_PAGE_SIZE", "9");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.countries.default_page_size, 9);
    unsafe {
        env::remove_var("WAYFARE__COUNTRIES__DEFAULT_PAGE_SIZE");
    }

    // 3) Invalid config (default > max) should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[storage]
backend = "memory"

[countries]
default_page_size = 50
max_page_size = 10
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("default_page_size must be <="));

    // 4) Auth without a secret is rejected
    let no_secret_path = dir.path().join("no-secret.toml");
    fs::write(
        &no_secret_path,
        "[storage]\nbackend = \"memory\"\n\n[auth]\nenabled = true\n",
    )
    .expect("write toml");
    let err = tokio_test::assert_err!(load_config(no_secret_path.to_str()));
    assert!(err.contains("jwt_secret"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");

    let cfg = tokio_test::assert_ok!(load_config(path.to_str()));
    assert_eq!(cfg.server.port, 3000);
    assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
    assert_eq!(cfg.countries.max_page_size, 100);
}
