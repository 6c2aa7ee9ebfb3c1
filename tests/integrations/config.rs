//! Configuration loading tests: defaults, TOML file, and CLI overrides.

use clap::Parser;
use notifyd::cli::Cli;
use notifyd::config::Config;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A helper function to run a test with a temporary config file.
fn with_config_file<F>(toml_content: &str, test_fn: F)
where
    F: FnOnce(PathBuf),
{
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    let path = file.path().to_path_buf();
    test_fn(path);
}

#[test]
fn test_load_full_valid_config() {
    let toml_content = r#"
        log_level = "debug"
        [http]
        listen_addr = "0.0.0.0:9090"
        [channels.web_socket]
        enabled = true
        [channels.email]
        enabled = true
        from = "alerts@example.com"
        timeout_seconds = 5
        [channels.email.smtp]
        host = "mail.example.com"
        port = 2525
        username = "mailer"
        password = "secret"
        starttls = false
        [channels.sms]
        enabled = false
        [channels.telegram]
        enabled = false
        [channels.whats_app]
        enabled = false
    "#;

    with_config_file(toml_content, |path| {
        let cli =
            Cli::try_parse_from(["notifyd", "--config", path.to_str().unwrap()]).unwrap();
        let config = Config::load(&cli).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.http.listen_addr, "0.0.0.0:9090");
        assert!(config.channels.web_socket.enabled);
        assert!(config.channels.email.enabled);
        assert_eq!(config.channels.email.from, "alerts@example.com");
        assert_eq!(config.channels.email.timeout_seconds, 5);
        assert_eq!(config.channels.email.smtp.host, "mail.example.com");
        assert_eq!(config.channels.email.smtp.port, 2525);
        assert!(!config.channels.email.smtp.starttls);
        assert!(!config.channels.sms.enabled);
    });
}

#[test]
fn test_defaults_apply_when_file_is_partial() {
    let toml_content = r#"
        [channels.email]
        enabled = true
        from = "alerts@example.com"
    "#;

    with_config_file(toml_content, |path| {
        let cli =
            Cli::try_parse_from(["notifyd", "--config", path.to_str().unwrap()]).unwrap();
        let config = Config::load(&cli).unwrap();

        // File values stick, everything else falls back to defaults.
        assert!(config.channels.email.enabled);
        assert_eq!(config.channels.email.from, "alerts@example.com");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.http.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.channels.email.smtp.port, 587);
        assert!(config.channels.web_socket.enabled);
    });
}

#[test]
fn test_cli_overrides_config_file() {
    let toml_content = r#"
        log_level = "warn"
        [http]
        listen_addr = "0.0.0.0:9090"
    "#;

    with_config_file(toml_content, |path| {
        let cli = Cli::try_parse_from([
            "notifyd",
            "--config",
            path.to_str().unwrap(),
            "--listen-addr",
            "127.0.0.1:7070",
            "--log-level",
            "trace",
        ])
        .unwrap();
        let config = Config::load(&cli).unwrap();

        assert_eq!(config.http.listen_addr, "127.0.0.1:7070");
        assert_eq!(config.log_level, "trace");
    });
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let cli = Cli::try_parse_from([
        "notifyd",
        "--config",
        "/path/to/non/existent/notifyd.toml",
    ])
    .unwrap();
    let config = Config::load(&cli).unwrap();
    assert_eq!(config.http.listen_addr, "127.0.0.1:8080");
}
