//! Configuration management.
//!
//! Defines the main `Config` struct and its sub-structs for the HTTP
//! listener and the per-channel settings. Uses the `figment` crate to
//! layer sources: built-in defaults, a `notifyd.toml` file, environment
//! variables prefixed `NOTIFYD_`, and command-line overrides.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the inbound HTTP listener.
    pub http: HttpConfig,
    /// Per-channel settings.
    pub channels: ChannelsConfig,
}

/// Configuration for the inbound HTTP listener.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// The address the HTTP server binds to.
    pub listen_addr: String,
}

/// Per-channel settings. Kinds without a working transport still carry a
/// toggle so operators can pre-declare policy.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChannelsConfig {
    pub web_socket: ChannelToggle,
    pub email: EmailConfig,
    pub sms: ChannelToggle,
    pub telegram: ChannelToggle,
    pub whats_app: ChannelToggle,
}

/// The enabled flag every channel carries. A disabled channel turns its
/// sends into no-ops without the caller observing failures.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ChannelToggle {
    pub enabled: bool,
}

/// Configuration for the email channel.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    /// Sender address for outbound mail.
    pub from: String,
    /// Upper bound on a single SMTP send.
    pub timeout_seconds: u64,
    pub smtp: SmtpConfig,
}

/// Mail relay settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Negotiate STARTTLS with the relay. Off means plaintext, which is
    /// only appropriate for local relays and tests.
    pub starttls: bool,
}

impl Config {
    /// Loads the application configuration by layering defaults, the TOML
    /// file, environment variables, and CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| "notifyd.toml".into());

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g.
            // NOTIFYD_LOG_LEVEL=debug
            .merge(Env::prefixed("NOTIFYD_").split("__"))
            .merge(cli)
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            http: HttpConfig {
                listen_addr: "127.0.0.1:8080".to_string(),
            },
            channels: ChannelsConfig {
                web_socket: ChannelToggle { enabled: true },
                email: EmailConfig {
                    enabled: false,
                    from: "notifyd@localhost".to_string(),
                    timeout_seconds: 10,
                    smtp: SmtpConfig {
                        host: "localhost".to_string(),
                        port: 587,
                        username: String::new(),
                        password: String::new(),
                        starttls: true,
                    },
                },
                sms: ChannelToggle::default(),
                telegram: ChannelToggle::default(),
                whats_app: ChannelToggle::default(),
            },
        }
    }
}
