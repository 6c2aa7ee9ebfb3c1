//! notifyd - notification fan-out dispatch service.

use anyhow::Result;
use clap::Parser;
use notifyd::{app::App, cli::Cli, config::Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    });

    // Initialize logging. RUST_LOG takes precedence over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("notifyd starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Listen Address: {}", config.http.listen_addr);
    info!(
        "WebSocket Channel: {}",
        if config.channels.web_socket.enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!(
        "Email Channel: {}",
        if config.channels.email.enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    if config.channels.email.enabled {
        info!("Email From: {}", config.channels.email.from);
        info!(
            "SMTP Relay: {}:{} (starttls: {})",
            config.channels.email.smtp.host,
            config.channels.email.smtp.port,
            config.channels.email.smtp.starttls
        );
    }
    info!("-------------------------------------------------------");

    let app = App::builder(config).start().await?;
    app.run().await
}
