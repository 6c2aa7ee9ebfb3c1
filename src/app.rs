//! The composition root, decoupled from the entry point.
//!
//! `AppBuilder` wires the registry, dispatcher, realtime hub, HTTP server,
//! and queue consumer together, with override hooks so tests can
//! substitute transports. `App` owns the spawned tasks and a watch-channel
//! shutdown signal, the same lifecycle shape the rest of the service uses.

use crate::channels::email::{EmailChannel, Mailer, SmtpMailer};
use crate::channels::realtime::{NotificationHub, WebSocketChannel};
use crate::config::Config;
use crate::dispatch::{Dispatcher, SendNotificationCommand};
use crate::http::{ApiState, HttpServer};
use crate::queue;
use crate::registry::ChannelRegistry;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// A handle to the running application.
pub struct App {
    listen_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    hub: Arc<NotificationHub>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the HTTP server actually bound to.
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    pub fn hub(&self) -> Arc<NotificationHub> {
        self.hub.clone()
    }

    /// Serves until interrupted, then shuts down gracefully.
    pub async fn run(self) -> Result<()> {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for shutdown signal")?;
        info!("Shutdown signal received. Waiting for tasks to complete...");
        self.shutdown().await;
        Ok(())
    }

    /// Signals all tasks to stop and waits for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
        info!("All tasks shut down.");
    }
}

/// Builder for the main application.
///
/// Constructing the components is separated from running them, and every
/// external transport has an override hook for tests.
pub struct AppBuilder {
    config: Config,
    registry_override: Option<ChannelRegistry>,
    mailer_override: Option<Arc<dyn Mailer>>,
    command_rx: Option<async_channel::Receiver<SendNotificationCommand>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry_override: None,
            mailer_override: None,
            command_rx: None,
        }
    }

    /// Replaces the whole channel registry. Used by tests that observe
    /// dispatch behavior directly.
    pub fn registry(mut self, registry: ChannelRegistry) -> Self {
        self.registry_override = Some(registry);
        self
    }

    /// Replaces the SMTP transport behind the email channel.
    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer_override = Some(mailer);
        self
    }

    /// Attaches the queue collaborator to a command receiver.
    pub fn command_receiver(
        mut self,
        commands: async_channel::Receiver<SendNotificationCommand>,
    ) -> Self {
        self.command_rx = Some(commands);
        self
    }

    /// Wires everything together, binds the listener, and spawns the
    /// long-running tasks.
    pub async fn start(self) -> Result<App> {
        let hub = Arc::new(NotificationHub::new());

        let registry = match self.registry_override {
            Some(registry) => registry,
            None => {
                let mut registry = ChannelRegistry::new();
                registry.register(Arc::new(WebSocketChannel::new(
                    self.config.channels.web_socket.clone(),
                    hub.clone(),
                )));

                let mailer: Arc<dyn Mailer> = match self.mailer_override {
                    Some(mailer) => mailer,
                    None => Arc::new(
                        SmtpMailer::from_config(&self.config.channels.email)
                            .context("failed to build SMTP transport")?,
                    ),
                };
                registry.register(Arc::new(EmailChannel::new(
                    self.config.channels.email.clone(),
                    mailer,
                )));
                // Sms, Telegram, and WhatsApp have no transport yet; the
                // registry reports them as not-found.
                registry
            }
        };

        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        let listener = TcpListener::bind(&self.config.http.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.http.listen_addr))?;
        let listen_addr = listener.local_addr()?;
        info!(addr = %listen_addr, "HTTP server listening");

        let server = HttpServer::new(
            listener,
            ApiState {
                dispatcher: dispatcher.clone(),
                hub: hub.clone(),
            },
            shutdown_rx.clone(),
        );
        tasks.push(tokio::spawn(server.run()));

        if let Some(commands) = self.command_rx {
            let consumer_dispatcher = dispatcher.clone();
            let mut consumer_shutdown = shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = consumer_shutdown.changed() => {}
                    _ = queue::consume(commands, consumer_dispatcher) => {}
                }
            }));
        }

        Ok(App {
            listen_addr,
            dispatcher,
            hub,
            shutdown_tx,
            tasks,
        })
    }
}
