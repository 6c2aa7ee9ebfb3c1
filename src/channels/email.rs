//! The email channel.
//!
//! Renders the notification message as a handlebars template with the
//! normalized payload as context, then hands the result to a `Mailer`.
//! The production mailer speaks SMTP through `lettre`; tests substitute a
//! fake. A message without placeholders renders verbatim, so plain bodies
//! need no special casing.

use crate::config::EmailConfig;
use crate::core::{ChannelError, ChannelKind, DeliveryStatus, Notification, NotificationChannel};
use async_trait::async_trait;
use handlebars::Handlebars;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Transport seam for outbound mail. Host, credentials, and TLS policy
/// live behind the implementation.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: String,
    ) -> Result<(), ChannelError>;
}

/// SMTP mailer backed by `lettre`'s async transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Self> {
        let smtp = &config.smtp;
        let mut builder = if smtp.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };
        builder = builder.port(smtp.port);
        if !smtp.username.is_empty() {
            builder = builder
                .credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()));
        }
        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_mailbox(address: &str, role: &str) -> Result<Mailbox, ChannelError> {
    address
        .parse()
        .map_err(|e| ChannelError::Transport(format!("invalid {role} address {address:?}: {e}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_mail(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: String,
    ) -> Result<(), ChannelError> {
        let message = Message::builder()
            .from(parse_mailbox(from, "sender")?)
            .to(parse_mailbox(to, "recipient")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// The email channel implementation.
pub struct EmailChannel {
    config: EmailConfig,
    mailer: Arc<dyn Mailer>,
    templates: Handlebars<'static>,
}

impl EmailChannel {
    pub fn new(config: EmailConfig, mailer: Arc<dyn Mailer>) -> Self {
        // Non-strict rendering: unset payload fields resolve to empty
        // rather than failing the send.
        let templates = Handlebars::new();
        Self {
            config,
            mailer,
            templates,
        }
    }

    fn render_body(&self, notification: &Notification) -> Result<String, ChannelError> {
        Ok(self
            .templates
            .render_template(&notification.message, notification.target.payload())?)
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    #[instrument(skip(self, notification), fields(id = %notification.id))]
    async fn send(&self, notification: &Notification) -> Result<DeliveryStatus, ChannelError> {
        if !self.config.enabled {
            debug!("email channel disabled, skipping send");
            return Ok(DeliveryStatus::Skipped);
        }

        let to = notification
            .target
            .endpoints()
            .email
            .as_ref()
            .map(|e| e.to.trim())
            .unwrap_or("");
        if to.is_empty() {
            return Err(ChannelError::MissingEndpoint("email"));
        }

        let body = self.render_body(notification)?;
        let send = self
            .mailer
            .send_mail(&self.config.from, to, &notification.title, body);

        match tokio::time::timeout(Duration::from_secs(self.config.timeout_seconds), send).await {
            Ok(result) => {
                result?;
                info!(to = %to, "email sent");
                Ok(DeliveryStatus::Delivered)
            }
            Err(_) => Err(ChannelError::Timeout(self.config.timeout_seconds)),
        }
    }
}
