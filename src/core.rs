//! Core domain types and the channel contract.
//!
//! This module defines the immutable value objects that describe a
//! notification and its target, plus the trait every delivery channel
//! implements. Channels receive a read-only view of a notification and
//! report success, an intentional no-op, or a failure.

use crate::payload::PayloadValue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// The fixed set of delivery mechanisms a notification can request.
///
/// Kinds may be declared before an implementation exists; the registry
/// treats an unimplemented kind as not-found, which is a normal, non-fatal
/// dispatch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    WebSocket,
    Email,
    Sms,
    Telegram,
    WhatsApp,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::WebSocket => "WebSocket",
            ChannelKind::Email => "Email",
            ChannelKind::Sms => "Sms",
            ChannelKind::Telegram => "Telegram",
            ChannelKind::WhatsApp => "WhatsApp",
        };
        f.write_str(name)
    }
}

/// Errors raised while constructing domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("target user id must not be empty")]
    EmptyUserId,
}

/// Email-specific addressing for a target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmailEndpoint {
    pub to: String,
}

/// Realtime-specific addressing for a target. An absent group means the
/// channel falls back to the deterministic per-user group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebSocketEndpoint {
    pub group: Option<String>,
}

/// Optional per-channel addressing overrides. Every field is independently
/// optional; a channel that needs an endpoint not supplied here falls back
/// to a deterministic default or fails that delivery only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEndpoints {
    #[serde(default)]
    pub email: Option<EmailEndpoint>,
    #[serde(default)]
    pub web_socket: Option<WebSocketEndpoint>,
}

/// Identifies who a notification goes to, with optional per-channel
/// addressing and the normalized rendering payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationTarget {
    user_id: String,
    endpoints: TargetEndpoints,
    payload: PayloadValue,
}

impl NotificationTarget {
    /// Builds a target. Rejects an empty user id; a missing channel
    /// endpoint never fails construction because endpoint resolution is
    /// each channel's responsibility.
    pub fn new(
        user_id: impl Into<String>,
        endpoints: TargetEndpoints,
        payload: PayloadValue,
    ) -> Result<Self, DomainError> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(DomainError::EmptyUserId);
        }
        Ok(Self {
            user_id,
            endpoints,
            payload,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn endpoints(&self) -> &TargetEndpoints {
        &self.endpoints
    }

    pub fn payload(&self) -> &PayloadValue {
        &self.payload
    }
}

/// The unit of work handed to channels. Constructed exactly once per
/// inbound request by the dispatcher and immutable thereafter.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub channels: Vec<ChannelKind>,
    pub target: NotificationTarget,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        title: String,
        message: String,
        channels: Vec<ChannelKind>,
        target: NotificationTarget,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            message,
            channels,
            target,
            created_at: Utc::now(),
        }
    }
}

/// Result of one channel attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryStatus {
    Delivered,
    /// The channel is disabled or not registered; intentionally a no-op.
    Skipped,
    Failed,
}

/// One channel attempt, individually observable so a failed attempt never
/// hides or affects the others.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub channel: ChannelKind,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl DeliveryOutcome {
    pub fn delivered(channel: ChannelKind) -> Self {
        Self {
            channel,
            status: DeliveryStatus::Delivered,
            error: None,
            sent_at: Some(Utc::now()),
        }
    }

    pub fn skipped(channel: ChannelKind) -> Self {
        Self {
            channel,
            status: DeliveryStatus::Skipped,
            error: None,
            sent_at: None,
        }
    }

    pub fn failed(channel: ChannelKind, error: String) -> Self {
        Self {
            channel,
            status: DeliveryStatus::Failed,
            error: Some(error),
            sent_at: None,
        }
    }
}

/// Errors a channel can raise for a single delivery attempt. Always
/// isolated to that attempt by the dispatcher.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("target has no {0} endpoint")]
    MissingEndpoint(&'static str),
    #[error("template rendering failed: {0}")]
    Template(#[from] handlebars::RenderError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("send timed out after {0}s")]
    Timeout(u64),
}

/// A delivery mechanism for one channel kind.
///
/// `send` returns `DeliveryStatus::Skipped` when the channel is
/// administratively disabled (operator policy, not an error), `Delivered`
/// on success, and an error for anything that prevented delivery. A
/// channel must not mutate the notification it receives.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// The kind this implementation handles.
    fn kind(&self) -> ChannelKind;

    /// Renders and delivers the notification to the channel's endpoint.
    async fn send(&self, notification: &Notification) -> Result<DeliveryStatus, ChannelError>;
}
