//! The send-notification use case: fan-out with per-channel failure
//! isolation.
//!
//! The dispatcher owns `Notification` construction. It builds exactly one
//! notification per accepted command, then attempts every requested
//! channel independently: a lookup miss is logged and skipped, a channel
//! error is logged and recorded, and neither stops the remaining
//! channels. Only input validation before the notification exists can
//! fail the whole call.

use crate::core::{
    ChannelKind, DeliveryOutcome, DeliveryStatus, DomainError, Notification, NotificationTarget,
};
use crate::payload::PayloadValue;
use crate::registry::ChannelRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// The inbound command shape, shared by the HTTP and queue collaborators.
///
/// Channel kinds are typed: a request naming a kind outside the
/// enumeration is rejected when the command is decoded, before any
/// notification is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationCommand {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub channels: Vec<ChannelKind>,
    pub target: CommandTarget,
}

/// Target addressing as it appears on the wire. `data` is the opaque
/// payload handed to the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandTarget {
    pub user_id: String,
    #[serde(default)]
    pub endpoints: crate::core::TargetEndpoints,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Errors that fail the whole request. Raised only before a notification
/// is constructed; everything afterwards is isolated per channel.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidTarget(#[from] DomainError),
}

impl SendNotificationCommand {
    /// Checks the invariants a collaborator can reject up front without
    /// running the dispatch.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.target.user_id.trim().is_empty() {
            return Err(DomainError::EmptyUserId.into());
        }
        Ok(())
    }
}

/// The single entry point for sending a notification.
pub struct Dispatcher {
    registry: Arc<ChannelRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Builds one notification from the command and attempts every
    /// requested channel in order. Returns the per-channel outcomes; a
    /// channel failure never becomes a dispatch-level error.
    ///
    /// Duplicate kinds in the command are attempted independently.
    /// Dropping the returned future stops not-yet-started attempts but
    /// cannot undo already-delivered channels.
    pub async fn dispatch(
        &self,
        command: SendNotificationCommand,
    ) -> Result<Vec<DeliveryOutcome>, DispatchError> {
        let payload = PayloadValue::normalize(command.target.data.as_ref());
        let target =
            NotificationTarget::new(command.target.user_id, command.target.endpoints, payload)?;
        let notification =
            Notification::new(command.title, command.message, command.channels, target);

        info!(
            id = %notification.id,
            user_id = %notification.target.user_id(),
            channels = ?notification.channels,
            "dispatching notification"
        );

        let mut outcomes = Vec::with_capacity(notification.channels.len());
        for kind in &notification.channels {
            let outcome = match self.registry.resolve(*kind) {
                None => {
                    warn!(id = %notification.id, channel = %kind, "channel not registered, skipping");
                    DeliveryOutcome::skipped(*kind)
                }
                Some(channel) => match channel.send(&notification).await {
                    Ok(DeliveryStatus::Skipped) => {
                        info!(id = %notification.id, channel = %kind, "channel disabled, nothing sent");
                        DeliveryOutcome::skipped(*kind)
                    }
                    Ok(DeliveryStatus::Delivered) => DeliveryOutcome::delivered(*kind),
                    Ok(DeliveryStatus::Failed) => {
                        error!(id = %notification.id, channel = %kind, "channel reported delivery failure");
                        DeliveryOutcome::failed(*kind, "channel reported delivery failure".to_string())
                    }
                    Err(e) => {
                        error!(
                            id = %notification.id,
                            channel = %kind,
                            error = %e,
                            "failed to send notification"
                        );
                        DeliveryOutcome::failed(*kind, e.to_string())
                    }
                },
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
