//! The realtime (WebSocket) channel.
//!
//! Delivery goes through the in-process `NotificationHub`, a group-keyed
//! pub/sub built on tokio broadcast channels. Connected clients subscribe
//! to a group (the HTTP collaborator joins them to `user-{userId}` by
//! default) and every publish fans the event out to all current
//! subscribers of that group. Publishing to a group with no subscribers
//! is a success: nobody was listening.

use crate::config::ChannelToggle;
use crate::core::{
    ChannelError, ChannelKind, DeliveryStatus, Notification, NotificationChannel,
    NotificationTarget,
};
use crate::payload::PayloadValue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, instrument};
use uuid::Uuid;

/// How many events a slow subscriber may lag behind before dropping some.
const GROUP_CHANNEL_CAPACITY: usize = 64;

/// The structured event delivered to realtime subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub payload: PayloadValue,
}

impl NotificationEvent {
    pub fn from_notification(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            title: notification.title.clone(),
            message: notification.message.clone(),
            created_at: notification.created_at,
            user_id: notification.target.user_id().to_string(),
            payload: notification.target.payload().clone(),
        }
    }
}

/// Group-keyed pub/sub for notification events.
#[derive(Default)]
pub struct NotificationHub {
    groups: RwLock<HashMap<String, broadcast::Sender<NotificationEvent>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a group, creating it on first use.
    pub fn subscribe(&self, group: &str) -> broadcast::Receiver<NotificationEvent> {
        let mut groups = self.groups.write().expect("hub lock poisoned");
        groups
            .entry(group.to_string())
            .or_insert_with(|| broadcast::channel(GROUP_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes an event to all current subscribers of a group. Returns
    /// the number of subscribers that received it.
    pub fn publish(&self, group: &str, event: NotificationEvent) -> usize {
        let groups = self.groups.read().expect("hub lock poisoned");
        match groups.get(group) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }
}

/// Resolves the delivery group for a target: the explicit endpoint group
/// when present and non-blank, else the deterministic per-user group.
pub fn resolve_group(target: &NotificationTarget) -> String {
    target
        .endpoints()
        .web_socket
        .as_ref()
        .and_then(|e| e.group.as_deref())
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("user-{}", target.user_id()))
}

/// The realtime channel implementation.
pub struct WebSocketChannel {
    config: ChannelToggle,
    hub: Arc<NotificationHub>,
}

impl WebSocketChannel {
    pub fn new(config: ChannelToggle, hub: Arc<NotificationHub>) -> Self {
        Self { config, hub }
    }
}

#[async_trait]
impl NotificationChannel for WebSocketChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WebSocket
    }

    #[instrument(skip(self, notification), fields(id = %notification.id))]
    async fn send(&self, notification: &Notification) -> Result<DeliveryStatus, ChannelError> {
        if !self.config.enabled {
            debug!("realtime channel disabled, skipping send");
            return Ok(DeliveryStatus::Skipped);
        }

        let group = resolve_group(&notification.target);
        let event = NotificationEvent::from_notification(notification);
        let receivers = self.hub.publish(&group, event);
        debug!(group = %group, receivers, "published realtime event");
        Ok(DeliveryStatus::Delivered)
    }
}
