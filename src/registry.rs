//! Maps a channel kind to its registered implementation.
//!
//! Registration happens once at startup in the composition root; after
//! that the registry is read-only and shared across dispatch calls. A kind
//! with no registered implementation is a normal lookup miss, not an
//! error, so new kinds can be declared before an implementation exists.

use crate::core::{ChannelKind, NotificationChannel};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelKind, Arc<dyn NotificationChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a channel under the kind it reports. Registering a second
    /// implementation for the same kind replaces the first.
    pub fn register(&mut self, channel: Arc<dyn NotificationChannel>) {
        self.channels.insert(channel.kind(), channel);
    }

    /// Looks up the implementation for a kind, if any.
    pub fn resolve(&self, kind: ChannelKind) -> Option<Arc<dyn NotificationChannel>> {
        self.channels.get(&kind).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
