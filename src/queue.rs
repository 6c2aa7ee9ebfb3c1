//! The inbound queue collaborator.
//!
//! Consumes `SendNotificationCommand` messages from an async channel and
//! invokes the dispatcher exactly once per message. Message-level retry of
//! commands that never reached the dispatcher is the producer side's
//! concern; once a dispatch has run, per-channel failures are already
//! isolated and must not requeue the whole command.

use crate::dispatch::{Dispatcher, SendNotificationCommand};
use async_channel::Receiver;
use std::sync::Arc;
use tracing::{error, info};

/// Runs until the command channel is closed and drained.
pub async fn consume(commands: Receiver<SendNotificationCommand>, dispatcher: Arc<Dispatcher>) {
    while let Ok(command) = commands.recv().await {
        if let Err(e) = dispatcher.dispatch(command).await {
            error!(error = %e, "rejected queued notification command");
        }
    }
    info!("command queue closed, consumer shutting down");
}
