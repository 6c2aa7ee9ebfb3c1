//! notifyd - a notification fan-out dispatch service.
//!
//! Accepts a send-notification command naming one or more delivery
//! channels and a target, builds one immutable notification, and attempts
//! every requested channel independently so one channel's failure never
//! prevents delivery on another.

pub mod app;
pub mod channels;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod http;
pub mod payload;
pub mod queue;
pub mod registry;

// Re-export core types for convenience
pub use crate::core::*;
pub use dispatch::{CommandTarget, DispatchError, Dispatcher, SendNotificationCommand};
pub use payload::PayloadValue;
pub use registry::ChannelRegistry;
