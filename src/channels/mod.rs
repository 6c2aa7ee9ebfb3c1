//! Channel implementations.
//!
//! Each submodule provides one `NotificationChannel` implementation. Sms,
//! Telegram, and WhatsApp are declared in the kind enumeration but have no
//! transport yet; the registry reports them as not-found until one exists.

pub mod email;
pub mod realtime;
