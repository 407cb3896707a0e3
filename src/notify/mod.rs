//! Chat notifications.
//!
//! Delivery is fire-and-forget: callers log failures and carry on.

pub mod messages;
mod telegram;

use async_trait::async_trait;

use crate::error::Result;

pub use messages::HeartbeatEntry;
pub use telegram::{TelegramCredentials, TelegramNotifier};

/// Outcome of a send attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No credentials configured; nothing was sent
    Skipped,
}

/// Sends one chat message per call.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<Delivery>;
}
