//! Best-effort event notifications to a configured webhook sink.
//!
//! Delivery is fire-and-forget: failures are logged at warn and swallowed,
//! never propagated to the analysis or trading paths.

use crate::domain::{Alert, Position, Verdict, Wallet};
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod webhook;

pub use mock::{NotifyEvent, RecordingNotifier};
pub use webhook::WebhookNotifier;

/// What happened to a notification attempt. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Accepted by the sink.
    Sent,
    /// No sink configured.
    Skipped,
    /// Delivery failed; logged and dropped.
    Failed,
}

/// Notification sink for analysis and trade lifecycle events.
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    async fn alert_analyzed(&self, alert: &Alert, verdict: &Verdict) -> NotifyOutcome;

    async fn position_opened(&self, position: &Position, wallet: &Wallet) -> NotifyOutcome;

    async fn position_closed(&self, position: &Position, wallet: &Wallet) -> NotifyOutcome;
}
