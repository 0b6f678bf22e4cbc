//! Recording notifier for tests.

use super::{Notifier, NotifyOutcome};
use crate::domain::{Alert, Position, Verdict, Wallet};
use async_trait::async_trait;
use std::sync::Mutex;

/// A notification event captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyEvent {
    AlertAnalyzed { symbol: String },
    PositionOpened { position_id: String },
    PositionClosed { position_id: String },
}

/// Notifier that records events instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotifyEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotifyEvent> {
        self.events.lock().expect("recorder lock poisoned").clone()
    }

    fn record(&self, event: NotifyEvent) {
        self.events.lock().expect("recorder lock poisoned").push(event);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn alert_analyzed(&self, _alert: &Alert, verdict: &Verdict) -> NotifyOutcome {
        self.record(NotifyEvent::AlertAnalyzed {
            symbol: verdict.symbol.clone(),
        });
        NotifyOutcome::Sent
    }

    async fn position_opened(&self, position: &Position, _wallet: &Wallet) -> NotifyOutcome {
        self.record(NotifyEvent::PositionOpened {
            position_id: position.position_id.clone(),
        });
        NotifyOutcome::Sent
    }

    async fn position_closed(&self, position: &Position, _wallet: &Wallet) -> NotifyOutcome {
        self.record(NotifyEvent::PositionClosed {
            position_id: position.position_id.clone(),
        });
        NotifyOutcome::Sent
    }
}
