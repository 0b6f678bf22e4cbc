//! Inbound charting-platform alert.

use super::{Decimal, TimeMs};

/// An alert received from the charting platform webhook.
///
/// Immutable once constructed; `received_at` is stamped at ingress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub symbol: String,
    pub exchange: Option<String>,
    /// Free-form action hint from the alert script ("buy", "sell", ...).
    pub action: Option<String>,
    pub price: Option<Decimal>,
    pub interval: Option<String>,
    pub message: Option<String>,
    pub secret: Option<String>,
    pub received_at: TimeMs,
}

impl Alert {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: None,
            action: None,
            price: None,
            interval: None,
            message: None,
            secret: None,
            received_at: TimeMs::now(),
        }
    }
}
