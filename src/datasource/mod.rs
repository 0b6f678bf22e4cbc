//! Quote vendor abstraction for fetching OHLCV candles.

use crate::domain::OhlcvCandle;
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod twelvedata;

pub use mock::MockQuoteSource;
pub use twelvedata::TwelveDataSource;

/// Quote source trait for fetching candles per (symbol, interval).
///
/// Implementations must handle retry/backoff and rate limiting. No caching;
/// calls are idempotent.
#[async_trait]
pub trait QuoteSource: Send + Sync + fmt::Debug {
    /// Fetch up to `count` candles for a vendor-canonical symbol, newest-first.
    ///
    /// # Arguments
    /// * `symbol` - Vendor symbol (e.g., "BTC/USD")
    /// * `interval` - Vendor interval tag (e.g., "1min", "4h", "1day")
    /// * `count` - Maximum number of candles to return
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        count: u32,
    ) -> Result<Vec<OhlcvCandle>, QuoteError>;
}

/// Error type for quote source operations.
#[derive(Debug, Clone)]
pub enum QuoteError {
    /// Network error after the retry budget (connection refused, timeout, DNS).
    Network(String),
    /// Vendor returned its documented error envelope with a 2xx status.
    Vendor(String),
    /// Non-2xx HTTP response.
    Http { status: u16, message: String },
    /// Invalid JSON or malformed candle fields.
    Parse(String),
    /// Rate limit exceeded after the retry budget.
    RateLimited,
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteError::Network(msg) => write!(f, "Network error: {}", msg),
            QuoteError::Vendor(msg) => write!(f, "Vendor error: {}", msg),
            QuoteError::Http { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            QuoteError::Parse(msg) => write!(f, "Parse error: {}", msg),
            QuoteError::RateLimited => write!(f, "Rate limited"),
        }
    }
}

impl std::error::Error for QuoteError {}
