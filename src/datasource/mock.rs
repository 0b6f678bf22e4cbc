//! Mock quote source for testing without network calls.

use super::{QuoteError, QuoteSource};
use crate::domain::{Decimal, OhlcvCandle, TimeMs};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock quote source returning predefined candles per (symbol, interval).
///
/// Candle sequences can be queued so that consecutive calls for the same key
/// observe a moving price (one queue entry consumed per call; the last entry
/// repeats once the queue drains).
#[derive(Debug, Default)]
pub struct MockQuoteSource {
    responses: Mutex<HashMap<(String, String), Vec<Vec<OhlcvCandle>>>>,
    error: Option<QuoteError>,
}

impl MockQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for a (symbol, interval) key.
    pub fn with_candles(self, symbol: &str, interval: &str, candles: Vec<OhlcvCandle>) -> Self {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .entry((symbol.to_ascii_uppercase(), interval.to_string()))
            .or_default()
            .push(candles);
        self
    }

    /// Queue single-candle responses with the given close prices, in order.
    pub fn with_close_sequence(self, symbol: &str, interval: &str, closes: &[&str]) -> Self {
        let mut source = self;
        for (i, close) in closes.iter().enumerate() {
            source = source.with_candles(symbol, interval, vec![candle_at(i as i64, close)]);
        }
        source
    }

    /// Make every fetch fail with the given error.
    pub fn with_error(mut self, error: QuoteError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Candle with the given close price, stamped `seq` minutes after now.
pub fn candle_at(seq: i64, close: &str) -> OhlcvCandle {
    let close = Decimal::parse(close).expect("invalid close price in test data");
    OhlcvCandle {
        open_time: TimeMs::new(TimeMs::now().as_ms() + seq * 60_000),
        open: close,
        high: close,
        low: close,
        close,
        volume: 100,
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        count: u32,
    ) -> Result<Vec<OhlcvCandle>, QuoteError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        let mut responses = self.responses.lock().expect("mock lock poisoned");
        let key = (symbol.to_ascii_uppercase(), interval.to_string());
        let queue = match responses.get_mut(&key) {
            Some(queue) if !queue.is_empty() => queue,
            _ => return Ok(Vec::new()),
        };

        let mut candles = if queue.len() > 1 {
            queue.remove(0)
        } else {
            queue[0].clone()
        };
        candles.truncate(count as usize);
        Ok(candles)
    }
}
