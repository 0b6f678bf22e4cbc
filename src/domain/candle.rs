//! OHLCV candle types returned by the quote vendor.

use super::{Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// A single OHLCV candle for a fixed time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcvCandle {
    /// Bucket open time (UTC).
    pub open_time: TimeMs,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

/// Candles for one timeframe, newest-first as the vendor returns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeframeData {
    /// Vendor interval tag, e.g. "1min", "4h", "1day".
    pub interval: String,
    pub candles: Vec<OhlcvCandle>,
}

impl TimeframeData {
    pub fn new(interval: impl Into<String>, candles: Vec<OhlcvCandle>) -> Self {
        Self {
            interval: interval.into(),
            candles,
        }
    }

    /// Most recent candle, if any.
    pub fn latest(&self) -> Option<&OhlcvCandle> {
        self.candles.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, close: &str) -> OhlcvCandle {
        OhlcvCandle {
            open_time: TimeMs::new(open_time),
            open: Decimal::parse("100").unwrap(),
            high: Decimal::parse("101").unwrap(),
            low: Decimal::parse("99").unwrap(),
            close: Decimal::parse(close).unwrap(),
            volume: 1200,
        }
    }

    #[test]
    fn test_latest_is_first() {
        let tf = TimeframeData::new("1min", vec![candle(2000, "100.5"), candle(1000, "99.5")]);
        assert_eq!(tf.latest().unwrap().open_time, TimeMs::new(2000));
    }

    #[test]
    fn test_latest_empty() {
        let tf = TimeframeData::new("1h", vec![]);
        assert!(tf.latest().is_none());
    }
}
