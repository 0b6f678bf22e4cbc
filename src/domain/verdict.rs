//! Structured trade verdict produced by the oracle.

use super::{Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// Direction component of a verdict.
///
/// Anything the oracle emits outside "Long"/"Short" (including empty or
/// malformed strings) parses as `NoTrade`, so admission rejects it instead
/// of the caller seeing an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
    NoTrade,
}

impl TradeDirection {
    /// Lenient parse: unknown strings map to NoTrade.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => TradeDirection::Long,
            "short" => TradeDirection::Short,
            _ => TradeDirection::NoTrade,
        }
    }

    /// +1 for Long, -1 for Short. NoTrade never reaches PnL math.
    pub fn sign(&self) -> i64 {
        match self {
            TradeDirection::Long => 1,
            TradeDirection::Short => -1,
            TradeDirection::NoTrade => 0,
        }
    }

    pub fn is_tradeable(&self) -> bool {
        matches!(self, TradeDirection::Long | TradeDirection::Short)
    }
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "Long"),
            TradeDirection::Short => write!(f, "Short"),
            TradeDirection::NoTrade => write!(f, "NoTrade"),
        }
    }
}

/// The oracle's structured judgement for one alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub symbol: String,
    pub direction: TradeDirection,
    /// Confidence in [0, 100].
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reward_ratio: Option<String>,
    pub reasoning: String,
    pub analyzed_at: TimeMs,
}

impl Verdict {
    /// True when entry, stop-loss, and take-profit are all present.
    pub fn has_price_levels(&self) -> bool {
        self.entry_price.is_some() && self.stop_loss.is_some() && self.take_profit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_known_directions() {
        assert_eq!(TradeDirection::parse_lenient("Long"), TradeDirection::Long);
        assert_eq!(TradeDirection::parse_lenient("SHORT"), TradeDirection::Short);
        assert_eq!(
            TradeDirection::parse_lenient("  long  "),
            TradeDirection::Long
        );
    }

    #[test]
    fn test_parse_lenient_unknown_maps_to_no_trade() {
        for s in ["", "hold", "buy", "garbage", "no_trade"] {
            assert_eq!(TradeDirection::parse_lenient(s), TradeDirection::NoTrade);
        }
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(TradeDirection::Long.sign(), 1);
        assert_eq!(TradeDirection::Short.sign(), -1);
    }

    #[test]
    fn test_has_price_levels() {
        let mut verdict = Verdict {
            symbol: "BTC/USD".to_string(),
            direction: TradeDirection::Long,
            confidence: 85,
            entry_price: Some(Decimal::parse("100").unwrap()),
            stop_loss: Some(Decimal::parse("95").unwrap()),
            take_profit: Some(Decimal::parse("110").unwrap()),
            risk_reward_ratio: None,
            reasoning: "test".to_string(),
            analyzed_at: TimeMs::new(0),
        };
        assert!(verdict.has_price_levels());
        verdict.stop_loss = None;
        assert!(!verdict.has_price_levels());
    }
}
