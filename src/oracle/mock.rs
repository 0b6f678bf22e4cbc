//! Mock oracle for testing without LLM calls.

use super::{OracleError, VerdictOracle};
use crate::domain::{Alert, Decimal, TimeMs, TimeframeData, TradeDirection, Verdict};
use async_trait::async_trait;

/// Mock oracle returning a predefined verdict (or error).
#[derive(Debug, Clone)]
pub struct MockOracle {
    verdict: Option<Verdict>,
    error: Option<OracleError>,
}

impl MockOracle {
    /// Oracle that always returns the given verdict.
    pub fn returning(verdict: Verdict) -> Self {
        Self {
            verdict: Some(verdict),
            error: None,
        }
    }

    /// Oracle that always fails with the given error.
    pub fn failing(error: OracleError) -> Self {
        Self {
            verdict: None,
            error: Some(error),
        }
    }

    /// A tradeable long verdict with the given levels, for test setup.
    pub fn long_verdict(symbol: &str, confidence: u8, entry: &str, sl: &str, tp: &str) -> Verdict {
        Verdict {
            symbol: symbol.to_string(),
            direction: TradeDirection::Long,
            confidence,
            entry_price: Some(Decimal::parse(entry).expect("invalid entry in test data")),
            stop_loss: Some(Decimal::parse(sl).expect("invalid stop loss in test data")),
            take_profit: Some(Decimal::parse(tp).expect("invalid take profit in test data")),
            risk_reward_ratio: None,
            reasoning: "mock verdict".to_string(),
            analyzed_at: TimeMs::now(),
        }
    }
}

#[async_trait]
impl VerdictOracle for MockOracle {
    async fn analyze(
        &self,
        alert: &Alert,
        _market_data: &[TimeframeData],
    ) -> Result<Verdict, OracleError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        let mut verdict = self.verdict.clone().expect("mock oracle has no verdict");
        if verdict.symbol.is_empty() {
            verdict.symbol = alert.symbol.clone();
        }
        Ok(verdict)
    }
}
