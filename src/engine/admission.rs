//! Risk gates between a verdict and the paper trading engine.
//!
//! Gates are applied in a fixed order and the first failure short-circuits
//! with a rejection reason. Most candidate verdicts are expected to fail one
//! of them; only the remainder reach the engine.

use super::paper::PaperTradingEngine;
use crate::config::PaperTradingConfig;
use crate::domain::{Position, Verdict};
use crate::notify::Notifier;
use std::sync::Arc;
use tracing::info;

/// Outcome of one admission evaluation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub opened: bool,
    pub position: Option<Position>,
    pub rejection_reason: Option<String>,
    pub verdict: Verdict,
}

impl ExecutionResult {
    fn rejected(verdict: Verdict, reason: impl Into<String>) -> Self {
        Self {
            opened: false,
            position: None,
            rejection_reason: Some(reason.into()),
            verdict,
        }
    }
}

/// Applies the risk gates and forwards admitted verdicts to the engine.
///
/// Never mutates state directly.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    config: PaperTradingConfig,
    engine: Arc<PaperTradingEngine>,
    notifier: Arc<dyn Notifier>,
}

impl AdmissionFilter {
    pub fn new(
        config: PaperTradingConfig,
        engine: Arc<PaperTradingEngine>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            engine,
            notifier,
        }
    }

    pub async fn evaluate(&self, verdict: Verdict) -> ExecutionResult {
        if !self.config.enabled {
            return ExecutionResult::rejected(verdict, "paper trading disabled");
        }

        let base = verdict.symbol.split('/').next().unwrap_or(&verdict.symbol);
        if !self
            .config
            .allowed_base_symbols
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(base))
        {
            return ExecutionResult::rejected(
                verdict.clone(),
                format!("base symbol {} not in allow-list", base),
            );
        }

        if !verdict.direction.is_tradeable() {
            return ExecutionResult::rejected(verdict, "verdict is NoTrade");
        }

        if verdict.confidence < self.config.confidence_threshold {
            return ExecutionResult::rejected(
                verdict.clone(),
                format!(
                    "confidence {} below threshold {}",
                    verdict.confidence, self.config.confidence_threshold
                ),
            );
        }

        if !verdict.has_price_levels() {
            return ExecutionResult::rejected(
                verdict,
                "missing entry, stop loss or take profit",
            );
        }

        if !self.engine.can_open().await {
            return ExecutionResult::rejected(
                verdict,
                "position capacity or balance exhausted",
            );
        }

        if self.engine.has_open_for(&verdict.symbol).await {
            return ExecutionResult::rejected(
                verdict.clone(),
                format!("existing open position for {}", verdict.symbol),
            );
        }

        match self.engine.open(&verdict).await {
            Ok(position) => {
                info!(
                    "Admitted {} {} with confidence {}",
                    position.direction, position.symbol, verdict.confidence
                );
                let wallet = self.engine.wallet().await;
                let notifier = Arc::clone(&self.notifier);
                let opened = position.clone();
                tokio::spawn(async move {
                    notifier.position_opened(&opened, &wallet).await;
                });
                ExecutionResult {
                    opened: true,
                    position: Some(position),
                    rejection_reason: None,
                    verdict,
                }
            }
            Err(e) => ExecutionResult::rejected(verdict, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, TradeDirection};
    use crate::notify::RecordingNotifier;
    use crate::oracle::MockOracle;
    use crate::persist::StatePersistor;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_config(enabled: bool) -> PaperTradingConfig {
        PaperTradingConfig {
            enabled,
            initial_balance: Decimal::parse("1000").unwrap(),
            confidence_threshold: 80,
            max_position_size_percent: Decimal::parse("0.10").unwrap(),
            max_concurrent_positions: 2,
            leverage: 2,
            max_stop_loss_percent: Decimal::parse("0.20").unwrap(),
            monitor_interval: Duration::from_secs(60),
            state_file_path: "unused.json".into(),
            allowed_base_symbols: vec!["BTC".to_string(), "XAU".to_string()],
        }
    }

    fn filter_in(dir: &TempDir, enabled: bool) -> (AdmissionFilter, Arc<PaperTradingEngine>) {
        let persistor = StatePersistor::new(
            dir.path().join("state.json"),
            Decimal::parse("1000").unwrap(),
        );
        let engine = Arc::new(PaperTradingEngine::new(test_config(enabled), persistor));
        let filter = AdmissionFilter::new(
            test_config(enabled),
            Arc::clone(&engine),
            Arc::new(RecordingNotifier::new()),
        );
        (filter, engine)
    }

    #[tokio::test]
    async fn test_admits_qualifying_verdict() {
        let dir = TempDir::new().unwrap();
        let (filter, engine) = filter_in(&dir, true);
        let verdict = MockOracle::long_verdict("BTC/USD", 85, "100", "95", "110");

        let result = filter.evaluate(verdict).await;
        assert!(result.opened, "rejected: {:?}", result.rejection_reason);
        assert!(result.position.is_some());
        assert_eq!(engine.wallet().await.total_trades, 1);
    }

    #[tokio::test]
    async fn test_rejects_when_disabled() {
        let dir = TempDir::new().unwrap();
        let (filter, engine) = filter_in(&dir, false);
        let verdict = MockOracle::long_verdict("BTC/USD", 85, "100", "95", "110");

        let result = filter.evaluate(verdict).await;
        assert!(!result.opened);
        assert!(result.rejection_reason.unwrap().contains("disabled"));
        assert_eq!(engine.wallet().await.total_trades, 0);
    }

    #[tokio::test]
    async fn test_rejects_disallowed_base_symbol() {
        let dir = TempDir::new().unwrap();
        let (filter, _engine) = filter_in(&dir, true);
        let verdict = MockOracle::long_verdict("DOGE/USD", 99, "0.1", "0.09", "0.12");

        let result = filter.evaluate(verdict).await;
        assert!(!result.opened);
        assert!(result.rejection_reason.unwrap().contains("DOGE"));
    }

    #[tokio::test]
    async fn test_rejects_no_trade() {
        let dir = TempDir::new().unwrap();
        let (filter, _engine) = filter_in(&dir, true);
        let mut verdict = MockOracle::long_verdict("BTC/USD", 85, "100", "95", "110");
        verdict.direction = TradeDirection::NoTrade;

        let result = filter.evaluate(verdict).await;
        assert!(!result.opened);
        assert!(result.rejection_reason.unwrap().contains("NoTrade"));
    }

    #[tokio::test]
    async fn test_rejects_below_confidence_threshold() {
        let dir = TempDir::new().unwrap();
        let (filter, engine) = filter_in(&dir, true);
        let verdict = MockOracle::long_verdict("BTC/USD", 70, "100", "95", "110");

        let result = filter.evaluate(verdict).await;
        assert!(!result.opened);
        let reason = result.rejection_reason.unwrap();
        assert!(reason.contains("confidence 70"), "reason: {}", reason);
        assert_eq!(engine.wallet().await.total_trades, 0);
    }

    #[tokio::test]
    async fn test_rejects_missing_levels() {
        let dir = TempDir::new().unwrap();
        let (filter, _engine) = filter_in(&dir, true);
        let mut verdict = MockOracle::long_verdict("BTC/USD", 85, "100", "95", "110");
        verdict.stop_loss = None;

        let result = filter.evaluate(verdict).await;
        assert!(!result.opened);
        assert!(result.rejection_reason.unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_rejects_duplicate_symbol() {
        let dir = TempDir::new().unwrap();
        let (filter, _engine) = filter_in(&dir, true);
        let verdict = MockOracle::long_verdict("BTC/USD", 85, "100", "95", "110");

        let first = filter.evaluate(verdict.clone()).await;
        assert!(first.opened);

        let second = filter.evaluate(verdict).await;
        assert!(!second.opened);
        assert!(second
            .rejection_reason
            .unwrap()
            .contains("existing open position"));
    }
}
