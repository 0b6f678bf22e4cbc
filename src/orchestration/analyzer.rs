//! Analysis orchestrator: normalize, enrich, judge, dispatch.
//!
//! Drives one alert through symbol normalization, a parallel multi-timeframe
//! candle fetch, and the oracle. The verdict goes back to the caller before
//! the notification and admission side effects run; those are detached tasks
//! whose failures never reach the inbound response.

use crate::datasource::QuoteSource;
use crate::domain::{normalize_symbol, Alert, TimeframeData, Verdict};
use crate::engine::AdmissionFilter;
use crate::notify::Notifier;
use crate::oracle::{OracleError, VerdictOracle};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Candles requested per timeframe.
const CANDLES_PER_TIMEFRAME: u32 = 50;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No market data available for {0}")]
    NoMarketData(String),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

#[derive(Clone)]
pub struct AnalysisOrchestrator {
    quotes: Arc<dyn QuoteSource>,
    oracle: Arc<dyn VerdictOracle>,
    notifier: Arc<dyn Notifier>,
    admission: Arc<AdmissionFilter>,
    timeframes: Vec<String>,
}

impl AnalysisOrchestrator {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        oracle: Arc<dyn VerdictOracle>,
        notifier: Arc<dyn Notifier>,
        admission: Arc<AdmissionFilter>,
        timeframes: Vec<String>,
    ) -> Self {
        Self {
            quotes,
            oracle,
            notifier,
            admission,
            timeframes,
        }
    }

    /// Analyze one alert and return the verdict.
    ///
    /// Notification and admission run as detached tasks after the verdict is
    /// produced; their outcome does not affect the returned value.
    pub async fn analyze(&self, alert: Alert) -> Result<Verdict, AnalysisError> {
        if alert.symbol.trim().is_empty() {
            return Err(AnalysisError::InvalidInput(
                "alert symbol must be non-empty".to_string(),
            ));
        }

        let canonical = normalize_symbol(&alert.symbol);
        info!("Analyzing alert for {} (raw {})", canonical, alert.symbol);

        let market_data = self.fetch_market_data(&canonical).await;
        if market_data.is_empty() {
            return Err(AnalysisError::NoMarketData(canonical));
        }

        // The oracle and everything downstream see the canonical symbol.
        let mut oracle_alert = alert.clone();
        oracle_alert.symbol = canonical;
        let verdict = self.oracle.analyze(&oracle_alert, &market_data).await?;
        info!(
            "Verdict for {}: {} at confidence {}",
            verdict.symbol, verdict.direction, verdict.confidence
        );

        self.dispatch(oracle_alert, verdict.clone());
        Ok(verdict)
    }

    /// Fetch all configured timeframes in parallel, dropping failures.
    async fn fetch_market_data(&self, symbol: &str) -> Vec<TimeframeData> {
        let fetches = self.timeframes.iter().map(|interval| {
            let quotes = Arc::clone(&self.quotes);
            async move {
                match quotes
                    .fetch_candles(symbol, interval, CANDLES_PER_TIMEFRAME)
                    .await
                {
                    Ok(candles) if !candles.is_empty() => {
                        Some(TimeframeData::new(interval.clone(), candles))
                    }
                    Ok(_) => {
                        warn!("No {} candles for {}", interval, symbol);
                        None
                    }
                    Err(e) => {
                        warn!("Dropping {} timeframe for {}: {}", interval, symbol, e);
                        None
                    }
                }
            }
        });

        futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Detach the fire-and-forget side effects.
    fn dispatch(&self, alert: Alert, verdict: Verdict) {
        let notifier = Arc::clone(&self.notifier);
        let notify_verdict = verdict.clone();
        tokio::spawn(async move {
            notifier.alert_analyzed(&alert, &notify_verdict).await;
        });

        let admission = Arc::clone(&self.admission);
        tokio::spawn(async move {
            let result = admission.evaluate(verdict).await;
            if let Some(reason) = result.rejection_reason {
                info!("Trade not taken for {}: {}", result.verdict.symbol, reason);
            }
        });
    }
}
