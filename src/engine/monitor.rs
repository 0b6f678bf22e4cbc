//! Position monitor: periodic stop-loss / take-profit sweep.
//!
//! One long-running task polls the latest 1-minute candle per open position
//! and asks the engine to close anything whose price crossed a level.
//! Per-position failures are logged and skipped; the loop only exits on the
//! shutdown signal.

use super::paper::PaperTradingEngine;
use crate::datasource::QuoteSource;
use crate::domain::{CloseReason, Decimal, Position, TimeMs, TradeDirection};
use crate::notify::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Candles older than this are flagged (market likely closed).
const STALE_CANDLE_MS: i64 = 5 * 60 * 1000;

/// Interval polled for exit checks.
const MONITOR_INTERVAL_TAG: &str = "1min";

#[derive(Debug)]
pub struct PositionMonitor {
    engine: Arc<PaperTradingEngine>,
    quotes: Arc<dyn QuoteSource>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PositionMonitor {
    pub fn new(
        engine: Arc<PaperTradingEngine>,
        quotes: Arc<dyn QuoteSource>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            quotes,
            notifier,
            interval,
            shutdown,
        }
    }

    /// Run until the shutdown signal flips. An in-flight sleep is cancelled
    /// promptly; an in-flight tick completes first.
    pub async fn run(mut self) {
        info!(
            "Position monitor started, polling every {:?}",
            self.interval
        );
        loop {
            if *self.shutdown.borrow() {
                break;
            }
            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.changed() => {}
            }
        }
        info!("Position monitor stopped");
    }

    /// One sweep over the open positions. Returns the number of closes.
    pub async fn tick(&self) -> usize {
        let positions = self.engine.open_positions().await;
        if positions.is_empty() {
            return 0;
        }
        debug!("Monitor tick: checking {} open position(s)", positions.len());

        let mut closed = 0;
        for position in positions {
            if self.check_position(&position).await {
                closed += 1;
            }
        }
        closed
    }

    async fn check_position(&self, position: &Position) -> bool {
        let candles = match self
            .quotes
            .fetch_candles(&position.symbol, MONITOR_INTERVAL_TAG, 1)
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                warn!(
                    "Monitor: failed to fetch price for {}: {}",
                    position.symbol, e
                );
                return false;
            }
        };
        let Some(candle) = candles.first() else {
            warn!("Monitor: no candle returned for {}", position.symbol);
            return false;
        };

        let age_ms = candle.open_time.elapsed_until(TimeMs::now());
        if age_ms > STALE_CANDLE_MS {
            warn!(
                "Monitor: candle for {} is {}s old, market may be closed",
                position.symbol,
                age_ms / 1000
            );
        }

        let price = candle.close;
        let Some(reason) = exit_trigger(position, price) else {
            return false;
        };

        match self.engine.close(&position.position_id, price, reason).await {
            Ok(outcome) => {
                let notifier = Arc::clone(&self.notifier);
                tokio::spawn(async move {
                    notifier
                        .position_closed(&outcome.position, &outcome.wallet)
                        .await;
                });
                true
            }
            Err(e) => {
                warn!(
                    "Monitor: failed to close {} ({}): {}",
                    position.symbol, position.position_id, e
                );
                false
            }
        }
    }
}

/// Exit decision for a position at a price. Stop-loss wins when both levels
/// are crossed in one candle.
fn exit_trigger(position: &Position, price: Decimal) -> Option<CloseReason> {
    match position.direction {
        TradeDirection::Long => {
            if price <= position.stop_loss {
                Some(CloseReason::StopLoss)
            } else if price >= position.take_profit {
                Some(CloseReason::TakeProfit)
            } else {
                None
            }
        }
        TradeDirection::Short => {
            if price >= position.stop_loss {
                Some(CloseReason::StopLoss)
            } else if price <= position.take_profit {
                Some(CloseReason::TakeProfit)
            } else {
                None
            }
        }
        TradeDirection::NoTrade => None,
    }
}
