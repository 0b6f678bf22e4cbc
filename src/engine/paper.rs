//! Paper trading engine: the single owner of wallet and position state.
//!
//! Every mutation runs under the write lock for its full critical section,
//! persistence included, so the persisted file is always a prefix of the
//! states observers have seen. Reads return defensive copies.

use crate::config::PaperTradingConfig;
use crate::domain::{CloseReason, Decimal, EngineState, Position, TimeMs, Verdict};
use crate::persist::StatePersistor;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Validation failures for open/close requests. Returned, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("Invalid trade parameters: {0}")]
    InvalidTradeParams(String),
    #[error("Position limit reached ({0} open)")]
    PositionLimitReached(usize),
    #[error("An open position already exists for {0}")]
    DuplicateSymbol(String),
    #[error("Insufficient balance to size a position")]
    InsufficientBalance,
    #[error("Position not found: {0}")]
    PositionNotFound(String),
}

/// Result of a successful close: the closed position and the new wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOutcome {
    pub position: Position,
    pub wallet: crate::domain::Wallet,
}

/// Process-wide paper trading engine.
///
/// State loads lazily from the persistor on first use and lives in memory
/// for the rest of the process. A failed save is logged and never rolled
/// back: the in-memory state stays canonical and the next successful save
/// carries it.
#[derive(Debug)]
pub struct PaperTradingEngine {
    config: PaperTradingConfig,
    persistor: StatePersistor,
    state: RwLock<Option<EngineState>>,
}

impl PaperTradingEngine {
    pub fn new(config: PaperTradingConfig, persistor: StatePersistor) -> Self {
        Self {
            config,
            persistor,
            state: RwLock::new(None),
        }
    }

    /// Open a position for an admitted verdict.
    pub async fn open(&self, verdict: &Verdict) -> Result<Position, TradeError> {
        if !verdict.direction.is_tradeable() {
            return Err(TradeError::InvalidTradeParams(format!(
                "direction must be Long or Short, got {}",
                verdict.direction
            )));
        }
        let (entry, stop_loss, take_profit) = match (
            verdict.entry_price,
            verdict.stop_loss,
            verdict.take_profit,
        ) {
            (Some(entry), Some(sl), Some(tp)) => (entry, sl, tp),
            _ => {
                return Err(TradeError::InvalidTradeParams(
                    "entry, stop loss and take profit are all required".to_string(),
                ))
            }
        };
        if !entry.is_positive() {
            return Err(TradeError::InvalidTradeParams(format!(
                "entry price must be positive, got {}",
                entry
            )));
        }
        validate_level_sides(verdict, entry, stop_loss, take_profit)?;

        let mut guard = self.state.write().await;
        let state = self.ensure_loaded(&mut guard).await;

        if state.open_positions.len() >= self.config.max_concurrent_positions {
            return Err(TradeError::PositionLimitReached(state.open_positions.len()));
        }
        if state.open_for_symbol(&verdict.symbol).is_some() {
            return Err(TradeError::DuplicateSymbol(verdict.symbol.clone()));
        }

        let size_usd = state.wallet.available_balance * self.config.max_position_size_percent;
        if !size_usd.is_positive() {
            return Err(TradeError::InsufficientBalance);
        }

        let stop_loss = self.cap_stop_loss(verdict, entry, stop_loss);
        let leverage = self.config.leverage;
        let quantity = size_usd * Decimal::from_i64(leverage as i64) / entry;

        let position = Position {
            position_id: uuid::Uuid::new_v4().to_string(),
            symbol: verdict.symbol.clone(),
            direction: verdict.direction,
            entry_price: entry,
            position_size_usd: size_usd,
            quantity,
            leverage,
            stop_loss,
            take_profit,
            confidence: verdict.confidence,
            opened_at: TimeMs::now(),
            reasoning: verdict.reasoning.clone(),
            closed_at: None,
            exit_price: None,
            realized_pnl: None,
            close_reason: None,
        };

        state.open_positions.push(position.clone());
        state.wallet = state.wallet.after_open(size_usd);
        state.last_updated_at = TimeMs::now();

        info!(
            "Opened {} {} @ {} (collateral {}, {}x, SL {}, TP {})",
            position.direction,
            position.symbol,
            position.entry_price,
            position.position_size_usd,
            position.leverage,
            position.stop_loss,
            position.take_profit
        );

        self.persist(state).await;
        Ok(position)
    }

    /// Close an open position at the given exit price.
    pub async fn close(
        &self,
        position_id: &str,
        exit_price: Decimal,
        reason: CloseReason,
    ) -> Result<CloseOutcome, TradeError> {
        let mut guard = self.state.write().await;
        let state = self.ensure_loaded(&mut guard).await;

        let index = state
            .open_positions
            .iter()
            .position(|p| p.position_id.eq_ignore_ascii_case(position_id))
            .ok_or_else(|| TradeError::PositionNotFound(position_id.to_string()))?;

        let position = state.open_positions.remove(index);
        let collateral = position.position_size_usd;
        let closed = position.into_closed(exit_price, reason, TimeMs::now());
        let pnl = closed.realized_pnl.unwrap_or_default();

        state.wallet = state.wallet.after_close(collateral, pnl);
        state.closed_positions.push(closed.clone());
        state.last_updated_at = TimeMs::now();

        info!(
            "Closed {} {} @ {} ({}): PnL {}, balance {}",
            closed.direction,
            closed.symbol,
            exit_price,
            reason,
            pnl,
            state.wallet.available_balance
        );

        let wallet = state.wallet.clone();
        self.persist(state).await;
        Ok(CloseOutcome {
            position: closed,
            wallet,
        })
    }

    /// Advisory: capacity and balance would admit another position.
    ///
    /// A hint only; `open` re-checks under the write lock.
    pub async fn can_open(&self) -> bool {
        let state = self.snapshot().await;
        state.open_positions.len() < self.config.max_concurrent_positions
            && state.wallet.available_balance.is_positive()
    }

    /// Advisory: an open position exists for the symbol (case-insensitive).
    pub async fn has_open_for(&self, symbol: &str) -> bool {
        self.snapshot().await.open_for_symbol(symbol).is_some()
    }

    pub async fn wallet(&self) -> crate::domain::Wallet {
        self.snapshot().await.wallet
    }

    pub async fn open_positions(&self) -> Vec<Position> {
        self.snapshot().await.open_positions
    }

    pub async fn closed_positions(&self) -> Vec<Position> {
        self.snapshot().await.closed_positions
    }

    /// Full defensive copy of the current state.
    pub async fn state(&self) -> EngineState {
        self.snapshot().await
    }

    async fn snapshot(&self) -> EngineState {
        {
            let guard = self.state.read().await;
            if let Some(state) = guard.as_ref() {
                return state.clone();
            }
        }
        let mut guard = self.state.write().await;
        self.ensure_loaded(&mut guard).await.clone()
    }

    /// Idempotent lazy init: the first caller under the write lock seeds
    /// state from the persistor.
    async fn ensure_loaded<'a>(
        &self,
        guard: &'a mut Option<EngineState>,
    ) -> &'a mut EngineState {
        if guard.is_none() {
            *guard = Some(self.persistor.load().await);
        }
        guard.as_mut().expect("state just seeded")
    }

    /// Cap the stop-loss distance at the configured percent of entry.
    fn cap_stop_loss(&self, verdict: &Verdict, entry: Decimal, stop_loss: Decimal) -> Decimal {
        let distance = stop_loss.distance_ratio(entry);
        if distance <= self.config.max_stop_loss_percent {
            return stop_loss;
        }
        let one = Decimal::from_i64(1);
        let capped = if verdict.direction == crate::domain::TradeDirection::Short {
            entry * (one + self.config.max_stop_loss_percent)
        } else {
            entry * (one - self.config.max_stop_loss_percent)
        };
        warn!(
            "Capping stop loss for {}: {} is {} away from entry {}, limiting to {}",
            verdict.symbol, stop_loss, distance, entry, capped
        );
        capped
    }

    /// Persist inside the critical section. Errors are logged, not reverted.
    async fn persist(&self, state: &EngineState) {
        if let Err(e) = self.persistor.save(state).await {
            error!(
                "Failed to persist engine state to {}: {}; in-memory state remains authoritative",
                self.persistor.path().display(),
                e
            );
        }
    }
}

/// Long wants SL < entry < TP; Short wants TP < entry < SL.
fn validate_level_sides(
    verdict: &Verdict,
    entry: Decimal,
    stop_loss: Decimal,
    take_profit: Decimal,
) -> Result<(), TradeError> {
    let ok = match verdict.direction {
        crate::domain::TradeDirection::Long => stop_loss < entry && entry < take_profit,
        crate::domain::TradeDirection::Short => take_profit < entry && entry < stop_loss,
        crate::domain::TradeDirection::NoTrade => false,
    };
    if ok {
        Ok(())
    } else {
        Err(TradeError::InvalidTradeParams(format!(
            "stop loss {} and take profit {} are on the wrong side of entry {} for {}",
            stop_loss, take_profit, entry, verdict.direction
        )))
    }
}
