//! Wallet, position, and engine-state values.
//!
//! All three are immutable values: every mutation in the engine produces a
//! replacement rather than editing in place, so snapshots handed to readers
//! are never torn.

use super::{Decimal, TimeMs, TradeDirection};
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    Manual,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::StopLoss => write!(f, "StopLoss"),
            CloseReason::TakeProfit => write!(f, "TakeProfit"),
            CloseReason::Manual => write!(f, "Manual"),
        }
    }
}

/// Paper wallet running totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub initial_balance: Decimal,
    pub available_balance: Decimal,
    pub total_realized_pnl: Decimal,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
}

impl Wallet {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            available_balance: initial_balance,
            total_realized_pnl: Decimal::zero(),
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
        }
    }

    /// Wallet after locking collateral for a newly admitted position.
    pub fn after_open(&self, collateral: Decimal) -> Self {
        Self {
            available_balance: self.available_balance - collateral,
            total_trades: self.total_trades + 1,
            ..self.clone()
        }
    }

    /// Wallet after a close returns collateral plus realized PnL.
    ///
    /// The spendable balance is floored at zero when a leveraged loss
    /// exceeds collateral; `total_realized_pnl` still records the full loss.
    pub fn after_close(&self, collateral: Decimal, pnl: Decimal) -> Self {
        let (winning, losing) = if pnl.is_negative() {
            (self.winning_trades, self.losing_trades + 1)
        } else {
            (self.winning_trades + 1, self.losing_trades)
        };
        Self {
            available_balance: (self.available_balance + collateral + pnl).clamp_non_negative(),
            total_realized_pnl: self.total_realized_pnl + pnl,
            winning_trades: winning,
            losing_trades: losing,
            ..self.clone()
        }
    }
}

/// A simulated leveraged position.
///
/// Created by the engine on an admitted open; closing produces a new copy
/// with the `closed_*` fields populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub position_id: String,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: Decimal,
    /// Collateral locked from the wallet.
    pub position_size_usd: Decimal,
    pub quantity: Decimal,
    pub leverage: u32,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Oracle confidence at open.
    pub confidence: u8,
    pub opened_at: TimeMs,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<TimeMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realized_pnl: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<CloseReason>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Realized PnL at an exit price:
    /// `direction_sign * (exit - entry) / entry * collateral * leverage`.
    pub fn pnl_at(&self, exit_price: Decimal) -> Decimal {
        let mut change = exit_price.change_ratio(self.entry_price);
        if self.direction == TradeDirection::Short {
            change = -change;
        }
        change * self.position_size_usd * Decimal::from_i64(self.leverage as i64)
    }

    /// Closed copy of this position.
    pub fn into_closed(self, exit_price: Decimal, reason: CloseReason, now: TimeMs) -> Self {
        let pnl = self.pnl_at(exit_price);
        Self {
            closed_at: Some(now),
            exit_price: Some(exit_price),
            realized_pnl: Some(pnl),
            close_reason: Some(reason),
            ..self
        }
    }
}

/// The single unit of persistence: wallet plus position books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub wallet: Wallet,
    pub open_positions: Vec<Position>,
    pub closed_positions: Vec<Position>,
    pub last_updated_at: TimeMs,
}

impl EngineState {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            wallet: Wallet::new(initial_balance),
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
            last_updated_at: TimeMs::now(),
        }
    }

    /// Open position matching a symbol, case-insensitive.
    pub fn open_for_symbol(&self, symbol: &str) -> Option<&Position> {
        self.open_positions
            .iter()
            .find(|p| p.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position(entry: &str, size: &str, leverage: u32) -> Position {
        Position {
            position_id: "test-id".to_string(),
            symbol: "BTC/USD".to_string(),
            direction: TradeDirection::Long,
            entry_price: Decimal::parse(entry).unwrap(),
            position_size_usd: Decimal::parse(size).unwrap(),
            quantity: Decimal::parse("2").unwrap(),
            leverage,
            stop_loss: Decimal::parse("95").unwrap(),
            take_profit: Decimal::parse("110").unwrap(),
            confidence: 85,
            opened_at: TimeMs::new(0),
            reasoning: "test".to_string(),
            closed_at: None,
            exit_price: None,
            realized_pnl: None,
            close_reason: None,
        }
    }

    #[test]
    fn test_long_pnl() {
        let position = long_position("100", "100", 2);
        assert_eq!(
            position.pnl_at(Decimal::parse("110").unwrap()),
            Decimal::parse("20").unwrap()
        );
        assert_eq!(
            position.pnl_at(Decimal::parse("95").unwrap()),
            Decimal::parse("-10").unwrap()
        );
    }

    #[test]
    fn test_short_pnl_mirrors_long() {
        let mut position = long_position("100", "100", 2);
        position.direction = TradeDirection::Short;
        assert_eq!(
            position.pnl_at(Decimal::parse("90").unwrap()),
            Decimal::parse("20").unwrap()
        );
    }

    #[test]
    fn test_into_closed_populates_exit_fields() {
        let position = long_position("100", "100", 2);
        let closed = position.into_closed(
            Decimal::parse("110").unwrap(),
            CloseReason::TakeProfit,
            TimeMs::new(5000),
        );
        assert!(!closed.is_open());
        assert_eq!(closed.realized_pnl, Some(Decimal::parse("20").unwrap()));
        assert_eq!(closed.close_reason, Some(CloseReason::TakeProfit));
        assert_eq!(closed.closed_at, Some(TimeMs::new(5000)));
    }

    #[test]
    fn test_wallet_after_open_locks_collateral() {
        let wallet = Wallet::new(Decimal::parse("1000").unwrap());
        let after = wallet.after_open(Decimal::parse("100").unwrap());
        assert_eq!(after.available_balance, Decimal::parse("900").unwrap());
        assert_eq!(after.total_trades, 1);
        assert_eq!(after.initial_balance, wallet.initial_balance);
    }

    #[test]
    fn test_wallet_after_close_win() {
        let wallet = Wallet::new(Decimal::parse("1000").unwrap())
            .after_open(Decimal::parse("100").unwrap());
        let after = wallet.after_close(
            Decimal::parse("100").unwrap(),
            Decimal::parse("20").unwrap(),
        );
        assert_eq!(after.available_balance, Decimal::parse("1020").unwrap());
        assert_eq!(after.winning_trades, 1);
        assert_eq!(after.losing_trades, 0);
        assert_eq!(after.total_realized_pnl, Decimal::parse("20").unwrap());
    }

    #[test]
    fn test_wallet_zero_pnl_counts_as_win() {
        let wallet = Wallet::new(Decimal::parse("1000").unwrap())
            .after_open(Decimal::parse("100").unwrap());
        let after = wallet.after_close(Decimal::parse("100").unwrap(), Decimal::zero());
        assert_eq!(after.winning_trades, 1);
    }

    #[test]
    fn test_wallet_close_clamps_balance_at_zero() {
        let wallet = Wallet::new(Decimal::parse("100").unwrap())
            .after_open(Decimal::parse("100").unwrap());
        // Leveraged loss larger than collateral.
        let after = wallet.after_close(
            Decimal::parse("100").unwrap(),
            Decimal::parse("-150").unwrap(),
        );
        assert_eq!(after.available_balance, Decimal::zero());
        assert_eq!(after.total_realized_pnl, Decimal::parse("-150").unwrap());
        assert_eq!(after.losing_trades, 1);
    }

    #[test]
    fn test_open_for_symbol_case_insensitive() {
        let mut state = EngineState::new(Decimal::parse("1000").unwrap());
        state.open_positions.push(long_position("100", "100", 2));
        assert!(state.open_for_symbol("btc/usd").is_some());
        assert!(state.open_for_symbol("ETH/USD").is_none());
    }
}
