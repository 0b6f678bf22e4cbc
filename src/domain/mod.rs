//! Domain types for alerts, verdicts, candles, and paper positions.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Alert/Verdict/Position value types with canonical JSON serialization
//! - Pure ticker normalization

pub mod alert;
pub mod candle;
pub mod decimal;
pub mod position;
pub mod primitives;
pub mod symbol_map;
pub mod verdict;

pub use alert::Alert;
pub use candle::{OhlcvCandle, TimeframeData};
pub use decimal::Decimal;
pub use position::{CloseReason, EngineState, Position, Wallet};
pub use primitives::TimeMs;
pub use symbol_map::normalize_symbol;
pub use verdict::{TradeDirection, Verdict};
