//! Paper trading core: engine, admission gates, and the exit monitor.

pub mod admission;
pub mod monitor;
pub mod paper;

pub use admission::{AdmissionFilter, ExecutionResult};
pub use monitor::PositionMonitor;
pub use paper::{CloseOutcome, PaperTradingEngine, TradeError};
