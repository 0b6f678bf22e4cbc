pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod notify;
pub mod oracle;
pub mod orchestration;
pub mod persist;

pub use config::Config;
pub use domain::{
    Alert, CloseReason, Decimal, EngineState, OhlcvCandle, Position, TimeMs, TimeframeData,
    TradeDirection, Verdict, Wallet,
};
pub use engine::{AdmissionFilter, PaperTradingEngine, PositionMonitor};
pub use error::AppError;
pub use persist::StatePersistor;
