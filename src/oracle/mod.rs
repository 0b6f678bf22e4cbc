//! Verdict oracle abstraction: alert + market data in, structured verdict out.

use crate::domain::{Alert, TimeframeData, Verdict};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod anthropic;
pub mod mock;

pub use anthropic::AnthropicOracle;
pub use mock::MockOracle;

/// Oracle trait: submit an alert with its multi-timeframe context and get a
/// structured trade verdict back.
#[async_trait]
pub trait VerdictOracle: Send + Sync + fmt::Debug {
    async fn analyze(
        &self,
        alert: &Alert,
        market_data: &[TimeframeData],
    ) -> Result<Verdict, OracleError>;
}

/// Error type for oracle operations.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// HTTP transport failure talking to the model API.
    #[error("Oracle transport error: {0}")]
    Transport(String),
    /// Reply could not be parsed into the verdict schema.
    #[error("Oracle parse error: {0}")]
    Parse(String),
    /// Reply contained no content.
    #[error("Oracle returned no content")]
    Empty,
}
