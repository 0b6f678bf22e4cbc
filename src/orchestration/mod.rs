//! Alert-to-verdict orchestration.

pub mod analyzer;

pub use analyzer::{AnalysisError, AnalysisOrchestrator};
