pub mod health;
pub mod positions;
pub mod state;
pub mod webhook;

use crate::engine::PaperTradingEngine;
use crate::orchestration::AnalysisOrchestrator;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: AnalysisOrchestrator,
    pub engine: Arc<PaperTradingEngine>,
    /// Shared secret for the inbound webhook; None disables the check.
    pub webhook_secret: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::receive_alert))
        .route("/state", get(state::get_state))
        .route("/history", get(state::get_history))
        .route("/positions/:id/close", post(positions::close_position))
        .route("/health", get(health::health))
        .with_state(state)
}
