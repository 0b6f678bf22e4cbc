//! Inspection endpoints over the engine state.

use crate::api::AppState;
use crate::domain::{Position, TimeMs, Wallet};
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub wallet: Wallet,
    pub open_positions: Vec<Position>,
    pub last_updated_at: TimeMs,
}

pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let snapshot = state.engine.state().await;
    Json(StateResponse {
        wallet: snapshot.wallet,
        open_positions: snapshot.open_positions,
        last_updated_at: snapshot.last_updated_at,
    })
}

pub async fn get_history(State(state): State<AppState>) -> Json<Vec<Position>> {
    Json(state.engine.closed_positions().await)
}
