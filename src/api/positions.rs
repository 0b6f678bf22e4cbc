//! Manual position close endpoint.

use crate::api::AppState;
use crate::domain::{CloseReason, Decimal, Position, Wallet};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionRequest {
    pub exit_price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionResponse {
    pub position: Position,
    pub wallet: Wallet,
}

pub async fn close_position(
    Path(position_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<ClosePositionRequest>,
) -> Result<Json<ClosePositionResponse>, AppError> {
    let exit_price = Decimal::from_f64(request.exit_price)
        .filter(|p| p.is_positive())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "exitPrice must be a positive number, got {}",
                request.exit_price
            ))
        })?;

    let outcome = state
        .engine
        .close(&position_id, exit_price, CloseReason::Manual)
        .await?;

    Ok(Json(ClosePositionResponse {
        position: outcome.position,
        wallet: outcome.wallet,
    }))
}
