//! Inbound alert webhook.

use crate::api::AppState;
use crate::domain::{Alert, Decimal, TimeMs, Verdict};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    pub symbol: Option<String>,
    pub exchange: Option<String>,
    pub action: Option<String>,
    pub price: Option<f64>,
    pub interval: Option<String>,
    pub message: Option<String>,
    pub secret: Option<String>,
}

pub async fn receive_alert(
    State(state): State<AppState>,
    Json(request): Json<AlertRequest>,
) -> Result<Json<Verdict>, AppError> {
    // Secret check comes first: an unauthenticated caller learns nothing
    // about payload validity.
    if let Some(expected) = &state.webhook_secret {
        if request.secret.as_deref() != Some(expected.as_str()) {
            return Err(AppError::Unauthorized("invalid webhook secret".into()));
        }
    }

    let alert = validate(request)?;
    let verdict = state.orchestrator.analyze(alert).await?;
    Ok(Json(verdict))
}

fn validate(request: AlertRequest) -> Result<Alert, AppError> {
    let mut errors = Vec::new();

    let symbol = match request.symbol {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            errors.push("symbol is required and must be non-empty".to_string());
            String::new()
        }
    };

    let price = match request.price {
        Some(raw) => match Decimal::from_f64(raw) {
            Some(price) => Some(price),
            None => {
                errors.push(format!("price must be a finite number, got {}", raw));
                None
            }
        },
        None => None,
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(Alert {
        symbol,
        exchange: request.exchange,
        action: request.action,
        price,
        interval: request.interval,
        message: request.message,
        secret: request.secret,
        received_at: TimeMs::now(),
    })
}
