use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": crate::domain::TimeMs::now().as_ms(),
    }))
}
