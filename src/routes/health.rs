use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{models::breaking_news::RECORD_OPTION_KEY, AppState};

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.options.get(RECORD_OPTION_KEY).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "storage": "connected" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "storage": e.to_string() })),
        ),
    }
}
