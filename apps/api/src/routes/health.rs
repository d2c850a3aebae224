use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports the service version and which analysis backends are wired up.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "journal-api",
        "analysis": {
            "text": state.analysis.analyzer_backend(),
            "video": state.analysis.can_measure_video(),
        }
    }))
}
