use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let results_dir = state.config.reports.results_dir();

    Json(json!({
        "status": "healthy",
        "service": "crosstab-api-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.reports.environment.to_string(),
        "results_dir": results_dir.display().to_string(),
    }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}
