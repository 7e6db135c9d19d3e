use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::api::state::AppState;
use crate::stats::StatsSnapshot;

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.scheduler.stats().snapshot())
}

pub async fn health(State(_state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
