//! Health and readiness endpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::debounce::DebounceStore;

#[derive(Clone)]
pub struct HealthState {
    pub ready: Arc<AtomicBool>,
    pub debounce: Arc<DebounceStore>,
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<HealthState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "podsentry",
        "version": env!("CARGO_PKG_VERSION"),
        "debounceEntries": state.debounce.len(),
    }))
}

async fn readiness_check(
    State(state): State<HealthState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if state.ready.load(Ordering::SeqCst) {
        Ok(Json(json!({ "status": "ready" })))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "syncing" })),
        ))
    }
}
