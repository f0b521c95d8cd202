use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{Value, json};

use crate::AppState;
use crate::db;
use crate::routes::{ApiError, with_db};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/health", get(api_health))
}

async fn api_health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let counts = with_db(&state, db::counts)?;
    Ok(Json(json!({
        "status": "ok",
        "leads": counts.leads,
        "webhook_enabled": state.webhook.is_some(),
    })))
}
