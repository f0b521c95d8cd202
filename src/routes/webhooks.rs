use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::db;
use crate::routes::{ApiError, with_db};
use crate::webhook::{CONFIRMATION_PATH, SIGNATURE_HEADER};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/webhooks/forms", post(form_completed))
}

async fn form_completed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let verifier = state
        .webhook
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("form webhook".into()))?;

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let event = verifier.accept(&body, signature)?;

    let recorded = with_db(&state, |conn| {
        db::record_form_submission(conn, event.form.as_str(), &event.submission_id, event.email.as_deref())
    })?;
    info!(form = event.form.as_str(), submission_id = %event.submission_id, recorded, "form completion");

    Ok(Json(json!({
        "recorded": recorded,
        "redirect": CONFIRMATION_PATH,
    })))
}
