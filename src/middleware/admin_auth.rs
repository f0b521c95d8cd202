//! Admin Auth Middleware -- checks the bearer session token on admin routes.
//!
//! The verified expiry is injected into request extensions as
//! `AdminSession` so handlers can read it if they need to.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};

use crate::AppState;
use crate::auth;
use crate::routes::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession {
    pub expires_at: DateTime<Utc>,
}

/// Axum middleware function that rejects requests without a valid session.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = auth::bearer_token(header)?;
    let expires_at = state.sessions.verify(token)?;

    req.extensions_mut().insert(AdminSession { expires_at });
    Ok(next.run(req).await)
}
