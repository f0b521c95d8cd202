pub mod admin;
pub mod budget;
pub mod health;
pub mod intake;
pub mod locations;
pub mod webhooks;

use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use rusqlite::Connection;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::AppState;
use crate::auth::AuthError;
use crate::estimator::EstimateError;
use crate::intake::IntakeError;
use crate::middleware::admin_auth::require_admin;
use crate::webhook::WebhookError;

/// Errors a handler can answer with. Each maps onto one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Estimate(#[from] EstimateError),
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error("{}", .0.body_text())]
    Query(#[from] QueryRejection),
    #[error("{}", .0.body_text())]
    Path(#[from] PathRejection),
    #[error("{0} not found")]
    NotFound(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Estimate(_) | ApiError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Webhook(e) if e.is_signature_failure() => StatusCode::UNAUTHORIZED,
            ApiError::Webhook(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Body(r) => r.status(),
            ApiError::Query(r) => r.status(),
            ApiError::Path(r) => r.status(),
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(e) => error!(error = %e, "request failed"),
            ApiError::Auth(e) => warn!(error = %e, "rejected admin request"),
            ApiError::Webhook(e) => warn!(error = %e, "rejected form webhook"),
            _ => {}
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// `axum::Json` whose rejections answer in the `ApiError` shape
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Run `f` against the shared connection
pub fn with_db<T>(
    state: &AppState,
    f: impl FnOnce(&Connection) -> anyhow::Result<T>,
) -> Result<T, ApiError> {
    let conn = state.db.lock().map_err(|_| anyhow!("database lock poisoned"))?;
    Ok(f(&conn)?)
}

pub fn router(state: Arc<AppState>) -> Router {
    let admin = admin::router().route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(health::router())
        .merge(locations::router())
        .merge(budget::router())
        .merge(intake::router())
        .merge(webhooks::router())
        .merge(admin::login_router())
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub mod testing {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::Duration;
    use rusqlite::Connection;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::AppState;
    use crate::auth::{AdminCredentials, SessionSigner};
    use crate::db;
    use crate::webhook::WebhookVerifier;

    pub const ADMIN_PASSWORD: &str = "harbour-lights";
    pub const WEBHOOK_SECRET: &[u8] = b"form-provider-secret";

    pub fn state() -> Arc<AppState> {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        Arc::new(AppState {
            db: Mutex::new(conn),
            admin: AdminCredentials::new(ADMIN_PASSWORD).unwrap(),
            sessions: SessionSigner::new(b"test session key", Duration::hours(1)),
            webhook: Some(WebhookVerifier::new(WEBHOOK_SECRET)),
        })
    }

    pub fn app(state: &Arc<AppState>) -> Router {
        super::router(state.clone())
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn admin_token(state: &AppState) -> String {
        state.sessions.issue().unwrap().token
    }

    pub fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        request
    }
}
