//! Staff endpoints: login, listings and status updates.
//!
//! Everything except `login_router` sits behind `require_admin`.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::response::Json;
use axum::routing::{get, patch, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::auth::{self, Session};
use crate::db;
use crate::middleware::admin_auth::AdminSession;
use crate::models::{ApplicationStatus, Counts, CreditApplication, FormSubmission, Lead, Order, OrderStatus};
use crate::routes::{ApiError, ApiJson, ApiPath, ApiQuery, with_db};

pub fn login_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/login", post(login))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/session", get(current_session))
        .route("/api/admin/summary", get(summary))
        .route("/api/admin/leads", get(list_leads))
        .route("/api/admin/orders", get(list_orders))
        .route("/api/admin/orders/{id}", patch(update_order))
        .route("/api/admin/credit-applications", get(list_applications))
        .route("/api/admin/credit-applications/{id}", patch(update_application))
        .route("/api/admin/form-submissions", get(list_form_submissions))
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = auth::login(&state.admin, &state.sessions, &body.password)?;
    info!(expires_at = %session.expires_at, "admin logged in");
    Ok(Json(session))
}

#[derive(Deserialize)]
struct StatusFilter<S> {
    status: Option<S>,
}

#[derive(Deserialize)]
struct StatusPatch<S> {
    status: S,
}

async fn current_session(Extension(session): Extension<AdminSession>) -> Json<Value> {
    Json(json!({ "expires_at": session.expires_at }))
}

async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<Counts>, ApiError> {
    Ok(Json(with_db(&state, db::counts)?))
}

async fn list_leads(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Lead>>, ApiError> {
    Ok(Json(with_db(&state, db::list_leads)?))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<StatusFilter<OrderStatus>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(with_db(&state, |conn| db::list_orders(conn, filter.status))?))
}

async fn update_order(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusPatch<OrderStatus>>,
) -> Result<Json<Order>, ApiError> {
    let order = with_db(&state, |conn| db::update_order_status(conn, id, body.status))?
        .ok_or_else(|| ApiError::NotFound(format!("order {id}")))?;
    info!(id, status = %order.status, "order status updated");
    Ok(Json(order))
}

async fn list_applications(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<StatusFilter<ApplicationStatus>>,
) -> Result<Json<Vec<CreditApplication>>, ApiError> {
    Ok(Json(with_db(&state, |conn| db::list_applications(conn, filter.status))?))
}

async fn update_application(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusPatch<ApplicationStatus>>,
) -> Result<Json<CreditApplication>, ApiError> {
    let app = with_db(&state, |conn| db::update_application_status(conn, id, body.status))?
        .ok_or_else(|| ApiError::NotFound(format!("credit application {id}")))?;
    info!(id, status = %app.status, "credit application status updated");
    Ok(Json(app))
}

async fn list_form_submissions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FormSubmission>>, ApiError> {
    Ok(Json(with_db(&state, db::list_form_submissions)?))
}
