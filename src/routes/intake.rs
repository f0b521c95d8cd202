//! Public form submissions: leads, delivery orders, credit applications

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use tracing::info;

use crate::AppState;
use crate::db;
use crate::intake::{NewCreditApplication, NewLead, NewOrder};
use crate::models::{CreditApplication, Lead, Order};
use crate::routes::{ApiError, ApiJson, with_db};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leads", post(create_lead))
        .route("/api/orders", post(create_order))
        .route("/api/credit-applications", post(create_application))
}

async fn create_lead(
    State(state): State<Arc<AppState>>,
    ApiJson(lead): ApiJson<NewLead>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let lead = lead.validate()?;
    let lead = with_db(&state, |conn| db::insert_lead(conn, &lead))?;
    info!(id = lead.id, source_page = ?lead.source_page, "lead captured");
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    ApiJson(order): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = order.validate()?;
    let order = with_db(&state, |conn| db::insert_order(conn, &order))?;
    info!(id = order.id, town = %order.town, fill = order.fill_tank, "order placed");
    Ok((StatusCode::CREATED, Json(order)))
}

async fn create_application(
    State(state): State<Arc<AppState>>,
    ApiJson(app): ApiJson<NewCreditApplication>,
) -> Result<(StatusCode, Json<CreditApplication>), ApiError> {
    let app = app.validate()?;
    let app = with_db(&state, |conn| db::insert_application(conn, &app))?;
    info!(id = app.id, "credit application received");
    Ok((StatusCode::CREATED, Json(app)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::db;
    use crate::routes::testing::{app, json_request, send, state};

    #[tokio::test]
    async fn lead_is_stored() {
        let state = state();
        let body = json!({
            "name": "Mary MacNeil",
            "phone": "902-555-0101",
            "message": "Interested in the budget plan",
            "source_page": "glace-bay",
            "interest": "budget-plan"
        });
        let (status, body) = send(app(&state), json_request("POST", "/api/leads", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Mary MacNeil");
        assert_eq!(body["source_page"], "glace-bay");

        let leads = db::list_leads(&state.db.lock().unwrap()).unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].id, body["id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn invalid_lead_is_rejected_and_not_stored() {
        let state = state();
        let body = json!({ "name": "No Contact" });
        let (status, body) = send(app(&state), json_request("POST", "/api/leads", &body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "an email address or phone number is required");
        assert!(db::list_leads(&state.db.lock().unwrap()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_starts_pending() {
        let state = state();
        let body = json!({
            "name": "John Boutilier",
            "phone": "902-555-0199",
            "address": "12 Commercial St",
            "town": "Dominion",
            "fill_tank": true
        });
        let (status, body) = send(app(&state), json_request("POST", "/api/orders", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["liters"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn credit_application_requires_email() {
        let state = state();
        let body = json!({
            "name": "Anne Gillis",
            "phone": "902-555-0142",
            "address": "4 Main St, Donkin"
        });
        let (status, body) =
            send(app(&state), json_request("POST", "/api/credit-applications", &body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "email is required");
    }
}
