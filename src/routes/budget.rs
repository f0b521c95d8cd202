use std::sync::Arc;

use axum::response::Json;
use axum::routing::post;
use axum::Router;

use crate::AppState;
use crate::estimator;
use crate::models::{BudgetEstimate, BudgetRequest};
use crate::routes::{ApiError, ApiJson};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/budget/estimate", post(api_estimate))
}

async fn api_estimate(ApiJson(request): ApiJson<BudgetRequest>) -> Result<Json<BudgetEstimate>, ApiError> {
    Ok(Json(estimator::budget(&request)?))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::json;

    use crate::routes::testing::{app, json_request, send, state};

    #[tokio::test]
    async fn estimates_from_profile() {
        let state = state();
        let body = json!({
            "profile": {
                "house_type": "two-story",
                "heat_pumps": 1,
                "thermostat_c": 20.0
            },
            "price_per_liter": "1.50"
        });
        let (status, body) = send(app(&state), json_request("POST", "/api/budget/estimate", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimated_annual_liters"], "1320");
        assert_eq!(body["yearly_total"], "1980.00");
        assert_eq!(body["monthly_payment"], "200");
        assert!(body["breakdown"]["heating_liters"].is_number());
    }

    #[tokio::test]
    async fn direct_entry() {
        let state = state();
        let body = json!({ "annual_liters": "2200", "price_per_liter": "1.45" });
        let (status, body) = send(app(&state), json_request("POST", "/api/budget/estimate", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["yearly_total"], "3190.00");
        assert_eq!(body["monthly_payment"], "320");
        assert!(body.get("breakdown").is_none());
    }

    #[tokio::test]
    async fn rejects_bad_price_and_usage() {
        let state = state();

        let missing_price = json!({ "annual_liters": "2200" });
        let (status, body) =
            send(app(&state), json_request("POST", "/api/budget/estimate", &missing_price)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "price per liter is required");

        let zero_usage = json!({ "annual_liters": "0", "price_per_liter": "1.45" });
        let (status, body) =
            send(app(&state), json_request("POST", "/api/budget/estimate", &zero_usage)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "annual usage must be positive, got 0");

        let negative_price = json!({ "profile": { "house_type": "single" }, "price_per_liter": "-1" });
        let (status, _) =
            send(app(&state), json_request("POST", "/api/budget/estimate", &negative_price)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_errors() {
        let state = state();

        let unknown_house = json!({ "profile": { "house_type": "bungalow" }, "price_per_liter": "1.45" });
        let (status, body) =
            send(app(&state), json_request("POST", "/api/budget/estimate", &unknown_house)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("bungalow"));

        let request = Request::builder()
            .method("POST")
            .uri("/api/budget/estimate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"annual_liters\": "))
            .unwrap();
        let (status, body) = send(app(&state), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let no_content_type = Request::builder()
            .method("POST")
            .uri("/api/budget/estimate")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(app(&state), no_content_type).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn oversized_usage_is_rejected() {
        let state = state();
        let body = json!({ "annual_liters": "79228162514264337593543950335", "price_per_liter": "2" });
        let (status, body) = send(app(&state), json_request("POST", "/api/budget/estimate", &body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "estimate is too large to price");
    }
}
