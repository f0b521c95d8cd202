use std::sync::Arc;

use axum::response::Json;
use axum::routing::get;
use axum::Router;

use crate::AppState;
use crate::locations::{self, Location};
use crate::routes::{ApiError, ApiPath};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/locations", get(list_locations))
        .route("/api/locations/{slug}", get(get_location))
}

async fn list_locations() -> Json<&'static [Location]> {
    Json(locations::all())
}

async fn get_location(ApiPath(slug): ApiPath<String>) -> Result<Json<&'static Location>, ApiError> {
    locations::find(&slug)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("location '{slug}'")))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::testing::{app, get, send, state};

    #[tokio::test]
    async fn lists_all_towns() {
        let state = state();
        let (status, body) = send(app(&state), get("/api/locations")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), crate::locations::LOCATIONS.len());
    }

    #[tokio::test]
    async fn single_town_or_404() {
        let state = state();
        let (status, body) = send(app(&state), get("/api/locations/new-waterford")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "New Waterford");

        let (status, body) = send(app(&state), get("/api/locations/moncton")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "location 'moncton' not found");
    }
}
