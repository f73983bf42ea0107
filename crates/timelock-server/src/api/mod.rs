//! API module for the timelock key server

pub mod error;
pub mod handlers;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use handlers::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// JSON response body with a trailing newline.
///
/// Every body this API emits ends with a newline, success and error alike,
/// so command-line clients get readable output.
pub struct JsonLine<T>(pub T);

impl<T: Serialize> IntoResponse for JsonLine<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string(&self.0) {
            Ok(mut body) => {
                body.push('\n');
                (
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response()
            }
            Err(e) => {
                error!(error = %e, "failed to encode response body as JSON");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser clients encrypt to future instants from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v0/get_public_key", get(handlers::get_public_key))
        .route("/v0/get_private_key", get(handlers::get_private_key))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
