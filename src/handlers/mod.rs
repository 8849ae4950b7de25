use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::OpenApi;

use crate::config::ApiDoc;
use crate::utils::error::AppError;
use crate::utils::extract::Json;
use crate::utils::response::success;

pub mod events;
pub mod registrations;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "event-planner-api",
    };

    success(payload, "Health check successful").into_response()
}

pub async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No handler found for {}", uri.path()))
}
