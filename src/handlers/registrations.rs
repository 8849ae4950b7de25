use axum::extract::State;
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::models::{RegistrationRequest, RegistrationResponse, RegistrationStatus, StatusQuery};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::response::{empty_success, ApiErrorResponse};

/// Register a user for an event
#[utoipa::path(
    post,
    path = "/api/v1/event-registration",
    tag = "event-registration",
    request_body = RegistrationRequest,
    responses(
        (status = 200, description = "User successfully registered", body = RegistrationResponse),
        (status = 400, description = "Validation error or duplicate registration", body = ApiErrorResponse),
        (status = 404, description = "Event not found", body = ApiErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let (user_id, event_id) = request.validate()?;
    info!(
        "API Call: POST /api/v1/event-registration - Registering user {} for event {}",
        user_id, event_id
    );
    let registration = state.registrations.register(user_id, event_id).await?;
    Ok(Json(registration.into()))
}

/// Cancel a user's registration for an event
#[utoipa::path(
    delete,
    path = "/api/v1/event-registration/{userId}/{eventId}",
    tag = "event-registration",
    params(
        ("userId" = i64, Path, description = "User id"),
        ("eventId" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Registration cancelled successfully"),
        (status = 400, description = "Registration already cancelled", body = ApiErrorResponse),
        (status = 404, description = "Registration not found", body = ApiErrorResponse)
    )
)]
pub async fn cancel_registration(
    State(state): State<AppState>,
    Path((user_id, event_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    info!(
        "API Call: DELETE /api/v1/event-registration/{}/{} - Cancelling registration",
        user_id, event_id
    );
    state.registrations.cancel(user_id, event_id).await?;
    Ok(empty_success("Registration cancelled successfully.").into_response())
}

/// Get all registrations of a user
#[utoipa::path(
    get,
    path = "/api/v1/event-registration/user/{userId}",
    tag = "event-registration",
    params(("userId" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Registrations fetched successfully", body = [RegistrationResponse])
    )
)]
pub async fn user_registrations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<RegistrationResponse>>, AppError> {
    info!(
        "API Call: GET /api/v1/event-registration/user/{} - Fetching registrations",
        user_id
    );
    let registrations = state.registrations.list_by_user(user_id).await?;
    Ok(Json(registrations.into_iter().map(Into::into).collect()))
}

/// Get all registrations for an event
#[utoipa::path(
    get,
    path = "/api/v1/event-registration/event/{eventId}",
    tag = "event-registration",
    params(("eventId" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Registrations fetched successfully", body = [RegistrationResponse]),
        (status = 404, description = "Event not found", body = ApiErrorResponse)
    )
)]
pub async fn event_registrations(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<RegistrationResponse>>, AppError> {
    info!(
        "API Call: GET /api/v1/event-registration/event/{} - Fetching registrations",
        event_id
    );
    let registrations = state.registrations.list_by_event(event_id).await?;
    Ok(Json(registrations.into_iter().map(Into::into).collect()))
}

/// Update the status of a registration
#[utoipa::path(
    put,
    path = "/api/v1/event-registration/{id}/status",
    tag = "event-registration",
    params(("id" = i64, Path, description = "Registration id"), StatusQuery),
    responses(
        (status = 200, description = "Status updated, or already at the requested value"),
        (status = 400, description = "Invalid registration status", body = ApiErrorResponse),
        (status = 404, description = "Registration not found", body = ApiErrorResponse)
    )
)]
pub async fn update_registration_status(
    State(state): State<AppState>,
    Path(registration_id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, AppError> {
    info!(
        "API Call: PUT /api/v1/event-registration/{}/status?newStatus={} - Updating status",
        registration_id, query.new_status
    );
    let status = RegistrationStatus::from_label(&query.new_status)?;
    state
        .registrations
        .update_status(registration_id, status)
        .await?;
    Ok(empty_success("Registration status updated successfully or no change needed.").into_response())
}
