use axum::extract::{OriginalUri, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::models::{
    DateRangeRequest, EventPage, EventRequest, EventResponse, EventStatus, PageQuery,
};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::response::ApiErrorResponse;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusFilter {
    /// Status label, matched case-insensitively.
    pub status: String,
}

/// Get all events
///
/// Paginated, latest date first. 204 when the requested page holds no events.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "events",
    params(PageQuery),
    responses(
        (status = 200, description = "List of events fetched successfully", body = EventPage),
        (status = 204, description = "No events found"),
        (status = 400, description = "Invalid pagination parameters", body = ApiErrorResponse)
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    info!(
        "API Call: GET /api/v1/events?page={}&size={} - Fetching paginated events",
        query.page, query.size
    );
    let page = state.events.list(query.page, query.size).await?;
    if page.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(page.map(EventResponse::from)).into_response())
}

/// Get an event by ID
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event fetched successfully", body = EventResponse),
        (status = 404, description = "Event not found", body = ApiErrorResponse)
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EventResponse>, AppError> {
    info!("API Call: GET /api/v1/events/{} - Fetching event details", id);
    let event = state.events.get_by_id(id).await?;
    Ok(Json(event.into()))
}

/// Create a new event
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "events",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event created successfully", body = EventResponse,
            headers(("Location" = String, description = "URI of the new event"))),
        (status = 400, description = "Invalid event details", body = ApiErrorResponse)
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(request): Json<EventRequest>,
) -> Result<Response, AppError> {
    info!("API Call: POST /api/v1/events - Creating event");
    let event = state.events.create(request).await?;
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), event.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(EventResponse::from(event)),
    )
        .into_response())
}

/// Update an existing event
///
/// Every field is replaced by the request's values.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event updated successfully", body = EventResponse),
        (status = 400, description = "Invalid event details", body = ApiErrorResponse),
        (status = 404, description = "Event not found", body = ApiErrorResponse)
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<EventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    info!("API Call: PUT /api/v1/events/{} - Updating event", id);
    let event = state.events.update(id, request).await?;
    Ok(Json(event.into()))
}

/// Delete an event
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted successfully"),
        (status = 404, description = "Event not found", body = ApiErrorResponse),
        (status = 500, description = "Event is still referenced by registrations", body = ApiErrorResponse)
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    info!("API Call: DELETE /api/v1/events/{} - Deleting event", id);
    state.events.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get events by status
///
/// An empty match is reported as 404.
#[utoipa::path(
    get,
    path = "/api/v1/events/status",
    tag = "events",
    params(StatusFilter),
    responses(
        (status = 200, description = "Events fetched successfully", body = [EventResponse]),
        (status = 400, description = "Invalid event status", body = ApiErrorResponse),
        (status = 404, description = "No events with that status", body = ApiErrorResponse)
    )
)]
pub async fn events_by_status(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    info!(
        "API Call: GET /api/v1/events/status?status={} - Fetching events by status",
        filter.status
    );
    let status = EventStatus::from_label(&filter.status)?;
    let events = state.events.list_by_status(status).await?;
    if events.is_empty() {
        return Err(AppError::NotFound(format!(
            "No events found with status {}",
            status
        )));
    }
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// Cancel an event
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}/cancel",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event cancelled successfully", body = EventResponse),
        (status = 400, description = "Event already cancelled", body = ApiErrorResponse),
        (status = 404, description = "Event not found", body = ApiErrorResponse)
    )
)]
pub async fn cancel_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EventResponse>, AppError> {
    info!("API Call: PUT /api/v1/events/{}/cancel - Cancelling event", id);
    let event = state.events.cancel(id).await?;
    Ok(Json(event.into()))
}

/// Get events between two dates
///
/// Both bounds are inclusive. A `+hh:mm` offset may be sent unencoded.
#[utoipa::path(
    get,
    path = "/api/v1/events/between",
    tag = "events",
    params(DateRangeRequest),
    responses(
        (status = 200, description = "Events fetched successfully", body = [EventResponse]),
        (status = 204, description = "No events found"),
        (status = 400, description = "Invalid date range", body = ApiErrorResponse)
    )
)]
pub async fn events_between_query(
    State(state): State<AppState>,
    Query(range): Query<DateRangeRequest>,
) -> Result<Response, AppError> {
    events_between(state, range).await
}

/// Get events between two dates, with the range as a JSON body
#[utoipa::path(
    post,
    path = "/api/v1/events/between",
    tag = "events",
    request_body = DateRangeRequest,
    responses(
        (status = 200, description = "Events fetched successfully", body = [EventResponse]),
        (status = 204, description = "No events found"),
        (status = 400, description = "Invalid date range", body = ApiErrorResponse)
    )
)]
pub async fn events_between_body(
    State(state): State<AppState>,
    Json(range): Json<DateRangeRequest>,
) -> Result<Response, AppError> {
    events_between(state, range).await
}

async fn events_between(state: AppState, range: DateRangeRequest) -> Result<Response, AppError> {
    info!(
        "API Call: /api/v1/events/between - Fetching events from {} to {}",
        range.start, range.end
    );
    let events = state.events.list_between(range.start, range.end).await?;
    if events.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let body: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();
    Ok(Json(body).into_response())
}
