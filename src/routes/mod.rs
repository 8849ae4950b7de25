use axum::http::{header, HeaderValue};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, OPENAPI_PATH};
use crate::handlers::{events, health_check, openapi_document, registrations, route_not_found};
use crate::state::AppState;
use crate::utils::response::fill_error_path;

pub const API_PREFIX: &str = "/api/v1";

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/status", get(events::events_by_status))
        .route(
            "/between",
            get(events::events_between_query).post(events::events_between_body),
        )
        .route(
            "/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/:id/cancel", put(events::cancel_event))
}

fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(registrations::register))
        .route("/user/:user_id", get(registrations::user_registrations))
        .route("/event/:event_id", get(registrations::event_registrations))
        .route("/:id/:event_id", delete(registrations::cancel_registration))
        .route("/:id/status", put(registrations::update_registration_status))
}

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .nest("/events", event_routes())
        .nest("/event-registration", registration_routes());

    Router::new()
        .route("/health", get(health_check))
        .route(OPENAPI_PATH, get(openapi_document))
        .nest(API_PREFIX, api)
        .fallback(route_not_found)
        .layer(middleware::from_fn(fill_error_path))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}
