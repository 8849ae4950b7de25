use utoipa::OpenApi;

use crate::handlers::{self, events, registrations};
use crate::models::{
    DateRangeRequest, EventPage, EventRequest, EventResponse, EventStatus, RegistrationRequest,
    RegistrationResponse, RegistrationStatus,
};
use crate::utils::response::ApiErrorResponse;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Event Planner API",
        description = "API documentation for Event Planner application",
        version = "1.0.0",
        contact(
            name = "Bluecomet Support",
            email = "bluecomet.org@gmail.com",
            url = "https://github.com/Priyansusahoo/BlueComet/issues"
        ),
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::health_check,
        events::list_events,
        events::create_event,
        events::get_event,
        events::update_event,
        events::delete_event,
        events::events_by_status,
        events::cancel_event,
        events::events_between_query,
        events::events_between_body,
        registrations::register,
        registrations::cancel_registration,
        registrations::user_registrations,
        registrations::event_registrations,
        registrations::update_registration_status,
    ),
    components(schemas(
        EventRequest,
        EventResponse,
        EventStatus,
        EventPage,
        DateRangeRequest,
        RegistrationRequest,
        RegistrationResponse,
        RegistrationStatus,
        ApiErrorResponse,
    )),
    tags(
        (name = "events", description = "Event lifecycle"),
        (name = "event-registration", description = "User registrations for events"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
