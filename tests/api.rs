//! End-to-end tests through the full router, backed by in-memory storage.

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use event_planner_server::routes::create_routes;
use event_planner_server::state::AppState;

const EVENTS: &str = "/api/v1/events";
const REGISTRATIONS: &str = "/api/v1/event-registration";
const AT: &str = "2030-01-01T10:00:00Z";

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

fn app() -> Router {
    create_routes(AppState::in_memory(100))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply {
        status,
        headers,
        body,
    }
}

fn event_body(name: &str, at: &str) -> Value {
    json!({
        "name": name,
        "location": "Hall A",
        "eventDateTime": at,
        "status": "Upcoming"
    })
}

async fn create_event(app: &Router, name: &str, at: &str) -> i64 {
    let reply = send(app, Method::POST, EVENTS, Some(event_body(name, at))).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body["id"].as_i64().unwrap()
}

fn assert_error(reply: &Reply, status: StatusCode, path: &str) {
    assert_eq!(reply.status, status, "{}", reply.body);
    assert_eq!(reply.body["status"], status.as_u16());
    assert_eq!(reply.body["error"], status.canonical_reason().unwrap());
    assert_eq!(reply.body["path"], path);
    assert!(reply.body["timestamp"].is_string());
    assert!(reply.body["message"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let reply = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_create_returns_location_and_is_resolvable() {
    let app = app();
    let reply = send(&app, Method::POST, EVENTS, Some(event_body("Conf", AT))).await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let id = reply.body["id"].as_i64().unwrap();
    assert_eq!(
        reply.headers[header::LOCATION],
        format!("/api/v1/events/{}", id).as_str()
    );
    assert_eq!(reply.body["status"], "Upcoming");
    assert_eq!(reply.body["eventDateTime"], AT);

    let fetched = send(&app, Method::GET, &format!("{}/{}", EVENTS, id), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, reply.body);
}

#[tokio::test]
async fn test_created_ids_are_unique() {
    let app = app();
    let a = create_event(&app, "a", AT).await;
    let b = create_event(&app, "b", AT).await;
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_cancel_scenario() {
    let app = app();
    let id = create_event(&app, "Conf", AT).await;
    let path = format!("{}/{}/cancel", EVENTS, id);

    let cancelled = send(&app, Method::PUT, &path, None).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["status"], "Cancelled");

    let again = send(&app, Method::PUT, &path, None).await;
    assert_error(&again, StatusCode::BAD_REQUEST, &path);
    assert_eq!(
        again.body["message"],
        format!("Event with ID: {} is already cancelled", id)
    );
}

#[tokio::test]
async fn test_cancel_missing_event_is_not_found() {
    let path = format!("{}/404/cancel", EVENTS);
    let reply = send(&app(), Method::PUT, &path, None).await;
    assert_error(&reply, StatusCode::NOT_FOUND, &path);
}

#[tokio::test]
async fn test_get_missing_event_is_not_found() {
    let path = format!("{}/12", EVENTS);
    let reply = send(&app(), Method::GET, &path, None).await;
    assert_error(&reply, StatusCode::NOT_FOUND, &path);
    assert_eq!(reply.body["message"], "Event with ID: 12 not found");
}

#[tokio::test]
async fn test_non_numeric_id_is_a_bad_request() {
    let path = format!("{}/abc", EVENTS);
    let reply = send(&app(), Method::GET, &path, None).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, &path);
}

#[tokio::test]
async fn test_create_validation_failures() {
    let app = app();

    let reply = send(&app, Method::POST, EVENTS, Some(event_body(" ", AT))).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, EVENTS);
    assert_eq!(reply.body["message"], "name: Event name is required");

    let past = event_body("Old", "2001-01-01T00:00:00Z");
    let reply = send(&app, Method::POST, EVENTS, Some(past)).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, EVENTS);

    let mut bad_status = event_body("Odd", AT);
    bad_status["status"] = json!("Postponed");
    let reply = send(&app, Method::POST, EVENTS, Some(bad_status)).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, EVENTS);
}

#[tokio::test]
async fn test_malformed_json_uses_error_body() {
    let request = Request::builder()
        .method(Method::POST)
        .uri(EVENTS)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["path"], EVENTS);
}

#[tokio::test]
async fn test_duplicate_name_is_rejected() {
    let app = app();
    create_event(&app, "Conf", AT).await;
    let reply = send(&app, Method::POST, EVENTS, Some(event_body("Conf", AT))).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, EVENTS);
}

#[tokio::test]
async fn test_list_events_pages_latest_first() {
    let app = app();
    let empty = send(&app, Method::GET, EVENTS, None).await;
    assert_eq!(empty.status, StatusCode::NO_CONTENT);

    create_event(&app, "early", "2030-01-01T10:00:00Z").await;
    create_event(&app, "late", "2030-06-01T10:00:00Z").await;
    create_event(&app, "middle", "2030-03-01T10:00:00Z").await;

    let first = send(&app, Method::GET, &format!("{}?page=0&size=2", EVENTS), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["totalElements"], 3);
    assert_eq!(first.body["totalPages"], 2);
    assert_eq!(first.body["content"][0]["name"], "late");
    assert_eq!(first.body["content"][1]["name"], "middle");

    let past_end = send(&app, Method::GET, &format!("{}?page=5&size=2", EVENTS), None).await;
    assert_eq!(past_end.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_bad_pagination_is_rejected() {
    let app = app();
    for query in ["page=-1", "size=0", "size=1000", "page=x"] {
        let reply = send(&app, Method::GET, &format!("{}?{}", EVENTS, query), None).await;
        assert_error(&reply, StatusCode::BAD_REQUEST, EVENTS);
    }
}

#[tokio::test]
async fn test_update_replaces_event() {
    let app = app();
    let id = create_event(&app, "Conf", AT).await;
    let path = format!("{}/{}", EVENTS, id);

    let replacement = json!({
        "name": "Conf 2",
        "location": "Hall B",
        "eventDateTime": "2031-01-01T09:00:00Z",
        "status": "ongoing"
    });
    let reply = send(&app, Method::PUT, &path, Some(replacement)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["name"], "Conf 2");
    assert_eq!(reply.body["location"], "Hall B");
    assert_eq!(reply.body["status"], "Ongoing");
    assert_eq!(reply.body["description"], Value::Null);

    let missing = format!("{}/999", EVENTS);
    let reply = send(&app, Method::PUT, &missing, Some(event_body("x", AT))).await;
    assert_error(&reply, StatusCode::NOT_FOUND, &missing);
}

#[tokio::test]
async fn test_delete_event() {
    let app = app();
    let id = create_event(&app, "Conf", AT).await;
    let path = format!("{}/{}", EVENTS, id);

    let reply = send(&app, Method::DELETE, &path, None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = send(&app, Method::DELETE, &path, None).await;
    assert_error(&reply, StatusCode::NOT_FOUND, &path);
}

#[tokio::test]
async fn test_events_by_status() {
    let app = app();
    let id = create_event(&app, "Conf", AT).await;
    create_event(&app, "Meetup", AT).await;
    send(&app, Method::PUT, &format!("{}/{}/cancel", EVENTS, id), None).await;

    let path = format!("{}/status", EVENTS);
    let reply = send(&app, Method::GET, &format!("{}?status=CANCELLED", path), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.as_array().unwrap().len(), 1);
    assert_eq!(reply.body[0]["id"], id);

    let reply = send(&app, Method::GET, &format!("{}?status=Completed", path), None).await;
    assert_error(&reply, StatusCode::NOT_FOUND, &path);

    let reply = send(&app, Method::GET, &format!("{}?status=nope", path), None).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, &path);
    assert_eq!(reply.body["message"], "Invalid EventStatus: nope");
}

#[tokio::test]
async fn test_events_between() {
    let app = app();
    let id = create_event(&app, "Conf", AT).await;
    create_event(&app, "Later", "2030-02-01T10:00:00Z").await;
    let path = format!("{}/between", EVENTS);

    let exact = send(&app, Method::GET, &format!("{}?start={}&end={}", path, AT, AT), None).await;
    assert_eq!(exact.status, StatusCode::OK);
    assert_eq!(exact.body.as_array().unwrap().len(), 1);
    assert_eq!(exact.body[0]["id"], id);

    let body = json!({ "start": "2029-12-01T00:00:00Z", "end": "2030-03-01T00:00:00Z" });
    let wide = send(&app, Method::POST, &path, Some(body)).await;
    assert_eq!(wide.status, StatusCode::OK);
    assert_eq!(wide.body.as_array().unwrap().len(), 2);

    let body = json!({ "start": "2035-01-01T00:00:00Z", "end": "2035-02-01T00:00:00Z" });
    let none = send(&app, Method::POST, &path, Some(body)).await;
    assert_eq!(none.status, StatusCode::NO_CONTENT);

    let body = json!({ "start": "2030-03-01T00:00:00Z", "end": "2030-01-01T00:00:00Z" });
    let inverted = send(&app, Method::POST, &path, Some(body)).await;
    assert_error(&inverted, StatusCode::BAD_REQUEST, &path);
}

#[tokio::test]
async fn test_registration_scenario() {
    let app = app();
    let register = json!({ "userId": 1, "eventId": 5 });

    let reply = send(&app, Method::POST, REGISTRATIONS, Some(register.clone())).await;
    assert_error(&reply, StatusCode::NOT_FOUND, REGISTRATIONS);

    let mut event_id = 0;
    for n in 1..=5 {
        event_id = create_event(&app, &format!("Event {}", n), AT).await;
    }
    assert_eq!(event_id, 5);

    let reply = send(&app, Method::POST, REGISTRATIONS, Some(register.clone())).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["registrationStatus"], "Pending");
    assert_eq!(reply.body["userId"], 1);
    assert_eq!(reply.body["eventId"], 5);
    assert!(reply.body["registeredAt"].is_string());

    let reply = send(&app, Method::POST, REGISTRATIONS, Some(register)).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, REGISTRATIONS);
    assert_eq!(
        reply.body["message"],
        "User with ID 1 is already registered for this event."
    );
}

#[tokio::test]
async fn test_register_requires_ids() {
    let reply = send(
        &app(),
        Method::POST,
        REGISTRATIONS,
        Some(json!({ "eventId": 5 })),
    )
    .await;
    assert_error(&reply, StatusCode::BAD_REQUEST, REGISTRATIONS);
    assert_eq!(reply.body["message"], "userId: User ID is required");
}

#[tokio::test]
async fn test_cancel_registration() {
    let app = app();
    let event_id = create_event(&app, "Conf", AT).await;
    let path = format!("{}/7/{}", REGISTRATIONS, event_id);

    let reply = send(&app, Method::DELETE, &path, None).await;
    assert_error(&reply, StatusCode::NOT_FOUND, &path);

    send(
        &app,
        Method::POST,
        REGISTRATIONS,
        Some(json!({ "userId": 7, "eventId": event_id })),
    )
    .await;

    let reply = send(&app, Method::DELETE, &path, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Registration cancelled successfully.");

    let reply = send(&app, Method::DELETE, &path, None).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, &path);
    assert_eq!(reply.body["message"], "Registration is already cancelled.");
}

#[tokio::test]
async fn test_registration_listings() {
    let app = app();

    let reply = send(&app, Method::GET, &format!("{}/user/3", REGISTRATIONS), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!([]));

    let missing = format!("{}/event/8", REGISTRATIONS);
    let reply = send(&app, Method::GET, &missing, None).await;
    assert_error(&reply, StatusCode::NOT_FOUND, &missing);

    let event_id = create_event(&app, "Conf", AT).await;
    let by_event = format!("{}/event/{}", REGISTRATIONS, event_id);
    let reply = send(&app, Method::GET, &by_event, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!([]));

    for user_id in [3, 4] {
        send(
            &app,
            Method::POST,
            REGISTRATIONS,
            Some(json!({ "userId": user_id, "eventId": event_id })),
        )
        .await;
    }

    let reply = send(&app, Method::GET, &by_event, None).await;
    assert_eq!(reply.body.as_array().unwrap().len(), 2);

    let reply = send(&app, Method::GET, &format!("{}/user/3", REGISTRATIONS), None).await;
    assert_eq!(reply.body.as_array().unwrap().len(), 1);
    assert_eq!(reply.body[0]["eventId"], event_id);
}

#[tokio::test]
async fn test_update_registration_status() {
    let app = app();
    let event_id = create_event(&app, "Conf", AT).await;
    let created = send(
        &app,
        Method::POST,
        REGISTRATIONS,
        Some(json!({ "userId": 1, "eventId": event_id })),
    )
    .await;
    let registration_id = created.body["id"].as_i64().unwrap();
    let path = format!("{}/{}/status", REGISTRATIONS, registration_id);
    let listing = format!("{}/user/1", REGISTRATIONS);

    let reply = send(&app, Method::PUT, &format!("{}?newStatus=pending", path), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let reply = send(&app, Method::GET, &listing, None).await;
    assert_eq!(reply.body[0]["registrationStatus"], "Pending");

    let reply = send(&app, Method::PUT, &format!("{}?newStatus=Confirmed", path), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body["message"],
        "Registration status updated successfully or no change needed."
    );
    let reply = send(&app, Method::GET, &listing, None).await;
    assert_eq!(reply.body[0]["registrationStatus"], "Confirmed");

    let reply = send(&app, Method::PUT, &format!("{}?newStatus=maybe", path), None).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, &path);
    assert_eq!(reply.body["message"], "Invalid RegistrationStatus: maybe");

    let missing = format!("{}/99/status", REGISTRATIONS);
    let reply = send(&app, Method::PUT, &format!("{}?newStatus=Confirmed", missing), None).await;
    assert_error(&reply, StatusCode::NOT_FOUND, &missing);
}

#[tokio::test]
async fn test_response_headers() {
    let reply = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(reply.headers["x-content-type-options"], "nosniff");
    assert_eq!(reply.headers["x-frame-options"], "DENY");
    assert_eq!(reply.headers[header::CACHE_CONTROL], "no-store");
    assert!(reply.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_uses_error_body() {
    let reply = send(&app(), Method::GET, "/api/v2/nothing", None).await;
    assert_error(&reply, StatusCode::NOT_FOUND, "/api/v2/nothing");
}

#[tokio::test]
async fn test_event_with_registrations_cannot_be_deleted() {
    let app = app();
    let id = create_event(&app, "Conf", AT).await;
    let body = json!({ "eventId": id, "userId": 1 });
    let reply = send(&app, Method::POST, REGISTRATIONS, Some(body)).await;
    assert_eq!(reply.status, StatusCode::OK);

    let path = format!("{}/{}", EVENTS, id);
    let reply = send(&app, Method::DELETE, &path, None).await;
    assert_error(&reply, StatusCode::INTERNAL_SERVER_ERROR, &path);

    let event = send(&app, Method::GET, &path, None).await;
    assert_eq!(event.status, StatusCode::OK);
    let registrations = send(
        &app,
        Method::GET,
        &format!("{}/event/{}", REGISTRATIONS, id),
        None,
    )
    .await;
    assert_eq!(registrations.status, StatusCode::OK);
    assert_eq!(registrations.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_largest_page_size_reports_one_page() {
    let app = create_routes(AppState::in_memory(i64::MAX));
    create_event(&app, "a", AT).await;
    create_event(&app, "b", "2030-02-01T10:00:00Z").await;

    let uri = format!("{}?size={}", EVENTS, i64::MAX);
    let reply = send(&app, Method::GET, &uri, None).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["totalElements"], 2);
    assert_eq!(reply.body["totalPages"], 1);
    assert_eq!(reply.body["content"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_events_between_accepts_unencoded_offset() {
    let app = app();
    let id = create_event(&app, "Conf", AT).await;
    let path = format!("{}/between", EVENTS);

    let uri = format!(
        "{}?start=2030-01-01T12:00:00+02:00&end=2030-01-01T12:00:00%2B02:00",
        path
    );
    let reply = send(&app, Method::GET, &uri, None).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body[0]["id"], id);

    let reply = send(&app, Method::GET, &format!("{}?start=soon&end={}", path, AT), None).await;
    assert_error(&reply, StatusCode::BAD_REQUEST, &path);
}

#[tokio::test]
async fn test_openapi_document_lists_every_route() {
    let reply = send(&app(), Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["info"]["title"], "Event Planner API");
    assert_eq!(reply.body["info"]["license"]["name"], "MIT");

    let paths = reply.body["paths"].as_object().unwrap();
    for path in [
        "/health",
        "/api/v1/events",
        "/api/v1/events/{id}",
        "/api/v1/events/{id}/cancel",
        "/api/v1/events/status",
        "/api/v1/events/between",
        "/api/v1/event-registration",
        "/api/v1/event-registration/{userId}/{eventId}",
        "/api/v1/event-registration/user/{userId}",
        "/api/v1/event-registration/event/{eventId}",
        "/api/v1/event-registration/{id}/status",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
    assert!(paths["/api/v1/events/{id}/cancel"].get("put").is_some());
    assert!(paths["/api/v1/event-registration/user/{userId}"].get("get").is_some());
}
