use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::models::ParseStatusError;
use crate::utils::error::AppError;

const NAME_MAX_CHARS: usize = 255;
const LOCATION_MAX_CHARS: usize = 200;
const DESCRIPTION_MAX_CHARS: usize = 2000;

/// Lifecycle status of an event.
///
/// Serialized to clients by its display label ("Upcoming") and stored in the
/// database by its constant name ("UPCOMING").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Upcoming,
        EventStatus::Ongoing,
        EventStatus::Completed,
        EventStatus::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "Upcoming",
            EventStatus::Ongoing => "Ongoing",
            EventStatus::Completed => "Completed",
            EventStatus::Cancelled => "Cancelled",
        }
    }

    pub fn column_value(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "UPCOMING",
            EventStatus::Ongoing => "ONGOING",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }

    /// Case-insensitive match against the display labels.
    pub fn from_label(value: &str) -> Result<Self, ParseStatusError> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value))
            .ok_or_else(|| ParseStatusError::new("EventStatus", value))
    }

    pub fn from_column(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.column_value() == value)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EventStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl TryFrom<String> for EventStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_label(&value)
    }
}

impl From<EventStatus> for String {
    fn from(status: EventStatus) -> Self {
        status.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub event_date_time: DateTime<Utc>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

impl Event {
    /// Overwrites every mutable field with the draft's values.
    pub fn apply(&mut self, draft: EventDraft) {
        self.name = draft.name;
        self.location = draft.location;
        self.description = draft.description;
        self.event_date_time = draft.event_date_time;
        self.status = draft.status;
    }
}

/// A validated set of event fields, ready to be inserted or applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub event_date_time: DateTime<Utc>,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub event_date_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub status: Option<EventStatus>,
}

impl EventRequest {
    /// Checks the request against the event constraints, reporting the first
    /// violation as `<field>: <reason>`.
    pub fn validate(self, now: DateTime<Utc>) -> Result<EventDraft, AppError> {
        let name = required_text(self.name, "name", "Event name is required")?;
        max_chars(&name, NAME_MAX_CHARS, "name", "Name must be under 255 characters")?;

        let location = required_text(self.location, "location", "Location is required")?;
        max_chars(
            &location,
            LOCATION_MAX_CHARS,
            "location",
            "Location must be under 200 characters",
        )?;

        if let Some(description) = &self.description {
            max_chars(
                description,
                DESCRIPTION_MAX_CHARS,
                "description",
                "Description cannot exceed 2000 characters",
            )?;
        }

        let event_date_time = self.event_date_time.ok_or_else(|| {
            invalid("eventDateTime", "Event date and time is required")
        })?;
        if event_date_time < now {
            return Err(invalid(
                "eventDateTime",
                "Event date must be in the future or present",
            ));
        }

        let status = self
            .status
            .ok_or_else(|| invalid("status", "Status is required"))?;

        Ok(EventDraft {
            name,
            location,
            description: self.description,
            event_date_time,
            status,
        })
    }
}

fn invalid(field: &str, reason: &str) -> AppError {
    AppError::ValidationError(format!("{}: {}", field, reason))
}

fn required_text(value: Option<String>, field: &str, reason: &str) -> Result<String, AppError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(invalid(field, reason)),
    }
}

fn max_chars(value: &str, max: usize, field: &str, reason: &str) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(invalid(field, reason));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub event_date_time: DateTime<Utc>,
    pub description: Option<String>,
    pub status: EventStatus,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            location: event.location,
            event_date_time: event.event_date_time,
            description: event.description,
            status: event.status,
        }
    }
}

/// Inclusive date-time window, accepted as a query string or a JSON body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeRequest {
    #[serde(deserialize_with = "deserialize_instant")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    pub end: DateTime<Utc>,
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw).map_err(serde::de::Error::custom)
}

/// Parses an RFC 3339 timestamp. An unencoded `+hh:mm` offset arrives from a
/// query string as ` hh:mm`, so a trailing space-separated offset is read as
/// positive.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match raw.parse::<DateTime<Utc>>() {
        Ok(instant) => Ok(instant),
        Err(e) => match raw.rsplit_once(' ') {
            Some((local, offset)) => format!("{}+{}", local, offset)
                .parse::<DateTime<Utc>>()
                .map_err(|_| e),
            None => Err(e),
        },
    }
}
