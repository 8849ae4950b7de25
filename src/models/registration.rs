use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::models::ParseStatusError;
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 3] = [
        RegistrationStatus::Pending,
        RegistrationStatus::Confirmed,
        RegistrationStatus::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "Pending",
            RegistrationStatus::Confirmed => "Confirmed",
            RegistrationStatus::Cancelled => "Cancelled",
        }
    }

    pub fn column_value(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Confirmed => "CONFIRMED",
            RegistrationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_label(value: &str) -> Result<Self, ParseStatusError> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value))
            .ok_or_else(|| ParseStatusError::new("RegistrationStatus", value))
    }

    pub fn from_column(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.column_value() == value)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RegistrationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl TryFrom<String> for RegistrationStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_label(&value)
    }
}

impl From<RegistrationStatus> for String {
    fn from(status: RegistrationStatus) -> Self {
        status.label().to_string()
    }
}

/// A user's claim on an event. `user_id` is issued elsewhere and never
/// checked against a user store.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub version: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRegistration {
    pub event_id: i64,
    pub user_id: i64,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub event_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl RegistrationRequest {
    /// Returns `(user_id, event_id)` once both are present.
    pub fn validate(self) -> Result<(i64, i64), AppError> {
        let event_id = self
            .event_id
            .ok_or_else(|| AppError::ValidationError("eventId: Event ID is required".to_string()))?;
        let user_id = self
            .user_id
            .ok_or_else(|| AppError::ValidationError("userId: User ID is required".to_string()))?;
        Ok((user_id, event_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub registration_status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationResponse {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            event_id: registration.event_id,
            user_id: registration.user_id,
            registration_status: registration.status,
            registered_at: registration.registered_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub new_status: String,
}
