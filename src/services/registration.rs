use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{NewRegistration, Registration, RegistrationStatus};
use crate::repository::{EventRepository, RegistrationRepository};
use crate::utils::error::AppError;

/// Registration lifecycle over the registration store, with event existence
/// checked against the event store.
///
/// The duplicate and already-cancelled checks read before they write and are
/// not atomic with the write. Two identical concurrent requests can both pass
/// the check.
#[derive(Clone)]
pub struct RegistrationService {
    registrations: Arc<dyn RegistrationRepository>,
    events: Arc<dyn EventRepository>,
}

impl RegistrationService {
    pub fn new(
        registrations: Arc<dyn RegistrationRepository>,
        events: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            registrations,
            events,
        }
    }

    pub async fn register(&self, user_id: i64, event_id: i64) -> Result<Registration, AppError> {
        info!(user_id, event_id, "Registering user for event");
        if !self.events.exists_by_id(event_id).await? {
            return Err(event_not_found(event_id));
        }

        if self
            .registrations
            .exists_by_user_and_event(user_id, event_id)
            .await?
        {
            warn!(user_id, event_id, "User is already registered");
            return Err(AppError::Conflict(format!(
                "User with ID {} is already registered for this event.",
                user_id
            )));
        }

        let registration = self
            .registrations
            .insert(NewRegistration {
                event_id,
                user_id,
                status: RegistrationStatus::Pending,
            })
            .await?;
        info!(id = registration.id, "Registration created");
        Ok(registration)
    }

    pub async fn cancel(&self, user_id: i64, event_id: i64) -> Result<Registration, AppError> {
        info!(user_id, event_id, "Cancelling registration");
        let mut registration = self
            .registrations
            .find_by_user_and_event(user_id, event_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Registration not found for user ID {} and event ID {}",
                    user_id, event_id
                ))
            })?;

        if registration.status == RegistrationStatus::Cancelled {
            warn!(id = registration.id, "Registration is already cancelled");
            return Err(AppError::Conflict(
                "Registration is already cancelled.".to_string(),
            ));
        }

        registration.status = RegistrationStatus::Cancelled;
        Ok(self.registrations.update(&registration).await?)
    }

    pub async fn list_by_event(&self, event_id: i64) -> Result<Vec<Registration>, AppError> {
        info!(event_id, "Fetching registrations for event");
        if !self.events.exists_by_id(event_id).await? {
            return Err(event_not_found(event_id));
        }
        Ok(self.registrations.find_by_event(event_id).await?)
    }

    /// Users live elsewhere, so an unknown user simply has no registrations.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Registration>, AppError> {
        info!(user_id, "Fetching registrations for user");
        Ok(self.registrations.find_by_user(user_id).await?)
    }

    /// Any status may move to any other. Setting the current status again
    /// returns the record untouched, without a write.
    pub async fn update_status(
        &self,
        registration_id: i64,
        new_status: RegistrationStatus,
    ) -> Result<Registration, AppError> {
        let mut registration = self
            .registrations
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Registration with ID {} not found.",
                    registration_id
                ))
            })?;

        if registration.status == new_status {
            info!(
                registration_id,
                status = %new_status,
                "Registration already has requested status"
            );
            return Ok(registration);
        }

        info!(registration_id, from = %registration.status, to = %new_status, "Updating registration status");
        registration.status = new_status;
        Ok(self.registrations.update(&registration).await?)
    }
}

fn event_not_found(event_id: i64) -> AppError {
    AppError::NotFound(format!("Event with ID {} not found.", event_id))
}
