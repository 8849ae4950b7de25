use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{Event, EventRequest, EventStatus, Page, PageRequest};
use crate::repository::EventRepository;
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct EventService {
    repository: Arc<dyn EventRepository>,
    max_page_size: i64,
}

impl EventService {
    pub fn new(repository: Arc<dyn EventRepository>, max_page_size: i64) -> Self {
        Self {
            repository,
            max_page_size,
        }
    }

    /// One page of events, latest date-time first. An empty page is not an error.
    pub async fn list(&self, page: i64, size: i64) -> Result<Page<Event>, AppError> {
        info!(page, size, "Fetching events");
        let request = PageRequest::new(page, size, self.max_page_size)?;
        Ok(self.repository.find_page(request).await?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Event, AppError> {
        info!(id, "Fetching event");
        self.find_event(id).await
    }

    pub async fn create(&self, request: EventRequest) -> Result<Event, AppError> {
        let draft = request.validate(Utc::now())?;
        info!(name = %draft.name, "Creating event");
        let event = self.repository.insert(draft).await?;
        info!(id = event.id, "Event created");
        Ok(event)
    }

    /// Full replace of every mutable field.
    pub async fn update(&self, id: i64, request: EventRequest) -> Result<Event, AppError> {
        info!(id, "Updating event");
        let mut event = self.find_event(id).await?;
        event.apply(request.validate(Utc::now())?);
        Ok(self.repository.update(&event).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        info!(id, "Deleting event");
        self.find_event(id).await?;
        if !self.repository.delete_by_id(id).await? {
            return Err(not_found(id));
        }
        info!(id, "Event deleted");
        Ok(())
    }

    pub async fn list_by_status(&self, status: EventStatus) -> Result<Vec<Event>, AppError> {
        info!(%status, "Fetching events by status");
        Ok(self.repository.find_by_status(status).await?)
    }

    pub async fn cancel(&self, id: i64) -> Result<Event, AppError> {
        info!(id, "Cancelling event");
        let mut event = self.find_event(id).await?;
        if event.status == EventStatus::Cancelled {
            warn!(id, "Event is already cancelled");
            return Err(AppError::Conflict(format!(
                "Event with ID: {} is already cancelled",
                id
            )));
        }
        event.status = EventStatus::Cancelled;
        Ok(self.repository.update(&event).await?)
    }

    /// Events whose date-time lies in `[start, end]`. Only `start > end` is
    /// rejected, so `start == end` selects events at exactly that instant.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, AppError> {
        info!(%start, %end, "Fetching events in date range");
        if start > end {
            return Err(AppError::ValidationError(
                "Start date must be before end date.".to_string(),
            ));
        }
        Ok(self.repository.find_between(start, end).await?)
    }

    async fn find_event(&self, id: i64) -> Result<Event, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Event with ID: {} not found", id))
}
