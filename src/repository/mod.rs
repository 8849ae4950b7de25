//! Storage capabilities used by the services.
//!
//! Both record types carry a `version` counter. Implementations only apply an
//! update when the stored version still matches the one the caller read, and
//! bump it on success; a mismatch surfaces as [`RepositoryError::StaleVersion`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Event, EventDraft, EventStatus, NewRegistration, Page, PageRequest, Registration,
};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryEventRepository, MemoryRegistrationRepository, MemoryStore};
pub use postgres::{PgEventRepository, PgRegistrationRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} with ID {id} was updated or deleted by another transaction")]
    StaleVersion { entity: &'static str, id: i64 },

    #[error("{0}")]
    Duplicate(String),

    #[error("{entity} with ID {id} is still referenced by registrations")]
    Referenced { entity: &'static str, id: i64 },

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub(crate) fn duplicate_event_name(name: &str) -> RepositoryError {
    RepositoryError::Duplicate(format!("Event with name '{}' already exists", name))
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Events ordered by date-time, latest first.
    async fn find_page(&self, page: PageRequest) -> RepositoryResult<Page<Event>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Event>>;

    async fn exists_by_id(&self, id: i64) -> RepositoryResult<bool>;

    async fn insert(&self, draft: EventDraft) -> RepositoryResult<Event>;

    /// Writes every mutable field of `event`, guarded by `event.version`.
    async fn update(&self, event: &Event) -> RepositoryResult<Event>;

    /// Returns `false` when nothing was deleted. Fails with
    /// [`RepositoryError::Referenced`] while registrations point at the event.
    async fn delete_by_id(&self, id: i64) -> RepositoryResult<bool>;

    async fn find_by_status(&self, status: EventStatus) -> RepositoryResult<Vec<Event>>;

    /// Both bounds are inclusive.
    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Event>>;
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Registration>>;

    async fn find_by_event(&self, event_id: i64) -> RepositoryResult<Vec<Registration>>;

    async fn find_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Registration>>;

    async fn find_by_user_and_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> RepositoryResult<Option<Registration>>;

    async fn exists_by_user_and_event(&self, user_id: i64, event_id: i64)
        -> RepositoryResult<bool>;

    async fn insert(&self, registration: NewRegistration) -> RepositoryResult<Registration>;

    /// Writes the status of `registration`, guarded by `registration.version`.
    async fn update(&self, registration: &Registration) -> RepositoryResult<Registration>;
}
