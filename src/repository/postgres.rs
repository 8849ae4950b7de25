use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

use crate::models::{
    Event, EventDraft, EventStatus, NewRegistration, Page, PageRequest, Registration,
    RegistrationStatus,
};
use crate::repository::{
    duplicate_event_name, EventRepository, RegistrationRepository, RepositoryError,
    RepositoryResult,
};

macro_rules! select_events {
    ($tail:literal) => {
        concat!(
            "SELECT id, name, description, location, event_date_time, status, \
             created_at, updated_at, version FROM events ",
            $tail
        )
    };
}

macro_rules! select_registrations {
    ($tail:literal) => {
        concat!(
            "SELECT id, event_id, user_id, registration_status, registered_at, version \
             FROM event_registrations ",
            $tail
        )
    };
}

const EVENT_RETURNING: &str =
    "RETURNING id, name, description, location, event_date_time, status, created_at, updated_at, version";

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    name: String,
    description: Option<String>,
    location: String,
    event_date_time: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i32,
}

impl TryFrom<EventRow> for Event {
    type Error = RepositoryError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = EventStatus::from_column(&row.status).ok_or_else(|| {
            RepositoryError::Corrupt(format!(
                "unknown status '{}' on event {}",
                row.status, row.id
            ))
        })?;
        Ok(Event {
            id: row.id,
            name: row.name,
            description: row.description,
            location: row.location,
            event_date_time: row.event_date_time,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: i64,
    event_id: i64,
    user_id: i64,
    registration_status: String,
    registered_at: DateTime<Utc>,
    version: i32,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = RepositoryError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        let status = RegistrationStatus::from_column(&row.registration_status).ok_or_else(|| {
            RepositoryError::Corrupt(format!(
                "unknown status '{}' on registration {}",
                row.registration_status, row.id
            ))
        })?;
        Ok(Registration {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            status,
            registered_at: row.registered_at,
            version: row.version,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> RepositoryResult<Vec<T>>
where
    T: TryFrom<R, Error = RepositoryError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn unique_name_violation(err: sqlx::Error, name: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => duplicate_event_name(name),
        _ => RepositoryError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn find_page(&self, page: PageRequest) -> RepositoryResult<Page<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(select_events!(
            "ORDER BY event_date_time DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(convert_all(rows)?, page, total))
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(select_events!("WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Event::try_from).transpose()
    }

    async fn exists_by_id(&self, id: i64) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert(&self, draft: EventDraft) -> RepositoryResult<Event> {
        let sql = format!(
            "INSERT INTO events \
             (name, description, location, event_date_time, status, created_at, updated_at, version) \
             VALUES ($1, $2, $3, $4, $5, now(), now(), 0) {}",
            EVENT_RETURNING
        );
        let row: EventRow = sqlx::query_as(&sql)
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(&draft.location)
            .bind(draft.event_date_time)
            .bind(draft.status.column_value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_name_violation(e, &draft.name))?;
        Event::try_from(row)
    }

    async fn update(&self, event: &Event) -> RepositoryResult<Event> {
        let sql = format!(
            "UPDATE events SET name = $2, description = $3, location = $4, \
             event_date_time = $5, status = $6, updated_at = now(), version = version + 1 \
             WHERE id = $1 AND version = $7 {}",
            EVENT_RETURNING
        );
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(event.id)
            .bind(&event.name)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.event_date_time)
            .bind(event.status.column_value())
            .bind(event.version)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_name_violation(e, &event.name))?;

        match row {
            Some(row) => Event::try_from(row),
            None => Err(RepositoryError::StaleVersion {
                entity: "Event",
                id: event.id,
            }),
        }
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    RepositoryError::Referenced { entity: "Event", id }
                }
                _ => RepositoryError::Database(e),
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_status(&self, status: EventStatus) -> RepositoryResult<Vec<Event>> {
        let rows: Vec<EventRow> =
            sqlx::query_as(select_events!("WHERE status = $1 ORDER BY event_date_time, id"))
                .bind(status.column_value())
                .fetch_all(&self.pool)
                .await?;
        convert_all(rows)
    }

    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(select_events!(
            "WHERE event_date_time BETWEEN $1 AND $2 ORDER BY event_date_time, id"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}

#[derive(Clone)]
pub struct PgRegistrationRepository {
    pool: PgPool,
}

impl PgRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationRepository for PgRegistrationRepository {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Registration>> {
        let row: Option<RegistrationRow> =
            sqlx::query_as(select_registrations!("WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Registration::try_from).transpose()
    }

    async fn find_by_event(&self, event_id: i64) -> RepositoryResult<Vec<Registration>> {
        let rows: Vec<RegistrationRow> =
            sqlx::query_as(select_registrations!("WHERE event_id = $1 ORDER BY id"))
                .bind(event_id)
                .fetch_all(&self.pool)
                .await?;
        convert_all(rows)
    }

    async fn find_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Registration>> {
        let rows: Vec<RegistrationRow> =
            sqlx::query_as(select_registrations!("WHERE user_id = $1 ORDER BY id"))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        convert_all(rows)
    }

    async fn find_by_user_and_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> RepositoryResult<Option<Registration>> {
        let row: Option<RegistrationRow> = sqlx::query_as(select_registrations!(
            "WHERE user_id = $1 AND event_id = $2 ORDER BY id LIMIT 1"
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Registration::try_from).transpose()
    }

    async fn exists_by_user_and_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM event_registrations WHERE user_id = $1 AND event_id = $2)",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, registration: NewRegistration) -> RepositoryResult<Registration> {
        let row: RegistrationRow = sqlx::query_as(
            "INSERT INTO event_registrations \
             (event_id, user_id, registration_status, registered_at, version) \
             VALUES ($1, $2, $3, now(), 0) \
             RETURNING id, event_id, user_id, registration_status, registered_at, version",
        )
        .bind(registration.event_id)
        .bind(registration.user_id)
        .bind(registration.status.column_value())
        .fetch_one(&self.pool)
        .await?;
        Registration::try_from(row)
    }

    async fn update(&self, registration: &Registration) -> RepositoryResult<Registration> {
        let row: Option<RegistrationRow> = sqlx::query_as(
            "UPDATE event_registrations \
             SET registration_status = $2, version = version + 1 \
             WHERE id = $1 AND version = $3 \
             RETURNING id, event_id, user_id, registration_status, registered_at, version",
        )
        .bind(registration.id)
        .bind(registration.status.column_value())
        .bind(registration.version)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Registration::try_from(row),
            None => Err(RepositoryError::StaleVersion {
                entity: "Registration",
                id: registration.id,
            }),
        }
    }
}
