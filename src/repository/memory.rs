//! In-process storage for tests and for running without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{
    Event, EventDraft, EventStatus, NewRegistration, Page, PageRequest, Registration,
};
use crate::repository::{
    duplicate_event_name, EventRepository, RegistrationRepository, RepositoryError,
    RepositoryResult,
};

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Both tables behind one handle, so event deletes can see the registrations
/// that still point at them.
///
/// Locks are always taken events first, then registrations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<Table<Event>>,
    registrations: RwLock<Table<Registration>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn event_repository(self: &Arc<Self>) -> MemoryEventRepository {
        MemoryEventRepository {
            store: Arc::clone(self),
        }
    }

    pub fn registration_repository(self: &Arc<Self>) -> MemoryRegistrationRepository {
        MemoryRegistrationRepository {
            store: Arc::clone(self),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryEventRepository {
    store: Arc<MemoryStore>,
}

impl MemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_date_then_id(a: &Event, b: &Event) -> std::cmp::Ordering {
    a.event_date_time
        .cmp(&b.event_date_time)
        .then(a.id.cmp(&b.id))
}

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn find_page(&self, page: PageRequest) -> RepositoryResult<Page<Event>> {
        let table = self.store.events.read().await;
        let mut events: Vec<Event> = table.rows.values().cloned().collect();
        events.sort_by(|a, b| by_date_then_id(b, a));

        let total = events.len() as i64;
        let content = events
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(0))
            .collect();
        Ok(Page::new(content, page, total))
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Event>> {
        Ok(self.store.events.read().await.rows.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self.store.events.read().await.rows.contains_key(&id))
    }

    async fn insert(&self, draft: EventDraft) -> RepositoryResult<Event> {
        let mut table = self.store.events.write().await;
        if table.rows.values().any(|e| e.name == draft.name) {
            return Err(duplicate_event_name(&draft.name));
        }

        let now = Utc::now();
        let id = table.next_id();
        let event = Event {
            id,
            name: draft.name,
            description: draft.description,
            location: draft.location,
            event_date_time: draft.event_date_time,
            status: draft.status,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        table.rows.insert(id, event.clone());
        Ok(event)
    }

    async fn update(&self, event: &Event) -> RepositoryResult<Event> {
        let mut table = self.store.events.write().await;
        if table
            .rows
            .values()
            .any(|e| e.id != event.id && e.name == event.name)
        {
            return Err(duplicate_event_name(&event.name));
        }

        let stale = RepositoryError::StaleVersion {
            entity: "Event",
            id: event.id,
        };
        let stored = match table.rows.get_mut(&event.id) {
            Some(stored) if stored.version == event.version => stored,
            _ => return Err(stale),
        };

        *stored = Event {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            version: stored.version + 1,
            ..event.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<bool> {
        let mut events = self.store.events.write().await;
        if !events.rows.contains_key(&id) {
            return Ok(false);
        }
        let referenced = self
            .store
            .registrations
            .read()
            .await
            .rows
            .values()
            .any(|r| r.event_id == id);
        if referenced {
            return Err(RepositoryError::Referenced {
                entity: "Event",
                id,
            });
        }
        Ok(events.rows.remove(&id).is_some())
    }

    async fn find_by_status(&self, status: EventStatus) -> RepositoryResult<Vec<Event>> {
        let table = self.store.events.read().await;
        let mut events: Vec<Event> = table
            .rows
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect();
        events.sort_by(by_date_then_id);
        Ok(events)
    }

    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Event>> {
        let table = self.store.events.read().await;
        let mut events: Vec<Event> = table
            .rows
            .values()
            .filter(|e| e.event_date_time >= start && e.event_date_time <= end)
            .cloned()
            .collect();
        events.sort_by(by_date_then_id);
        Ok(events)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRegistrationRepository {
    store: Arc<MemoryStore>,
}

impl MemoryRegistrationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filtered(&self, keep: impl Fn(&Registration) -> bool) -> Vec<Registration> {
        self.store
            .registrations
            .read()
            .await
            .rows
            .values()
            .filter(|&r| keep(r))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RegistrationRepository for MemoryRegistrationRepository {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Registration>> {
        Ok(self.store.registrations.read().await.rows.get(&id).cloned())
    }

    async fn find_by_event(&self, event_id: i64) -> RepositoryResult<Vec<Registration>> {
        Ok(self.filtered(|r| r.event_id == event_id).await)
    }

    async fn find_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Registration>> {
        Ok(self.filtered(|r| r.user_id == user_id).await)
    }

    async fn find_by_user_and_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> RepositoryResult<Option<Registration>> {
        Ok(self
            .filtered(|r| r.user_id == user_id && r.event_id == event_id)
            .await
            .into_iter()
            .next())
    }

    async fn exists_by_user_and_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> RepositoryResult<bool> {
        Ok(self
            .store
            .registrations
            .read()
            .await
            .rows
            .values()
            .any(|r| r.user_id == user_id && r.event_id == event_id))
    }

    async fn insert(&self, registration: NewRegistration) -> RepositoryResult<Registration> {
        let mut table = self.store.registrations.write().await;
        let id = table.next_id();
        let stored = Registration {
            id,
            event_id: registration.event_id,
            user_id: registration.user_id,
            status: registration.status,
            registered_at: Utc::now(),
            version: 0,
        };
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, registration: &Registration) -> RepositoryResult<Registration> {
        let mut table = self.store.registrations.write().await;
        match table.rows.get_mut(&registration.id) {
            Some(stored) if stored.version == registration.version => {
                stored.status = registration.status;
                stored.version += 1;
                Ok(stored.clone())
            }
            _ => Err(RepositoryError::StaleVersion {
                entity: "Registration",
                id: registration.id,
            }),
        }
    }
}
