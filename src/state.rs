use std::sync::Arc;

use crate::repository::{EventRepository, MemoryStore, RegistrationRepository};
use crate::services::{EventService, RegistrationService};

/// Services shared by every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub registrations: RegistrationService,
}

impl AppState {
    pub fn new(
        events: Arc<dyn EventRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        max_page_size: i64,
    ) -> Self {
        Self {
            events: EventService::new(events.clone(), max_page_size),
            registrations: RegistrationService::new(registrations, events),
        }
    }

    pub fn in_memory(max_page_size: i64) -> Self {
        let store = MemoryStore::new();
        Self::new(
            Arc::new(store.event_repository()),
            Arc::new(store.registration_repository()),
            max_page_size,
        )
    }
}
