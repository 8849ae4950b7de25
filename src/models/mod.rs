use thiserror::Error;

pub mod event;
pub mod page;
pub mod registration;

pub use event::{
    DateRangeRequest, Event, EventDraft, EventRequest, EventResponse, EventStatus,
};
pub use page::{EventPage, Page, PageQuery, PageRequest};
pub use registration::{
    NewRegistration, Registration, RegistrationRequest, RegistrationResponse, RegistrationStatus,
    StatusQuery,
};

/// Raised when a status label does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
