pub mod event;
pub mod registration;

pub use event::EventService;
pub use registration::RegistrationService;
