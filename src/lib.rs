//! Agenda: calendar events with strict date/time normalization, kept either
//! in a local key-value store or in a hosted event table.

pub mod agenda;
pub mod config;
pub mod datetime;
pub mod error;
pub mod event;
pub mod local_store;
pub mod notify;
pub mod remote_store;
pub mod store;

pub use agenda::Agenda;
pub use config::{Config, StorageKind};
pub use error::{AgendaError, AgendaResult, ValidationError};
pub use event::{sort_events, CalendarEvent, EventDraft, EventForm};
pub use notify::{Notifier, NotifierKind};
pub use store::{Backend, EventStore};
