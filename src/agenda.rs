//! The agenda session: owns the ordered event list and the selected day,
//! validates form input and keeps the store in step.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::datetime::{iso_to_display, parse_iso_date};
use crate::error::{AgendaError, AgendaResult};
use crate::event::{sort_events, CalendarEvent, EventDraft, EventForm};
use crate::notify::Notifier;
use crate::store::EventStore;

pub const MSG_ADDED: &str = "Event added.";
pub const MSG_UPDATED: &str = "Event updated.";
pub const MSG_DELETED: &str = "Event deleted.";
pub const MSG_LOAD_FAILED: &str = "Failed to load events.";
pub const MSG_SAVE_FAILED: &str = "Failed to save events.";

pub struct Agenda<S, N> {
    store: S,
    notifier: N,
    events: Vec<CalendarEvent>,
    selected: Option<NaiveDate>,
}

impl<S: EventStore, N: Notifier> Agenda<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            events: Vec::new(),
            selected: None,
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn get(&self, id: Uuid) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id() == id)
    }

    pub fn selected_day(&self) -> Option<NaiveDate> {
        self.selected
    }

    /// Replace the in-memory list with the store's contents. On failure the
    /// previous list is kept.
    pub async fn load(&mut self) -> AgendaResult<()> {
        match self.store.list().await {
            Ok(mut events) => {
                sort_events(&mut events);
                tracing::info!("Loaded {} events", events.len());
                self.events = events;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load events: {}", e);
                self.notifier.notify(MSG_LOAD_FAILED);
                Err(e)
            }
        }
    }

    pub async fn add(&mut self, form: &EventForm) -> AgendaResult<CalendarEvent> {
        let draft = self.validate(form)?;
        let event = CalendarEvent::create(draft);

        self.persist(self.store.insert(&event).await)?;

        self.events.push(event.clone());
        sort_events(&mut self.events);
        self.selected = Some(event.date);
        tracing::info!("Created event: {}", event.title);
        self.notifier.notify(MSG_ADDED);
        Ok(event)
    }

    /// Full-field replace of the event with `id`.
    pub async fn update(&mut self, id: Uuid, form: &EventForm) -> AgendaResult<CalendarEvent> {
        let draft = self.validate(form)?;
        let mut event = self
            .get(id)
            .cloned()
            .ok_or(AgendaError::EventNotFound(id))?;
        event.replace(draft);

        self.persist(self.store.update(&event).await)?;

        if let Some(slot) = self.events.iter_mut().find(|e| e.id() == id) {
            *slot = event.clone();
        }
        sort_events(&mut self.events);
        self.selected = Some(event.date);
        tracing::info!("Updated event: {}", event.title);
        self.notifier.notify(MSG_UPDATED);
        Ok(event)
    }

    pub async fn delete(&mut self, id: Uuid) -> AgendaResult<()> {
        if self.get(id).is_none() {
            return Err(AgendaError::EventNotFound(id));
        }

        self.persist(self.store.delete(id).await)?;

        self.events.retain(|e| e.id() != id);
        if let Some(day) = self.selected {
            if self.events_on(day).next().is_none() {
                self.selected = None;
            }
        }
        tracing::info!("Deleted event: {}", id);
        self.notifier.notify(MSG_DELETED);
        Ok(())
    }

    /// Select a calendar day given as `YYYY-MM-DD`. Returns the display form
    /// used to pre-fill the date field, or an empty string if `iso` is not a
    /// real date (the selection is left unchanged then).
    pub fn select_day(&mut self, iso: &str) -> String {
        if let Some(date) = parse_iso_date(iso) {
            self.selected = Some(date);
        }
        iso_to_display(iso)
    }

    pub fn events_on(&self, date: NaiveDate) -> impl Iterator<Item = &CalendarEvent> {
        self.events.iter().filter(move |e| e.date == date)
    }

    /// Days that have at least one event, for marking the calendar.
    pub fn marked_dates(&self) -> BTreeSet<NaiveDate> {
        self.events.iter().map(|e| e.date).collect()
    }

    fn validate(&self, form: &EventForm) -> AgendaResult<EventDraft> {
        form.validate().map_err(|e| {
            self.notifier.notify(&e.to_string());
            e.into()
        })
    }

    fn persist(&self, result: AgendaResult<()>) -> AgendaResult<()> {
        result.map_err(|e| {
            tracing::warn!("Failed to save events: {}", e);
            self.notifier.notify(MSG_SAVE_FAILED);
            e
        })
    }
}
