//! Hosted event table reached through a PostgREST-style HTTP API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::{format_time, parse_iso_date, parse_time, to_iso};
use crate::error::{AgendaError, AgendaResult};
use crate::event::{CalendarEvent, EventDraft};
use crate::store::EventStore;

const EVENTS_TABLE: &str = "events";

/// Row layout of the hosted `events` table. Columns the server fills in
/// (owner, creation time) are ignored on read and never sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub all_day: bool,
}

impl From<&CalendarEvent> for EventRow {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id(),
            title: event.title.clone(),
            description: event.description.clone(),
            date: to_iso(event.date),
            start_time: event.time.map(format_time),
            end_time: event.end_time.map(format_time),
            all_day: event.all_day,
        }
    }
}

/// Database `time` columns come back as `HH:MM:SS`; `HH:MM` is accepted too.
fn parse_row_time(raw: &str) -> Option<chrono::NaiveTime> {
    match raw.len() {
        5 => parse_time(raw),
        8 => {
            let seconds = &raw.as_bytes()[5..];
            if seconds[0] != b':' || !seconds[1..].iter().all(u8::is_ascii_digit) {
                return None;
            }
            parse_time(raw.get(..5)?)
        }
        _ => None,
    }
}

impl TryFrom<EventRow> for CalendarEvent {
    type Error = AgendaError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let date = parse_iso_date(&row.date)
            .ok_or_else(|| AgendaError::MalformedEvent(format!("{}: date '{}'", row.id, row.date)))?;

        let time_of = |raw: Option<String>| -> AgendaResult<Option<chrono::NaiveTime>> {
            match raw.as_deref() {
                None | Some("") => Ok(None),
                Some(t) => parse_row_time(t)
                    .map(Some)
                    .ok_or_else(|| AgendaError::MalformedEvent(format!("{}: time '{}'", row.id, t))),
            }
        };

        let (time, end_time) = if row.all_day {
            (None, None)
        } else {
            let start = time_of(row.start_time)?;
            let end = time_of(row.end_time)?.filter(|end| start.is_some_and(|s| *end >= s));
            (start, end)
        };

        CalendarEvent::restore(
            row.id,
            EventDraft {
                title: row.title,
                description: row.description.filter(|s| !s.is_empty()),
                date,
                time,
                end_time,
                all_day: row.all_day,
            },
        )
    }
}

#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, EVENTS_TABLE)
    }

    fn row_url(&self, id: Uuid) -> String {
        format!("{}?id=eq.{}", self.table_url(), id)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AgendaResult<reqwest::Response> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgendaError::Remote { status, body });
        }

        Ok(response)
    }
}

impl EventStore for RemoteStore {
    async fn list(&self) -> AgendaResult<Vec<CalendarEvent>> {
        let url = format!(
            "{}?select=*&order=date.asc,start_time.asc",
            self.table_url()
        );
        let rows: Vec<serde_json::Value> = self
            .send(self.request(reqwest::Method::GET, &url))
            .await?
            .json()
            .await?;

        let mut events = Vec::with_capacity(rows.len());
        for value in rows {
            let parsed = serde_json::from_value::<EventRow>(value)
                .map_err(AgendaError::from)
                .and_then(CalendarEvent::try_from);
            match parsed {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!("Skipping row due to parse error: {}", e);
                }
            }
        }

        tracing::debug!("Fetched {} events from remote store", events.len());
        Ok(events)
    }

    async fn insert(&self, event: &CalendarEvent) -> AgendaResult<()> {
        let request = self
            .request(reqwest::Method::POST, &self.table_url())
            .json(&EventRow::from(event));
        self.send(request).await?;
        tracing::debug!("Inserted remote event {}", event.id());
        Ok(())
    }

    async fn update(&self, event: &CalendarEvent) -> AgendaResult<()> {
        let request = self
            .request(reqwest::Method::PATCH, &self.row_url(event.id()))
            .header("Prefer", "return=representation")
            .json(&EventRow::from(event));
        let updated: Vec<serde_json::Value> = self.send(request).await?.json().await?;
        if updated.is_empty() {
            return Err(AgendaError::EventNotFound(event.id()));
        }
        tracing::debug!("Updated remote event {}", event.id());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AgendaResult<()> {
        let request = self
            .request(reqwest::Method::DELETE, &self.row_url(id))
            .header("Prefer", "return=representation");
        let deleted: Vec<serde_json::Value> = self.send(request).await?.json().await?;
        if deleted.is_empty() {
            return Err(AgendaError::EventNotFound(id));
        }
        tracing::debug!("Deleted remote event {}", id);
        Ok(())
    }
}
