//! On-device persistence: the whole event list is one JSON string stored
//! under a fixed key of a plain key-value store.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};
use crate::event::{sort_events, CalendarEvent};
use crate::store::EventStore;

pub const EVENTS_KEY: &str = "agenda_events_v1";

/// Opaque string key-value storage.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> AgendaResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AgendaResult<()>;
}

/// One file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> AgendaResult<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> AgendaResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        // Write then rename so a crash never leaves half a list behind.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> AgendaResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AgendaResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Event list kept as JSON under [`EVENTS_KEY`].
#[derive(Debug)]
pub struct LocalStore<K> {
    kv: K,
}

impl<K: KeyValueStore> LocalStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Entries that fail the event invariants, and repeats of an id already
    /// read, are skipped with a warning. A list that is not JSON at all is
    /// an error.
    async fn read_all(&self) -> AgendaResult<Vec<CalendarEvent>> {
        let raw = match self.kv.get(EVENTS_KEY).await? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(Vec::new()),
        };
        let entries: Vec<serde_json::Value> = serde_json::from_str(&raw)?;

        let mut seen = HashSet::new();
        let mut events = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<CalendarEvent>(entry) {
                Ok(event) if seen.insert(event.id()) => events.push(event),
                Ok(event) => {
                    tracing::warn!("Skipping stored event with duplicate id {}", event.id());
                }
                Err(e) => {
                    tracing::warn!("Skipping stored event due to parse error: {}", e);
                }
            }
        }

        Ok(events)
    }

    async fn write_all(&self, events: &mut [CalendarEvent]) -> AgendaResult<()> {
        sort_events(events);
        let raw = serde_json::to_string(events)?;
        self.kv.set(EVENTS_KEY, &raw).await
    }
}

impl<K: KeyValueStore> EventStore for LocalStore<K> {
    async fn list(&self) -> AgendaResult<Vec<CalendarEvent>> {
        let mut events = self.read_all().await?;
        sort_events(&mut events);
        tracing::debug!("Loaded {} events from local store", events.len());
        Ok(events)
    }

    async fn insert(&self, event: &CalendarEvent) -> AgendaResult<()> {
        let mut events = self.read_all().await?;
        events.push(event.clone());
        self.write_all(&mut events).await
    }

    async fn update(&self, event: &CalendarEvent) -> AgendaResult<()> {
        let mut events = self.read_all().await?;
        let slot = events
            .iter_mut()
            .find(|e| e.id() == event.id())
            .ok_or(AgendaError::EventNotFound(event.id()))?;
        *slot = event.clone();
        self.write_all(&mut events).await
    }

    async fn delete(&self, id: Uuid) -> AgendaResult<()> {
        let mut events = self.read_all().await?;
        let before = events.len();
        events.retain(|e| e.id() != id);
        if events.len() == before {
            return Err(AgendaError::EventNotFound(id));
        }
        self.write_all(&mut events).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventForm;

    fn event(title: &str, date: &str, time: &str) -> CalendarEvent {
        let form = EventForm {
            title: title.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            ..Default::default()
        };
        CalendarEvent::create(form.validate().unwrap())
    }

    #[tokio::test]
    async fn test_missing_key_is_empty_agenda() {
        let store = LocalStore::new(MemoryKeyValueStore::new());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_keeps_list_sorted() {
        let store = LocalStore::new(MemoryKeyValueStore::new());
        store.insert(&event("late", "02/01/2025", "08:00")).await.unwrap();
        store.insert(&event("early", "01/01/2025", "23:00")).await.unwrap();

        let titles: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["early", "late"]);

        let raw = store.kv.get(EVENTS_KEY).await.unwrap().unwrap();
        assert!(raw.find("early").unwrap() < raw.find("late").unwrap());
    }

    #[tokio::test]
    async fn test_update_and_delete_by_id() {
        let store = LocalStore::new(MemoryKeyValueStore::new());
        let mut ev = event("gym", "01/01/2025", "07:00");
        store.insert(&ev).await.unwrap();

        ev.title = "swim".to_string();
        store.update(&ev).await.unwrap();
        assert_eq!(store.list().await.unwrap()[0].title, "swim");

        store.delete(ev.id()).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        assert!(matches!(store.update(&ev).await, Err(AgendaError::EventNotFound(id)) if id == ev.id()));
        assert!(matches!(store.delete(ev.id()).await, Err(AgendaError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_list_is_an_error() {
        let kv = MemoryKeyValueStore::new();
        kv.set(EVENTS_KEY, "{not json").await.unwrap();
        let store = LocalStore::new(kv);
        assert!(matches!(store.list().await, Err(AgendaError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_stored_entries_breaking_invariants_are_skipped() {
        let kv = MemoryKeyValueStore::new();
        let id = "7d444840-9dc0-11d1-b245-5ffdce74fad2";
        let raw = format!(
            r#"[
                {{"id":"{id}","title":"kept","date":"2025-01-02","time":"09:00"}},
                {{"id":"{id}","title":"dup","date":"2025-01-01","time":"07:00"}},
                {{"id":"0b7c4c1e-2f55-4d0e-8a3c-9d5f6e7a8b90","title":"   ","date":"2025-01-02","allDay":true,"time":"10:00","endTime":"08:00"}},
                {{"id":"1c8d5d2f-3a66-4e1f-9b4d-0e6a7f8b9ca1","title":"x","date":"2025-01-02","endTime":"08:00"}},
                {{"id":"2d9e6e3a-4b77-4f2a-8c5e-1f7b8a9cadb2","title":"holiday","date":"2025-01-02","allDay":true}}
            ]"#
        );
        kv.set(EVENTS_KEY, &raw).await.unwrap();
        let store = LocalStore::new(kv);

        let events = store.list().await.unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["holiday", "kept"]);
        assert_eq!(events[1].id().to_string(), id);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKeyValueStore::new(dir.path().join("nested"));
        assert_eq!(kv.get("@agenda/events").await.unwrap(), None);

        kv.set("@agenda/events", "[]").await.unwrap();
        assert_eq!(kv.get("@agenda/events").await.unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested").join("_agenda_events.json").exists());
    }

    #[tokio::test]
    async fn test_file_backed_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(FileKeyValueStore::new(dir.path()));
        let ev = event("review", "2025-03-10", "15:30");
        store.insert(&ev).await.unwrap();

        let reopened = LocalStore::new(FileKeyValueStore::new(dir.path()));
        assert_eq!(reopened.list().await.unwrap(), vec![ev]);
    }
}
