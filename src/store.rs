//! Persistence seam for the agenda.

use uuid::Uuid;

use crate::config::{Config, StorageKind};
use crate::error::{AgendaError, AgendaResult};
use crate::event::CalendarEvent;
use crate::local_store::{FileKeyValueStore, LocalStore};
use crate::remote_store::RemoteStore;

/// Where events live. Every operation may fail; callers decide how to
/// surface that.
#[allow(async_fn_in_trait)]
pub trait EventStore {
    /// All events, ordered by date then start time.
    async fn list(&self) -> AgendaResult<Vec<CalendarEvent>>;
    async fn insert(&self, event: &CalendarEvent) -> AgendaResult<()>;
    /// Replace the stored event with the same id.
    async fn update(&self, event: &CalendarEvent) -> AgendaResult<()>;
    async fn delete(&self, id: Uuid) -> AgendaResult<()>;
}

/// The single storage strategy picked from configuration at startup.
#[derive(Debug)]
pub enum Backend {
    Local(LocalStore<FileKeyValueStore>),
    Remote(RemoteStore),
}

impl Backend {
    pub fn from_config(config: &Config) -> AgendaResult<Self> {
        match config.storage {
            StorageKind::Local => {
                tracing::info!("Using local store in {}", config.data_dir.display());
                Ok(Backend::Local(LocalStore::new(FileKeyValueStore::new(
                    &config.data_dir,
                ))))
            }
            StorageKind::Remote => {
                let remote = config.remote.as_ref().ok_or_else(|| {
                    AgendaError::Config(
                        "remote storage needs AGENDA_REMOTE_URL and AGENDA_REMOTE_KEY".into(),
                    )
                })?;
                tracing::info!("Using remote store at {}", remote.url);
                Ok(Backend::Remote(RemoteStore::new(&remote.url, &remote.api_key)))
            }
        }
    }
}

impl EventStore for Backend {
    async fn list(&self) -> AgendaResult<Vec<CalendarEvent>> {
        match self {
            Backend::Local(store) => store.list().await,
            Backend::Remote(store) => store.list().await,
        }
    }

    async fn insert(&self, event: &CalendarEvent) -> AgendaResult<()> {
        match self {
            Backend::Local(store) => store.insert(event).await,
            Backend::Remote(store) => store.insert(event).await,
        }
    }

    async fn update(&self, event: &CalendarEvent) -> AgendaResult<()> {
        match self {
            Backend::Local(store) => store.update(event).await,
            Backend::Remote(store) => store.update(event).await,
        }
    }

    async fn delete(&self, id: Uuid) -> AgendaResult<()> {
        match self {
            Backend::Local(store) => store.delete(id).await,
            Backend::Remote(store) => store.delete(id).await,
        }
    }
}
