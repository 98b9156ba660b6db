//! Runtime configuration read from the environment (and `.env` when the
//! binary loads one).

use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::{AgendaError, AgendaResult};
use crate::notify::NotifierKind;

pub const STORAGE_VAR: &str = "AGENDA_STORAGE";
pub const DATA_DIR_VAR: &str = "AGENDA_DATA_DIR";
pub const REMOTE_URL_VAR: &str = "AGENDA_REMOTE_URL";
pub const REMOTE_KEY_VAR: &str = "AGENDA_REMOTE_KEY";
pub const NOTIFY_VAR: &str = "AGENDA_NOTIFY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageKind {
    #[default]
    Local,
    Remote,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageKind::Local),
            "remote" => Ok(StorageKind::Remote),
            other => Err(format!("Unknown storage '{}'. Use local or remote", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageKind,
    pub data_dir: PathBuf,
    /// Present only when both the URL and the key are set.
    pub remote: Option<RemoteConfig>,
    pub notifier: NotifierKind,
}

impl Config {
    pub fn from_env() -> AgendaResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AgendaResult<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage: StorageKind = match var(STORAGE_VAR) {
            Some(v) => v.parse().map_err(AgendaError::Config)?,
            None => StorageKind::default(),
        };

        let notifier: NotifierKind = match var(NOTIFY_VAR) {
            Some(v) => v.parse().map_err(AgendaError::Config)?,
            None => NotifierKind::default(),
        };

        let data_dir = match var(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let remote = match (var(REMOTE_URL_VAR), var(REMOTE_KEY_VAR)) {
            (Some(url), Some(api_key)) => Some(RemoteConfig { url, api_key }),
            _ => None,
        };

        Ok(Self {
            storage,
            data_dir,
            remote,
            notifier,
        })
    }
}

fn default_data_dir() -> AgendaResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("agenda"))
        .ok_or_else(|| {
            AgendaError::Config(format!(
                "Could not determine data directory; set {}",
                DATA_DIR_VAR
            ))
        })
}
