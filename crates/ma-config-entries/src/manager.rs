//! In-memory store of config entries, written back to
//! `.storage/core.config_entries` after each change.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use ma_registries::{Storable, Storage, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::entry::{ConfigEntry, ConfigEntryUpdate};

pub const STORAGE_KEY: &str = "core.config_entries";
pub const STORAGE_VERSION: u32 = 1;
pub const STORAGE_MINOR_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("no config entry with id {0}")]
    NotFound(String),

    /// Two entries of one domain may not share a unique id
    #[error("{domain} already has an entry for '{unique_id}'")]
    AlreadyExists { domain: String, unique_id: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

/// On-disk document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigEntriesData {
    pub entries: Vec<ConfigEntry>,
}

impl Storable for ConfigEntriesData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

type UniqueKey = (String, String);

fn unique_key(entry: &ConfigEntry) -> Option<UniqueKey> {
    entry
        .unique_id
        .as_ref()
        .map(|unique_id| (entry.domain.clone(), unique_id.clone()))
}

pub struct ConfigEntries {
    storage: Arc<Storage>,
    entries: DashMap<String, ConfigEntry>,
    /// (domain, unique_id) -> entry_id
    unique_ids: DashMap<UniqueKey, String>,
}

impl ConfigEntries {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            entries: DashMap::new(),
            unique_ids: DashMap::new(),
        }
    }

    pub async fn load(&self) -> StorageResult<()> {
        let Some(file) = self.storage.load::<ConfigEntriesData>().await? else {
            debug!("No stored config entries");
            return Ok(());
        };
        info!(
            "Restoring {} config entries (format v{}.{})",
            file.data.entries.len(),
            file.version,
            file.minor_version
        );
        for entry in file.data.entries {
            self.put(entry);
        }
        Ok(())
    }

    /// Write every entry, oldest first
    pub async fn save(&self) -> StorageResult<()> {
        let data = ConfigEntriesData {
            entries: oldest_first(self.iter().collect()),
        };
        self.storage.save(&data).await?;
        debug!("Stored {} config entries", data.entries.len());
        Ok(())
    }

    fn put(&self, entry: ConfigEntry) {
        if let Some(key) = unique_key(&entry) {
            self.unique_ids.insert(key, entry.entry_id.clone());
        }
        self.entries.insert(entry.entry_id.clone(), entry);
    }

    fn take(&self, entry_id: &str) -> Option<ConfigEntry> {
        let (_, entry) = self.entries.remove(entry_id)?;
        if let Some(key) = unique_key(&entry) {
            self.unique_ids.remove(&key);
        }
        Some(entry)
    }

    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|e| e.value().clone())
    }

    /// Entries of a domain, oldest first
    pub fn get_by_domain(&self, domain: &str) -> Vec<ConfigEntry> {
        oldest_first(self.iter().filter(|e| e.domain == domain).collect())
    }

    pub fn get_by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        let key = (domain.to_string(), unique_id.to_string());
        let entry_id = self.unique_ids.get(&key)?.value().clone();
        self.get(&entry_id)
    }

    /// Store a new entry; its `(domain, unique_id)` must be free
    pub async fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        if let Some((domain, unique_id)) = unique_key(&entry) {
            if self.get_by_unique_id(&domain, &unique_id).is_some() {
                return Err(ConfigEntriesError::AlreadyExists { domain, unique_id });
            }
        }

        self.put(entry.clone());
        self.save().await?;
        info!("Created {} entry '{}' ({})", entry.domain, entry.title, entry.entry_id);
        Ok(entry)
    }

    /// Apply `update` to an entry, keeping its id
    pub async fn update(
        &self,
        entry_id: &str,
        update: ConfigEntryUpdate,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let mut entry = self
            .take(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        entry.title = update.title.unwrap_or(entry.title);
        entry.data = update.data.unwrap_or(entry.data);
        entry.options = update.options.unwrap_or(entry.options);
        entry.modified_at = Utc::now();

        self.put(entry.clone());
        self.save().await?;
        debug!("Changed entry {}", entry_id);
        Ok(entry)
    }

    pub async fn remove(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .take(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        self.save().await?;
        info!("Deleted {} entry '{}' ({})", entry.domain, entry.title, entry_id);
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ConfigEntry> + '_ {
        self.entries.iter().map(|e| e.value().clone())
    }
}

fn oldest_first(mut entries: Vec<ConfigEntry>) -> Vec<ConfigEntry> {
    entries.sort_by_key(|e| e.created_at);
    entries
}
