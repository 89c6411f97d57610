//! Area Registry
//!
//! Rooms and zones known to the home. Names are looked up case-insensitively.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::{Storable, Storage, StorageResult};

pub const STORAGE_KEY: &str = "core.area_registry";
pub const STORAGE_VERSION: u32 = 1;
pub const STORAGE_MINOR_VERSION: u32 = 1;

/// A registered area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaEntry {
    /// Slug of the name at creation time
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl AreaEntry {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: ma_core::slugify(&name),
            name,
            icon: None,
            floor_id: None,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Normalize a name for lookups
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaRegistryData {
    pub areas: Vec<AreaEntry>,
}

impl Storable for AreaRegistryData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

pub struct AreaRegistry {
    storage: Arc<Storage>,

    /// Primary index: area_id -> entry
    by_id: DashMap<String, Arc<AreaEntry>>,

    /// Index: normalized name -> area_id
    by_name: DashMap<String, String>,
}

impl AreaRegistry {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            by_id: DashMap::new(),
            by_name: DashMap::new(),
        }
    }

    pub async fn load(&self) -> StorageResult<()> {
        if let Some(file) = self.storage.load::<AreaRegistryData>().await? {
            info!(
                "Loading {} areas from storage (v{}.{})",
                file.data.areas.len(),
                file.version,
                file.minor_version
            );
            for entry in file.data.areas {
                self.index_entry(Arc::new(entry));
            }
        }
        Ok(())
    }

    pub async fn save(&self) -> StorageResult<()> {
        let data = AreaRegistryData {
            areas: self.iter().map(|a| (*a).clone()).collect(),
        };
        self.storage.save(&data).await?;
        debug!("Saved {} areas to storage", data.areas.len());
        Ok(())
    }

    fn index_entry(&self, entry: Arc<AreaEntry>) {
        self.by_name
            .insert(normalize_name(&entry.name), entry.id.clone());
        self.by_id.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, area_id: &str) -> Option<Arc<AreaEntry>> {
        self.by_id.get(area_id).map(|r| Arc::clone(r.value()))
    }

    /// Case-insensitive lookup by name
    pub fn get_by_name(&self, name: &str) -> Option<Arc<AreaEntry>> {
        let area_id = self.by_name.get(&normalize_name(name))?.value().clone();
        self.get(&area_id)
    }

    /// Create an area, or return the one that already has this name
    pub fn create(&self, name: &str) -> Arc<AreaEntry> {
        if let Some(existing) = self.get_by_name(name) {
            return existing;
        }
        let entry = Arc::new(AreaEntry::new(name));
        info!("Created area: {} ({})", name, entry.id);
        self.index_entry(Arc::clone(&entry));
        entry
    }

    pub fn remove(&self, area_id: &str) -> Option<Arc<AreaEntry>> {
        let (_, entry) = self.by_id.remove(area_id)?;
        self.by_name.remove(&normalize_name(&entry.name));
        info!("Removed area: {}", area_id);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Arc<AreaEntry>> + '_ {
        self.by_id.iter().map(|r| Arc::clone(r.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_ignores_case() {
        let dir = TempDir::new().unwrap();
        let reg = AreaRegistry::new(Arc::new(Storage::new(dir.path())));

        let kitchen = reg.create("Kitchen");
        assert_eq!(kitchen.id, "kitchen");
        assert_eq!(reg.get_by_name("KITCHEN").unwrap().id, "kitchen");
        assert_eq!(reg.get_by_name(" kitchen ").unwrap().name, "Kitchen");
        assert!(reg.get_by_name("Pantry").is_none());
    }

    #[test]
    fn test_create_existing_name_returns_same_area() {
        let dir = TempDir::new().unwrap();
        let reg = AreaRegistry::new(Arc::new(Storage::new(dir.path())));

        let a = reg.create("Living Room");
        let b = reg.create("living room");
        assert_eq!(a.id, b.id);
        assert_eq!(reg.len(), 1);

        reg.remove(&a.id).unwrap();
        assert!(reg.is_empty());
        assert!(reg.get_by_name("Living Room").is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(dir.path()));

        let reg = AreaRegistry::new(storage.clone());
        reg.create("Garden");
        reg.save().await.unwrap();

        let reloaded = AreaRegistry::new(storage);
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.get("garden").unwrap().name, "Garden");
    }
}
