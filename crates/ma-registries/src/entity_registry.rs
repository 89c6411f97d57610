//! Entity Registry
//!
//! Tracks known entities, their platform and the area they are assigned to.
//! The configuration flows only read from it: they list entity ids, filter
//! them by domain and collect the entities of an area.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ma_core::{EntityId, EntityIdError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::storage::{Storable, Storage, StorageResult};

pub const STORAGE_KEY: &str = "core.entity_registry";
pub const STORAGE_VERSION: u32 = 1;
pub const STORAGE_MINOR_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityRegistryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidEntityId(#[from] EntityIdError),
}

/// Reason an entity was disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledBy {
    Integration,
    User,
}

/// A registered entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEntry {
    /// Internal id
    pub id: String,
    pub entity_id: EntityId,
    /// Integration providing the entity
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<DisabledBy>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl EntityEntry {
    pub fn new(entity_id: EntityId, platform: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ulid::Ulid::new().to_string().to_lowercase(),
            entity_id,
            platform: platform.into(),
            unique_id: None,
            area_id: None,
            device_class: None,
            disabled_by: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn domain(&self) -> &str {
        self.entity_id.domain()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRegistryData {
    pub entities: Vec<EntityEntry>,
}

impl Storable for EntityRegistryData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Entity Registry
///
/// Entries are stored as `Arc<EntityEntry>` to avoid cloning on reads.
pub struct EntityRegistry {
    storage: Arc<Storage>,

    /// Primary index: entity_id -> entry
    by_entity_id: DashMap<String, Arc<EntityEntry>>,

    /// Index: area_id -> entity_ids
    by_area_id: DashMap<String, HashSet<String>>,
}

impl EntityRegistry {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            by_entity_id: DashMap::new(),
            by_area_id: DashMap::new(),
        }
    }

    pub async fn load(&self) -> StorageResult<()> {
        if let Some(file) = self.storage.load::<EntityRegistryData>().await? {
            info!(
                "Loading {} entities from storage (v{}.{})",
                file.data.entities.len(),
                file.version,
                file.minor_version
            );
            for entry in file.data.entities {
                self.index_entry(Arc::new(entry));
            }
        }
        Ok(())
    }

    pub async fn save(&self) -> StorageResult<()> {
        let data = EntityRegistryData {
            entities: self.iter().map(|e| (*e).clone()).collect(),
        };
        self.storage.save(&data).await?;
        debug!("Saved {} entities to storage", data.entities.len());
        Ok(())
    }

    fn index_entry(&self, entry: Arc<EntityEntry>) {
        let key = entry.entity_id.to_string();
        if let Some(ref area_id) = entry.area_id {
            self.by_area_id
                .entry(area_id.clone())
                .or_default()
                .insert(key.clone());
        }
        self.by_entity_id.insert(key, entry);
    }

    fn unindex_entry(&self, entry: &EntityEntry) {
        let key = entry.entity_id.to_string();
        if let Some(ref area_id) = entry.area_id {
            if let Some(mut ids) = self.by_area_id.get_mut(area_id) {
                ids.remove(&key);
            }
        }
        self.by_entity_id.remove(&key);
    }

    /// Register an entity, or return the existing entry for that id
    pub fn register(
        &self,
        entity_id: &str,
        platform: &str,
        area_id: Option<&str>,
    ) -> Result<Arc<EntityEntry>, EntityRegistryError> {
        if let Some(existing) = self.get(entity_id) {
            return Ok(existing);
        }

        let mut entry = EntityEntry::new(entity_id.parse()?, platform);
        entry.area_id = area_id.map(str::to_string);
        let entry = Arc::new(entry);

        debug!("Registered entity {} ({})", entity_id, platform);
        self.index_entry(Arc::clone(&entry));
        Ok(entry)
    }

    pub fn get(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        self.by_entity_id.get(entity_id).map(|r| Arc::clone(r.value()))
    }

    /// Apply a change to an entry and re-index it
    pub fn update<F>(&self, entity_id: &str, f: F) -> Result<Arc<EntityEntry>, EntityRegistryError>
    where
        F: FnOnce(&mut EntityEntry),
    {
        let current = self
            .get(entity_id)
            .ok_or_else(|| EntityRegistryError::NotFound(entity_id.to_string()))?;

        self.unindex_entry(&current);
        let mut entry = (*current).clone();
        f(&mut entry);
        entry.modified_at = Utc::now();

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        Ok(entry)
    }

    /// Move an entity to another area (or out of any area)
    pub fn assign_area(
        &self,
        entity_id: &str,
        area_id: Option<&str>,
    ) -> Result<Arc<EntityEntry>, EntityRegistryError> {
        self.update(entity_id, |e| e.area_id = area_id.map(str::to_string))
    }

    pub fn remove(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        let entry = self.get(entity_id)?;
        self.unindex_entry(&entry);
        Some(entry)
    }

    /// Entities assigned to an area
    pub fn get_by_area_id(&self, area_id: &str) -> Vec<Arc<EntityEntry>> {
        self.by_area_id
            .get(area_id)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// All entity ids, sorted
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.by_entity_id.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Sorted entity ids whose domain is one of `domains`
    pub fn entity_ids_in_domains(&self, domains: &[&str]) -> Vec<String> {
        let mut ids: Vec<String> = self
            .by_entity_id
            .iter()
            .filter(|r| r.value().entity_id.in_domains(domains))
            .map(|r| r.key().clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.by_entity_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Arc<EntityEntry>> + '_ {
        self.by_entity_id.iter().map(|r| Arc::clone(r.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry() -> (TempDir, EntityRegistry) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(dir.path()));
        (dir, EntityRegistry::new(storage))
    }

    #[test]
    fn test_register_is_idempotent() {
        let (_dir, reg) = registry();
        let first = reg.register("light.kitchen", "hue", Some("kitchen")).unwrap();
        let second = reg.register("light.kitchen", "hue", None).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.area_id.as_deref(), Some("kitchen"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_register_rejects_invalid_id() {
        let (_dir, reg) = registry();
        assert!(matches!(
            reg.register("Kitchen Light", "hue", None),
            Err(EntityRegistryError::InvalidEntityId(_))
        ));
    }

    #[test]
    fn test_area_index_follows_assignment() {
        let (_dir, reg) = registry();
        reg.register("light.kitchen", "hue", Some("kitchen")).unwrap();
        reg.register("sensor.kitchen_temp", "zha", Some("kitchen")).unwrap();
        assert_eq!(reg.get_by_area_id("kitchen").len(), 2);

        reg.assign_area("light.kitchen", Some("hallway")).unwrap();
        assert_eq!(reg.get_by_area_id("kitchen").len(), 1);
        assert_eq!(reg.get_by_area_id("hallway").len(), 1);

        assert!(matches!(
            reg.assign_area("light.missing", None),
            Err(EntityRegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_domain_filter_sorted() {
        let (_dir, reg) = registry();
        for id in ["switch.fan", "light.b", "light.a", "sun.sun", "climate.hvac"] {
            reg.register(id, "demo", None).unwrap();
        }
        assert_eq!(
            reg.entity_ids_in_domains(&["light", "sun"]),
            vec!["light.a", "light.b", "sun.sun"]
        );
        assert_eq!(reg.entity_ids().first().map(String::as_str), Some("climate.hvac"));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(dir.path()));

        let reg = EntityRegistry::new(storage.clone());
        reg.register("media_player.tv", "cast", Some("living_room"))
            .unwrap();
        reg.save().await.unwrap();

        let reloaded = EntityRegistry::new(storage);
        reloaded.load().await.unwrap();
        let entry = reloaded.get("media_player.tv").unwrap();
        assert_eq!(entry.domain(), "media_player");
        assert_eq!(reloaded.get_by_area_id("living_room").len(), 1);
    }
}
