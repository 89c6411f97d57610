//! Area and entity registries backing the Magic Areas flows.
//!
//! The flows only read from them: which entities sit in an area, and
//! which areas exist. Both persist as versioned JSON under `.storage/`.

pub mod area_registry;
pub mod entity_registry;
pub mod storage;

use std::path::Path;
use std::sync::Arc;

pub use area_registry::{AreaEntry, AreaRegistry, AreaRegistryData};
pub use entity_registry::{
    DisabledBy, EntityEntry, EntityRegistry, EntityRegistryData, EntityRegistryError,
};
pub use storage::{Storable, Storage, StorageError, StorageFile, StorageResult};

/// The two registries sharing one `.storage/` directory
pub struct Registries {
    pub storage: Arc<Storage>,
    pub entities: EntityRegistry,
    pub areas: AreaRegistry,
}

impl Registries {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self::with_storage(Arc::new(Storage::new(config_dir)))
    }

    pub fn with_storage(storage: Arc<Storage>) -> Self {
        Self {
            entities: EntityRegistry::new(Arc::clone(&storage)),
            areas: AreaRegistry::new(Arc::clone(&storage)),
            storage,
        }
    }

    /// Load both registries; a missing file leaves that registry empty
    pub async fn load_all(&self) -> StorageResult<()> {
        self.areas.load().await?;
        self.entities.load().await
    }

    pub async fn save_all(&self) -> StorageResult<()> {
        self.areas.save().await?;
        self.entities.save().await
    }
}
