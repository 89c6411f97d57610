//! Config Entries
//!
//! A config entry is one configured instance of the integration; for Magic
//! Areas there is one entry per area, identified by the area name as its
//! unique id. Entries carry the creation-time `data` and the user-editable
//! `options` written by the options flow.
//!
//! Entries are persisted in `.storage/core.config_entries`.

pub mod entry;
pub mod manager;

pub use entry::{ConfigEntry, ConfigEntrySource, ConfigEntryUpdate};

pub use manager::{
    ConfigEntries, ConfigEntriesData, ConfigEntriesError, ConfigEntriesResult, STORAGE_KEY,
    STORAGE_MINOR_VERSION, STORAGE_VERSION,
};

/// Mapping type for entry data and options
pub type Map = serde_json::Map<String, serde_json::Value>;
