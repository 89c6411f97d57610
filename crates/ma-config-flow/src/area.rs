//! The area an options flow is configuring

use std::collections::BTreeMap;

use ma_config_entries::{ConfigEntries, ConfigEntry};
use ma_core::{conf, slugify, split_domain, AreaType, DOMAIN, META_AREA_GLOBAL};
use ma_registries::Registries;
use serde_json::Value;
use tracing::debug;

use crate::Map;

/// An area with its effective configuration and member entities
#[derive(Debug, Clone)]
pub struct MagicArea {
    /// Slug of the name
    pub id: String,
    pub name: String,
    pub area_type: AreaType,
    /// Entry data with the entry's options applied on top
    pub config: Map,
    /// Member entity ids by domain, each list sorted
    pub entities: BTreeMap<String, Vec<String>>,
}

impl MagicArea {
    pub fn new(name: impl Into<String>, area_type: AreaType, config: Map) -> Self {
        let name = name.into();
        Self {
            id: slugify(&name),
            name,
            area_type,
            config,
            entities: BTreeMap::new(),
        }
    }

    pub fn with_entities<I, S>(mut self, entity_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for entity_id in entity_ids {
            let entity_id = entity_id.into();
            let Some(domain) = split_domain(&entity_id).map(str::to_string) else {
                continue;
            };
            self.entities.entry(domain).or_default().push(entity_id);
        }
        for ids in self.entities.values_mut() {
            ids.sort();
            ids.dedup();
        }
        self
    }

    pub fn is_meta(&self) -> bool {
        self.area_type == AreaType::Meta
    }

    /// The meta area spanning every other area
    pub fn is_global(&self) -> bool {
        self.id == META_AREA_GLOBAL.to_lowercase()
    }

    /// Member entities of one domain
    pub fn entities_in(&self, domain: &str) -> &[String] {
        self.entities.get(domain).map(Vec::as_slice).unwrap_or_default()
    }

    /// Build the area for a config entry.
    ///
    /// Regular areas take the registry entities assigned to the registry area
    /// of the same name (case-insensitive). Meta areas take the entities of
    /// every regular area of their kind; the global area takes all of them.
    /// In both cases `include_entities` are added and `exclude_entities`
    /// removed.
    pub fn from_entry(
        entry: &ConfigEntry,
        registries: &Registries,
        entries: &ConfigEntries,
    ) -> Self {
        let config = effective_config(entry);
        let name = config
            .get(conf::NAME)
            .and_then(Value::as_str)
            .unwrap_or(&entry.title)
            .to_string();
        let area_type = area_type_of(&config);

        let area = MagicArea::new(name, area_type, config);
        let members = if area.is_meta() {
            area.meta_members(registries, entries)
        } else {
            regular_members(&area.name, &area.config, registries)
        };

        debug!(
            "Loaded area {} ({}) with {} entities",
            area.name,
            area.area_type,
            members.len()
        );
        area.with_entities(members)
    }

    fn meta_members(&self, registries: &Registries, entries: &ConfigEntries) -> Vec<String> {
        let mut members = Vec::new();
        for child in entries.get_by_domain(DOMAIN) {
            let config = effective_config(&child);
            let child_type = area_type_of(&config);
            if child_type == AreaType::Meta {
                continue;
            }
            if !self.is_global() && child_type.as_str() != self.id {
                continue;
            }
            let name = config
                .get(conf::NAME)
                .and_then(Value::as_str)
                .unwrap_or(&child.title);
            members.extend(regular_members(name, &config, registries));
        }
        remove_excluded(members, &self.config)
    }
}

fn effective_config(entry: &ConfigEntry) -> Map {
    let mut config = entry.data.clone();
    config.extend(entry.options.clone());
    config
}

fn area_type_of(config: &Map) -> AreaType {
    config
        .get(conf::TYPE)
        .and_then(Value::as_str)
        .and_then(AreaType::parse)
        .unwrap_or_default()
}

fn string_list<'a>(config: &'a Map, key: &str) -> impl Iterator<Item = &'a str> {
    config
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

fn regular_members(name: &str, config: &Map, registries: &Registries) -> Vec<String> {
    let mut members: Vec<String> = registries
        .areas
        .get_by_name(name)
        .map(|area| {
            registries
                .entities
                .get_by_area_id(&area.id)
                .into_iter()
                .filter(|e| !e.is_disabled())
                .map(|e| e.entity_id.to_string())
                .collect()
        })
        .unwrap_or_default();

    members.extend(string_list(config, conf::INCLUDE_ENTITIES).map(str::to_string));
    remove_excluded(members, config)
}

fn remove_excluded(mut members: Vec<String>, config: &Map) -> Vec<String> {
    let excluded: Vec<&str> = string_list(config, conf::EXCLUDE_ENTITIES).collect();
    members.retain(|id| !excluded.contains(&id.as_str()));
    members
}
