//! Entity lists offered by the options flow

use ma_core::domains::{CONFIG_FLOW_ENTITY_FILTER_EXT, LIGHT, MEDIA_PLAYER};
use ma_core::{conf, split_domain};
use serde_json::Value;

use crate::area::MagicArea;
use crate::Map;

/// Sorted entity ids captured once when an options flow starts
///
/// Later registry changes are not reflected until a new flow is started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Every known entity in the selectable domains
    pub all_entities: Vec<String>,
    /// The area's own entities in the selectable domains
    pub area_entities: Vec<String>,
    /// The area's entities plus the ones currently excluded from it
    pub all_area_entities: Vec<String>,
    pub all_lights: Vec<String>,
    pub all_media_players: Vec<String>,
}

impl EntitySnapshot {
    pub fn capture<S: AsRef<str>>(
        known_entity_ids: &[S],
        area: &MagicArea,
        saved_options: &Map,
    ) -> Self {
        let mut all_entities: Vec<String> = known_entity_ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| {
                split_domain(id).is_some_and(|d| CONFIG_FLOW_ENTITY_FILTER_EXT.contains(&d))
            })
            .map(str::to_string)
            .collect();
        all_entities.sort();

        let mut area_entities: Vec<String> = CONFIG_FLOW_ENTITY_FILTER_EXT
            .iter()
            .flat_map(|domain| area.entities_in(domain).iter().cloned())
            .collect();
        area_entities.sort();

        let mut all_area_entities = area_entities.clone();
        all_area_entities.extend(
            saved_options
                .get(conf::EXCLUDE_ENTITIES)
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(str::to_string),
        );
        all_area_entities.sort();
        all_area_entities.dedup();

        Self {
            all_entities,
            area_entities,
            all_area_entities,
            all_lights: area.entities_in(LIGHT).to_vec(),
            all_media_players: area.entities_in(MEDIA_PLAYER).to_vec(),
        }
    }
}
