//! End-to-end options flow tests
//!
//! Each test imports areas the way `configuration.yaml` would, then walks
//! the options flow through the manager the way the frontend does.

use std::sync::Arc;

use ma_config_entries::{ConfigEntries, ConfigEntrySource};
use ma_config_flow::{ConfigFlowHandler, FlowManager, FlowResult, FlowResultType};
use ma_core::DOMAIN;
use ma_registries::Registries;
use serde_json::{json, Value};
use tempfile::TempDir;

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    _dir: TempDir,
    manager: FlowManager,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let registries = Arc::new(Registries::new(dir.path()));
        let entries = Arc::new(ConfigEntries::new(registries.storage.clone()));

        let kitchen = registries.areas.create("Kitchen");
        let bedroom = registries.areas.create("Bedroom");
        for (entity_id, area) in [
            ("light.kitchen_ceiling", &kitchen.id),
            ("light.kitchen_counter", &kitchen.id),
            ("binary_sensor.kitchen_motion", &kitchen.id),
            ("media_player.kitchen_speaker", &kitchen.id),
            ("light.bedroom_lamp", &bedroom.id),
            ("binary_sensor.bedroom_motion", &bedroom.id),
        ] {
            registries
                .entities
                .register(entity_id, "test", Some(area.as_str()))
                .unwrap();
        }
        registries
            .entities
            .register("input_boolean.night_mode", "input_boolean", None)
            .unwrap();

        Self {
            _dir: dir,
            manager: FlowManager::new(entries, registries),
        }
    }

    /// Import an area and return its entry id
    async fn import(&self, data: Value) -> String {
        let result = self
            .manager
            .start_flow(DOMAIN, ConfigEntrySource::Import, Some(data))
            .await
            .unwrap();
        assert_eq!(result.result_type, FlowResultType::CreateEntry);
        result.result.unwrap()["entry_id"].as_str().unwrap().to_string()
    }

    async fn start(&self, entry_id: &str) -> FlowResult {
        self.manager.start_options_flow(entry_id).await.unwrap()
    }

    async fn submit(&self, flow_id: &str, input: Value) -> FlowResult {
        self.manager
            .progress_flow(flow_id, Some(input))
            .await
            .unwrap()
    }

    fn options(&self, entry_id: &str) -> serde_json::Map<String, Value> {
        self.manager.entries().get(entry_id).unwrap().options
    }
}

fn default_of(result: &FlowResult, field: &str) -> Value {
    result
        .data_schema
        .iter()
        .find(|f| f.name == field)
        .and_then(|f| f.default.clone())
        .unwrap_or_else(|| panic!("no field {} in {:?}", field, result.step_id))
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_kitchen_light_groups_and_aggregates() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Kitchen"})).await;

    let result = h.start(&entry_id).await;
    let flow_id = result.flow_id.clone();
    assert_eq!(result.step_id.as_deref(), Some("area_config"));

    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(result.step_id.as_deref(), Some("secondary_states"));

    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(result.step_id.as_deref(), Some("select_features"));

    let mut visited = Vec::new();
    let mut result = h
        .submit(&flow_id, json!({"light_groups": true, "aggregates": true}))
        .await;
    while result.result_type == FlowResultType::Form {
        let step_id = result.step_id.clone().unwrap();
        assert!(step_id.starts_with("feature_conf_"), "unexpected step {}", step_id);
        // Nothing is stored until the last step
        assert!(h.options(&entry_id).is_empty());
        visited.push(step_id);
        result = h.submit(&flow_id, json!({})).await;
    }

    visited.sort();
    assert_eq!(
        visited,
        vec!["feature_conf_aggregates", "feature_conf_light_groups"]
    );
    assert_eq!(result.result_type, FlowResultType::CreateEntry);
    assert_eq!(result.title.as_deref(), Some(""));

    let features = h.options(&entry_id)["features"].clone();
    let keys: Vec<&String> = features.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(features["aggregates"]["aggregates_min_entities"], json!(2));
    assert_eq!(features["light_groups"]["overhead_lights_states"], json!(["occupied"]));
}

#[tokio::test]
async fn test_global_meta_area_skips_secondary_states() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Global", "type": "meta"})).await;

    let result = h.start(&entry_id).await;
    let flow_id = result.flow_id.clone();
    let fields: Vec<&str> = result.data_schema.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        fields,
        vec!["exclude_entities", "update_interval", "clear_timeout", "icon"]
    );
    assert_eq!(default_of(&result, "clear_timeout"), json!(0));

    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(result.step_id.as_deref(), Some("select_features"));
    let toggles: Vec<&str> = result.data_schema.iter().map(|f| f.name.as_str()).collect();
    assert!(toggles.contains(&"area_aware_media_player"));
    assert!(!toggles.contains(&"presence_hold"));

    // Light groups have no step for meta areas
    let result = h
        .submit(&flow_id, json!({"light_groups": true, "climate_groups": true}))
        .await;
    assert_eq!(result.step_id.as_deref(), Some("feature_conf_climate_groups"));
    assert_eq!(default_of(&result, "turn_on_state"), json!(""));

    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(result.result_type, FlowResultType::CreateEntry);

    let options = h.options(&entry_id);
    assert_eq!(options["type"], json!("meta"));
    assert!(options.get("secondary_states").map_or(true, |s| s == &json!({})));
    assert_eq!(options["features"]["light_groups"], json!({}));
    assert_eq!(options["features"]["climate_groups"], json!({"turn_on_state": ""}));
}

#[tokio::test]
async fn test_interior_meta_area_feature_list() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Interior", "type": "meta"})).await;

    let flow_id = h.start(&entry_id).await.flow_id;
    let result = h.submit(&flow_id, json!({})).await;
    let toggles: Vec<&str> = result.data_schema.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        toggles,
        vec![
            "media_player_groups",
            "light_groups",
            "climate_groups",
            "cover_groups",
            "aggregates",
            "health",
        ]
    );
}

#[tokio::test]
async fn test_toggled_off_features_are_absent() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Kitchen"})).await;

    let flow_id = h.start(&entry_id).await.flow_id;
    h.submit(&flow_id, json!({})).await;
    h.submit(&flow_id, json!({})).await;
    let result = h
        .submit(
            &flow_id,
            json!({"health": true, "cover_groups": true, "light_groups": false}),
        )
        .await;
    assert_eq!(result.result_type, FlowResultType::CreateEntry);

    let features = h.options(&entry_id)["features"].clone();
    assert_eq!(features, json!({"health": {}, "cover_groups": {}}));
}

#[tokio::test]
async fn test_light_group_states_include_configured_secondary_states() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Bedroom"})).await;

    let flow_id = h.start(&entry_id).await.flow_id;
    h.submit(&flow_id, json!({})).await;
    let result = h
        .submit(&flow_id, json!({"sleep_entity": "input_boolean.night_mode"}))
        .await;
    assert_eq!(result.step_id.as_deref(), Some("select_features"));

    let result = h.submit(&flow_id, json!({"light_groups": true})).await;
    let states = result
        .data_schema
        .iter()
        .find(|f| f.name == "sleep_lights_states")
        .and_then(|f| f.options.clone())
        .unwrap();
    assert_eq!(states, vec!["occupied", "extended", "sleep"]);

    let lights = result
        .data_schema
        .iter()
        .find(|f| f.name == "overhead_lights")
        .and_then(|f| f.options.clone())
        .unwrap();
    assert_eq!(lights, vec!["light.bedroom_lamp"]);

    let result = h
        .submit(
            &flow_id,
            json!({"sleep_lights": ["light.bedroom_lamp"], "sleep_lights_states": ["sleep"]}),
        )
        .await;
    assert_eq!(result.result_type, FlowResultType::CreateEntry);

    let options = h.options(&entry_id);
    assert_eq!(
        options["secondary_states"]["sleep_entity"],
        json!("input_boolean.night_mode")
    );
    assert_eq!(
        options["features"]["light_groups"]["sleep_lights"],
        json!(["light.bedroom_lamp"])
    );
}

#[tokio::test]
async fn test_saved_values_prefill_next_session() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Kitchen"})).await;

    let flow_id = h.start(&entry_id).await.flow_id;
    h.submit(
        &flow_id,
        json!({
            "clear_timeout": 300,
            "icon": "mdi:chef-hat",
            "exclude_entities": ["light.kitchen_counter"],
        }),
    )
    .await;
    h.submit(&flow_id, json!({"extended_time": 15})).await;
    h.submit(&flow_id, json!({"aggregates": true})).await;
    let result = h.submit(&flow_id, json!({"aggregates_min_entities": 3})).await;
    assert_eq!(result.result_type, FlowResultType::CreateEntry);

    let result = h.start(&entry_id).await;
    let flow_id = result.flow_id.clone();
    assert_eq!(default_of(&result, "clear_timeout"), json!(300));
    assert_eq!(default_of(&result, "icon"), json!("mdi:chef-hat"));
    assert_eq!(
        default_of(&result, "exclude_entities"),
        json!(["light.kitchen_counter"])
    );
    // Excluded entities stay selectable so they can be put back
    let exclude_choices = result
        .data_schema
        .iter()
        .find(|f| f.name == "exclude_entities")
        .and_then(|f| f.options.clone())
        .unwrap();
    assert!(exclude_choices.contains(&"light.kitchen_counter".to_string()));

    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(default_of(&result, "extended_time"), json!(15));

    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(default_of(&result, "aggregates"), json!(true));
    assert_eq!(default_of(&result, "health"), json!(false));

    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(result.step_id.as_deref(), Some("feature_conf_aggregates"));
    assert_eq!(default_of(&result, "aggregates_min_entities"), json!(3));

    h.submit(&flow_id, json!({})).await;
    let options = h.options(&entry_id);
    assert_eq!(options["clear_timeout"], json!(300));
    assert_eq!(options["features"]["aggregates"]["aggregates_min_entities"], json!(3));
}

#[tokio::test]
async fn test_feature_validation_errors_redisplay_step() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Kitchen"})).await;

    let flow_id = h.start(&entry_id).await.flow_id;
    h.submit(&flow_id, json!({})).await;
    h.submit(&flow_id, json!({})).await;
    h.submit(&flow_id, json!({"presence_hold": true})).await;

    let result = h
        .submit(&flow_id, json!({"presence_hold_timeout": "soon"}))
        .await;
    assert_eq!(result.result_type, FlowResultType::Form);
    assert_eq!(result.step_id.as_deref(), Some("feature_conf_presence_hold"));
    assert_eq!(
        result.errors.unwrap()["presence_hold_timeout"],
        "malformed_input"
    );
    // Nothing is stored until the flow completes
    assert!(h.options(&entry_id).is_empty());

    let result = h.submit(&flow_id, json!({"presence_hold_timeout": 10})).await;
    assert_eq!(result.result_type, FlowResultType::CreateEntry);
    assert_eq!(
        h.options(&entry_id)["features"]["presence_hold"],
        json!({"presence_hold_timeout": 10})
    );
}

#[tokio::test]
async fn test_legacy_feature_list_is_tolerated() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Kitchen"})).await;
    h.manager
        .entries()
        .update(
            &entry_id,
            ma_config_entries::ConfigEntryUpdate::new().options(
                json!({"features": ["aggregates", "health"]})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
        )
        .await
        .unwrap();

    let flow_id = h.start(&entry_id).await.flow_id;
    h.submit(&flow_id, json!({})).await;
    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(default_of(&result, "aggregates"), json!(true));
    assert_eq!(default_of(&result, "health"), json!(true));

    let result = h.submit(&flow_id, json!({})).await;
    assert_eq!(result.step_id.as_deref(), Some("feature_conf_aggregates"));
    assert_eq!(default_of(&result, "aggregates_min_entities"), json!(2));

    h.submit(&flow_id, json!({})).await;
    assert_eq!(
        h.options(&entry_id)["features"],
        json!({"health": {}, "aggregates": {"aggregates_min_entities": 2}})
    );
}

#[tokio::test]
async fn test_repeated_imports_keep_one_entry() {
    let h = Harness::new();
    h.import(json!({"name": "Kitchen"})).await;

    for _ in 0..3 {
        let result = h
            .manager
            .start_flow(
                DOMAIN,
                ConfigEntrySource::Import,
                Some(json!({"name": "Kitchen", "icon": "mdi:stove"})),
            )
            .await
            .unwrap();
        assert_eq!(result.result_type, FlowResultType::Abort);
    }

    let entries = h.manager.entries().get_by_domain(DOMAIN);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data["icon"], json!("mdi:stove"));
}

#[tokio::test]
async fn test_each_configurable_feature_visited_once() {
    let h = Harness::new();
    let entry_id = h.import(json!({"name": "Kitchen"})).await;

    let flow_id = h.start(&entry_id).await.flow_id;
    h.submit(&flow_id, json!({})).await;
    h.submit(&flow_id, json!({})).await;

    let mut result = h
        .submit(
            &flow_id,
            json!({
                "light_groups": true,
                "climate_groups": true,
                "area_aware_media_player": true,
                "aggregates": true,
                "presence_hold": true,
                "health": true,
            }),
        )
        .await;

    let mut steps = 0;
    while result.result_type == FlowResultType::Form {
        steps += 1;
        result = h.submit(&flow_id, json!({})).await;
    }
    assert_eq!(steps, 5);

    let features = h.options(&entry_id)["features"].clone();
    assert_eq!(features.as_object().unwrap().len(), 6);
    assert_eq!(
        features["area_aware_media_player"]["notification_states"],
        json!(["extended"])
    );
    assert!(h.manager.list_flows().await.is_empty());
}
