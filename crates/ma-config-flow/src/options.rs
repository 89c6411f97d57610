//! Option tables and validated schemas
//!
//! Each table lists `(name, default, validator)` rows in display order. The
//! forms are built from the tables with [`build_options_schema`]; submitted
//! values are then checked against the validated schemas below, which carry
//! the base validators and the declared defaults.
//!
//! [`build_options_schema`]: ma_schema::build_options_schema

use ma_core::conf::{self, LIGHT_GROUP_ACT_ON_OPTIONS};
use ma_core::domains::{DEFAULT_PRESENCE_DEVICE_PLATFORMS, DEFAULT_PRESENCE_DEVICE_SENSOR_CLASS};
use ma_core::{AreaState, AreaType, ConfigurableFeature, FEATURE_LIST};
use ma_schema::{OptionSpec, Schema, SchemaField, Validator};
use serde_json::{json, Value};

pub fn options_area() -> Vec<OptionSpec> {
    vec![
        OptionSpec::new(
            conf::TYPE,
            json!(AreaType::Interior.as_str()),
            Validator::one_of(AreaType::REGULAR.iter().map(AreaType::as_str)),
        ),
        OptionSpec::new(conf::INCLUDE_ENTITIES, json!([]), Validator::EntityIds),
        OptionSpec::new(conf::EXCLUDE_ENTITIES, json!([]), Validator::EntityIds),
        OptionSpec::new(
            conf::PRESENCE_DEVICE_PLATFORMS,
            json!(DEFAULT_PRESENCE_DEVICE_PLATFORMS),
            Validator::StringList,
        ),
        OptionSpec::new(
            conf::PRESENCE_SENSOR_DEVICE_CLASS,
            json!(DEFAULT_PRESENCE_DEVICE_SENSOR_CLASS),
            Validator::StringList,
        ),
        OptionSpec::new(conf::ON_STATES, json!(conf::DEFAULT_ON_STATES), Validator::StringList),
        OptionSpec::new(
            conf::UPDATE_INTERVAL,
            json!(conf::DEFAULT_UPDATE_INTERVAL),
            Validator::PositiveInt,
        ),
        OptionSpec::new(
            conf::CLEAR_TIMEOUT,
            json!(conf::DEFAULT_CLEAR_TIMEOUT),
            Validator::PositiveInt,
        ),
        OptionSpec::new(conf::ICON, json!(conf::DEFAULT_ICON), Validator::Icon),
        OptionSpec::new(conf::RELOAD_ON_REGISTRY_CHANGE, json!(true), Validator::Boolean),
    ]
}

/// Meta areas have no entities of their own, so most presence settings
/// do not apply
pub fn options_area_meta() -> Vec<OptionSpec> {
    vec![
        OptionSpec::new(conf::EXCLUDE_ENTITIES, json!([]), Validator::EntityIds),
        OptionSpec::new(
            conf::UPDATE_INTERVAL,
            json!(conf::DEFAULT_UPDATE_INTERVAL),
            Validator::PositiveInt,
        ),
        OptionSpec::new(
            conf::CLEAR_TIMEOUT,
            json!(conf::DEFAULT_CLEAR_TIMEOUT_META),
            Validator::PositiveInt,
        ),
        OptionSpec::new(conf::ICON, json!(conf::DEFAULT_ICON), Validator::Icon),
    ]
}

pub fn options_secondary_states() -> Vec<OptionSpec> {
    vec![
        OptionSpec::new(conf::DARK_ENTITY, json!(""), Validator::OptionalEntityId),
        OptionSpec::new(conf::ACCENT_ENTITY, json!(""), Validator::OptionalEntityId),
        OptionSpec::new(conf::SLEEP_ENTITY, json!(""), Validator::OptionalEntityId),
        OptionSpec::new(
            conf::SLEEP_TIMEOUT,
            json!(conf::DEFAULT_SLEEP_TIMEOUT),
            Validator::PositiveInt,
        ),
        OptionSpec::new(
            conf::EXTENDED_TIME,
            json!(conf::DEFAULT_EXTENDED_TIME),
            Validator::PositiveInt,
        ),
        OptionSpec::new(
            conf::EXTENDED_TIMEOUT,
            json!(conf::DEFAULT_EXTENDED_TIMEOUT),
            Validator::PositiveInt,
        ),
    ]
}

pub fn options_light_group() -> Vec<OptionSpec> {
    let categories = [
        (
            conf::OVERHEAD_LIGHTS,
            conf::OVERHEAD_LIGHTS_STATES,
            conf::OVERHEAD_LIGHTS_ACT_ON,
            json!([AreaState::Occupied.as_str()]),
        ),
        (
            conf::SLEEP_LIGHTS,
            conf::SLEEP_LIGHTS_STATES,
            conf::SLEEP_LIGHTS_ACT_ON,
            json!([]),
        ),
        (
            conf::ACCENT_LIGHTS,
            conf::ACCENT_LIGHTS_STATES,
            conf::ACCENT_LIGHTS_ACT_ON,
            json!([]),
        ),
        (
            conf::TASK_LIGHTS,
            conf::TASK_LIGHTS_STATES,
            conf::TASK_LIGHTS_ACT_ON,
            json!([]),
        ),
    ];

    categories
        .into_iter()
        .flat_map(|(lights, states, act_on, default_states)| {
            [
                OptionSpec::new(lights, json!([]), Validator::EntityIds),
                OptionSpec::new(states, default_states, Validator::StringList),
                OptionSpec::new(act_on, json!(LIGHT_GROUP_ACT_ON_OPTIONS), Validator::StringList),
            ]
        })
        .collect()
}

fn climate_turn_on_states() -> Validator {
    Validator::one_of([
        conf::EMPTY_ENTRY,
        AreaState::Occupied.as_str(),
        AreaState::Extended.as_str(),
    ])
}

pub fn options_climate_group() -> Vec<OptionSpec> {
    vec![OptionSpec::new(
        conf::CLIMATE_GROUPS_TURN_ON_STATE,
        json!(AreaState::Extended.as_str()),
        climate_turn_on_states(),
    )]
}

pub fn options_climate_group_meta() -> Vec<OptionSpec> {
    vec![OptionSpec::new(
        conf::CLIMATE_GROUPS_TURN_ON_STATE,
        json!(conf::EMPTY_ENTRY),
        climate_turn_on_states(),
    )]
}

pub fn options_area_aware_media_player() -> Vec<OptionSpec> {
    vec![
        OptionSpec::new(conf::NOTIFICATION_DEVICES, json!([]), Validator::EntityIds),
        OptionSpec::new(
            conf::NOTIFY_STATES,
            json!([AreaState::Extended.as_str()]),
            Validator::StringList,
        ),
    ]
}

pub fn options_aggregates() -> Vec<OptionSpec> {
    vec![OptionSpec::new(
        conf::AGGREGATES_MIN_ENTITIES,
        json!(conf::DEFAULT_AGGREGATES_MIN_ENTITIES),
        Validator::PositiveInt,
    )]
}

pub fn options_presence_hold() -> Vec<OptionSpec> {
    vec![OptionSpec::new(
        conf::PRESENCE_HOLD_TIMEOUT,
        json!(conf::DEFAULT_PRESENCE_HOLD_TIMEOUT),
        Validator::PositiveInt,
    )]
}

/// Schema with the table's declared defaults and base validators
fn table_schema(options: &[OptionSpec]) -> Schema {
    options.iter().fold(Schema::new(), |schema, option| {
        schema.optional(option.name, option.default.clone(), option.validator.clone())
    })
}

pub fn secondary_states_schema() -> Schema {
    table_schema(&options_secondary_states())
}

/// Validator for one feature's configuration
pub fn feature_schema(feature: ConfigurableFeature) -> Schema {
    let options = match feature {
        ConfigurableFeature::LightGroups => options_light_group(),
        ConfigurableFeature::ClimateGroups => options_climate_group(),
        ConfigurableFeature::AreaAwareMediaPlayer => options_area_aware_media_player(),
        ConfigurableFeature::Aggregates => options_aggregates(),
        ConfigurableFeature::PresenceHold => options_presence_hold(),
    };
    table_schema(&options)
}

/// The `features` mapping: every key optional, no defaults filled in
fn enabled_features_schema() -> Schema {
    let mut schema = Schema::new();
    for feature in FEATURE_LIST {
        let inner = feature
            .configurable()
            .map(feature_schema)
            .unwrap_or_default();
        schema.insert(SchemaField {
            name: feature.as_str().to_string(),
            default: None,
            suggested_value: None,
            validator: Validator::Nested(Box::new(inner)),
        });
    }
    schema
}

fn with_nested_sections(schema: Schema) -> Schema {
    schema
        .optional(
            conf::SECONDARY_STATES,
            json!({}),
            Validator::Nested(Box::new(secondary_states_schema())),
        )
        .optional(
            conf::ENABLED_FEATURES,
            json!({}),
            Validator::Nested(Box::new(enabled_features_schema())),
        )
}

/// Full settings of a regular area
pub fn regular_area_schema() -> Schema {
    with_nested_sections(table_schema(&options_area()))
}

/// Full settings of a meta area
pub fn meta_area_schema() -> Schema {
    let schema = Schema::new().optional(
        conf::TYPE,
        Value::from(AreaType::Meta.as_str()),
        Validator::one_of([AreaType::Meta.as_str()]),
    );
    let schema = options_area_meta()
        .iter()
        .fold(schema, |schema, option| {
            schema.optional(option.name, option.default.clone(), option.validator.clone())
        });
    with_nested_sections(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_area_defaults() {
        let options = regular_area_schema().validate(&json!({})).unwrap();
        assert_eq!(options[conf::TYPE], json!("interior"));
        assert_eq!(options[conf::CLEAR_TIMEOUT], json!(60));
        assert_eq!(options[conf::ENABLED_FEATURES], json!({}));
        assert_eq!(
            options[conf::SECONDARY_STATES][conf::SLEEP_TIMEOUT],
            json!(conf::DEFAULT_SLEEP_TIMEOUT)
        );
        assert_eq!(options[conf::SECONDARY_STATES][conf::DARK_ENTITY], json!(""));
    }

    #[test]
    fn test_regular_area_rejects_meta_type() {
        let err = regular_area_schema()
            .validate(&json!({"type": "meta"}))
            .unwrap_err();
        assert!(err.field_errors().contains_key(conf::TYPE));
    }

    #[test]
    fn test_meta_area_schema() {
        let options = meta_area_schema().validate(&json!({})).unwrap();
        assert_eq!(options[conf::TYPE], json!("meta"));
        assert_eq!(options[conf::CLEAR_TIMEOUT], json!(0));
        assert!(options.get(conf::INCLUDE_ENTITIES).is_none());

        assert!(meta_area_schema()
            .validate(&json!({"include_entities": ["light.a"]}))
            .is_err());
    }

    #[test]
    fn test_light_group_table_order() {
        let names: Vec<_> = options_light_group().iter().map(|o| o.name).collect();
        assert_eq!(names.len(), 12);
        assert_eq!(
            &names[..3],
            &["overhead_lights", "overhead_lights_states", "overhead_lights_act_on"]
        );
        assert_eq!(names[9], "task_lights");
    }

    #[test]
    fn test_feature_schemas() {
        let climate = feature_schema(ConfigurableFeature::ClimateGroups)
            .validate(&json!({}))
            .unwrap();
        assert_eq!(climate[conf::CLIMATE_GROUPS_TURN_ON_STATE], json!("extended"));

        assert!(feature_schema(ConfigurableFeature::ClimateGroups)
            .validate(&json!({"turn_on_state": "sleep"}))
            .is_err());

        let aggregates = feature_schema(ConfigurableFeature::Aggregates)
            .validate(&json!({"aggregates_min_entities": "3"}))
            .unwrap();
        assert_eq!(aggregates[conf::AGGREGATES_MIN_ENTITIES], json!(3));
    }

    #[test]
    fn test_enabled_features_keep_only_given_keys() {
        let options = regular_area_schema()
            .validate(&json!({"features": {"health": {}, "presence_hold": {}}}))
            .unwrap();
        let features = options[conf::ENABLED_FEATURES].as_object().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features["health"], json!({}));
        assert_eq!(
            features["presence_hold"][conf::PRESENCE_HOLD_TIMEOUT],
            json!(0)
        );

        assert!(regular_area_schema()
            .validate(&json!({"features": {"teleport": {}}}))
            .is_err());
    }
}
