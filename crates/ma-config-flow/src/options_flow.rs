//! Options flow
//!
//! Walks an existing area through its settings. Validated values are
//! collected in `area_options` and only handed back, as a single
//! `CreateEntry`, once every selected feature has been configured.

use std::collections::HashMap;

use ma_config_entries::ConfigEntry;
use ma_core::domains::{self, ALL_BINARY_SENSOR_DEVICE_CLASSES, ALL_PRESENCE_DEVICE_PLATFORMS};
use ma_core::{
    conf, AreaState, ConfigurableFeature, Feature, SecondaryState, BUILTIN_AREA_STATES,
    FEATURE_LIST, FEATURE_LIST_GLOBAL, FEATURE_LIST_META, NON_CONFIGURABLE_FEATURES_META,
};
use ma_schema::{build_options_schema, OptionSpec, Schema, ValidationError, Validator};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::area::MagicArea;
use crate::error::FlowError;
use crate::options::{
    self, feature_schema, meta_area_schema, regular_area_schema, secondary_states_schema,
};
use crate::result::{FlowErrors, StepResult, BASE_ERROR};
use crate::snapshot::EntitySnapshot;
use crate::Map;

pub const STEP_INIT: &str = "init";
pub const STEP_AREA_CONFIG: &str = "area_config";
pub const STEP_SECONDARY_STATES: &str = "secondary_states";
pub const STEP_SELECT_FEATURES: &str = "select_features";
const STEP_DONE: &str = "done";

const ERROR_MALFORMED_INPUT: &str = "malformed_input";
const ERROR_UNKNOWN: &str = "unknown";

/// Where an options flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsFlowState {
    Init,
    AreaConfig,
    SecondaryStates,
    SelectFeatures,
    FeatureConf(ConfigurableFeature),
    /// Options were committed; the flow takes no more input
    Done,
}

impl OptionsFlowState {
    pub fn step_id(&self) -> String {
        match self {
            OptionsFlowState::Init => STEP_INIT.to_string(),
            OptionsFlowState::AreaConfig => STEP_AREA_CONFIG.to_string(),
            OptionsFlowState::SecondaryStates => STEP_SECONDARY_STATES.to_string(),
            OptionsFlowState::SelectFeatures => STEP_SELECT_FEATURES.to_string(),
            OptionsFlowState::FeatureConf(feature) => feature.step_id(),
            OptionsFlowState::Done => STEP_DONE.to_string(),
        }
    }
}

/// Options flow for one area
pub struct OptionsFlow {
    /// Options of the entry when the flow started, used to pre-fill forms
    saved_options: Map,
    area: MagicArea,
    snapshot: EntitySnapshot,
    state: OptionsFlowState,
    /// Settings validated so far
    area_options: Map,
    selected_features: Vec<Feature>,
    /// Configurable features still to visit, configured from the back
    features_to_configure: Vec<ConfigurableFeature>,
}

impl OptionsFlow {
    pub fn new(entry: &ConfigEntry, area: MagicArea) -> Self {
        Self {
            saved_options: entry.options.clone(),
            area,
            snapshot: EntitySnapshot::default(),
            state: OptionsFlowState::Init,
            area_options: Map::new(),
            selected_features: Vec::new(),
            features_to_configure: Vec::new(),
        }
    }

    pub fn state(&self) -> OptionsFlowState {
        self.state
    }

    pub fn area(&self) -> &MagicArea {
        &self.area
    }

    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    /// Settings validated so far
    pub fn area_options(&self) -> &Map {
        &self.area_options
    }

    pub fn selected_features(&self) -> &[Feature] {
        &self.selected_features
    }

    /// Features still waiting for their configuration step
    pub fn pending_features(&self) -> &[ConfigurableFeature] {
        &self.features_to_configure
    }

    /// Capture the entity lists and show the first form
    pub fn step_init(&mut self, known_entity_ids: &[String]) -> StepResult {
        debug!("Initializing options flow for area {}", self.area.name);
        debug!("Options in config entry: {:?}", self.saved_options);

        self.snapshot = EntitySnapshot::capture(known_entity_ids, &self.area, &self.saved_options);
        self.step_area_config(None)
    }

    /// Submit input for `step_id`, which must be the step the flow is at
    pub fn step(
        &mut self,
        step_id: &str,
        user_input: Option<&Value>,
    ) -> Result<StepResult, FlowError> {
        let expected = self.state.step_id();
        if step_id != expected {
            return Err(FlowError::UnknownStep {
                step_id: step_id.to_string(),
                expected,
            });
        }

        let result = match self.state {
            OptionsFlowState::AreaConfig => self.step_area_config(user_input),
            OptionsFlowState::SecondaryStates => self.step_secondary_states(user_input),
            OptionsFlowState::SelectFeatures => self.step_select_features(user_input),
            OptionsFlowState::FeatureConf(feature) => self.step_feature_conf(feature, user_input),
            OptionsFlowState::Init | OptionsFlowState::Done => {
                return Err(FlowError::UnknownStep {
                    step_id: step_id.to_string(),
                    expected,
                })
            }
        };
        Ok(result)
    }

    /// Basic settings. Meta areas continue with feature selection, regular
    /// areas with their secondary states.
    pub fn step_area_config(&mut self, user_input: Option<&Value>) -> StepResult {
        self.state = OptionsFlowState::AreaConfig;
        let mut errors = FlowErrors::new();

        if let Some(user_input) = user_input {
            debug!("Validating area base config: {}", user_input);
            let area_schema = if self.area.is_meta() {
                meta_area_schema()
            } else {
                regular_area_schema()
            };

            match area_schema.validate(user_input) {
                Ok(area_options) => {
                    debug!("Saving area base config: {:?}", area_options);
                    self.area_options = area_options;
                    return if self.area.is_meta() {
                        self.step_select_features(None)
                    } else {
                        self.step_secondary_states(None)
                    };
                }
                Err(err) => errors = field_errors("Area Step Config", &err),
            }
        }

        let table = if self.area.is_meta() {
            options::options_area_meta()
        } else {
            options::options_area()
        };
        let dynamic_validators = HashMap::from([
            (
                conf::INCLUDE_ENTITIES,
                Validator::multi_select(&self.snapshot.all_entities),
            ),
            (
                conf::EXCLUDE_ENTITIES,
                Validator::multi_select(&self.snapshot.all_area_entities),
            ),
            (
                conf::PRESENCE_DEVICE_PLATFORMS,
                Validator::multi_select(domains::sorted(ALL_PRESENCE_DEVICE_PLATFORMS)),
            ),
            (
                conf::PRESENCE_SENSOR_DEVICE_CLASS,
                Validator::multi_select(domains::sorted(ALL_BINARY_SENSOR_DEVICE_CLASSES)),
            ),
        ]);

        StepResult::form(
            STEP_AREA_CONFIG,
            build_options_schema(&table, &self.saved_options, &dynamic_validators),
            errors,
        )
    }

    /// Secondary state triggers, merged into what `area_config` produced
    pub fn step_secondary_states(&mut self, user_input: Option<&Value>) -> StepResult {
        self.state = OptionsFlowState::SecondaryStates;
        let mut errors = FlowErrors::new();

        if let Some(user_input) = user_input {
            debug!("Validating area secondary states config: {}", user_input);
            match secondary_states_schema().validate(user_input) {
                Ok(states) => match section_mut(&mut self.area_options, conf::SECONDARY_STATES) {
                    Some(secondary_states) => {
                        secondary_states.extend(states);
                        debug!("Saving area secondary state config: {:?}", self.area_options);
                        return self.step_select_features(None);
                    }
                    None => {
                        errors = unexpected(
                            "Area Secondary States",
                            "secondary_states is not a mapping",
                        )
                    }
                },
                Err(err) => errors = field_errors("Area Secondary States", &err),
            }
        }

        let trigger_entities = Validator::one_of(
            std::iter::once(conf::EMPTY_ENTRY)
                .chain(self.snapshot.all_entities.iter().map(String::as_str)),
        );
        let dynamic_validators = HashMap::from([
            (conf::DARK_ENTITY, trigger_entities.clone()),
            (conf::SLEEP_ENTITY, trigger_entities.clone()),
            (conf::ACCENT_ENTITY, trigger_entities),
        ]);

        StepResult::form(
            STEP_SECONDARY_STATES,
            build_options_schema(
                &options::options_secondary_states(),
                &saved_section(&self.saved_options, conf::SECONDARY_STATES),
                &dynamic_validators,
            ),
            errors,
        )
    }

    /// One toggle per candidate feature
    pub fn step_select_features(&mut self, user_input: Option<&Value>) -> StepResult {
        self.state = OptionsFlowState::SelectFeatures;
        let feature_list = self.feature_list();
        let schema = self.select_features_schema(feature_list);
        let mut errors = FlowErrors::new();

        if let Some(user_input) = user_input {
            match schema.validate(user_input) {
                Ok(selection) => {
                    self.selected_features = feature_list
                        .iter()
                        .copied()
                        .filter(|f| selection.get(f.as_str()) == Some(&Value::Bool(true)))
                        .collect();
                    debug!("Selected features: {:?}", self.selected_features);

                    let configurable = self.configurable_features();
                    self.features_to_configure = self
                        .selected_features
                        .iter()
                        .filter_map(Feature::configurable)
                        .filter(|f| configurable.contains(f))
                        .collect();

                    let unconfigured: Vec<Feature> = self
                        .selected_features
                        .iter()
                        .copied()
                        .filter(|f| {
                            f.configurable()
                                .map_or(true, |c| !self.features_to_configure.contains(&c))
                        })
                        .collect();

                    match section_mut(&mut self.area_options, conf::ENABLED_FEATURES) {
                        Some(enabled) => {
                            for feature in unconfigured {
                                enabled.insert(feature.as_str().to_string(), json!({}));
                            }
                            return self.route_feature_config();
                        }
                        None => errors = unexpected("Select Features", "features is not a mapping"),
                    }
                }
                Err(err) => errors = field_errors("Select Features", &err),
            }
        }

        debug!("Selecting features from {:?}", feature_list);
        StepResult::form(STEP_SELECT_FEATURES, schema, errors)
    }

    /// Show the next pending feature's step, or commit when none is left
    fn route_feature_config(&mut self) -> StepResult {
        debug!("Features yet to configure: {:?}", self.features_to_configure);
        debug!("Current config is: {:?}", self.area_options);

        match self.features_to_configure.pop() {
            Some(feature) => {
                debug!("Initiating configuration step for feature {}", feature);
                self.step_feature_conf(feature, None)
            }
            None => {
                debug!("All features configured, saving config: {:?}", self.area_options);
                self.state = OptionsFlowState::Done;
                StepResult::CreateEntry {
                    title: String::new(),
                    data: self.area_options.clone(),
                }
            }
        }
    }

    /// The `feature_conf_<feature>` step
    pub fn step_feature_conf(
        &mut self,
        feature: ConfigurableFeature,
        user_input: Option<&Value>,
    ) -> StepResult {
        match feature {
            ConfigurableFeature::LightGroups => {
                let lights = Validator::multi_select(&self.snapshot.all_lights);
                let states = Validator::multi_select(self.light_group_states());
                let act_on = Validator::multi_select(conf::LIGHT_GROUP_ACT_ON_OPTIONS);

                let mut dynamic_validators = HashMap::new();
                for (lights_key, states_key, act_on_key) in [
                    (
                        conf::OVERHEAD_LIGHTS,
                        conf::OVERHEAD_LIGHTS_STATES,
                        conf::OVERHEAD_LIGHTS_ACT_ON,
                    ),
                    (conf::SLEEP_LIGHTS, conf::SLEEP_LIGHTS_STATES, conf::SLEEP_LIGHTS_ACT_ON),
                    (conf::ACCENT_LIGHTS, conf::ACCENT_LIGHTS_STATES, conf::ACCENT_LIGHTS_ACT_ON),
                    (conf::TASK_LIGHTS, conf::TASK_LIGHTS_STATES, conf::TASK_LIGHTS_ACT_ON),
                ] {
                    dynamic_validators.insert(lights_key, lights.clone());
                    dynamic_validators.insert(states_key, states.clone());
                    dynamic_validators.insert(act_on_key, act_on.clone());
                }

                self.do_feature_config(
                    feature,
                    &options::options_light_group(),
                    &dynamic_validators,
                    user_input,
                )
            }
            ConfigurableFeature::ClimateGroups => {
                let table = if self.area.is_meta() {
                    options::options_climate_group_meta()
                } else {
                    options::options_climate_group()
                };
                let dynamic_validators = HashMap::from([(
                    conf::CLIMATE_GROUPS_TURN_ON_STATE,
                    Validator::one_of([
                        conf::EMPTY_ENTRY,
                        AreaState::Occupied.as_str(),
                        AreaState::Extended.as_str(),
                    ]),
                )]);
                self.do_feature_config(feature, &table, &dynamic_validators, user_input)
            }
            ConfigurableFeature::AreaAwareMediaPlayer => {
                let dynamic_validators = HashMap::from([
                    (
                        conf::NOTIFICATION_DEVICES,
                        Validator::multi_select(&self.snapshot.all_media_players),
                    ),
                    (
                        conf::NOTIFY_STATES,
                        Validator::multi_select(
                            [AreaState::Occupied, AreaState::Extended, AreaState::Sleep]
                                .map(|s| s.as_str()),
                        ),
                    ),
                ]);
                self.do_feature_config(
                    feature,
                    &options::options_area_aware_media_player(),
                    &dynamic_validators,
                    user_input,
                )
            }
            ConfigurableFeature::Aggregates => {
                let table = options::options_aggregates();
                self.do_feature_config(feature, &table, &HashMap::new(), user_input)
            }
            ConfigurableFeature::PresenceHold => {
                let table = options::options_presence_hold();
                self.do_feature_config(feature, &table, &HashMap::new(), user_input)
            }
        }
    }

    /// Shared body of the feature steps.
    ///
    /// Input is checked against the feature's own validator; any failing
    /// field is reported as `malformed_input`.
    fn do_feature_config(
        &mut self,
        feature: ConfigurableFeature,
        table: &[OptionSpec],
        dynamic_validators: &HashMap<&str, Validator>,
        user_input: Option<&Value>,
    ) -> StepResult {
        self.state = OptionsFlowState::FeatureConf(feature);
        let mut errors = FlowErrors::new();

        if let Some(user_input) = user_input {
            debug!("Validating {} feature config: {}", feature, user_input);
            match feature_schema(feature).validate(user_input) {
                Ok(validated) => match section_mut(&mut self.area_options, conf::ENABLED_FEATURES) {
                    Some(enabled) => {
                        debug!("Saving {} feature config: {:?}", feature, validated);
                        enabled.insert(feature.as_str().to_string(), Value::Object(validated));
                        return self.route_feature_config();
                    }
                    None => errors = unexpected("Feature Config", "features is not a mapping"),
                },
                Err(err) => errors = self.input_errors(&err),
            }
        }

        // Older entries stored the feature list as a plain list
        let saved_features = saved_section(&self.saved_options, conf::ENABLED_FEATURES);

        StepResult::form(
            feature.step_id(),
            build_options_schema(
                table,
                &saved_section(&saved_features, feature.as_str()),
                dynamic_validators,
            ),
            errors,
        )
    }

    /// Error map shown when input fails the current step's schema.
    ///
    /// Feature steps report every failing field as `malformed_input`.
    pub fn input_errors(&self, err: &ValidationError) -> FlowErrors {
        match (self.state, err) {
            (OptionsFlowState::FeatureConf(_), ValidationError::MultipleInvalid(invalid)) => {
                let errors: FlowErrors = invalid
                    .iter()
                    .filter_map(|e| e.field())
                    .map(|field| (field.to_string(), ERROR_MALFORMED_INPUT.to_string()))
                    .collect();
                debug!("Found the following errors: {:?}", errors);
                errors
            }
            (state, err) => field_errors(&state.step_id(), err),
        }
    }

    fn feature_list(&self) -> &'static [Feature] {
        if self.area.is_global() {
            FEATURE_LIST_GLOBAL
        } else if self.area.is_meta() {
            FEATURE_LIST_META
        } else {
            FEATURE_LIST
        }
    }

    /// Features with their own step, minus those meta areas cannot configure
    fn configurable_features(&self) -> Vec<ConfigurableFeature> {
        ConfigurableFeature::ALL
            .into_iter()
            .filter(|f| {
                !(self.area.is_meta() && NON_CONFIGURABLE_FEATURES_META.contains(&f.feature()))
            })
            .collect()
    }

    fn select_features_schema(&self, feature_list: &[Feature]) -> Schema {
        let table: Vec<OptionSpec> = feature_list
            .iter()
            .map(|f| OptionSpec::new(f.as_str(), json!(false), Validator::Boolean))
            .collect();
        let saved: Map = feature_list
            .iter()
            .map(|f| (f.as_str().to_string(), Value::Bool(self.was_enabled(*f))))
            .collect();
        build_options_schema(&table, &saved, &HashMap::new())
    }

    fn was_enabled(&self, feature: Feature) -> bool {
        match self.saved_options.get(conf::ENABLED_FEATURES) {
            Some(Value::Object(features)) => features.contains_key(feature.as_str()),
            Some(Value::Array(features)) => features
                .iter()
                .any(|f| f.as_str() == Some(feature.as_str())),
            _ => false,
        }
    }

    /// Area states a light group can be tied to: the built-in states plus
    /// every secondary state with a trigger entity, except dark
    fn light_group_states(&self) -> Vec<&'static str> {
        let secondary_states = self
            .area_options
            .get(conf::SECONDARY_STATES)
            .and_then(Value::as_object);

        let mut states: Vec<&'static str> =
            BUILTIN_AREA_STATES.iter().map(AreaState::as_str).collect();
        for secondary in SecondaryState::ALL {
            if secondary.state == AreaState::Dark {
                continue;
            }
            if secondary_states
                .and_then(|s| s.get(secondary.entity_key))
                .is_some_and(is_set)
            {
                states.push(secondary.state.as_str());
            }
        }
        states
    }
}

/// The mapping under `key`, created if missing. `None` if something else
/// is stored there.
fn section_mut<'a>(options: &'a mut Map, key: &str) -> Option<&'a mut Map> {
    options
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
}

/// Saved mapping under `key`; anything that is not a mapping counts as empty
fn saved_section(options: &Map, key: &str) -> Map {
    options
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn field_errors(step: &str, err: &ValidationError) -> FlowErrors {
    if err.errors().is_none() {
        return unexpected(step, &err.to_string());
    }
    let errors = err.field_errors();
    debug!("{}: Found the following errors: {:?}", step, errors);
    errors
}

fn unexpected(step: &str, message: &str) -> FlowErrors {
    warn!("{}: Unexpected error caught: {}", step, message);
    FlowErrors::from([(BASE_ERROR.to_string(), ERROR_UNKNOWN.to_string())])
}
