//! Option keys stored in config entry data and options

// Entry data
pub const NAME: &str = "name";
pub const ID: &str = "id";
pub const TYPE: &str = "type";

// Base area settings
pub const INCLUDE_ENTITIES: &str = "include_entities";
pub const EXCLUDE_ENTITIES: &str = "exclude_entities";
pub const PRESENCE_DEVICE_PLATFORMS: &str = "presence_device_platforms";
pub const PRESENCE_SENSOR_DEVICE_CLASS: &str = "presence_sensor_device_class";
pub const ON_STATES: &str = "on_states";
pub const UPDATE_INTERVAL: &str = "update_interval";
pub const CLEAR_TIMEOUT: &str = "clear_timeout";
pub const ICON: &str = "icon";
pub const RELOAD_ON_REGISTRY_CHANGE: &str = "reload_on_registry_change";

// Nested maps
pub const SECONDARY_STATES: &str = "secondary_states";
pub const ENABLED_FEATURES: &str = "features";

// Secondary states
pub const DARK_ENTITY: &str = "dark_entity";
pub const SLEEP_ENTITY: &str = "sleep_entity";
pub const ACCENT_ENTITY: &str = "accent_entity";
pub const SLEEP_TIMEOUT: &str = "sleep_timeout";
pub const EXTENDED_TIME: &str = "extended_time";
pub const EXTENDED_TIMEOUT: &str = "extended_timeout";

// Light groups
pub const OVERHEAD_LIGHTS: &str = "overhead_lights";
pub const OVERHEAD_LIGHTS_STATES: &str = "overhead_lights_states";
pub const OVERHEAD_LIGHTS_ACT_ON: &str = "overhead_lights_act_on";
pub const SLEEP_LIGHTS: &str = "sleep_lights";
pub const SLEEP_LIGHTS_STATES: &str = "sleep_lights_states";
pub const SLEEP_LIGHTS_ACT_ON: &str = "sleep_lights_act_on";
pub const ACCENT_LIGHTS: &str = "accent_lights";
pub const ACCENT_LIGHTS_STATES: &str = "accent_lights_states";
pub const ACCENT_LIGHTS_ACT_ON: &str = "accent_lights_act_on";
pub const TASK_LIGHTS: &str = "task_lights";
pub const TASK_LIGHTS_STATES: &str = "task_lights_states";
pub const TASK_LIGHTS_ACT_ON: &str = "task_lights_act_on";

/// When a light group reacts: on occupancy changes, on area state changes
pub const LIGHT_GROUP_ACT_ON_OCCUPANCY_CHANGE: &str = "occupancy";
pub const LIGHT_GROUP_ACT_ON_STATE_CHANGE: &str = "state";
pub const LIGHT_GROUP_ACT_ON_OPTIONS: [&str; 2] = [
    LIGHT_GROUP_ACT_ON_OCCUPANCY_CHANGE,
    LIGHT_GROUP_ACT_ON_STATE_CHANGE,
];

// Climate groups
pub const CLIMATE_GROUPS_TURN_ON_STATE: &str = "turn_on_state";

// Area aware media player
pub const NOTIFICATION_DEVICES: &str = "notification_devices";
pub const NOTIFY_STATES: &str = "notification_states";

// Aggregates
pub const AGGREGATES_MIN_ENTITIES: &str = "aggregates_min_entities";

// Presence hold
pub const PRESENCE_HOLD_TIMEOUT: &str = "presence_hold_timeout";

// Defaults
pub const DEFAULT_ON_STATES: [&str; 4] = ["on", "home", "playing", "open"];
pub const DEFAULT_UPDATE_INTERVAL: u64 = 60;
pub const DEFAULT_CLEAR_TIMEOUT: u64 = 60;
pub const DEFAULT_CLEAR_TIMEOUT_META: u64 = 0;
pub const DEFAULT_ICON: &str = "mdi:texture-box";
pub const DEFAULT_SLEEP_TIMEOUT: u64 = 60;
pub const DEFAULT_EXTENDED_TIME: u64 = 5;
pub const DEFAULT_EXTENDED_TIMEOUT: u64 = 10;
pub const DEFAULT_AGGREGATES_MIN_ENTITIES: u64 = 2;
pub const DEFAULT_PRESENCE_HOLD_TIMEOUT: u64 = 0;

/// Entry value for "no selection" in single-choice fields
pub const EMPTY_ENTRY: &str = "";
