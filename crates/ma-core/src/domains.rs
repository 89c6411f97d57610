//! Entity domains the configuration flows care about

pub const BINARY_SENSOR: &str = "binary_sensor";
pub const CLIMATE: &str = "climate";
pub const COVER: &str = "cover";
pub const DEVICE_TRACKER: &str = "device_tracker";
pub const FAN: &str = "fan";
pub const INPUT_BOOLEAN: &str = "input_boolean";
pub const LIGHT: &str = "light";
pub const MEDIA_PLAYER: &str = "media_player";
pub const REMOTE: &str = "remote";
pub const SENSOR: &str = "sensor";
pub const SUN: &str = "sun";
pub const SWITCH: &str = "switch";

/// Domains offered when picking trigger entities
pub const CONFIG_FLOW_ENTITY_FILTER: &[&str] = &[BINARY_SENSOR, SENSOR, SWITCH, INPUT_BOOLEAN];

/// Domains offered when picking entities to include or exclude
pub const CONFIG_FLOW_ENTITY_FILTER_EXT: &[&str] = &[
    BINARY_SENSOR,
    SENSOR,
    SWITCH,
    INPUT_BOOLEAN,
    LIGHT,
    MEDIA_PLAYER,
    CLIMATE,
    SUN,
];

/// Platforms whose entities can report presence
pub const ALL_PRESENCE_DEVICE_PLATFORMS: &[&str] =
    &[MEDIA_PLAYER, BINARY_SENSOR, REMOTE, DEVICE_TRACKER];

/// Platforms used for presence tracking unless configured otherwise
pub const DEFAULT_PRESENCE_DEVICE_PLATFORMS: &[&str] = &[MEDIA_PLAYER, BINARY_SENSOR];

/// Binary sensor device classes
pub const ALL_BINARY_SENSOR_DEVICE_CLASSES: &[&str] = &[
    "battery",
    "battery_charging",
    "carbon_monoxide",
    "cold",
    "connectivity",
    "door",
    "garage_door",
    "gas",
    "heat",
    "light",
    "lock",
    "moisture",
    "motion",
    "moving",
    "occupancy",
    "opening",
    "plug",
    "power",
    "presence",
    "problem",
    "running",
    "safety",
    "smoke",
    "sound",
    "tamper",
    "update",
    "vibration",
    "window",
];

/// Device classes that count as presence sensors by default
pub const DEFAULT_PRESENCE_DEVICE_SENSOR_CLASS: &[&str] = &["motion", "occupancy", "presence"];

/// Sorted copy of a static list, for multi-select choices
pub fn sorted(values: &[&str]) -> Vec<String> {
    let mut values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    values.sort();
    values
}
