//! Area types and area states

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conf;

/// Kind of area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    #[default]
    Interior,
    Exterior,
    /// Aggregate of other areas
    Meta,
}

impl AreaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaType::Interior => "interior",
            AreaType::Exterior => "exterior",
            AreaType::Meta => "meta",
        }
    }

    /// Types a user may pick for a regular area
    pub const REGULAR: [AreaType; 2] = [AreaType::Interior, AreaType::Exterior];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "interior" => Some(AreaType::Interior),
            "exterior" => Some(AreaType::Exterior),
            "meta" => Some(AreaType::Meta),
            _ => None,
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States an area can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaState {
    Occupied,
    Clear,
    Extended,
    Sleep,
    Dark,
    Bright,
    Accented,
}

impl AreaState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaState::Occupied => "occupied",
            AreaState::Clear => "clear",
            AreaState::Extended => "extended",
            AreaState::Sleep => "sleep",
            AreaState::Dark => "dark",
            AreaState::Bright => "bright",
            AreaState::Accented => "accented",
        }
    }
}

impl fmt::Display for AreaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States every area has without extra configuration
pub const BUILTIN_AREA_STATES: [AreaState; 2] = [AreaState::Occupied, AreaState::Extended];

/// A state driven by a user-designated trigger entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryState {
    pub state: AreaState,
    /// Key under `secondary_states` holding the trigger entity
    pub entity_key: &'static str,
    /// Trigger entity state that activates the area state
    pub active_when: &'static str,
}

impl SecondaryState {
    /// The configurable secondary states, in display order
    pub const ALL: [SecondaryState; 3] = [
        SecondaryState {
            state: AreaState::Sleep,
            entity_key: conf::SLEEP_ENTITY,
            active_when: "on",
        },
        SecondaryState {
            state: AreaState::Dark,
            entity_key: conf::DARK_ENTITY,
            active_when: "on",
        },
        SecondaryState {
            state: AreaState::Accented,
            entity_key: conf::ACCENT_ENTITY,
            active_when: "on",
        },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_type_roundtrip() {
        for t in [AreaType::Interior, AreaType::Exterior, AreaType::Meta] {
            assert_eq!(AreaType::parse(t.as_str()), Some(t));
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, serde_json::json!(t.as_str()));
        }
        assert_eq!(AreaType::parse("garage"), None);
        assert_eq!(AreaType::default(), AreaType::Interior);
    }

    #[test]
    fn test_secondary_state_keys_are_distinct() {
        let keys: Vec<_> = SecondaryState::ALL.iter().map(|s| s.entity_key).collect();
        assert_eq!(keys, vec!["sleep_entity", "dark_entity", "accent_entity"]);
    }
}
