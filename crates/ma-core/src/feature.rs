//! Feature catalogue
//!
//! Features are optional derived behaviors enabled per area. A subset of
//! them ([`ConfigurableFeature`]) have a dedicated configuration step in the
//! options flow; the rest are recorded with an empty configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown feature '{0}'")]
pub struct FeatureParseError(pub String);

/// Every feature an area can enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    LightGroups,
    ClimateGroups,
    MediaPlayerGroups,
    CoverGroups,
    AreaAwareMediaPlayer,
    Aggregates,
    Health,
    PresenceHold,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::LightGroups => "light_groups",
            Feature::ClimateGroups => "climate_groups",
            Feature::MediaPlayerGroups => "media_player_groups",
            Feature::CoverGroups => "cover_groups",
            Feature::AreaAwareMediaPlayer => "area_aware_media_player",
            Feature::Aggregates => "aggregates",
            Feature::Health => "health",
            Feature::PresenceHold => "presence_hold",
        }
    }

    /// The configuration step for this feature, if it has one
    pub fn configurable(&self) -> Option<ConfigurableFeature> {
        match self {
            Feature::LightGroups => Some(ConfigurableFeature::LightGroups),
            Feature::ClimateGroups => Some(ConfigurableFeature::ClimateGroups),
            Feature::AreaAwareMediaPlayer => Some(ConfigurableFeature::AreaAwareMediaPlayer),
            Feature::Aggregates => Some(ConfigurableFeature::Aggregates),
            Feature::PresenceHold => Some(ConfigurableFeature::PresenceHold),
            Feature::MediaPlayerGroups | Feature::CoverGroups | Feature::Health => None,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = FeatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FEATURE_LIST
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| FeatureParseError(s.to_string()))
    }
}

/// Features with a dedicated `feature_conf_<feature>` step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurableFeature {
    LightGroups,
    ClimateGroups,
    AreaAwareMediaPlayer,
    Aggregates,
    PresenceHold,
}

impl ConfigurableFeature {
    pub const ALL: [ConfigurableFeature; 5] = [
        ConfigurableFeature::LightGroups,
        ConfigurableFeature::ClimateGroups,
        ConfigurableFeature::AreaAwareMediaPlayer,
        ConfigurableFeature::Aggregates,
        ConfigurableFeature::PresenceHold,
    ];

    pub fn feature(&self) -> Feature {
        match self {
            ConfigurableFeature::LightGroups => Feature::LightGroups,
            ConfigurableFeature::ClimateGroups => Feature::ClimateGroups,
            ConfigurableFeature::AreaAwareMediaPlayer => Feature::AreaAwareMediaPlayer,
            ConfigurableFeature::Aggregates => Feature::Aggregates,
            ConfigurableFeature::PresenceHold => Feature::PresenceHold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.feature().as_str()
    }

    /// Step id of the feature's configuration form
    pub fn step_id(&self) -> String {
        format!("feature_conf_{}", self.as_str())
    }

    /// Inverse of [`ConfigurableFeature::step_id`]
    pub fn from_step_id(step_id: &str) -> Option<Self> {
        let name = step_id.strip_prefix("feature_conf_")?;
        name.parse::<Feature>().ok()?.configurable()
    }
}

impl From<ConfigurableFeature> for Feature {
    fn from(feature: ConfigurableFeature) -> Self {
        feature.feature()
    }
}

impl fmt::Display for ConfigurableFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Features offered for meta areas other than the global one
pub const FEATURE_LIST_META: &[Feature] = &[
    Feature::MediaPlayerGroups,
    Feature::LightGroups,
    Feature::ClimateGroups,
    Feature::CoverGroups,
    Feature::Aggregates,
    Feature::Health,
];

/// Features offered for regular areas
pub const FEATURE_LIST: &[Feature] = &[
    Feature::MediaPlayerGroups,
    Feature::LightGroups,
    Feature::ClimateGroups,
    Feature::CoverGroups,
    Feature::Aggregates,
    Feature::Health,
    Feature::AreaAwareMediaPlayer,
    Feature::PresenceHold,
];

/// Features offered for the global meta area
pub const FEATURE_LIST_GLOBAL: &[Feature] = &[
    Feature::MediaPlayerGroups,
    Feature::LightGroups,
    Feature::ClimateGroups,
    Feature::CoverGroups,
    Feature::Aggregates,
    Feature::Health,
    Feature::AreaAwareMediaPlayer,
];

/// Features that have a step for regular areas but not for meta areas
pub const NON_CONFIGURABLE_FEATURES_META: &[Feature] = &[Feature::LightGroups];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_features() {
        for feature in FEATURE_LIST {
            assert_eq!(feature.as_str().parse::<Feature>().unwrap(), *feature);
        }
        assert_eq!(
            "teleporter".parse::<Feature>().unwrap_err(),
            FeatureParseError("teleporter".to_string())
        );
    }

    #[test]
    fn test_step_ids() {
        assert_eq!(
            ConfigurableFeature::LightGroups.step_id(),
            "feature_conf_light_groups"
        );
        for feature in ConfigurableFeature::ALL {
            assert_eq!(
                ConfigurableFeature::from_step_id(&feature.step_id()),
                Some(feature)
            );
        }
        assert_eq!(ConfigurableFeature::from_step_id("feature_conf_health"), None);
        assert_eq!(ConfigurableFeature::from_step_id("area_config"), None);
    }

    #[test]
    fn test_configurable_subset() {
        let configurable: Vec<_> = FEATURE_LIST
            .iter()
            .filter_map(|f| f.configurable())
            .collect();
        assert_eq!(configurable.len(), ConfigurableFeature::ALL.len());
        for feature in ConfigurableFeature::ALL {
            assert_eq!(feature.feature().configurable(), Some(feature));
        }
    }

    #[test]
    fn test_feature_lists_nest() {
        for feature in FEATURE_LIST_META {
            assert!(FEATURE_LIST.contains(feature));
            assert!(FEATURE_LIST_GLOBAL.contains(feature));
        }
        assert!(!FEATURE_LIST_GLOBAL.contains(&Feature::PresenceHold));
    }
}
