//! The `magic_areas:` section of `configuration.yaml`

use indexmap::IndexMap;
use ma_core::{conf, DOMAIN};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::loader::YamlLoader;

pub const CONFIGURATION_FILE: &str = "configuration.yaml";

/// Areas declared in YAML, in file order, keyed by their YAML key
///
/// Each value is the input handed to the entry flow's import step. It always
/// carries a `name`, defaulting to the key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MagicAreasYaml {
    areas: IndexMap<String, Map<String, JsonValue>>,
}

impl MagicAreasYaml {
    /// Build from the value found under `magic_areas:`
    pub fn from_section(section: &Value) -> ConfigResult<Self> {
        let mapping = match section {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(ConfigError::InvalidArea {
                    area: DOMAIN.to_string(),
                    reason: "expected a mapping of areas".to_string(),
                })
            }
        };

        let mut areas = IndexMap::new();
        for (key, value) in mapping {
            let key = yaml_key(key)?;
            let mut area = match yaml_to_json(value, &key)? {
                JsonValue::Null => Map::new(),
                JsonValue::Object(map) => map,
                _ => {
                    return Err(ConfigError::InvalidArea {
                        area: key,
                        reason: "area configuration must be a mapping".to_string(),
                    })
                }
            };
            area.entry(conf::NAME)
                .or_insert_with(|| JsonValue::String(key.clone()));
            areas.insert(key, area);
        }

        Ok(Self { areas })
    }

    /// Import inputs, in declaration order
    pub fn areas(&self) -> impl Iterator<Item = &Map<String, JsonValue>> {
        self.areas.values()
    }

    pub fn get(&self, key: &str) -> Option<&Map<String, JsonValue>> {
        self.areas.get(key)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

/// Read `configuration.yaml` from `config_dir` and extract its areas.
///
/// A configuration without a `magic_areas:` section has no areas.
pub fn load_magic_areas(config_dir: impl AsRef<Path>) -> ConfigResult<MagicAreasYaml> {
    let mut loader = YamlLoader::new(config_dir.as_ref())?;
    let config = loader.load_file(CONFIGURATION_FILE)?;

    let section = match &config {
        Value::Mapping(root) => root.get(DOMAIN),
        _ => None,
    };
    let Some(section) = section else {
        debug!("No {} section in {}", DOMAIN, CONFIGURATION_FILE);
        return Ok(MagicAreasYaml::default());
    };

    let areas = MagicAreasYaml::from_section(section)?;
    info!("Found {} areas in {}", areas.len(), CONFIGURATION_FILE);
    Ok(areas)
}

fn yaml_key(key: &Value) -> ConfigResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConfigError::InvalidArea {
            area: format!("{:?}", other),
            reason: "area key must be a scalar".to_string(),
        }),
    }
}

fn yaml_to_json(value: &Value, key: &str) -> ConfigResult<JsonValue> {
    serde_json::to_value(value).map_err(|e| ConfigError::InvalidArea {
        area: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_name_defaults_to_key() {
        let section: Value = serde_yaml::from_str(
            "kitchen:\n  clear_timeout: 30\nLiving Room:\n  name: Lounge\nhall:\n",
        )
        .unwrap();
        let areas = MagicAreasYaml::from_section(&section).unwrap();

        let names: Vec<_> = areas.areas().map(|a| a["name"].clone()).collect();
        assert_eq!(names, vec![json!("kitchen"), json!("Lounge"), json!("hall")]);
        assert_eq!(areas.get("kitchen").unwrap()["clear_timeout"], json!(30));
    }

    #[test]
    fn test_rejects_non_mapping_area() {
        let section: Value = serde_yaml::from_str("kitchen:\n  - a\n").unwrap();
        assert!(matches!(
            MagicAreasYaml::from_section(&section),
            Err(ConfigError::InvalidArea { .. })
        ));
    }

    #[test]
    fn test_load_from_config_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("secrets.yaml"), "night: binary_sensor.night\n").unwrap();
        fs::write(
            dir.path().join(CONFIGURATION_FILE),
            concat!(
                "homeassistant:\n  name: Home\n",
                "magic_areas:\n  bedroom:\n    secondary_states:\n",
                "      dark_entity: !secret night\n",
            ),
        )
        .unwrap();

        let areas = load_magic_areas(dir.path()).unwrap();
        assert_eq!(areas.len(), 1);
        let bedroom = areas.get("bedroom").unwrap();
        assert_eq!(bedroom["name"], json!("bedroom"));
        assert_eq!(
            bedroom["secondary_states"]["dark_entity"],
            json!("binary_sensor.night")
        );
    }

    #[test]
    fn test_missing_section() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIGURATION_FILE), "homeassistant:\n").unwrap();
        assert!(load_magic_areas(dir.path()).unwrap().is_empty());
    }
}
