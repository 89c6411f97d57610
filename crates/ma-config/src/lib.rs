//! YAML configuration loading for Magic Areas
//!
//! Reads `configuration.yaml` with the custom tags people use in their
//! Home Assistant configuration:
//!
//! - `!include path` - Include another YAML file
//! - `!include_dir_named dir` - Include all YAML files as a mapping
//! - `!secret key` - Substitute from secrets.yaml
//! - `!env_var VAR` - Environment variable substitution
//!
//! The `magic_areas:` section is turned into one import input per area.
//!
//! # Example
//!
//! ```ignore
//! use ma_config::load_magic_areas;
//!
//! for area in load_magic_areas("/config")?.areas() {
//!     println!("{}", area["name"]);
//! }
//! ```

mod error;
mod loader;
mod magic_areas;
mod secrets;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, YamlLoader};
pub use magic_areas::{load_magic_areas, MagicAreasYaml, CONFIGURATION_FILE};
pub use secrets::Secrets;

pub use serde_yaml::Value;
