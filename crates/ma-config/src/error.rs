//! Errors raised while reading `configuration.yaml` and its includes

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid YAML: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `!secret` referenced a key missing from `secrets.yaml`
    #[error("no secret named '{key}'")]
    UnknownSecret { key: String },

    #[error("cannot include {target}: {reason}")]
    BadInclude { target: String, reason: String },

    #[error("{} is not a directory", path.display())]
    MissingDirectory { path: PathBuf },

    /// A file ended up including itself
    #[error("{} includes itself", path.display())]
    IncludeCycle { path: PathBuf },

    #[error("environment variable '{var}' is not set")]
    MissingEnvVar { var: String },

    #[error("{tag} expects a string argument")]
    TagArgument { tag: String },

    /// The `magic_areas:` section, or one area in it, has the wrong shape
    #[error("magic_areas area '{area}': {reason}")]
    InvalidArea { area: String, reason: String },
}
