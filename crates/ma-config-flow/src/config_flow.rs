//! Entry flow: one config entry per named area

use ma_config_entries::{ConfigEntries, ConfigEntrySource, ConfigEntryUpdate};
use ma_core::{conf, DOMAIN};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::FlowError;
use crate::result::{FlowErrors, StepResult};
use crate::Map;

/// Version of the entries this flow creates
pub const CONFIG_FLOW_VERSION: u32 = 1;

pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";
pub const ABORT_NOT_SUPPORTED: &str = "not_supported";

/// Creates config entries, keyed by area name
#[derive(Debug, Clone)]
pub struct ConfigFlow {
    source: ConfigEntrySource,
    unique_id: Option<String>,
}

impl ConfigFlow {
    pub fn new(source: ConfigEntrySource) -> Self {
        Self {
            source,
            unique_id: None,
        }
    }

    pub fn source(&self) -> ConfigEntrySource {
        self.source
    }

    /// Set once a step has seen the area name
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    /// Areas are only added through YAML or automatically; an empty UI
    /// submission is refused.
    pub async fn step_user(
        &mut self,
        entries: &ConfigEntries,
        user_input: Option<Map>,
    ) -> Result<StepResult, FlowError> {
        let Some(user_input) = user_input else {
            return Ok(StepResult::abort(ABORT_NOT_SUPPORTED));
        };

        let name = self.set_unique_id(&user_input)?;
        if let Some(abort) = self.abort_if_unique_id_configured(entries) {
            return Ok(abort);
        }

        Ok(StepResult::CreateEntry {
            title: name,
            data: user_input,
        })
    }

    /// An area already present is refreshed with the imported data before
    /// the flow aborts as a duplicate.
    pub async fn step_import(
        &mut self,
        entries: &ConfigEntries,
        user_input: Map,
    ) -> Result<StepResult, FlowError> {
        let name = self.set_unique_id(&user_input)?;

        if let Some(existing) = entries.get_by_unique_id(DOMAIN, &name) {
            entries
                .update(
                    &existing.entry_id,
                    ConfigEntryUpdate::new().data(user_input.clone()),
                )
                .await?;
            info!("Updated config entry {} from import", name);
            if let Some(abort) = self.abort_if_unique_id_configured(entries) {
                return Ok(abort);
            }
        }

        Ok(StepResult::CreateEntry {
            title: name,
            data: user_input,
        })
    }

    fn set_unique_id(&mut self, user_input: &Map) -> Result<String, FlowError> {
        let name = match user_input.get(conf::NAME) {
            Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
            Some(_) => return Err(invalid_name("expected a non-empty string")),
            None => return Err(invalid_name("required key not provided")),
        };
        debug!("Entry flow ({}) for area {}", self.source.as_str(), name);
        self.unique_id = Some(name.clone());
        Ok(name)
    }

    fn abort_if_unique_id_configured(&self, entries: &ConfigEntries) -> Option<StepResult> {
        let unique_id = self.unique_id.as_deref()?;
        entries
            .get_by_unique_id(DOMAIN, unique_id)
            .map(|_| StepResult::abort(ABORT_ALREADY_CONFIGURED))
    }
}

fn invalid_name(message: &str) -> FlowError {
    let mut errors = FlowErrors::new();
    errors.insert(conf::NAME.to_string(), message.to_string());
    FlowError::InvalidInput(errors)
}
