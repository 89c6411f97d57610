//! Flow Manager
//!
//! Keeps the active options flows and persists what finished flows produce.
//! Entry flows finish in a single step and are never kept.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

use ma_config_entries::{
    ConfigEntries, ConfigEntriesError, ConfigEntry, ConfigEntrySource, ConfigEntryUpdate,
};
use ma_core::DOMAIN;
use ma_registries::Registries;
use ma_schema::Schema;
use serde_json::Value;

use crate::area::MagicArea;
use crate::config_flow::{ConfigFlow, ABORT_ALREADY_CONFIGURED, CONFIG_FLOW_VERSION};
use crate::error::FlowError;
use crate::handler::ConfigFlowHandler;
use crate::options_flow::OptionsFlow;
use crate::result::{FlowErrors, FlowResult, StepResult, BASE_ERROR};

/// Active options flow state
struct ActiveFlow {
    /// Entry the flow edits
    entry_id: String,
    flow: OptionsFlow,
    /// Current step ID
    current_step: String,
    /// Schema of the form last shown
    data_schema: Option<Schema>,
}

impl ActiveFlow {
    fn track(&mut self, step: &StepResult) {
        if let StepResult::Form {
            step_id, schema, ..
        } = step
        {
            self.current_step = step_id.clone();
            self.data_schema = Some(schema.clone());
        }
    }
}

/// Manages active configuration flows
pub struct FlowManager {
    /// Active flows: flow_id -> flow state
    flows: RwLock<HashMap<String, ActiveFlow>>,
    entries: Arc<ConfigEntries>,
    registries: Arc<Registries>,
}

impl FlowManager {
    pub fn new(entries: Arc<ConfigEntries>, registries: Arc<Registries>) -> Self {
        Self {
            flows: RwLock::new(HashMap::new()),
            entries,
            registries,
        }
    }

    pub fn entries(&self) -> &ConfigEntries {
        &self.entries
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Store the entry an entry flow produced
    async fn create_entry(
        &self,
        flow_id: &str,
        flow: &ConfigFlow,
        step: StepResult,
    ) -> Result<FlowResult, FlowError> {
        let (title, data) = match step {
            StepResult::CreateEntry { title, data } => (title, data),
            other => return Ok(FlowResult::from_step(flow_id, DOMAIN, &other)),
        };

        let mut entry = ConfigEntry::new(DOMAIN, title.clone())
            .with_data(data.clone())
            .with_source(flow.source())
            .with_version(CONFIG_FLOW_VERSION, 1);
        if let Some(unique_id) = flow.unique_id() {
            entry = entry.with_unique_id(unique_id);
        }

        match self.entries.add(entry).await {
            Ok(entry) => {
                let step = StepResult::CreateEntry { title, data };
                Ok(FlowResult::from_step(flow_id, DOMAIN, &step)
                    .with_result(entry_json(&entry), CONFIG_FLOW_VERSION))
            }
            Err(ConfigEntriesError::AlreadyExists { .. }) => Ok(FlowResult::from_step(
                flow_id,
                DOMAIN,
                &StepResult::abort(ABORT_ALREADY_CONFIGURED),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ConfigFlowHandler for FlowManager {
    async fn start_flow(
        &self,
        handler: &str,
        source: ConfigEntrySource,
        user_input: Option<Value>,
    ) -> Result<FlowResult, FlowError> {
        if handler != DOMAIN {
            return Err(FlowError::UnknownHandler(handler.to_string()));
        }

        let flow_id = Ulid::new().to_string().to_lowercase();
        info!(
            "Starting config flow for {} ({}) with flow_id {}",
            handler,
            source.as_str(),
            flow_id
        );

        let user_input = match user_input {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                debug!("Rejecting flow input {}", other);
                return Err(FlowError::InvalidInput(base_error("expected a mapping")));
            }
        };

        let mut flow = ConfigFlow::new(source);
        let step = match source {
            ConfigEntrySource::User => flow.step_user(&self.entries, user_input).await?,
            ConfigEntrySource::Import => {
                let user_input = user_input
                    .ok_or_else(|| FlowError::InvalidInput(base_error("import needs data")))?;
                flow.step_import(&self.entries, user_input).await?
            }
        };

        let result = self.create_entry(&flow_id, &flow, step).await?;
        info!(
            "Flow {} completed with result type: {}",
            flow_id,
            result.result_type.as_str()
        );
        Ok(result)
    }

    async fn start_options_flow(&self, entry_id: &str) -> Result<FlowResult, FlowError> {
        let entry = self
            .entries
            .get(entry_id)
            .ok_or_else(|| FlowError::EntryNotFound(entry_id.to_string()))?;

        let flow_id = Ulid::new().to_string().to_lowercase();
        info!(
            "Starting options flow for {} ({}) with flow_id {}",
            entry.title, entry_id, flow_id
        );

        let area = MagicArea::from_entry(&entry, &self.registries, &self.entries);
        let mut flow = OptionsFlow::new(&entry, area);
        let step = flow.step_init(&self.registries.entities.entity_ids());
        let result = FlowResult::from_step(&flow_id, entry_id, &step);

        let mut active = ActiveFlow {
            entry_id: entry_id.to_string(),
            flow,
            current_step: String::new(),
            data_schema: None,
        };
        active.track(&step);
        self.flows.write().await.insert(flow_id, active);

        Ok(result)
    }

    async fn progress_flow(
        &self,
        flow_id: &str,
        user_input: Option<Value>,
    ) -> Result<FlowResult, FlowError> {
        let mut flows = self.flows.write().await;
        let active = flows
            .get_mut(flow_id)
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;

        info!(
            "Progressing flow {} for {} at step {}",
            flow_id, active.entry_id, active.current_step
        );

        // Input is checked against the form that was shown before the step
        // sees it, so omitted fields arrive with their pre-filled values.
        // Rejected input shows the same form again with the errors.
        let user_input = match (user_input, &active.data_schema) {
            (Some(input), Some(schema)) => match schema.validate(&input) {
                Ok(valid) => Some(Value::Object(valid)),
                Err(err) => {
                    let step = StepResult::form(
                        active.current_step.clone(),
                        schema.clone(),
                        active.flow.input_errors(&err),
                    );
                    return Ok(FlowResult::from_step(flow_id, &active.entry_id, &step));
                }
            },
            (input, _) => input,
        };

        let step_id = active.current_step.clone();
        let step = active.flow.step(&step_id, user_input.as_ref())?;
        active.track(&step);

        let entry_id = active.entry_id.clone();
        let mut result = FlowResult::from_step(flow_id, &entry_id, &step);

        if step.is_finished() {
            flows.remove(flow_id);
            drop(flows);

            if let StepResult::CreateEntry { data, .. } = step {
                let entry = self
                    .entries
                    .update(&entry_id, ConfigEntryUpdate::new().options(data))
                    .await?;
                result = result.with_result(entry_json(&entry), entry.version);
            }
            info!(
                "Flow {} completed with result type: {}",
                flow_id,
                result.result_type.as_str()
            );
        }

        Ok(result)
    }

    async fn abort_flow(&self, flow_id: &str) -> Result<(), FlowError> {
        self.flows
            .write()
            .await
            .remove(flow_id)
            .map(|_| info!("Aborted flow {}", flow_id))
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))
    }

    async fn list_flows(&self) -> Vec<Value> {
        let flows = self.flows.read().await;
        flows
            .iter()
            .map(|(flow_id, flow)| {
                serde_json::json!({
                    "flow_id": flow_id,
                    "handler": flow.entry_id,
                    "step_id": flow.current_step,
                    "context": {
                        "source": "options"
                    }
                })
            })
            .collect()
    }
}

fn base_error(message: &str) -> FlowErrors {
    debug!("Flow input rejected: {}", message);
    FlowErrors::from([(BASE_ERROR.to_string(), message.to_string())])
}

fn entry_json(entry: &ConfigEntry) -> Value {
    serde_json::to_value(entry).unwrap_or_default()
}
