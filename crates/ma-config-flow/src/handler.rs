//! Config Flow Handler Trait

use async_trait::async_trait;
use ma_config_entries::ConfigEntrySource;

use crate::error::FlowError;
use crate::result::FlowResult;

/// Interface for driving configuration flows
#[async_trait]
pub trait ConfigFlowHandler: Send + Sync {
    /// Start an entry flow for an integration
    ///
    /// # Arguments
    /// * `handler` - The integration domain
    /// * `source` - Where the request comes from (UI or YAML import)
    /// * `user_input` - Input for the first step, if any
    async fn start_flow(
        &self,
        handler: &str,
        source: ConfigEntrySource,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResult, FlowError>;

    /// Start an options flow for an existing config entry
    async fn start_options_flow(&self, entry_id: &str) -> Result<FlowResult, FlowError>;

    /// Continue a flow with input for its current step
    async fn progress_flow(
        &self,
        flow_id: &str,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResult, FlowError>;

    /// Discard a flow without storing anything
    async fn abort_flow(&self, flow_id: &str) -> Result<(), FlowError>;

    /// Active flows as JSON values
    async fn list_flows(&self) -> Vec<serde_json::Value>;
}
