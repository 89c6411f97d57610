//! Flow errors

use ma_config_entries::ConfigEntriesError;
use thiserror::Error;

use crate::result::FlowErrors;

/// Errors returned to whoever drives a flow
///
/// Validation failures inside a step are not errors: the step shows its
/// form again with an error map. These are failures of the request itself.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Flow {0} not found")]
    UnknownFlow(String),

    #[error("No flow handler for {0}")]
    UnknownHandler(String),

    #[error("Step {step_id} submitted, but the flow is at {expected}")]
    UnknownStep { step_id: String, expected: String },

    /// Entry-flow input that cannot create an entry
    #[error("Invalid user input: {0:?}")]
    InvalidInput(FlowErrors),

    #[error("Config entry {0} not found")]
    EntryNotFound(String),

    #[error(transparent)]
    ConfigEntries(#[from] ConfigEntriesError),
}
