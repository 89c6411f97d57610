//! Step and flow results

use ma_schema::{FormField, Map, Schema};
use serde::Serialize;
use std::collections::HashMap;

/// Error messages keyed by field name, `base` for form-wide errors
pub type FlowErrors = HashMap<String, String>;

/// Key of errors that belong to no single field
pub const BASE_ERROR: &str = "base";

/// What a flow step asks for next
#[derive(Debug, Clone)]
pub enum StepResult {
    /// Show a form and wait for input
    Form {
        step_id: String,
        schema: Schema,
        errors: FlowErrors,
    },
    /// Finish, storing `data`
    CreateEntry { title: String, data: Map },
    /// Finish without storing anything
    Abort { reason: String },
}

impl StepResult {
    pub fn form(step_id: impl Into<String>, schema: Schema, errors: FlowErrors) -> Self {
        StepResult::Form {
            step_id: step_id.into(),
            schema,
            errors,
        }
    }

    pub fn abort(reason: impl Into<String>) -> Self {
        StepResult::Abort {
            reason: reason.into(),
        }
    }

    pub fn step_id(&self) -> Option<&str> {
        match self {
            StepResult::Form { step_id, .. } => Some(step_id),
            _ => None,
        }
    }

    pub fn errors(&self) -> Option<&FlowErrors> {
        match self {
            StepResult::Form { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, StepResult::Form { .. })
    }

    pub fn result_type(&self) -> FlowResultType {
        match self {
            StepResult::Form { .. } => FlowResultType::Form,
            StepResult::CreateEntry { .. } => FlowResultType::CreateEntry,
            StepResult::Abort { .. } => FlowResultType::Abort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowResultType {
    Form,
    CreateEntry,
    Abort,
}

impl FlowResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowResultType::Form => "form",
            FlowResultType::CreateEntry => "create_entry",
            FlowResultType::Abort => "abort",
        }
    }
}

/// Result of starting or progressing a flow, as returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    pub flow_id: String,
    /// Integration domain for entry flows, entry id for options flows
    pub handler: String,
    #[serde(rename = "type")]
    pub result_type: FlowResultType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    /// Always present, empty if the result is not a form
    pub data_schema: Vec<FormField>,
    /// Errors from the previous submission (null if none)
    pub errors: Option<FlowErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// The stored config entry, for create_entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl FlowResult {
    pub fn from_step(flow_id: &str, handler: &str, step: &StepResult) -> Self {
        let mut result = Self {
            flow_id: flow_id.to_string(),
            handler: handler.to_string(),
            result_type: step.result_type(),
            step_id: None,
            data_schema: Vec::new(),
            errors: None,
            title: None,
            reason: None,
            version: None,
            result: None,
        };

        match step {
            StepResult::Form {
                step_id,
                schema,
                errors,
            } => {
                result.step_id = Some(step_id.clone());
                result.data_schema = schema.form_fields();
                result.errors = (!errors.is_empty()).then(|| errors.clone());
            }
            StepResult::CreateEntry { title, .. } => {
                result.title = Some(title.clone());
            }
            StepResult::Abort { reason } => {
                result.reason = Some(reason.clone());
            }
        }
        result
    }

    pub fn with_result(mut self, result: serde_json::Value, version: u32) -> Self {
        self.result = Some(result);
        self.version = Some(version);
        self
    }
}
