//! Validation errors

use std::collections::HashMap;
use thiserror::Error;

/// A single failing value, addressed by its path in the input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} @ data[{}]", .path.join("]["))]
pub struct Invalid {
    pub path: Vec<String>,
    pub message: String,
}

impl Invalid {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: vec![field.into()],
            message: message.into(),
        }
    }

    /// Prefix the path with the enclosing field name
    pub fn nested_in(mut self, field: &str) -> Self {
        self.path.insert(0, field.to_string());
        self
    }

    /// Top-level field this error belongs to
    pub fn field(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

/// Errors from validating input against a schema
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more fields failed validation
    #[error("{}", join_errors(.0))]
    MultipleInvalid(Vec<Invalid>),

    /// The input as a whole had the wrong shape
    #[error("expected a mapping, got {0}")]
    NotAMapping(String),
}

impl ValidationError {
    /// The per-field errors, if this is a field-level failure
    pub fn errors(&self) -> Option<&[Invalid]> {
        match self {
            ValidationError::MultipleInvalid(errors) => Some(errors),
            ValidationError::NotAMapping(_) => None,
        }
    }

    /// Messages keyed by the top-level field they belong to.
    ///
    /// When a field has several errors the last one wins.
    pub fn field_errors(&self) -> HashMap<String, String> {
        self.errors()
            .unwrap_or_default()
            .iter()
            .filter_map(|e| Some((e.field()?.to_string(), e.message.clone())))
            .collect()
    }
}

fn join_errors(errors: &[Invalid]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
