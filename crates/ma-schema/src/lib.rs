//! Form schemas and validation
//!
//! A small validation layer modelled on the schemas Home Assistant config
//! flows use. A [`Schema`] is an ordered set of optional fields, each with a
//! default and a [`Validator`]. Validating user input either yields the
//! normalized mapping or a [`ValidationError`] listing every failing field.
//!
//! # Key Types
//!
//! - [`Validator`] - Per-field value checks and coercions
//! - [`Schema`] / [`SchemaField`] - Ordered optional fields
//! - [`OptionSpec`] - One row of a declarative option table
//! - [`build_options_schema`] - Table + saved values + overrides -> schema
//! - [`FormField`] - Serializable rendering of a schema field

mod error;
mod form;
mod schema;
mod validator;

pub use error::{Invalid, ValidationError};
pub use form::FormField;
pub use schema::{build_options_schema, OptionSpec, Schema, SchemaField};
pub use validator::Validator;

/// Input mapping type used throughout the flows
pub type Map = serde_json::Map<String, serde_json::Value>;
