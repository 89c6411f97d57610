//! Config and Options Flows for Magic Areas
//!
//! The entry flow creates one config entry per named area. The options flow
//! walks an existing entry through its settings:
//!
//! ```text
//! area_config -> secondary_states -> select_features -> feature_conf_<feature>* -> commit
//!              (regular areas only)
//! ```
//!
//! Selected features that have their own configuration step are pushed on a
//! worklist and configured one at a time; the accumulated options are
//! committed once the worklist is empty.
//!
//! # Key Types
//!
//! - [`ConfigFlow`] - Entry creation from the UI or from YAML import
//! - [`OptionsFlow`] - The options state machine
//! - [`FlowManager`] - Keeps active flows and persists their results
//! - [`MagicArea`] - The area an options flow is configuring

mod area;
mod config_flow;
mod error;
mod handler;
mod manager;
pub mod options;
mod options_flow;
mod result;
mod snapshot;

pub use area::MagicArea;
pub use config_flow::{ConfigFlow, CONFIG_FLOW_VERSION};
pub use error::FlowError;
pub use handler::ConfigFlowHandler;
pub use manager::FlowManager;
pub use options_flow::{OptionsFlow, OptionsFlowState};
pub use result::{FlowErrors, FlowResult, FlowResultType, StepResult, BASE_ERROR};
pub use snapshot::EntitySnapshot;

pub use ma_schema::Map;
