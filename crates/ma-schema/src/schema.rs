//! Ordered optional-field schemas

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{Invalid, ValidationError};
use crate::form::FormField;
use crate::validator::Validator;
use crate::Map;

/// One optional field of a [`Schema`]
#[derive(Debug, Clone)]
pub struct SchemaField {
    pub name: String,
    /// Used when the field is missing from the input
    pub default: Option<Value>,
    /// Pre-fills the form without affecting validation
    pub suggested_value: Option<Value>,
    pub validator: Validator,
}

/// An ordered set of optional fields
///
/// Field order is declaration order and is kept for rendering.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, SchemaField>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an optional field with a default
    pub fn optional(mut self, name: &str, default: Value, validator: Validator) -> Self {
        self.insert(SchemaField {
            name: name.to_string(),
            default: Some(default),
            suggested_value: None,
            validator,
        });
        self
    }

    pub fn insert(&mut self, field: SchemaField) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a mapping, filling defaults for missing fields.
    ///
    /// Every failing field is reported, not just the first one. Keys the
    /// schema does not know are rejected.
    pub fn validate(&self, input: &Value) -> Result<Map, ValidationError> {
        let Value::Object(input) = input else {
            return Err(ValidationError::NotAMapping(value_kind(input).to_string()));
        };

        let mut output = Map::new();
        let mut errors = Vec::new();

        for key in input.keys() {
            if !self.fields.contains_key(key) {
                errors.push(Invalid::new(key.as_str(), "extra keys not allowed"));
            }
        }

        for field in self.fields.values() {
            match input.get(&field.name) {
                Some(value) => match field.validator.validate(&field.name, value) {
                    Ok(valid) => {
                        output.insert(field.name.clone(), valid);
                    }
                    Err(mut field_errors) => errors.append(&mut field_errors),
                },
                None => {
                    if let Some(default) = &field.default {
                        output.insert(field.name.clone(), default.clone());
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(ValidationError::MultipleInvalid(errors))
        }
    }

    /// Render the fields for a form
    pub fn form_fields(&self) -> Vec<FormField> {
        self.fields.values().map(FormField::from).collect()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// One row of a declarative option table: name, default, base validator
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: Value,
    pub validator: Validator,
}

impl OptionSpec {
    pub fn new(name: &'static str, default: Value, validator: Validator) -> Self {
        Self {
            name,
            default,
            validator,
        }
    }
}

/// Build a form schema from an option table.
///
/// Each field is optional. Its default is the saved value when there is one,
/// otherwise the declared default, and the saved value is also offered as the
/// suggested value. A validator in `dynamic_validators` replaces the table's
/// base validator for that field.
pub fn build_options_schema(
    options: &[OptionSpec],
    saved_options: &Map,
    dynamic_validators: &HashMap<&str, Validator>,
) -> Schema {
    debug!(
        "Building schema from options: {:?} - dynamic validators for: {:?}",
        options.iter().map(|o| o.name).collect::<Vec<_>>(),
        dynamic_validators.keys().collect::<Vec<_>>()
    );
    debug!("Data for pre-populating fields: {:?}", saved_options);

    let mut schema = Schema::new();
    for option in options {
        let saved = saved_options.get(option.name).cloned();
        schema.insert(SchemaField {
            name: option.name.to_string(),
            default: Some(saved.clone().unwrap_or_else(|| option.default.clone())),
            suggested_value: saved,
            validator: dynamic_validators
                .get(option.name)
                .cloned()
                .unwrap_or_else(|| option.validator.clone()),
        });
    }

    debug!("Built schema with fields: {:?}", schema.names());
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("clear_timeout", json!(60), Validator::PositiveInt),
            OptionSpec::new("icon", json!("mdi:texture-box"), Validator::Icon),
            OptionSpec::new("exclude_entities", json!([]), Validator::EntityIds),
        ]
    }

    #[test]
    fn test_validate_fills_defaults() {
        let schema = build_options_schema(&table(), &Map::new(), &HashMap::new());
        let out = schema.validate(&json!({"clear_timeout": "30"})).unwrap();
        assert_eq!(out["clear_timeout"], json!(30));
        assert_eq!(out["icon"], json!("mdi:texture-box"));
        assert_eq!(out["exclude_entities"], json!([]));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let schema = build_options_schema(&table(), &Map::new(), &HashMap::new());
        let err = schema
            .validate(&json!({"clear_timeout": -5, "icon": "sofa", "bogus": 1}))
            .unwrap_err();
        let fields: Vec<_> = err.errors().unwrap().iter().filter_map(|e| e.field()).collect();
        assert_eq!(fields, vec!["bogus", "clear_timeout", "icon"]);
    }

    #[test]
    fn test_validate_rejects_non_mapping() {
        let schema = Schema::new();
        assert_eq!(
            schema.validate(&json!(["a"])),
            Err(ValidationError::NotAMapping("list".to_string()))
        );
    }

    #[test]
    fn test_field_order_preserved() {
        let schema = build_options_schema(&table(), &Map::new(), &HashMap::new());
        assert_eq!(
            schema.names(),
            vec!["clear_timeout", "icon", "exclude_entities"]
        );
    }

    #[test]
    fn test_saved_values_become_defaults() {
        let mut saved = Map::new();
        saved.insert("clear_timeout".into(), json!(120));
        let schema = build_options_schema(&table(), &saved, &HashMap::new());

        let field = schema.get("clear_timeout").unwrap();
        assert_eq!(field.default, Some(json!(120)));
        assert_eq!(field.suggested_value, Some(json!(120)));

        let icon = schema.get("icon").unwrap();
        assert_eq!(icon.default, Some(json!("mdi:texture-box")));
        assert_eq!(icon.suggested_value, None);

        assert_eq!(schema.validate(&json!({})).unwrap()["clear_timeout"], json!(120));
    }

    #[test]
    fn test_dynamic_validator_overrides_base() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "exclude_entities",
            Validator::multi_select(["light.desk"]),
        );
        let schema = build_options_schema(&table(), &Map::new(), &overrides);

        assert!(schema
            .validate(&json!({"exclude_entities": ["light.desk"]}))
            .is_ok());
        assert!(schema
            .validate(&json!({"exclude_entities": ["light.other"]}))
            .is_err());
    }

    #[test]
    fn test_nested_errors_carry_path() {
        let inner = Schema::new().optional("dark_entity", json!(""), Validator::OptionalEntityId);
        let schema = Schema::new().optional(
            "secondary_states",
            json!({}),
            Validator::Nested(Box::new(inner)),
        );

        let err = schema
            .validate(&json!({"secondary_states": {"dark_entity": "not an id"}}))
            .unwrap_err();
        let invalid = &err.errors().unwrap()[0];
        assert_eq!(invalid.path, vec!["secondary_states", "dark_entity"]);
        assert_eq!(invalid.field(), Some("secondary_states"));

        let ok = schema
            .validate(&json!({"secondary_states": {}}))
            .unwrap();
        assert_eq!(ok["secondary_states"], json!({"dark_entity": ""}));
    }
}
