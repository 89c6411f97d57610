//! Field validators

use ma_core::EntityId;
use serde_json::Value;

use crate::error::Invalid;
use crate::schema::Schema;

/// Check (and where sensible coerce) a single field value
#[derive(Debug, Clone)]
pub enum Validator {
    /// `true`/`false`, plus the usual string and 0/1 spellings
    Boolean,
    /// Non-negative integer; numeric strings are accepted
    PositiveInt,
    Float,
    /// Any string; numbers are converted to their string form
    String,
    /// `prefix:name` icon reference
    Icon,
    EntityId,
    /// An entity id or the empty string
    OptionalEntityId,
    /// List of entity ids, or a comma separated string of them
    EntityIds,
    /// List of strings; a single string becomes a one-element list
    StringList,
    /// List whose items must all be among the choices
    MultiSelect(Vec<String>),
    /// Single value that must be one of the choices
    OneOf(Vec<String>),
    /// Nested mapping validated by its own schema
    Nested(Box<Schema>),
    Any,
}

impl Validator {
    /// Multi-select over a list of choices
    pub fn multi_select<S: AsRef<str>>(choices: impl IntoIterator<Item = S>) -> Self {
        Validator::MultiSelect(choices.into_iter().map(|c| c.as_ref().to_string()).collect())
    }

    /// Single choice, like `vol.In`
    pub fn one_of<S: AsRef<str>>(choices: impl IntoIterator<Item = S>) -> Self {
        Validator::OneOf(choices.into_iter().map(|c| c.as_ref().to_string()).collect())
    }

    /// Choices offered to the user, if the validator restricts them
    pub fn choices(&self) -> Option<&[String]> {
        match self {
            Validator::MultiSelect(choices) | Validator::OneOf(choices) => Some(choices),
            _ => None,
        }
    }

    /// Name of the form widget for this validator
    pub fn type_name(&self) -> &'static str {
        match self {
            Validator::Boolean => "boolean",
            Validator::PositiveInt => "integer",
            Validator::Float => "float",
            Validator::String | Validator::Icon => "string",
            Validator::EntityId | Validator::OptionalEntityId => "entity",
            Validator::EntityIds => "entities",
            Validator::StringList => "list",
            Validator::MultiSelect(_) => "multi_select",
            Validator::OneOf(_) => "select",
            Validator::Nested(_) => "mapping",
            Validator::Any => "any",
        }
    }

    /// Validate `value` found under `field`
    pub fn validate(&self, field: &str, value: &Value) -> Result<Value, Vec<Invalid>> {
        match self {
            Validator::Nested(schema) => schema.validate(value).map(Value::Object).map_err(|e| {
                match e.errors() {
                    Some(errors) => errors
                        .iter()
                        .cloned()
                        .map(|err| err.nested_in(field))
                        .collect(),
                    None => vec![Invalid::new(field, "expected a dictionary")],
                }
            }),
            _ => self
                .check(value)
                .map_err(|message| vec![Invalid::new(field, message)]),
        }
    }

    fn check(&self, value: &Value) -> Result<Value, String> {
        match self {
            Validator::Boolean => boolean(value).map(Value::Bool),
            Validator::PositiveInt => positive_int(value).map(Value::from),
            Validator::Float => match value {
                Value::Number(n) => n
                    .as_f64()
                    .map(Value::from)
                    .ok_or_else(|| "expected float".into()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::from)
                    .map_err(|_| "expected float".into()),
                _ => Err("expected float".into()),
            },
            Validator::String => string(value).map(Value::String),
            Validator::Icon => {
                let icon = string(value)?;
                if icon.contains(':') {
                    Ok(Value::String(icon))
                } else {
                    Err("Icons should be specified in the form \"prefix:name\"".into())
                }
            }
            Validator::EntityId => entity_id(value).map(Value::String),
            Validator::OptionalEntityId => match value {
                Value::String(s) if s.is_empty() => Ok(Value::String(String::new())),
                Value::Null => Ok(Value::String(String::new())),
                _ => entity_id(value).map(Value::String),
            },
            Validator::EntityIds => {
                let items: Vec<Value> = match value {
                    Value::String(s) => s
                        .split(',')
                        .map(|part| Value::String(part.trim().to_string()))
                        .filter(|v| v.as_str() != Some(""))
                        .collect(),
                    Value::Array(items) => items.clone(),
                    Value::Null => Vec::new(),
                    _ => return Err("Entity IDs should be a list or comma separated string".into()),
                };
                items
                    .iter()
                    .map(entity_id)
                    .map(|r| r.map(Value::String))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Validator::StringList => match value {
                Value::Null => Ok(Value::Array(Vec::new())),
                Value::Array(items) => items
                    .iter()
                    .map(|item| string(item).map(Value::String))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => string(other).map(|s| Value::Array(vec![Value::String(s)])),
            },
            Validator::MultiSelect(choices) => {
                let Value::Array(items) = value else {
                    return Err("Not a list".into());
                };
                for item in items {
                    let item = item.as_str().ok_or("expected str")?;
                    if !choices.iter().any(|c| c == item) {
                        return Err(format!("{} is not a valid option", item));
                    }
                }
                Ok(value.clone())
            }
            Validator::OneOf(choices) => {
                let choice = value.as_str().ok_or("expected str")?;
                if choices.iter().any(|c| c == choice) {
                    Ok(value.clone())
                } else {
                    Err(format!("value must be one of {:?}", choices))
                }
            }
            Validator::Nested(schema) => schema
                .validate(value)
                .map(Value::Object)
                .map_err(|e| e.to_string()),
            Validator::Any => Ok(value.clone()),
        }
    }
}

fn boolean(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err("invalid boolean value".into()),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" | "enable" => Ok(true),
            "0" | "false" | "no" | "off" | "disable" => Ok(false),
            _ => Err(format!("invalid boolean value {}", s)),
        },
        _ => Err("expected bool".into()),
    }
}

fn positive_int(value: &Value) -> Result<u64, String> {
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or("expected int")?,
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| "expected int")?,
        _ => return Err("expected int".into()),
    };
    u64::try_from(n).map_err(|_| "value must be at least 0".to_string())
}

fn string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err("expected str".into()),
    }
}

fn entity_id(value: &Value) -> Result<String, String> {
    let raw = value.as_str().ok_or("expected str")?;
    let normalized = raw.trim().to_lowercase();
    normalized
        .parse::<EntityId>()
        .map(|id| id.to_string())
        .map_err(|_| format!("Entity ID {} is an invalid entity ID", raw))
}
