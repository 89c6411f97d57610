//! Form field rendering

use serde::{Deserialize, Serialize};

use crate::schema::SchemaField;

/// A schema field as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Fields built by the option tables are never required
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl From<&SchemaField> for FormField {
    fn from(field: &SchemaField) -> Self {
        Self {
            name: field.name.clone(),
            field_type: field.validator.type_name().to_string(),
            required: false,
            default: field.default.clone(),
            suggested_value: field.suggested_value.clone(),
            options: field.validator.choices().map(<[String]>::to_vec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Schema, Validator};
    use serde_json::json;

    #[test]
    fn test_render_select_field() {
        let schema = Schema::new().optional(
            "turn_on_state",
            json!("extended"),
            Validator::one_of(["", "occupied", "extended"]),
        );
        let fields = schema.form_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_type, "select");
        assert_eq!(fields[0].options.as_ref().map(Vec::len), Some(3));

        let json = serde_json::to_value(&fields[0]).unwrap();
        assert_eq!(json["type"], "select");
        assert_eq!(json["default"], "extended");
        assert!(json.get("suggested_value").is_none());
    }
}
