//! Structural contracts for structured completions
//!
//! Response types derive [`JsonSchema`]; the schema shown to the model, the
//! validation of its answer and the mock's default answer all come from that
//! one derive.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

/// JSON Schema generated for a response type
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    schema: Value,
}

impl ResponseSchema {
    pub fn of<T: JsonSchema>() -> Self {
        Self {
            name: T::schema_name().into_owned(),
            schema: schema_for!(T).to_value(),
        }
    }

    /// The schema document, for embedding in prompts
    pub fn to_json_schema(&self) -> &Value {
        &self.schema
    }

    /// Smallest value that satisfies the schema: required fields only
    pub fn minimal_instance(&self) -> Value {
        minimal_value(&self.schema, &self.schema, "value")
    }

    /// Check `value` against the schema, collecting every violation
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        let validator = jsonschema::validator_for(&self.schema).map_err(|e| e.to_string())?;
        let errors: Vec<String> = validator
            .iter_errors(value)
            .map(|e| format!("{} at '{}'", e, e.instance_path))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("; "))
        }
    }
}

/// A response type that can describe its own shape
pub trait StructuredResponse: DeserializeOwned + JsonSchema {
    fn schema() -> ResponseSchema {
        ResponseSchema::of::<Self>()
    }
}

impl<T: DeserializeOwned + JsonSchema> StructuredResponse for T {}

static NULL: Value = Value::Null;

/// Follow a local `#/$defs/...` reference
fn resolve<'a>(schema: &'a Value, root: &'a Value) -> &'a Value {
    match schema.get("$ref").and_then(Value::as_str) {
        Some(reference) => reference
            .strip_prefix("#/")
            .map(|path| path.split('/').fold(root, |node, key| &node[key]))
            .unwrap_or(&NULL),
        None => schema,
    }
}

/// First non-null type named by `type`, `anyOf` or `oneOf`
fn primary_type<'a>(schema: &'a Value, root: &'a Value) -> (Option<&'a str>, &'a Value) {
    let schema = resolve(schema, root);
    match &schema["type"] {
        Value::String(t) => return (Some(t.as_str()), schema),
        Value::Array(types) => {
            let t = types.iter().filter_map(Value::as_str).find(|t| *t != "null");
            return (t.or(Some("null")), schema);
        }
        _ => {}
    }
    let variants = schema["anyOf"].as_array().or_else(|| schema["oneOf"].as_array());
    for variant in variants.into_iter().flatten() {
        let (t, resolved) = primary_type(variant, root);
        if t.is_some_and(|t| t != "null") {
            return (t, resolved);
        }
    }
    (None, schema)
}

fn minimal_value(schema: &Value, root: &Value, name: &str) -> Value {
    let (kind, schema) = primary_type(schema, root);
    match kind {
        Some("object") => {
            let properties = &schema["properties"];
            let map: Map<String, Value> = schema["required"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(|field| (field.to_string(), minimal_value(&properties[field], root, field)))
                .collect();
            Value::Object(map)
        }
        Some("string") => Value::String(format!("mock_{name}")),
        Some("number") => json!(0.0),
        Some("integer") => json!(0),
        Some("boolean") => Value::Bool(false),
        Some("array") => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Item {
        id: String,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Sample {
        /// 0 to 1
        score: f64,
        notes: Vec<String>,
        label: String,
        #[serde(default)]
        items: Vec<Item>,
        #[serde(default)]
        comment: Option<String>,
    }

    #[test]
    fn test_json_schema_lists_required_fields() {
        let schema = Sample::schema();
        assert_eq!(schema.name, "Sample");
        let doc = schema.to_json_schema();
        assert_eq!(doc["type"], "object");
        assert_eq!(doc["required"], json!(["score", "notes", "label"]));
        assert_eq!(doc["properties"]["score"]["description"], "0 to 1");
    }

    #[test]
    fn test_minimal_instance_fills_required_only() {
        let schema = Sample::schema();
        let minimal = schema.minimal_instance();
        assert_eq!(minimal, json!({"score": 0.0, "notes": [], "label": "mock_label"}));
        assert!(schema.validate(&minimal).is_ok());
    }

    #[test]
    fn test_minimal_instance_follows_refs() {
        #[derive(Debug, Deserialize, JsonSchema)]
        #[allow(dead_code)]
        struct Wrapper {
            item: Item,
        }
        let minimal = Wrapper::schema().minimal_instance();
        assert_eq!(minimal, json!({"item": {"id": "mock_id"}}));
    }

    #[test]
    fn test_validate_rejects_bad_nested_items() {
        let value = json!({"score": 1, "notes": [], "label": "x", "items": [{"id": 4}]});
        let err = Sample::schema().validate(&value).unwrap_err();
        assert!(err.contains("/items/0/id"));
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert!(Sample::schema().validate(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_optional_field_accepts_null() {
        let value = json!({"score": 1, "notes": [], "label": "x", "comment": null});
        assert!(Sample::schema().validate(&value).is_ok());
    }
}
