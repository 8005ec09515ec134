use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::error::{AppError, Result};
use crate::domain::schema::{SchemaContract, SchemaKind};
use crate::infrastructure::response::extract_json_payload;

/// Parse raw service output against `schema` and deserialize it into `T`.
///
/// Empty output is `EmptyOutput`; anything unparseable or off-shape is
/// `MalformedOutput` carrying the raw text.
pub fn parse_output<T: DeserializeOwned>(raw: &str, schema: &SchemaContract) -> Result<T> {
    let value = validate_output(raw, schema)?;
    serde_json::from_value(value).map_err(|e| AppError::malformed(e.to_string(), raw))
}

pub fn validate_output(raw: &str, schema: &SchemaContract) -> Result<Value> {
    let payload = extract_json_payload(raw);
    if payload.is_empty() {
        return Err(AppError::EmptyOutput);
    }

    let value: Value = serde_json::from_str(&payload)
        .map_err(|e| AppError::malformed(format!("invalid JSON: {}", e), raw))?;

    conform(&value, schema, "$").map_err(|reason| AppError::malformed(reason, raw))?;
    Ok(value)
}

/// Shape check: container kinds, primitive kinds, required and unlisted keys.
fn conform(value: &Value, schema: &SchemaContract, path: &str) -> std::result::Result<(), String> {
    let mismatch = || {
        format!(
            "{} should be {}, found {}",
            path,
            schema.type_name(),
            json_type(value)
        )
    };

    match &schema.kind {
        SchemaKind::String => value.is_string().then_some(()).ok_or_else(mismatch),
        SchemaKind::Number => value.is_number().then_some(()).ok_or_else(mismatch),
        SchemaKind::Integer => (value.is_i64() || value.is_u64())
            .then_some(())
            .ok_or_else(mismatch),
        SchemaKind::Boolean => value.is_boolean().then_some(()).ok_or_else(mismatch),
        SchemaKind::Array(items) => {
            let array = value.as_array().ok_or_else(mismatch)?;
            array
                .iter()
                .enumerate()
                .try_for_each(|(idx, item)| conform(item, items, &format!("{}[{}]", path, idx)))
        }
        SchemaKind::Object(object) => {
            let map = value.as_object().ok_or_else(mismatch)?;
            if let Some(missing) = object.required.iter().find(|name| !map.contains_key(*name)) {
                return Err(format!("{} is missing required field '{}'", path, missing));
            }
            if !object.allow_additional {
                if let Some(extra) = map
                    .keys()
                    .find(|key| !object.properties.iter().any(|(name, _)| name == *key))
                {
                    return Err(format!("{} has unexpected field '{}'", path, extra));
                }
            }
            object
                .properties
                .iter()
                .filter_map(|(name, property)| map.get(name).map(|v| (name, property, v)))
                .try_for_each(|(name, property, v)| {
                    conform(v, property, &format!("{}.{}", path, name))
                })
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
