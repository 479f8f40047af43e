//! The single serialization path for outgoing payloads.
//!
//! Felts are far larger than the integers most JSON consumers hold exactly,
//! so every large value must travel as a string. [to_wire_json] enforces this
//! by rejecting any native JSON number outside `±(2^53 - 1)`.
use courier_common::MAX_SAFE_INTEGER;
use serde_json::{Number, Value};

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{number} at {path} cannot be represented exactly as a JSON number")]
    UnsafeNumber { path: String, number: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Serializes `value` to a JSON value, refusing native numbers outside the
/// exactly representable integer range.
pub fn to_wire_value<T>(value: &T) -> Result<Value, SerializationError>
where
    T: serde::Serialize + ?Sized,
{
    let value = serde_json::to_value(value)?;
    visit_numbers(&value, &mut String::from("$"), &is_safe_integer)?;
    Ok(value)
}

/// Same as [to_wire_value], producing the request body bytes.
pub fn to_wire_json<T>(value: &T) -> Result<Vec<u8>, SerializationError>
where
    T: serde::Serialize + ?Sized,
{
    let value = to_wire_value(value)?;
    Ok(serde_json::to_vec(&value)?)
}

/// Checks that every number inside `value` is an integer, of any magnitude.
pub fn ensure_integral(value: &Value) -> Result<(), SerializationError> {
    visit_numbers(value, &mut String::from("$"), &is_integral)
}

fn is_safe_integer(number: &Number) -> bool {
    if let Some(value) = number.as_u64() {
        value <= MAX_SAFE_INTEGER
    } else if let Some(value) = number.as_i64() {
        value.unsigned_abs() <= MAX_SAFE_INTEGER
    } else {
        false
    }
}

fn is_integral(number: &Number) -> bool {
    number.is_u64()
        || number.is_i64()
        || !number.to_string().contains(['.', 'e', 'E'])
}

fn visit_numbers(
    value: &Value,
    path: &mut String,
    accept: &dyn Fn(&Number) -> bool,
) -> Result<(), SerializationError> {
    match value {
        Value::Number(number) if !accept(number) => Err(SerializationError::UnsafeNumber {
            path: path.clone(),
            number: number.to_string(),
        }),
        Value::Array(items) => items.iter().enumerate().try_for_each(|(i, item)| {
            let len = path.len();
            path.push_str(&format!("[{i}]"));
            let result = visit_numbers(item, path, accept);
            path.truncate(len);
            result
        }),
        Value::Object(fields) => fields.iter().try_for_each(|(key, item)| {
            let len = path.len();
            path.push('.');
            path.push_str(key);
            let result = visit_numbers(item, path, accept);
            path.truncate(len);
            result
        }),
        _ => Ok(()),
    }
}
