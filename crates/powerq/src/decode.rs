//! Response decoding for power-query payloads.
//!
//! The server returns either a bare JSON array of records or an object
//! wrapping the array under the `record` key. When a query matches zero
//! rows the wrapping object omits the key entirely, so an empty object
//! decodes as an empty result rather than an error.
//!
//! Decoding is strict and all-or-nothing: the first record that fails to
//! decode aborts the whole response, so callers never see a half-formed
//! roster. Output order is the server's array order.

use serde::de::DeserializeOwned;
use serde_json::Value;
use smol_str::SmolStr;

use powerq_common::error::DecodeError;

/// Key the server wraps record arrays under.
const RECORD_KEY: &str = "record";

/// Split the response envelope into raw record values.
pub fn record_values(raw: &[u8]) -> Result<Vec<Value>, DecodeError> {
    let envelope: Value = serde_json::from_slice(raw)?;
    match envelope {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(RECORD_KEY) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(DecodeError::Envelope(SmolStr::new(format!(
                "`{RECORD_KEY}` is not an array (got {})",
                json_kind(&other)
            )))),
            // Zero-row responses omit the key.
            None => Ok(Vec::new()),
        },
        other => Err(DecodeError::Envelope(SmolStr::new(format!(
            "expected an array or a record object, got {}",
            json_kind(&other)
        )))),
    }
}

/// Decode a full response body into typed records.
pub fn decode_records<T: DeserializeOwned>(raw: &[u8]) -> Result<Vec<T>, DecodeError> {
    let values = record_values(raw)?;
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let record = serde_json::from_value(value).map_err(|e| classify(index, e))?;
        records.push(record);
    }
    Ok(records)
}

/// Map a per-record serde error onto the decode taxonomy.
///
/// serde_json does not expose structured error kinds for struct fields, so
/// this matches on the rendered message. `from_value` errors carry no
/// line/column suffix, which keeps the match stable.
fn classify(index: usize, err: serde_json::Error) -> DecodeError {
    let detail = err.to_string();
    if let Some(rest) = detail.strip_prefix("missing field `")
        && let Some(name) = rest.split('`').next()
    {
        return DecodeError::MissingField {
            index,
            name: SmolStr::new(name),
        };
    }
    if detail.starts_with("invalid type") || detail.starts_with("invalid value") {
        return DecodeError::TypeMismatch {
            index,
            detail: SmolStr::new(detail),
        };
    }
    DecodeError::Record { index, source: err }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
