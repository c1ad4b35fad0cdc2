//! Final-output parsing

use serde_json::{json, Value};

/// Turn the model's final text into a structured payload.
///
/// A reply that parses as a JSON object is returned as-is; anything else is
/// wrapped as `{"raw": text}`. Never fails. Empty text is a state-machine
/// concern and must not reach this function.
pub fn parse_final(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if value.is_object() => value,
        _ => json!({ "raw": text }),
    }
}
