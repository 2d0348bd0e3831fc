use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

/// Parses `input` as a JSON object; anything else (including invalid JSON) yields `None`.
pub fn json_object(input: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

pub fn stringify(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Returns the value at `key` when it is a JSON string.
pub fn string_value<'a>(map: &'a JsonObject, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Reads a numeric value, accepting JSON numbers and numeric strings.
pub fn number_value(map: &JsonObject, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}
