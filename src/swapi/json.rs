//! JSON decoding helpers for SWAPI bodies.

use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Parse a response body that must be a JSON object.
///
/// Syntax errors carry a short excerpt of the offending line so truncated or
/// HTML error pages are easy to recognise in logs.
pub fn parse_object(body: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(anyhow!("expected a JSON object, got {}", type_name(&other))),
        Err(err) => Err(anyhow!(
            "{err}\n{}",
            excerpt(body, err.line(), err.column(), 40)
        )),
    }
}

/// Deserialize a decoded value into `T`, reporting the failing field path.
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        anyhow!("at path '{path}': {}", err.into_inner())
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn excerpt(body: &str, line: usize, column: usize, width: usize) -> String {
    let target = body.lines().nth(line.saturating_sub(1)).unwrap_or("");
    if target.is_empty() {
        return "(empty line)".to_string();
    }

    let chars: Vec<char> = target.chars().collect();
    let at = column.saturating_sub(1).min(chars.len());
    let start = at.saturating_sub(width / 2);
    let end = (at + width / 2).min(chars.len());
    let slice: String = chars[start..end].iter().collect();

    format!("...{slice}...\n   {}^", " ".repeat(at - start))
}
