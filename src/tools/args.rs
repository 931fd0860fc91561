//! Argument extraction helpers for provider tools
//!
//! Each helper returns a ready-made failed `ToolInvocationResult` on error so
//! tools can bail out with `?`-like ergonomics via `match`/`let else`.

use serde_json::{Map, Value};

use super::tool::ToolInvocationResult;

pub type ArgResult<T> = Result<T, ToolInvocationResult>;

/// View the arguments as a JSON object (`null` counts as empty)
pub fn object(input: &Value) -> ArgResult<Map<String, Value>> {
    match input {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        _ => Err(ToolInvocationResult::failure(
            "Invalid arguments: expected a JSON object",
        )),
    }
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> ArgResult<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| {
            ToolInvocationResult::failure(format!("Missing required string: '{key}'"))
        })
}

/// Optional string; empty strings are treated as absent
pub fn optional_string(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub fn required_string_list(args: &Map<String, Value>, key: &str) -> ArgResult<Vec<String>> {
    let Some(items) = args.get(key).and_then(Value::as_array) else {
        return Err(ToolInvocationResult::failure(format!(
            "Missing required list: '{key}'"
        )));
    };

    items
        .iter()
        .map(|item| {
            item.as_str().map(ToString::to_string).ok_or_else(|| {
                ToolInvocationResult::failure(format!("'{key}' must contain only strings"))
            })
        })
        .collect()
}

pub fn optional_u32_list(args: &Map<String, Value>, key: &str) -> ArgResult<Option<Vec<u32>>> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let Some(items) = value.as_array() else {
        return Err(ToolInvocationResult::failure(format!(
            "'{key}' must be a list of non-negative integers"
        )));
    };

    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    ToolInvocationResult::failure(format!(
                        "'{key}' must be a list of non-negative integers"
                    ))
                })
        })
        .collect::<ArgResult<Vec<u32>>>()
        .map(Some)
}
