//! Helpers for pulling fields out of incoming JSON commands
//!
//! Commands arrive from a peer controller and may be malformed. None of these
//! helpers fail: a missing or mistyped key produces a default value and a
//! diagnostic naming the key.

use serde_json::{Map, Value};

/// String value of `key`, or an empty string if it is missing or not a string
pub fn get_string_value(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key).and_then(Value::as_str) {
        Some(value) => value.to_string(),
        None => {
            log::warn!("{} doesn't exist in library", key);
            String::new()
        }
    }
}

/// Log the string value of `key`
pub fn print_value(obj: &Map<String, Value>, key: &str) {
    match obj.get(key).and_then(Value::as_str) {
        Some(value) => log::info!("{}", value),
        None => log::warn!("{} doesn't exist in library", key),
    }
}

/// Array value of `key`, for feeding per-lane updates
pub fn get_lane_array<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    let array = obj.get(key).and_then(Value::as_array).map(Vec::as_slice);
    if array.is_none() {
        log::warn!("{} is not an array in library", key);
    }
    array
}
