//! Lookup helpers over loosely-typed JSON records.

use serde_json::{Map, Value};

use super::mojibake;

/// Envelope keys the DSO wraps single records in.
const ENVELOPE_KEYS: &[&str] = &["data", "user", "profile", "result"];

/// Strip `{ "data": { ... } }`-style envelopes until a plain record remains.
///
/// Only unwraps when the envelope key holds an object, so a record that
/// merely has a `user` string field is left alone.
#[must_use]
pub fn unwrap_record(value: &Value) -> Option<&Map<String, Value>> {
    let mut current = value.as_object()?;
    loop {
        let inner = ENVELOPE_KEYS
            .iter()
            .find_map(|key| current.get(*key).and_then(Value::as_object));
        match inner {
            Some(next) => current = next,
            None => return Some(current),
        }
    }
}

/// Render a scalar JSON value as trimmed, repaired text.
///
/// Strings are trimmed and passed through mojibake repair; numbers render in
/// their JSON form. Empty strings, nulls, booleans and containers yield `None`.
#[must_use]
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| mojibake::repair(trimmed).into_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The first non-empty text value among `aliases`, in order.
#[must_use]
pub fn first_text<S: AsRef<str>>(record: &Map<String, Value>, aliases: &[S]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| record.get(alias.as_ref()).and_then(text))
}

/// The first value among `aliases` that is present and not null.
#[must_use]
pub fn first_value<'a, S: AsRef<str>>(
    record: &'a Map<String, Value>,
    aliases: &[S],
) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|alias| record.get(alias.as_ref()).filter(|v| !v.is_null()))
}

/// The first array among `aliases`.
#[must_use]
pub fn first_array<'a, S: AsRef<str>>(
    record: &'a Map<String, Value>,
    aliases: &[S],
) -> Option<&'a Vec<Value>> {
    aliases
        .iter()
        .find_map(|alias| record.get(alias.as_ref()).and_then(Value::as_array))
}

/// Find the list of records in a collection response.
///
/// Accepts a bare array, or an object holding the array under `data` or one of
/// `keys`, possibly one level down inside `data` (`{"data": {"orders": []}}`).
/// Non-object entries are dropped. Failure bodies yield nothing.
#[must_use]
pub fn collection<'a>(value: &'a Value, keys: &[&str]) -> Vec<&'a Map<String, Value>> {
    fn find<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v Vec<Value>> {
        std::iter::once("data")
            .chain(keys.iter().copied())
            .find_map(|key| obj.get(key).and_then(Value::as_array))
    }

    if is_failure(value) {
        return Vec::new();
    }

    let items = match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => find(obj, keys).or_else(|| {
            obj.get("data")
                .and_then(Value::as_object)
                .and_then(|inner| find(inner, keys))
        }),
        _ => None,
    };

    items
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

/// Whether a response body reports failure (`success: false`, `status: "error"`).
#[must_use]
pub fn is_failure(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    if obj.get("success").and_then(Value::as_bool) == Some(false) {
        return true;
    }
    obj.get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| matches!(s.to_lowercase().as_str(), "error" | "fail" | "failed"))
}
