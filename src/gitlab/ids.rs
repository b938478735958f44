//! Global identifier normalization.
//!
//! GitLab's GraphQL layer (and some REST fields such as webhook payloads) expose
//! ids as `gid://gitlab/<Type>/<id>`. Agents only ever need the bare id, so every
//! tool response passes through [`normalize_ids`] before it is returned.

use serde_json::Value;

const GID_PREFIX: &str = "gid://gitlab/";

/// Recursively replace `gid://gitlab/<Type>/<id>` strings with the bare id.
///
/// All-digit suffixes that fit in `u64` become JSON numbers; anything else stays a string.
pub fn normalize_ids(value: Value) -> Value {
    match value {
        Value::String(s) => strip_gid(&s).unwrap_or(Value::String(s)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_ids).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_ids(v)))
                .collect(),
        ),
        other => other,
    }
}

fn strip_gid(s: &str) -> Option<Value> {
    let rest = s.strip_prefix(GID_PREFIX)?;
    let (kind, id) = rest.split_once('/')?;
    if kind.is_empty() || id.is_empty() || id.contains('/') {
        return None;
    }
    Some(match id.parse::<u64>() {
        Ok(n) if id.chars().all(|c| c.is_ascii_digit()) => Value::from(n),
        _ => Value::String(id.to_string()),
    })
}
