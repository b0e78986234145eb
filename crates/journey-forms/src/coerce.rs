//! Lenient coercion of stored JSON into canonical field values
//!
//! Stored rows come in several historical shapes: arrays saved as JSON
//! strings, numbers saved as strings, nested objects saved as strings, `null`
//! where a value was never written, and lists with the wrong length. Every
//! helper here accepts any [`Value`] and falls back to a default instead of
//! failing. Fallbacks are logged at `debug`.

use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Field of a row, treating `null` as absent
///
/// Pass rows through [`row`] first so string-encoded rows are decoded.
#[must_use]
pub fn field<'a>(row: &'a Value, key: &str) -> Option<&'a Value> {
    row.as_object()
        .and_then(|m| m.get(key))
        .filter(|v| !v.is_null())
}

/// First present field among legacy aliases
#[must_use]
pub fn any_field<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| field(row, k))
}

/// Row as an object map
///
/// Accepts a native object or a string holding one; anything else yields an
/// empty map.
#[must_use]
pub fn object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => match decode(s) {
            Some(Value::Object(map)) => map,
            _ => {
                fallback("object", value);
                Map::new()
            }
        },
        None | Some(Value::Null) => Map::new(),
        Some(_) => {
            fallback("object", value);
            Map::new()
        }
    }
}

/// Whole stored row as an object map
#[must_use]
pub fn row(raw: &Value) -> Value {
    Value::Object(object(Some(raw)))
}

/// Scalar as text
///
/// Numbers and booleans are rendered, arrays and objects yield an empty
/// string.
#[must_use]
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        None | Some(Value::Null) => String::new(),
        Some(_) => {
            fallback("text", value);
            String::new()
        }
    }
}

/// List of strings
///
/// Accepts a native array or a JSON-encoded array string. A plain
/// non-empty string becomes a single entry.
#[must_use]
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|v| text(Some(v))).collect(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            match decode(trimmed) {
                Some(Value::Array(items)) => items.iter().map(|v| text(Some(v))).collect(),
                _ => vec![s.clone()],
            }
        }
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            fallback("string_list", value);
            Vec::new()
        }
    }
}

/// List of strings padded with empty entries or truncated to `arity`
#[must_use]
pub fn fixed_list(value: Option<&Value>, arity: usize) -> Vec<String> {
    let mut list = string_list(value);
    list.resize(arity, String::new());
    list
}

/// List of objects
///
/// Accepts a native array or a JSON-encoded array string; entries that are
/// not objects are dropped.
#[must_use]
pub fn object_list(value: Option<&Value>) -> Vec<Map<String, Value>> {
    let items = match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => match decode(s) {
            Some(Value::Array(items)) => items,
            _ => {
                fallback("object_list", value);
                Vec::new()
            }
        },
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            fallback("object_list", value);
            Vec::new()
        }
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            Value::String(s) => match decode(&s) {
                Some(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Integer clamped to `[min, max]`
///
/// Accepts numbers and numeric strings; floats are rounded.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn int_in(value: Option<&Value>, min: i64, max: i64, default: i64) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        _ => None,
    };
    match parsed {
        Some(n) => n.clamp(min, max),
        None => {
            if value.is_some() {
                fallback("int", value);
            }
            default
        }
    }
}

/// Boolean
///
/// Accepts booleans, `"true"`/`"yes"`/`"1"` style strings and numbers.
#[must_use]
pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "on"
        ),
        _ => false,
    }
}

/// Text restricted to a fixed set of choices
#[must_use]
pub fn choice(value: Option<&Value>, allowed: &[&str]) -> Option<String> {
    let raw = text(value);
    let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
    if normalized.is_empty() {
        return None;
    }
    let found = allowed.iter().find(|a| **a == normalized).map(|a| (*a).to_string());
    if found.is_none() {
        fallback("choice", value);
    }
    found
}

/// Calendar date
///
/// Accepts `YYYY-MM-DD` and full RFC 3339 timestamps, keeping the date part.
#[must_use]
pub fn date(value: Option<&Value>) -> Option<NaiveDate> {
    let raw = text(value);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = raw
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    if parsed.is_none() {
        fallback("date", value);
    }
    parsed
}

/// Date in storage format
#[must_use]
pub fn date_value(date: Option<NaiveDate>) -> Value {
    date.map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%d").to_string()))
}

fn decode(s: &str) -> Option<Value> {
    serde_json::from_str(s.trim()).ok()
}

fn fallback(kind: &'static str, value: Option<&Value>) {
    tracing::debug!(kind, raw = ?value, "normalize fell back to default");
}
