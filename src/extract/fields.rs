use serde_json::Value;
use std::borrow::Cow;

use super::ParsedResult;

/// True when the field is JSON `true` or the string "true" in any casing.
pub fn flag(map: &ParsedResult, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// True only for a JSON boolean `true`; string spellings do not count.
pub fn strict_flag(map: &ParsedResult, key: &str) -> bool {
    matches!(map.get(key), Some(Value::Bool(true)))
}

/// Trimmed string value. Non-string scalars are rendered; missing or null is "".
pub fn text<'a>(map: &'a ParsedResult, key: &str) -> Cow<'a, str> {
    match map.get(key) {
        Some(Value::String(s)) => Cow::Borrowed(s.trim()),
        Some(Value::Null) | None => Cow::Borrowed(""),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// First non-empty text among several candidate keys.
pub fn text_any<'a>(map: &'a ParsedResult, keys: &[&str]) -> Cow<'a, str> {
    for key in keys {
        let value = text(map, key);
        if !value.is_empty() {
            return value;
        }
    }
    Cow::Borrowed("")
}

/// Integer value from a JSON number or a numeric string.
pub fn integer(map: &ParsedResult, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
