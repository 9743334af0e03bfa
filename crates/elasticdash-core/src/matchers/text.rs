//! String helpers shared by the matchers

use serde_json::{Map, Value};

/// Case-insensitive substring test
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `contains_ci` over an optional field; absent text never matches
pub(crate) fn opt_contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|text| contains_ci(text, needle))
}

/// Text searched by the `*_contains` predicates on JSON values
///
/// Strings are searched raw, `null` has no text, everything else is searched
/// in its JSON form.
pub(crate) fn serialized_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn map_text(map: &Map<String, Value>) -> Option<String> {
    (!map.is_empty()).then(|| Value::Object(map.clone()).to_string())
}

/// Shorten long text for failure messages
pub(crate) fn preview(text: &str) -> String {
    const MAX: usize = 80;
    if text.chars().count() <= MAX {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX).collect();
    format!("{}...", head)
}
