pub mod document;
pub mod error;
pub mod extract;
pub mod fields;
pub mod request;

/// String form of a JSON value for URL, query, and label purposes: strings
/// unquoted, everything else in its JSON notation.
pub(crate) fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
