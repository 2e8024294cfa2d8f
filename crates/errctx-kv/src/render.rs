//! Textual rendering of KV values for log sinks.

use serde_json::Value;

/// The textual form of a value as it appears in a rendered pair.
///
/// Strings render bare (no surrounding quotes). Every other value renders as
/// compact JSON, so `2` becomes `2`, `false` becomes `false` and `null`
/// becomes `null`.
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace every double quote with a single quote.
///
/// Some log shippers mis-parse escaped double quotes inside field values.
pub fn sanitize(text: &str) -> String {
    text.replace('"', "'")
}

/// [`text`] followed by [`sanitize`].
pub fn pair_value(value: &Value) -> String {
    sanitize(&text(value))
}
