//! Query parameter maps and their textual forms.

use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved parameter carrying the public API key.
pub const KEY_PARAM: &str = "_key";

/// Reserved parameter carrying the request signature.
pub const SECRET_PARAM: &str = "_secret";

/// Request parameters keyed by name.
///
/// Values may be scalars (strings, numbers, booleans) or structured values
/// (objects, arrays). Only scalars take part in signing.
pub type Params = BTreeMap<String, Value>;

/// Textual form of a scalar value, or `None` for structured values and `null`.
///
/// Strings are returned without quotes, numbers in their natural decimal form
/// and booleans as `true`/`false`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Flatten parameters into `(key, value)` pairs for a URL query string.
///
/// Scalars use [`scalar_text`], so the transmitted text always matches the
/// signed text. Arrays expand to one pair per element, objects are sent as
/// JSON text, and `null` values are dropped.
pub fn to_query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());

    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    let text = scalar_text(item).unwrap_or_else(|| item.to_string());
                    pairs.push((key.clone(), text));
                }
            }
            Value::Object(_) => pairs.push((key.clone(), value.to_string())),
            scalar => {
                if let Some(text) = scalar_text(scalar) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }

    pairs
}
