//! Canonical output comparison
//!
//! Produced values and expected outputs are both rendered to one canonical
//! JSON form and compared as text. Canonical means compact separators,
//! object keys in sorted order, and floats with no fractional part written as
//! integers, so `[0, 1]`, `[0,1]` and `[0.0, 1.0]` all agree.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

/// Outcome of comparing one produced value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub passed: bool,

    /// Canonical rendering of the produced value
    pub output: String,
}

/// Compare a produced value against the raw expected text
pub fn compare(produced: &Value, expected: &str) -> Comparison {
    let output = canonicalize(produced);
    let passed = output == normalize_expected(expected);
    Comparison { passed, output }
}

/// Canonical JSON rendering of a value
pub fn canonicalize(value: &Value) -> String {
    normalize(value).to_string()
}

/// Canonical rendering of raw expected text.
///
/// Text that is not valid JSON is taken as a bare string literal.
pub fn normalize_expected(expected: &str) -> String {
    let trimmed = expected.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => canonicalize(&value),
        Err(_) => Value::String(trimmed.to_string()).to_string(),
    }
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(normalize_number(n)),
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        // Sorted explicitly; `Map` keeps insertion order under `preserve_order`
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, normalize(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        other => other.clone(),
    }
}

fn normalize_number(n: &Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n.clone();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Number::from(f as i64)
        }
        _ => n.clone(),
    }
}
