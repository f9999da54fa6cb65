//! Loose JSON scalar coercion
//!
//! Frontends and the exchange both send numbers as strings and codes as
//! numbers. These helpers read either form.

use serde_json::Value;

/// String form of a scalar; `None` for null, arrays and objects
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_to_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Finite number from a JSON number or a numeric string
pub fn value_to_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };

    n.is_finite().then_some(n)
}

/// Like [`value_to_number`], but null and blank strings read as zero
pub fn value_to_number_or_zero(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        other => value_to_number(other),
    }
}

/// Trim and uppercase
pub fn normalize(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Normalized string form of an optional value, empty when absent
pub fn normalized_text(value: Option<&Value>) -> String {
    value
        .and_then(value_to_text)
        .map(|s| normalize(&s))
        .unwrap_or_default()
}

// Integral floats print without a fraction, so status 3.0 reads as "3"
fn number_to_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}
