//! Settings redaction: produce a safe-to-log snapshot by masking secrets.

use serde_json::Value;

use crate::settings::Settings;

/// Keys whose values are secrets.
static SENSITIVE_KEYS: &[&str] = &["tv_token", "token", "api_key", "password", "secret"];

/// Redact a JSON value, replacing sensitive string fields with a short hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

/// Serialize settings for display with the pairing token masked.
pub fn redacted_settings(settings: &Settings) -> Value {
    match serde_json::to_value(settings) {
        Ok(value) => redact(&value),
        Err(_) => Value::Null,
    }
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            // Keep a short prefix so two tokens can still be told apart.
            let hint: String = s.chars().take(4).collect();
            if s.chars().count() > 4 {
                Value::String(format!("{hint}***"))
            } else {
                Value::String("***".to_string())
            }
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}
