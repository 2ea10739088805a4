//! Log Redaction Layer
//!
//! Scrubs pairing tokens and bearer credentials from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(token=)[^&\s"']+"#).unwrap());
static TOKEN_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)("token"\s*:\s*")[^"]*(")"#).unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut redacted = TOKEN_PARAM_RE.replace_all(input, "${1}[REDACTED]").to_string();
    redacted = TOKEN_FIELD_RE
        .replace_all(&redacted, "${1}[REDACTED]${2}")
        .to_string();
    redacted = BEARER_RE.replace_all(&redacted, "Bearer [REDACTED]").to_string();
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_token_query_param() {
        let raw = "wss://192.168.1.20:8002/api/v2/channels/com.samsung.art-app?name=VGhlRnJhbWU=&token=53187241";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("53187241"));
        assert!(clean.contains("name=VGhlRnJhbWU="));
        assert!(clean.ends_with("token=[REDACTED]"));
    }

    #[test]
    fn scrubs_token_json_field() {
        let raw = r#"{"event":"ms.channel.connect","data":{"token":"99887766"}}"#;
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("99887766"));
        assert!(clean.contains(r#""token":"[REDACTED]""#));
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_sensitive_data("Girl with a Pearl Earring"), "Girl with a Pearl Earring");
    }
}
