//! PII redaction for text that leaves the process or touches storage.
//!
//! Regex-based and best-effort. Runs on inbound free text before it is
//! forwarded to the LLM or persisted, and on structured values (via a
//! serialize → redact → reparse pass) before they are embedded in prompts.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").unwrap());

/// Singapore NRIC/FIN: prefix letter, 7 digits, checksum letter.
static NRIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[STFG]\d{7}[A-Z]\b").unwrap());

/// Local 8-digit phone numbers, with optional +65 prefix and separator.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\+?65[- ]?)?\d{4}[- ]?\d{4}\b").unwrap());

/// Long digit runs that look like account or card numbers.
static ACCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{12,16}\b").unwrap());

/// Redact PII-like substrings, replacing each with a placeholder token.
///
/// Order matters: the phone pattern must run before the account pattern so
/// separated phone numbers are not half-consumed as digit runs.
pub fn redact_text(input: &str) -> String {
    if input.is_empty() {
        return input.to_string();
    }
    let out = EMAIL_RE.replace_all(input, "[REDACTED_EMAIL]");
    let out = NRIC_RE.replace_all(&out, "[REDACTED_NRIC]");
    let out = PHONE_RE.replace_all(&out, "[REDACTED_PHONE]");
    let out = ACCOUNT_RE.replace_all(&out, "[REDACTED_ACCOUNT]");
    out.into_owned()
}

/// Redact a structured value by round-tripping it through its JSON text.
///
/// Catches PII embedded in any nested string field. If the redacted text no
/// longer parses (placeholder landed inside a number, for instance), the
/// original value is returned unchanged rather than failing the request.
pub fn redact_json(value: &serde_json::Value) -> serde_json::Value {
    let Ok(text) = serde_json::to_string(value) else {
        return value.clone();
    };
    let redacted = redact_text(&text);
    serde_json::from_str(&redacted).unwrap_or_else(|_| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email() {
        let out = redact_text("contact me at jane.tan@example.com please");
        assert!(!out.contains("jane.tan@example.com"));
        assert!(out.contains("[REDACTED_EMAIL]"));
    }

    #[test]
    fn redacts_nric() {
        let out = redact_text("my IC is S1234567A thanks");
        assert!(!out.contains("S1234567A"));
        assert!(out.contains("[REDACTED_NRIC]"));
    }

    #[test]
    fn redacts_local_phone() {
        let out = redact_text("call 9123 4567 anytime");
        assert!(!out.contains("9123 4567"));
        assert!(out.contains("[REDACTED_PHONE]"));
    }

    #[test]
    fn redacts_phone_with_country_code() {
        let out = redact_text("reach me on +65 9123-4567");
        assert!(!out.contains("9123-4567"));
        assert!(out.contains("[REDACTED_PHONE]"));
    }

    #[test]
    fn redacts_account_number_runs() {
        let out = redact_text("transferred to account 1234567890123456");
        assert!(!out.contains("1234567890123456"));
        assert!(out.contains("[REDACTED_ACCOUNT]"));

        let out = redact_text("ref 123456789012");
        assert!(out.contains("[REDACTED_ACCOUNT]"));
    }

    #[test]
    fn leaves_short_numbers_alone() {
        let out = redact_text("I lost $5,000 over 3 weeks");
        assert_eq!(out, "I lost $5,000 over 3 weeks");
    }

    #[test]
    fn redacts_nested_json_strings() {
        let value = serde_json::json!({
            "summary": "victim at bob@scam.example.com lost money",
            "entities": ["S7654321B", "DBS"],
        });
        let out = redact_json(&value);
        assert_eq!(
            out["summary"],
            "victim at [REDACTED_EMAIL] lost money"
        );
        assert_eq!(out["entities"][0], "[REDACTED_NRIC]");
        assert_eq!(out["entities"][1], "DBS");
    }

    #[test]
    fn json_redaction_survives_non_string_values() {
        let value = serde_json::json!({"score": 42, "flag": true});
        assert_eq!(redact_json(&value), value);
    }

    #[test]
    fn empty_input_passthrough() {
        assert_eq!(redact_text(""), "");
    }
}
