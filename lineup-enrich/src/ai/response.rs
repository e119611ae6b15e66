//! Provider reply → field candidates

use crate::error::ProviderError;
use crate::records::columns;
use crate::records::values::normalize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Candidates parsed from one reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Normalised, non-empty candidates keyed by column
    pub values: BTreeMap<String, String>,
    /// Fields the provider explicitly left empty ("insufficient information")
    pub blank: BTreeSet<String>,
}

/// Remove a surrounding Markdown code fence, if any
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_blank(field: &str, text: &str) -> bool {
    let text = text.trim();
    text.is_empty()
        || (field == columns::AI_RATING && text.parse::<f64>().is_ok_and(|r| r == 0.0))
}

/// Parse a reply that should be a JSON object keyed by column name
///
/// Only `allowed_fields` are read. Values are normalised per column;
/// values that are not legal for their column are dropped.
///
/// # Errors
/// `ProviderError::InvalidResponse` if the reply is not a JSON object or
/// carries none of the allowed fields.
pub fn parse_proposal(raw: &str, allowed_fields: &[&str]) -> Result<ParsedResponse, ProviderError> {
    let body = strip_code_fence(raw);
    let json: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Not JSON: {}", e)))?;
    let Value::Object(object) = json else {
        return Err(ProviderError::InvalidResponse("Expected a JSON object".to_string()));
    };

    let mut parsed = ParsedResponse::default();
    let mut known = 0;
    for field in allowed_fields {
        let Some(value) = object.get(*field) else {
            continue;
        };
        known += 1;
        let Some(text) = value_to_text(value) else {
            debug!(field = %field, "Ignoring non-scalar value");
            continue;
        };
        if is_blank(field, &text) {
            parsed.blank.insert(field.to_string());
            continue;
        }
        match normalize(field, &text) {
            Some(normalized) => {
                parsed.values.insert(field.to_string(), normalized);
            }
            None => debug!(field = %field, value = %text, "Dropping value not valid for column"),
        }
    }

    if known == 0 {
        return Err(ProviderError::InvalidResponse(
            "Response has none of the expected fields".to_string(),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::columns::AI_FIELDS;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```\ntrailing"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn test_numbers_become_strings_and_zero_rating_is_blank() {
        let parsed = parse_proposal(
            r#"{"Genre": "Afrobeat", "AI Rating": 0, "Number of People in Act": 8, "Bio": ""}"#,
            &AI_FIELDS,
        )
        .unwrap();

        assert_eq!(parsed.values.get("Genre").map(String::as_str), Some("Afrobeat"));
        assert_eq!(parsed.values.get("Number of People in Act").map(String::as_str), Some("8"));
        assert!(parsed.blank.contains("AI Rating"));
        assert!(parsed.blank.contains("Bio"));
        assert!(!parsed.values.contains_key("AI Rating"));
    }

    #[test]
    fn test_invalid_values_dropped_not_blank() {
        let parsed = parse_proposal(
            r#"{"AI Rating": "excellent", "Gender of Front Person": "Unknown", "Spotify link": "n/a"}"#,
            &AI_FIELDS,
        )
        .unwrap();
        assert!(parsed.values.is_empty());
        assert!(parsed.blank.is_empty());
    }

    #[test]
    fn test_malformed_responses() {
        assert!(matches!(
            parse_proposal("Sorry, I can't help with that.", &AI_FIELDS),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_proposal("[1, 2]", &AI_FIELDS),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_proposal(r#"{"Favourite colour": "blue"}"#, &AI_FIELDS),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_allowed_fields_restrict_keys() {
        let parsed = parse_proposal(
            r#"{"Genre": "Jazz", "AI Summary": "Sharp horn section."}"#,
            &[columns::GENRE],
        )
        .unwrap();
        assert_eq!(parsed.values.len(), 1);
    }
}
