//! Turning loosely structured completion text into typed results.

use crate::error::{LlmError, LlmResult};
use mailtriage_core::{ClassificationResult, ClassificationTask, EntityMap};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassification {
    request_type: Value,
    #[serde(default)]
    sub_request_types: Option<Value>,
    confidence_score: Value,
}

/// Free-text tasks keep the response verbatim, minus surrounding whitespace.
pub fn free_text(raw: &str) -> String {
    raw.trim().to_string()
}

/// Parse a request-classification response.
pub fn parse_request_classification(raw: &str) -> LlmResult<ClassificationResult> {
    let task = ClassificationTask::RequestType;
    let value = first_json_object(raw).map_err(|e| malformed(task, e))?;
    let parsed: RawClassification =
        serde_json::from_value(value).map_err(|e| malformed(task, e.to_string()))?;

    let request_type = match parsed.request_type {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        other => {
            return Err(malformed(
                task,
                format!("requestType must be a non-empty string, got {}", other),
            ))
        }
    };

    let sub_request_types = match parsed.sub_request_types {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => dedup(vec![s]),
        Some(Value::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => values.push(s),
                    other => {
                        return Err(malformed(
                            task,
                            format!("subRequestTypes entries must be strings, got {}", other),
                        ))
                    }
                }
            }
            dedup(values)
        }
        Some(other) => {
            return Err(malformed(
                task,
                format!("subRequestTypes must be an array, got {}", other),
            ))
        }
    };

    let confidence_score = parsed
        .confidence_score
        .as_f64()
        .filter(|c| c.is_finite() && (0.0..=1.0).contains(c))
        .ok_or_else(|| {
            malformed(
                task,
                format!(
                    "confidenceScore must be a number in [0, 1], got {}",
                    parsed.confidence_score
                ),
            )
        })?;

    Ok(ClassificationResult {
        request_type,
        sub_request_types,
        confidence_score,
    })
}

/// Parse an entity-extraction response into a flat string map.
pub fn parse_entities(raw: &str) -> LlmResult<EntityMap> {
    let task = ClassificationTask::Entities;
    let value = first_json_object(raw).map_err(|e| malformed(task, e))?;

    let object = match value {
        Value::Object(map) => map,
        other => {
            return Err(malformed(
                task,
                format!("expected a JSON object, got {}", other),
            ))
        }
    };

    let mut entities = EntityMap::new();
    for (key, value) in object {
        let text = match value {
            Value::Null => continue,
            Value::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    match scalar_to_string(&item) {
                        Some(part) => parts.push(part),
                        None => {
                            return Err(malformed(
                                task,
                                format!("entity '{}' holds a nested value", key),
                            ))
                        }
                    }
                }
                parts.join(", ")
            }
            other => scalar_to_string(&other).ok_or_else(|| {
                malformed(task, format!("entity '{}' holds a nested object", key))
            })?,
        };
        entities.insert(key, text);
    }

    Ok(entities)
}

/// Decode the first complete JSON object in completion output.
///
/// Markdown fences and prose before or after the object are ignored. When a
/// `{` does not open a valid value, decoding resumes at the next one.
pub fn first_json_object(text: &str) -> Result<Value, String> {
    let mut first_error = None;

    for (start, _) in text.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) => return Ok(value),
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
            None => {}
        }
    }

    Err(first_error.unwrap_or_else(|| "no JSON object found".to_string()))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn malformed(task: ClassificationTask, message: String) -> LlmError {
    LlmError::MalformedResponse { task, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_classification() {
        let raw = r#"{"requestType": "Loan Completion", "subRequestTypes": ["Address Change", "Address Change"], "confidenceScore": 0.92}"#;
        let result = parse_request_classification(raw).unwrap();
        assert_eq!(result.request_type, "Loan Completion");
        assert_eq!(result.sub_request_types, vec!["Address Change"]);
        assert_eq!(result.confidence_score, 0.92);
    }

    #[test]
    fn test_parse_request_classification_in_code_fence() {
        let raw = "Here you go:\n```json\n{\"requestType\": \"Prepayment Charges\", \"confidenceScore\": 1}\n```";
        let result = parse_request_classification(raw).unwrap();
        assert_eq!(result.request_type, "Prepayment Charges");
        assert!(result.sub_request_types.is_empty());
        assert_eq!(result.confidence_score, 1.0);
    }

    #[test]
    fn test_request_classification_rejects_prose() {
        let err = parse_request_classification("This is a loan completion request.").unwrap_err();
        assert!(matches!(
            err,
            LlmError::MalformedResponse {
                task: ClassificationTask::RequestType,
                ..
            }
        ));
    }

    #[test]
    fn test_request_classification_rejects_bad_fields() {
        let out_of_range = r#"{"requestType": "Loan Completion", "confidenceScore": 92}"#;
        assert!(parse_request_classification(out_of_range).is_err());

        let missing_score = r#"{"requestType": "Loan Completion"}"#;
        assert!(parse_request_classification(missing_score).is_err());

        let empty_type = r#"{"requestType": "", "confidenceScore": 0.5}"#;
        assert!(parse_request_classification(empty_type).is_err());

        let numeric_subs = r#"{"requestType": "A", "subRequestTypes": [1], "confidenceScore": 0.5}"#;
        assert!(parse_request_classification(numeric_subs).is_err());

        let string_score = r#"{"requestType": "A", "confidenceScore": "high"}"#;
        assert!(parse_request_classification(string_score).is_err());
    }

    #[test]
    fn test_parse_entities() {
        let raw = r#"{"customerName": "John Doe", "loanAmount": 50000, "accounts": ["1", "2"], "note": null, "verified": true}"#;
        let entities = parse_entities(raw).unwrap();
        assert_eq!(entities.get("customerName").map(String::as_str), Some("John Doe"));
        assert_eq!(entities.get("loanAmount").map(String::as_str), Some("50000"));
        assert_eq!(entities.get("accounts").map(String::as_str), Some("1, 2"));
        assert_eq!(entities.get("verified").map(String::as_str), Some("true"));
        assert!(!entities.contains_key("note"));
    }

    #[test]
    fn test_entities_accept_arbitrary_keys_and_empty_object() {
        let entities = parse_entities("{}").unwrap();
        assert!(entities.is_empty());

        let entities = parse_entities(r#"{"Maturity Date": "2030-01-01"}"#).unwrap();
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn test_entities_reject_non_conforming() {
        assert!(parse_entities("No entities found.").is_err());
        assert!(parse_entities(r#"["a", "b"]"#).is_err());
        assert!(parse_entities(r#"{"borrower": {"name": "x"}}"#).is_err());
    }

    #[test]
    fn test_free_text_is_trimmed_verbatim() {
        assert_eq!(free_text("  Positive\n"), "Positive");
        assert_eq!(free_text("Somewhat positive, really"), "Somewhat positive, really");
    }

    #[test]
    fn test_trailing_prose_after_object_is_ignored() {
        let raw = "{\"requestType\": \"Loan Completion\", \"subRequestTypes\": [], \"confidenceScore\": 0.9}\n\nLet me know if you need anything else.";
        let result = parse_request_classification(raw).unwrap();
        assert_eq!(result.request_type, "Loan Completion");
        assert_eq!(result.confidence_score, 0.9);

        let entities = parse_entities("{\"customerName\": \"Jane\"} (extracted from the body)").unwrap();
        assert_eq!(entities.get("customerName").map(String::as_str), Some("Jane"));
    }

    #[test]
    fn test_first_json_object() {
        assert_eq!(first_json_object("  {\"a\": 1}  ").unwrap()["a"], 1);
        assert_eq!(first_json_object("```\n{\"a\": 1}\n```").unwrap()["a"], 1);
        assert_eq!(first_json_object("Result: {\"a\": 1}. Done {\"b\": 2}").unwrap()["a"], 1);
        assert_eq!(first_json_object("Note {draft}: {\"a\": 2}").unwrap()["a"], 2);
        assert!(first_json_object("nothing here").is_err());
        assert!(first_json_object("{\"a\": ").is_err());
    }
}
