//! Response decoding: raw model text → JSON object.
//!
//! Even with "respond ONLY with a valid JSON object" in the instruction,
//! models regularly wrap the answer in ```` ```json ```` fences. Decoding is
//! therefore two steps:
//!
//! 1. [`strip_code_fences`]: trim and remove every fence marker.
//! 2. Parse as JSON and require an object.
//!
//! Schema checking is a separate, optional step ([`validate_analysis`]) so
//! "not JSON", "not an object" and "wrong shape" stay distinguishable.

use crate::analysis::LetterAnalysis;
use crate::error::DecodeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json|JSON)?").unwrap());

/// Remove surrounding whitespace and all ```` ``` ```` / ```` ```json ```` markers.
pub fn strip_code_fences(raw: &str) -> String {
    RE_FENCE.replace_all(raw.trim(), "").trim().to_string()
}

/// Decode raw model text into a JSON object.
///
/// The object is returned unchanged; no field is checked here.
pub fn decode_response(raw: &str) -> Result<Value, DecodeError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|source| DecodeError::NotJson {
        raw: raw.to_string(),
        source,
    })?;

    if !value.is_object() {
        return Err(DecodeError::NotAnObject {
            raw: raw.to_string(),
        });
    }
    Ok(value)
}

/// Check a decoded object against the analysis schema.
pub fn validate_analysis(value: &Value) -> Result<LetterAnalysis, DecodeError> {
    let schema_err = |detail: String| DecodeError::Schema {
        detail,
        raw: value.to_string(),
    };

    let analysis: LetterAnalysis =
        serde_json::from_value(value.clone()).map_err(|e| schema_err(e.to_string()))?;
    analysis.check_invariants().map_err(schema_err)?;
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Category;
    use serde_json::json;

    const CLEAN: &str = r#"{"category": "INFO", "summary_german": "Hallo", "deadline_date": null,
        "deadline_subject": null, "payment_amount": null, "payment_currency": null,
        "payment_recipient": null, "full_analysis_log": "log"}"#;

    #[test]
    fn fenced_and_clean_json_decode_identically() {
        let fenced = format!("```json\n{CLEAN}\n```");
        assert_eq!(decode_response(CLEAN).unwrap(), decode_response(&fenced).unwrap());
    }

    #[test]
    fn untagged_fence_and_surrounding_whitespace() {
        let fenced = format!("\n\n  ```\n{CLEAN}\n```  \n");
        assert_eq!(decode_response(&fenced).unwrap(), decode_response(CLEAN).unwrap());
    }

    #[test]
    fn truncated_json_fails() {
        let truncated = &CLEAN[..CLEAN.len() / 2];
        let err = decode_response(truncated).unwrap_err();
        assert!(matches!(err, DecodeError::NotJson { .. }));
        assert_eq!(err.raw_response(), Some(truncated));
    }

    #[test]
    fn prose_fails() {
        let err = decode_response("I could not read this letter.").unwrap_err();
        assert!(matches!(err, DecodeError::NotJson { .. }));
    }

    #[test]
    fn non_object_json_fails() {
        for raw in ["[1, 2]", "\"FINANCIAL\"", "42", "null"] {
            let err = decode_response(raw).unwrap_err();
            assert!(matches!(err, DecodeError::NotAnObject { .. }), "{raw}");
        }
    }

    #[test]
    fn decoded_object_is_returned_unchanged() {
        let raw = r#"```json
{"category": "FINANCIAL", "extra_field": [1, 2, 3]}
```"#;
        let value = decode_response(raw).unwrap();
        assert_eq!(value, json!({"category": "FINANCIAL", "extra_field": [1, 2, 3]}));
    }

    #[test]
    fn validate_accepts_schema_conforming_object() {
        let analysis = validate_analysis(&decode_response(CLEAN).unwrap()).unwrap();
        assert_eq!(analysis.category, Category::Info);
    }

    #[test]
    fn validate_rejects_wrong_types() {
        let mut value = decode_response(CLEAN).unwrap();
        value["payment_amount"] = json!("50,00 EUR");
        let err = validate_analysis(&value).unwrap_err();
        assert!(matches!(err, DecodeError::Schema { .. }));
        assert!(err.is_model_output());
    }

    #[test]
    fn validate_rejects_missing_field() {
        let value = json!({"category": "INFO"});
        assert!(matches!(
            validate_analysis(&value),
            Err(DecodeError::Schema { .. })
        ));
    }
}
