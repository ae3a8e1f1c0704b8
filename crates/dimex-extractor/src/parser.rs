//! Parse model output into records
//!
//! Parsing never fails outright: output that does not match the schema is
//! kept as a degraded record with the reason and the raw text.

use dimex_domain::{
    DegradedRecord, EvaluationOutcome, EvaluationRecord, ExtractionOutcome, ExtractionRecord,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Prefix of every parse failure reason
pub const PARSE_FAILURE_PREFIX: &str = "Parser failed";

/// Parse extraction output
///
/// With `strict_vocabulary`, a record whose categorical fields fall outside
/// their vocabularies is degraded as well.
pub fn parse_extraction(raw: &str, strict_vocabulary: bool) -> ExtractionOutcome {
    let record: ExtractionRecord = match parse_object(raw) {
        Ok(record) => record,
        Err(reason) => return ExtractionOutcome::Degraded(DegradedRecord::new(reason, raw)),
    };

    if strict_vocabulary {
        let violations = record.vocabulary_violations();
        if !violations.is_empty() {
            return ExtractionOutcome::Degraded(DegradedRecord::new(
                format!("{}: {}", PARSE_FAILURE_PREFIX, violations.join("; ")),
                raw,
            ));
        }
    }

    ExtractionOutcome::Parsed(record)
}

/// Parse evaluation output and recompute the overall score
///
/// Scores outside [0, 1] degrade the result. Any overall score the model
/// reported is replaced by the mean of the field scores.
pub fn parse_evaluation(raw: &str) -> EvaluationOutcome {
    let mut record: EvaluationRecord = match parse_object(raw) {
        Ok(record) => record,
        Err(reason) => return EvaluationOutcome::Degraded(DegradedRecord::new(reason, raw)),
    };

    if let Err(e) = record.validate() {
        return EvaluationOutcome::Degraded(DegradedRecord::new(
            format!("{}: {}", PARSE_FAILURE_PREFIX, e),
            raw,
        ));
    }

    record.compute_overall_score();
    EvaluationOutcome::Scored(record)
}

fn parse_object<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let json = extract_json(raw);
    if json.is_empty() {
        return Err(format!("{}: empty model output", PARSE_FAILURE_PREFIX));
    }
    serde_json::from_str(json).map_err(|e| {
        debug!(error = %e, "Model output did not match schema");
        format!("{}: {}", PARSE_FAILURE_PREFIX, e)
    })
}

/// Locate the JSON object in a model response
///
/// Handles markdown code fences and prose around the object. When no object
/// is found the trimmed response is returned unchanged.
pub fn extract_json(response: &str) -> &str {
    let mut candidate = response.trim();

    if let Some(fenced) = fenced_block(candidate) {
        candidate = fenced.trim();
    }

    if candidate.starts_with('{') && candidate.ends_with('}') {
        return candidate;
    }

    match (candidate.find('{'), candidate.rfind('}')) {
        (Some(start), Some(end)) if start < end => &candidate[start..=end],
        _ => candidate,
    }
}

/// Contents of the first ``` fenced block, without the language tag
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    // Skip the language tag line (```json)
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let close = body.find("```").unwrap_or(body.len());
    Some(&body[..close])
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "dcm_capability": "Intelligent Supply",
        "scor_process": "Source",
        "scrm_area": "Supply Risk",
        "problem_description": "Supplier disruptions are detected too late.",
        "ai_technology_nature": "Graph neural network; agentic monitoring agent",
        "industry_sector": "Automotive"
    }"#;

    #[test]
    fn test_parse_valid_record() {
        let outcome = parse_extraction(VALID, false);
        let record = outcome.record().unwrap();
        assert_eq!(record.dcm_capability, "Intelligent Supply");
        assert_eq!(record.scrm_area.as_deref(), Some("Supply Risk"));
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = format!("```json\n{}\n```", VALID);
        assert!(parse_extraction(&response, false).is_parsed());
    }

    #[test]
    fn test_parse_json_with_prose() {
        let response = format!("Here is the analysis:\n{}\nLet me know if you need more.", VALID);
        assert!(parse_extraction(&response, false).is_parsed());
    }

    #[test]
    fn test_missing_scrm_area_is_allowed() {
        let response = r#"{"dcm_capability": "Smart Operations", "scor_process": "Make",
            "problem_description": "p", "ai_technology_nature": "a", "industry_sector": "General"}"#;
        let outcome = parse_extraction(response, false);
        assert_eq!(outcome.record().unwrap().scrm_area, None);
    }

    #[test]
    fn test_refusal_is_degraded() {
        match parse_extraction("I cannot comply.", false) {
            ExtractionOutcome::Degraded(degraded) => {
                assert!(degraded.error.starts_with("Parser failed: "));
                assert!(degraded.error.len() > "Parser failed: ".len());
                assert_eq!(degraded.raw_output, "I cannot comply.");
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_field_is_degraded() {
        let response = r#"{"dcm_capability": "Smart Operations", "scor_process": "Make"}"#;
        match parse_extraction(response, false) {
            ExtractionOutcome::Degraded(degraded) => {
                assert!(degraded.error.contains("missing field"));
                assert_eq!(degraded.raw_output, response);
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_output_is_degraded() {
        match parse_extraction("   ", false) {
            ExtractionOutcome::Degraded(degraded) => {
                assert_eq!(degraded.error, "Parser failed: empty model output");
                assert_eq!(degraded.raw_output, "   ");
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_array_is_degraded() {
        assert!(!parse_extraction("[1, 2, 3]", false).is_parsed());
    }

    #[test]
    fn test_strict_vocabulary() {
        let response = VALID.replace("Intelligent Supply", "Procurement Excellence");
        assert!(parse_extraction(&response, false).is_parsed());

        match parse_extraction(&response, true) {
            ExtractionOutcome::Degraded(degraded) => {
                assert!(degraded.error.contains("Procurement Excellence"));
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_evaluation_mean_recomputed() {
        let response = r#"{"overall_score": 0.1, "fields": {
            "dcm_capability": {"score": 1.0},
            "industry_sector": {"score": 0.5, "notes": ["close but not exact"]}
        }}"#;
        let outcome = parse_evaluation(response);
        let record = outcome.record().unwrap();
        assert_eq!(record.overall_score, Some(0.75));
        assert_eq!(record.fields["industry_sector"].notes.len(), 1);
    }

    #[test]
    fn test_evaluation_without_fields() {
        let outcome = parse_evaluation(r#"{"fields": {}}"#);
        assert_eq!(outcome.record().unwrap().overall_score, None);
    }

    #[test]
    fn test_evaluation_out_of_range_is_degraded() {
        let response = r#"{"fields": {"scor_process": {"score": 1.5}}}"#;
        match parse_evaluation(response) {
            EvaluationOutcome::Degraded(degraded) => {
                assert!(degraded.error.starts_with("Parser failed: "));
                assert!(degraded.error.contains("scor_process"));
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_json_from_plain_json() {
        assert_eq!(extract_json("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_from_markdown_without_language() {
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_without_object() {
        assert_eq!(extract_json(" no json here "), "no json here");
    }
}
