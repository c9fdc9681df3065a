// SPDX-License-Identifier: MIT

//! Structured verdict blocks
//!
//! The model is asked to answer inside a fenced ```` ```json ```` block. This
//! module finds that block, validates it against the verdict schema and can
//! render a block for a given verdict.

use crate::adk::error::ReviewError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// First fenced json block, across newlines
static BLOCK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json(.*?)```").expect("valid block regex"));

/// Wire schema of the structured block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredVerdict {
    /// `null` or absent means the model has not decided yet
    #[serde(default, alias = "approved")]
    pub decision: Option<bool>,
    #[serde(default)]
    pub reason: String,
}

/// Extract the trimmed contents of the first fenced json block
pub fn extract_block(response: &str) -> Result<&str, ReviewError> {
    BLOCK_REGEX
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .ok_or(ReviewError::Format)
}

/// Parse a block's contents against the verdict schema.
///
/// The block must hold a JSON object; serde would otherwise accept a
/// positional array for the struct.
pub fn parse_block(block: &str) -> Result<StructuredVerdict, ReviewError> {
    let parse_error = |message: String| ReviewError::Parse {
        message,
        block: block.to_string(),
    };
    let value: serde_json::Value =
        serde_json::from_str(block).map_err(|e| parse_error(e.to_string()))?;
    if !value.is_object() {
        return Err(parse_error("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| parse_error(e.to_string()))
}

/// Extract then parse
pub fn parse_response(response: &str) -> Result<StructuredVerdict, ReviewError> {
    parse_block(extract_block(response)?)
}

/// Render a fenced block for a verdict.
///
/// Backticks are emitted as `\u0060` escapes so a reason containing a
/// fence cannot terminate the block early.
pub fn render_block(verdict: &StructuredVerdict) -> String {
    let json = serde_json::to_string_pretty(verdict)
        .unwrap_or_else(|_| "{}".to_string())
        .replace('`', "\\u0060");
    format!("```json\n{}\n```", json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_block_with_surrounding_text() {
        let response = "Sure, here you go:\n```json\n{\"decision\": true}\n```\nThanks!";
        assert_eq!(extract_block(response).unwrap(), "{\"decision\": true}");
    }

    #[test]
    fn test_extract_first_block_only() {
        let response = "```json\n{\"decision\": false}\n```\n```json\n{\"decision\": true}\n```";
        let verdict = parse_response(response).unwrap();
        assert_eq!(verdict.decision, Some(false));
    }

    #[test]
    fn test_missing_block_is_format_error() {
        let err = parse_response("{\"decision\": true, \"reason\": \"raw json\"}").unwrap_err();
        assert!(matches!(err, ReviewError::Format));

        // unlabeled fence does not count
        let err = parse_response("```\n{\"decision\": true}\n```").unwrap_err();
        assert!(matches!(err, ReviewError::Format));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_response("```json\n{decision: yes}\n```").unwrap_err();
        match err {
            ReviewError::Parse { block, .. } => assert_eq!(block, "{decision: yes}"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_field_types_are_parse_errors() {
        for body in [
            r#"{"decision": "yes", "reason": "x"}"#,
            r#"{"decision": true, "reason": 3}"#,
            r#""approved""#,
            r#"[true, "positional"]"#,
            "42",
        ] {
            let response = format!("```json\n{}\n```", body);
            assert!(
                matches!(parse_response(&response), Err(ReviewError::Parse { .. })),
                "{} should not parse",
                body
            );
        }
    }

    #[test]
    fn test_null_and_absent_decision_are_unset() {
        let v = parse_response("```json\n{\"decision\": null, \"reason\": \"unsure\"}\n```")
            .unwrap();
        assert_eq!(v.decision, None);
        assert_eq!(v.reason, "unsure");

        let v = parse_response("```json\n{\"reason\": \"thinking\"}\n```").unwrap();
        assert_eq!(v.decision, None);
    }

    #[test]
    fn test_approved_alias_accepted() {
        let v = parse_response("```json\n{\"approved\": true, \"reason\": \"fits\"}\n```").unwrap();
        assert_eq!(v.decision, Some(true));
        assert_eq!(v.reason, "fits");
    }

    #[test]
    fn test_render_then_parse_preserves_verdict() {
        for verdict in [
            StructuredVerdict {
                decision: Some(true),
                reason: "meets experience requirement".into(),
            },
            StructuredVerdict {
                decision: Some(false),
                reason: "uses ```code``` fences and \"quotes\"\nacross lines".into(),
            },
            StructuredVerdict {
                decision: None,
                reason: String::new(),
            },
        ] {
            let parsed = parse_response(&render_block(&verdict)).unwrap();
            assert_eq!(parsed, verdict);
        }
    }
}
