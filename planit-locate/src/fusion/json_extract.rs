//! Response-text JSON extraction
//!
//! Recovers a `RecognitionResult` from the recognition oracle's free-form
//! reply. Replies may wrap the object in markdown fences, lead with prose,
//! or trail commentary after the closing brace.
//!
//! # Strategy Cascade
//! Span strategies are tried in order; the first span that parses as a JSON
//! *object* wins:
//! 1. **greedy** - first `{` through the last `}`
//! 2. **minimal** - first `{` through the first `}` after it
//! 3. **whole** - the entire trimmed text
//!
//! Exhaustion yields `None`. A malformed reply degrades to "no recognition
//! signal", it never fails the request.

use crate::types::{Confidence, RecognitionResult};
use serde_json::{Map, Value};
use tracing::debug;

type SpanStrategy = fn(&str) -> Option<&str>;

/// Ordered span strategies
const SPAN_STRATEGIES: &[(&str, SpanStrategy)] = &[
    ("greedy", greedy_span),
    ("minimal", minimal_span),
    ("whole", whole_text),
];

/// Extract a recognition result from oracle text
pub fn extract_recognition(text: &str) -> Option<RecognitionResult> {
    if text.trim().is_empty() {
        debug!("Recognition reply empty");
        return None;
    }

    let recovered = SPAN_STRATEGIES.iter().find_map(|(name, strategy)| {
        let span = strategy(text)?;
        let result = parse_object(span)?;
        debug!(strategy = *name, "Recognition JSON recovered");
        Some(result)
    });

    if recovered.is_none() {
        debug!(
            reply_length = text.len(),
            "No JSON object recoverable from recognition reply"
        );
    }

    recovered
}

fn greedy_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn minimal_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = start + text[start..].find('}')?;
    Some(&text[start..=end])
}

fn whole_text(text: &str) -> Option<&str> {
    Some(text.trim())
}

fn parse_object(span: &str) -> Option<RecognitionResult> {
    let value: Value = serde_json::from_str(span).ok()?;
    let object = value.as_object()?;
    Some(from_object(object))
}

fn from_object(object: &Map<String, Value>) -> RecognitionResult {
    RecognitionResult {
        place_name: string_field(object, &["placeName", "place_name"]),
        city: string_field(object, &["city"]),
        state: string_field(object, &["state", "region"]),
        country: string_field(object, &["country"]),
        best_guess: string_field(object, &["bestGuess", "best_guess"]),
        confidence: confidence_field(object),
        rationale: string_field(object, &["rationale"]),
    }
}

/// First non-blank string under any of `keys`
fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric or numeric-string confidence, clamped to [0, 1]
fn confidence_field(object: &Map<String, Value>) -> Option<Confidence> {
    let raw = match object.get("confidence")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    raw.is_finite().then(|| raw.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{"placeName":"Eiffel Tower","city":"Paris","state":null,"country":"France","confidence":0.9,"rationale":"iron lattice tower"}"#;

    fn eiffel() -> RecognitionResult {
        RecognitionResult {
            place_name: Some("Eiffel Tower".to_string()),
            city: Some("Paris".to_string()),
            state: None,
            country: Some("France".to_string()),
            best_guess: None,
            confidence: Some(0.9),
            rationale: Some("iron lattice tower".to_string()),
        }
    }

    #[test]
    fn test_bare_object() {
        assert_eq!(extract_recognition(BARE), Some(eiffel()));
    }

    #[test]
    fn test_markdown_fence_matches_bare() {
        let fenced = format!("```json\n{}\n```", BARE);
        assert_eq!(extract_recognition(&fenced), extract_recognition(BARE));
    }

    #[test]
    fn test_leading_and_trailing_prose_matches_bare() {
        let wrapped = format!(
            "Sure! Here is my answer:\n{}\nLet me know if you need anything else.",
            BARE
        );
        assert_eq!(extract_recognition(&wrapped), Some(eiffel()));
    }

    #[test]
    fn test_minimal_span_rescues_trailing_brace_noise() {
        // Greedy span runs into the second "{...}" and fails to parse
        let text = format!("{} (also considered {{Trocadero}})", BARE);
        assert_eq!(extract_recognition(&text), Some(eiffel()));
    }

    #[test]
    fn test_garbage_is_absent() {
        assert!(extract_recognition("I cannot tell where this is.").is_none());
        assert!(extract_recognition("{not json at all}").is_none());
        assert!(extract_recognition("").is_none());
        assert!(extract_recognition("   \n").is_none());
    }

    #[test]
    fn test_non_object_json_is_absent() {
        assert!(extract_recognition("[1, 2, 3]").is_none());
        assert!(extract_recognition("\"Paris\"").is_none());
    }

    #[test]
    fn test_all_null_object_is_present() {
        let result = extract_recognition(
            r#"{"placeName":null,"city":null,"state":null,"country":null,"confidence":0}"#,
        )
        .expect("object must be recovered even when every field is null");
        assert!(!result.has_naming_field());
        assert_eq!(result.confidence, Some(0.0));
    }

    #[test]
    fn test_blank_strings_become_none() {
        let result = extract_recognition(r#"{"placeName":"  ","city":"Rome"}"#).unwrap();
        assert_eq!(result.place_name, None);
        assert_eq!(result.city.as_deref(), Some("Rome"));
    }

    #[test]
    fn test_confidence_coercion() {
        let as_string = extract_recognition(r#"{"city":"Oslo","confidence":"0.7"}"#).unwrap();
        assert_eq!(as_string.confidence, Some(0.7));

        let too_high = extract_recognition(r#"{"city":"Oslo","confidence":85}"#).unwrap();
        assert_eq!(too_high.confidence, Some(1.0));

        let wrong_type = extract_recognition(r#"{"city":"Oslo","confidence":true}"#).unwrap();
        assert_eq!(wrong_type.confidence, None);
    }

    #[test]
    fn test_best_guess_alias() {
        let result = extract_recognition(r#"{"best_guess":"a fjord"}"#).unwrap();
        assert_eq!(result.best_guess.as_deref(), Some("a fjord"));
    }
}
