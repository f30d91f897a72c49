//! Recognition prompt contract
//!
//! The schema is a request to the oracle, not a guarantee; replies are
//! recovered by `json_extract`.

/// Build the recognition prompt, folding in the caller's region hint
pub fn recognition_prompt(region_hint: Option<&str>) -> String {
    let hint = region_hint
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| format!("Region hint: {}.\n", h))
        .unwrap_or_default();

    format!(
        r#"You are a location recognition assistant.
Given a single photo, identify the MOST LIKELY real-world location.
Return STRICT JSON only with fields:
{{
  "placeName": string | null,
  "city": string | null,
  "state": string | null,
  "country": string | null,
  "bestGuess": string | null,
  "confidence": number,
  "rationale": string
}}
"confidence" is between 0 and 1. "rationale" is a short reason referencing visual clues.
If no specific place is recognisable, set placeName to null and describe the scene in bestGuess.
If unsure, set confidence to 0.
{}JSON only. No prose."#,
        hint
    )
}
