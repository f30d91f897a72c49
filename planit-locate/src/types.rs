//! Core Types and Trait Definitions for planit-locate
//!
//! Defines the oracle seams and the request-scoped data model of the
//! location fusion pipeline:
//! - **Oracles:** `ImageNormalizer`, `RecognitionOracle`, `PlaceSearch`
//! - **Data:** `RecognitionResult` → `Candidate` ← `PlaceRecord`
//! - **Outcome:** `FinalAnswer`
//!
//! # Architecture
//! Everything here lives for one request. The fusion engine holds trait
//! objects so tests can swap the HTTP clients for in-memory fakes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confidence score in [0, 1]
pub type Confidence = f64;

// ============================================================================
// Image Input
// ============================================================================

/// Raw image input as supplied by the caller
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    /// Inline base64 payload, optionally wrapped in a `data:` URL envelope
    #[serde(default)]
    pub image_base64: Option<String>,
    /// Remote image URL
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ImageInput {
    pub fn from_base64(data: impl Into<String>) -> Self {
        Self {
            image_base64: Some(data.into()),
            image_url: None,
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            image_base64: None,
            image_url: Some(url.into()),
        }
    }

    /// Inline payload, if present and non-blank
    pub fn inline(&self) -> Option<&str> {
        non_blank(self.image_base64.as_deref())
    }

    /// Remote URL, if present and non-blank
    pub fn url(&self) -> Option<&str> {
        non_blank(self.image_url.as_deref())
    }

    /// True when either inline bytes or a URL were supplied
    pub fn has_image(&self) -> bool {
        self.inline().is_some() || self.url().is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Canonical image payload handed to the recognition oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// Standard base64 (padded) encoding of the image bytes
    pub data_base64: String,
    /// Best-effort media type (e.g. "image/png")
    pub media_type: String,
    /// Decoded payload size in bytes
    pub byte_len: usize,
}

// ============================================================================
// Recognition Output
// ============================================================================

/// Structured guess recovered from the recognition oracle's text reply
///
/// Every field is optional. A present result with all fields `None` is
/// still distinct from an absent result (`Option<RecognitionResult>::None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
    pub place_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    /// Free-text guess when the oracle could not fill the structured fields
    pub best_guess: Option<String>,
    pub confidence: Option<Confidence>,
    pub rationale: Option<String>,
}

impl RecognitionResult {
    /// True when at least one naming field is present
    pub fn has_naming_field(&self) -> bool {
        self.place_name.is_some()
            || self.city.is_some()
            || self.state.is_some()
            || self.country.is_some()
            || self.best_guess.is_some()
    }

    /// Display name: explicit place name, else "city, state, country", else best guess
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.place_name {
            return Some(name.clone());
        }

        let locality: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .collect();
        if !locality.is_empty() {
            return Some(locality.join(", "));
        }

        self.best_guess.clone()
    }
}

// ============================================================================
// Search Output
// ============================================================================

/// Place record returned by the search oracle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceRecord {
    pub name: String,
    pub formatted_address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Popularity signal (number of user ratings)
    pub user_ratings_total: Option<u64>,
    pub place_id: Option<String>,
}

// ============================================================================
// Candidates and Final Answer
// ============================================================================

/// Provenance of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    /// Recognition oracle only, no coordinates
    #[serde(rename = "recognition")]
    Recognition,
    /// Search oracle without a recognition guess
    #[serde(rename = "places_only")]
    PlacesOnly,
    /// Search oracle refining a recognition guess
    #[serde(rename = "recognition+places")]
    RecognitionPlaces,
}

/// Unified, scored location guess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Never empty
    pub place_name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub confidence: Confidence,
    pub source: CandidateSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl Candidate {
    /// True when both coordinates are known
    pub fn is_geocoded(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

/// "No answer" sentinel record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoIdea {
    pub place_name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub confidence: Confidence,
    pub message: &'static str,
}

impl Default for NoIdea {
    fn default() -> Self {
        Self {
            place_name: None,
            lat: None,
            lng: None,
            confidence: 0.0,
            message: "no_idea",
        }
    }
}

/// Outcome of one fusion run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FinalAnswer {
    Located(Candidate),
    NoAnswer(NoIdea),
}

impl FinalAnswer {
    pub fn no_answer() -> Self {
        FinalAnswer::NoAnswer(NoIdea::default())
    }

    /// Selected candidate, if any
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            FinalAnswer::Located(candidate) => Some(candidate),
            FinalAnswer::NoAnswer(_) => None,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            FinalAnswer::Located(candidate) => candidate.confidence,
            FinalAnswer::NoAnswer(sentinel) => sentinel.confidence,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Oracle call failure
///
/// Absorbed inside the fusion engine; a failing stage contributes no candidates.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// External API returned an error status or error payload
    #[error("API error: {0}")]
    Api(String),

    /// Failed to parse response body
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client could not be constructed
    #[error("Oracle not configured: {0}")]
    NotConfigured(String),
}

/// Image normalization failure
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Neither inline bytes nor URL supplied
    #[error("imageBase64 or imageUrl is required")]
    Missing,

    /// Media type the recognition oracle does not accept
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Inline payload is not valid base64
    #[error("Invalid image encoding: {0}")]
    InvalidEncoding(String),

    /// Remote image could not be fetched
    #[error("Failed to fetch image URL: {0}")]
    FetchFailed(String),
}

// ============================================================================
// Oracle Traits
// ============================================================================

/// Turns raw caller input into a canonical payload
#[async_trait::async_trait]
pub trait ImageNormalizer: Send + Sync {
    async fn normalize(&self, input: &ImageInput) -> Result<NormalizedImage, NormalizeError>;
}

/// Image-understanding oracle
///
/// # Example
/// ```rust,ignore
/// use planit_locate::types::{NormalizedImage, OracleError, RecognitionOracle};
///
/// struct Canned(&'static str);
///
/// #[async_trait::async_trait]
/// impl RecognitionOracle for Canned {
///     fn name(&self) -> &'static str { "Canned" }
///
///     async fn identify(&self, _image: &NormalizedImage, _prompt: &str) -> Result<String, OracleError> {
///         Ok(self.0.to_string())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait RecognitionOracle: Send + Sync {
    /// Oracle name for logging
    fn name(&self) -> &'static str;

    /// Ask the oracle about an image
    ///
    /// # Returns
    /// The oracle's raw text reply. It *should* contain a JSON object but
    /// nothing is guaranteed; an empty string is a valid reply.
    async fn identify(&self, image: &NormalizedImage, prompt: &str)
        -> Result<String, OracleError>;
}

/// Text search oracle for named, geocoded places
#[async_trait::async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Oracle name for logging
    fn name(&self) -> &'static str;

    /// Search for places matching `query`, biased by `place_type`
    ///
    /// # Returns
    /// Records in the oracle's relevance order. "No matches" is `Ok(vec![])`.
    async fn search(&self, query: &str, place_type: &str)
        -> Result<Vec<PlaceRecord>, OracleError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_blank_fields_count_as_missing() {
        let input = ImageInput {
            image_base64: Some("   ".to_string()),
            image_url: Some(String::new()),
        };
        assert!(!input.has_image());
        assert!(ImageInput::from_url("https://example.com/a.jpg").has_image());
    }

    #[test]
    fn test_display_name_prefers_place_name() {
        let result = RecognitionResult {
            place_name: Some("Eiffel Tower".to_string()),
            city: Some("Paris".to_string()),
            ..Default::default()
        };
        assert_eq!(result.display_name().as_deref(), Some("Eiffel Tower"));
    }

    #[test]
    fn test_display_name_joins_locality() {
        let result = RecognitionResult {
            city: Some("Austin".to_string()),
            country: Some("USA".to_string()),
            best_guess: Some("somewhere in Texas".to_string()),
            ..Default::default()
        };
        assert_eq!(result.display_name().as_deref(), Some("Austin, USA"));
    }

    #[test]
    fn test_display_name_falls_back_to_best_guess() {
        let result = RecognitionResult {
            best_guess: Some("a harbour in Norway".to_string()),
            ..Default::default()
        };
        assert!(result.has_naming_field());
        assert_eq!(result.display_name().as_deref(), Some("a harbour in Norway"));
    }

    #[test]
    fn test_empty_result_has_no_naming_field() {
        let result = RecognitionResult {
            confidence: Some(0.9),
            rationale: Some("blurry".to_string()),
            ..Default::default()
        };
        assert!(!result.has_naming_field());
        assert!(result.display_name().is_none());
    }

    #[test]
    fn test_no_answer_serialization() {
        let value = serde_json::to_value(FinalAnswer::no_answer()).unwrap();
        assert!(value["placeName"].is_null());
        assert!(value["lat"].is_null());
        assert!(value["lng"].is_null());
        assert_eq!(value["confidence"].as_f64(), Some(0.0));
        assert_eq!(value["message"], "no_idea");
    }

    #[test]
    fn test_candidate_serialization_shape() {
        let answer = FinalAnswer::Located(Candidate {
            place_name: "Golden Gate Bridge".to_string(),
            lat: Some(37.8),
            lng: Some(-122.48),
            confidence: 0.98,
            source: CandidateSource::RecognitionPlaces,
            address: None,
            place_id: Some("abc".to_string()),
        });
        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(value["placeName"], "Golden Gate Bridge");
        assert_eq!(value["source"], "recognition+places");
        assert_eq!(value["placeId"], "abc");
        assert!(value.get("address").is_none());
        assert!(value.get("message").is_none());
    }
}
