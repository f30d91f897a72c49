//! Location resolver - request-level fusion orchestration
//!
//! # Pipeline
//! 1. Reject requests without an image (`MissingImage`)
//! 2. Reject when no recognition oracle is configured (`MissingRecognitionCredentials`)
//! 3. Normalize the image
//! 4. Ask the recognition oracle, recover its JSON (failure → no recognition signal)
//! 5. Build a query, run the place-type fan-out (failure → no search candidates)
//! 6. Score, rank, select
//!
//! Only steps 1-3 can fail the request. Oracle failures in 4-5 degrade the
//! candidate set toward the "no_idea" sentinel.
//!
//! # Example
//! ```rust,ignore
//! use planit_locate::config::FusionConfig;
//! use planit_locate::fusion::LocationResolver;
//! use planit_locate::types::ImageInput;
//!
//! let resolver = LocationResolver::from_config(FusionConfig::default())?;
//! let answer = resolver
//!     .resolve_location(&ImageInput::from_url("https://example.com/photo.jpg"), Some("Paris"))
//!     .await?;
//! println!("{}", serde_json::to_string(&answer)?);
//! ```

use crate::config::FusionConfig;
use crate::fusion::candidate_ranker::CandidateSet;
use crate::fusion::json_extract::extract_recognition;
use crate::fusion::prompt::recognition_prompt;
use crate::fusion::query_builder::{build_query, search_place_types};
use crate::oracles::gemini_client::GeminiClient;
use crate::oracles::image_normalizer::HttpImageNormalizer;
use crate::oracles::places_client::PlacesClient;
use crate::types::{
    FinalAnswer, ImageInput, ImageNormalizer, NormalizeError, OracleError, PlaceSearch,
    RecognitionOracle, RecognitionResult,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that cross the fusion boundary
///
/// Input problems and missing recognition credentials only. Oracle failures
/// never appear here.
#[derive(Debug, Error)]
pub enum LocateError {
    /// Neither inline bytes nor URL supplied
    #[error("imageBase64 or imageUrl is required")]
    MissingImage,

    /// Image media type not accepted by the recognition oracle
    #[error("unsupported image format: {0}")]
    UnsupportedMediaType(String),

    /// Inline payload could not be decoded
    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    /// Remote image could not be fetched
    #[error("failed_to_fetch_image_url: {0}")]
    ImageFetch(String),

    /// No recognition credential; there is no fallback without it
    #[error("recognition credentials not configured")]
    MissingRecognitionCredentials,
}

impl From<NormalizeError> for LocateError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::Missing => LocateError::MissingImage,
            NormalizeError::UnsupportedFormat(media_type) => {
                LocateError::UnsupportedMediaType(media_type)
            }
            NormalizeError::InvalidEncoding(msg) => LocateError::InvalidImage(msg),
            NormalizeError::FetchFailed(msg) => LocateError::ImageFetch(msg),
        }
    }
}

/// Candidate fusion engine
///
/// Stateless across requests: holds configuration and oracle handles only.
pub struct LocationResolver {
    config: FusionConfig,
    normalizer: Arc<dyn ImageNormalizer>,
    recognizer: Option<Arc<dyn RecognitionOracle>>,
    search: Option<Arc<dyn PlaceSearch>>,
}

impl LocationResolver {
    /// Create a resolver with no oracles attached
    pub fn new(config: FusionConfig, normalizer: Arc<dyn ImageNormalizer>) -> Self {
        Self {
            config,
            normalizer,
            recognizer: None,
            search: None,
        }
    }

    /// Build the production resolver: HTTP clients for every configured credential
    pub fn from_config(config: FusionConfig) -> Result<Self, OracleError> {
        let normalizer: Arc<dyn ImageNormalizer> = Arc::new(HttpImageNormalizer::new(config.max_image_bytes)?);

        let recognizer: Option<Arc<dyn RecognitionOracle>> = match &config.recognition_api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(
                key.clone(),
                config.recognition_model.clone(),
            )?)),
            None => None,
        };

        let search: Option<Arc<dyn PlaceSearch>> = match &config.search_api_key {
            Some(key) => Some(Arc::new(PlacesClient::new(key.clone())?)),
            None => None,
        };

        let mut resolver = Self::new(config, normalizer);
        resolver.recognizer = recognizer;
        resolver.search = search;
        Ok(resolver)
    }

    /// Attach a recognition oracle
    pub fn with_recognizer(mut self, recognizer: Arc<dyn RecognitionOracle>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Attach a place search oracle
    pub fn with_place_search(mut self, search: Arc<dyn PlaceSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Resolve a photo to a best-guess location
    ///
    /// # Errors
    /// - `MissingImage` / `UnsupportedMediaType` / `InvalidImage` / `ImageFetch`
    ///   for input problems
    /// - `MissingRecognitionCredentials` when no recognition oracle is configured
    ///
    /// Every oracle failure is absorbed and reflected in the answer instead.
    pub async fn resolve_location(
        &self,
        input: &ImageInput,
        region_hint: Option<&str>,
    ) -> Result<FinalAnswer, LocateError> {
        if !input.has_image() {
            return Err(LocateError::MissingImage);
        }

        let Some(recognizer) = self.recognizer.as_deref() else {
            return Err(LocateError::MissingRecognitionCredentials);
        };

        let region_hint = region_hint.map(str::trim).filter(|h| !h.is_empty());

        let image = self.normalizer.normalize(input).await?;
        debug!(
            media_type = %image.media_type,
            byte_len = image.byte_len,
            "Image normalized"
        );

        let recognition = self.recognize(recognizer, &image, region_hint).await;

        let mut candidates = CandidateSet::new();
        if let Some(result) = &recognition {
            candidates.push_recognition(result, &self.config.scoring);
        }

        match (
            build_query(recognition.as_ref(), region_hint, &self.config.query_bias_terms),
            self.search.as_deref(),
        ) {
            (Some(query), Some(search)) => {
                let records = search_place_types(search, &query, &self.config.place_types).await;
                candidates.push_places(&records, &self.config.scoring);
            }
            (Some(query), None) => {
                debug!(query = %query, "Place search not configured, skipping");
            }
            (None, _) => {
                debug!("Nothing to search for");
            }
        }

        let candidate_count = candidates.len();
        let answer = candidates.select();

        match &answer {
            FinalAnswer::Located(chosen) => info!(
                place_name = %chosen.place_name,
                confidence = chosen.confidence,
                source = ?chosen.source,
                candidate_count = candidate_count,
                "Location resolved"
            ),
            FinalAnswer::NoAnswer(_) => info!("No location candidates"),
        }

        Ok(answer)
    }

    async fn recognize(
        &self,
        recognizer: &dyn RecognitionOracle,
        image: &crate::types::NormalizedImage,
        region_hint: Option<&str>,
    ) -> Option<RecognitionResult> {
        let prompt = recognition_prompt(region_hint);

        match recognizer.identify(image, &prompt).await {
            Ok(text) => {
                let result = extract_recognition(&text);
                debug!(
                    oracle = recognizer.name(),
                    recovered = result.is_some(),
                    "Recognition reply processed"
                );
                result
            }
            Err(e) => {
                warn!(
                    oracle = recognizer.name(),
                    error = %e,
                    "Recognition failed, continuing without recognition signal"
                );
                None
            }
        }
    }
}
