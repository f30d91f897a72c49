//! Candidate scoring and final selection
//!
//! Converts oracle outputs into `Candidate`s and picks the final answer.
//!
//! # Confidence Scoring
//! - **Recognition:** `min(max(confidence ?? 0.6, 0.5), 0.99)`. A guess without
//!   coordinates is never fully trusted nor fully discounted.
//! - **Search:** `min(0.6 + log10(max(ratings, 1)) / 10, 0.98) - 0.05 * rank`
//!   over the oracle's top 3, in the oracle's own order. Popularity pays off
//!   logarithmically; lower oracle ranks are penalised.
//!
//! # Selection
//! First geocoded candidate in append order, else the first candidate, else
//! the "no_idea" sentinel. Confidence never reorders candidates.

use crate::types::{
    Candidate, CandidateSource, Confidence, FinalAnswer, PlaceRecord, RecognitionResult,
};
use tracing::debug;

/// Tunable scoring bounds
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Recognition confidence used when the oracle gave none
    pub recognition_default_confidence: Confidence,
    /// Lower clamp for recognition-only confidence
    pub recognition_confidence_floor: Confidence,
    /// Upper clamp for recognition-only confidence
    pub recognition_confidence_ceiling: Confidence,
    /// Search confidence before the popularity bonus
    pub search_base_confidence: Confidence,
    /// Upper clamp for search confidence before the rank penalty
    pub search_confidence_ceiling: Confidence,
    /// Penalty per rank position within the search slice
    pub rank_penalty: Confidence,
    /// Number of search records turned into candidates
    pub max_place_candidates: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            recognition_default_confidence: 0.6,
            recognition_confidence_floor: 0.5,
            recognition_confidence_ceiling: 0.99,
            search_base_confidence: 0.6,
            search_confidence_ceiling: 0.98,
            rank_penalty: 0.05,
            max_place_candidates: 3,
        }
    }
}

impl ScoringConfig {
    /// Clamped confidence for a recognition-only guess
    ///
    /// Never panics: an inverted pair lets the ceiling win and a NaN bound
    /// is ignored.
    pub fn recognition_confidence(&self, reported: Option<Confidence>) -> Confidence {
        reported
            .unwrap_or(self.recognition_default_confidence)
            .max(self.recognition_confidence_floor)
            .min(self.recognition_confidence_ceiling)
    }

    /// Confidence for a search record at `rank` within the slice
    pub fn search_confidence(&self, user_ratings_total: Option<u64>, rank: usize) -> Confidence {
        let popularity = match user_ratings_total {
            Some(total) => {
                let bonus = (total.max(1) as f64).log10() / 10.0;
                (self.search_base_confidence + bonus).min(self.search_confidence_ceiling)
            }
            None => self.search_base_confidence,
        };

        (popularity - self.rank_penalty * rank as f64).clamp(0.0, 1.0)
    }
}

/// Ordered, append-only candidate list for one request
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
    has_recognition: bool,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Append the coordinate-less recognition candidate, if the result names anything
    ///
    /// # Returns
    /// `true` when a candidate was appended
    pub fn push_recognition(&mut self, result: &RecognitionResult, scoring: &ScoringConfig) -> bool {
        if !result.has_naming_field() {
            debug!("Recognition result has no naming field, no candidate");
            return false;
        }

        let Some(place_name) = result.display_name() else {
            return false;
        };

        let confidence = scoring.recognition_confidence(result.confidence);
        debug!(
            place_name = %place_name,
            reported = ?result.confidence,
            confidence = confidence,
            "Recognition candidate"
        );

        self.candidates.push(Candidate {
            place_name,
            lat: None,
            lng: None,
            confidence,
            source: CandidateSource::Recognition,
            address: None,
            place_id: None,
        });
        self.has_recognition = true;
        true
    }

    /// Append search-derived candidates from the oracle's top records
    ///
    /// Records are taken in the oracle's order; the rank penalty uses the
    /// position in the top slice. Nameless records are skipped.
    ///
    /// # Returns
    /// Number of candidates appended
    pub fn push_places(&mut self, records: &[PlaceRecord], scoring: &ScoringConfig) -> usize {
        let source = if self.has_recognition {
            CandidateSource::RecognitionPlaces
        } else {
            CandidateSource::PlacesOnly
        };

        let before = self.candidates.len();

        for (rank, record) in records.iter().take(scoring.max_place_candidates).enumerate() {
            let name = record.name.trim();
            if name.is_empty() {
                debug!(rank = rank, "Skipping nameless place record");
                continue;
            }

            let confidence = scoring.search_confidence(record.user_ratings_total, rank);
            debug!(
                place_name = %name,
                rank = rank,
                user_ratings_total = ?record.user_ratings_total,
                confidence = confidence,
                "Place candidate"
            );

            self.candidates.push(Candidate {
                place_name: name.to_string(),
                lat: record.lat,
                lng: record.lng,
                confidence,
                source,
                address: record.formatted_address.clone(),
                place_id: record.place_id.clone(),
            });
        }

        self.candidates.len() - before
    }

    /// Pick the final answer
    ///
    /// A geocoded guess beats an ungeocoded one regardless of confidence.
    pub fn select(self) -> FinalAnswer {
        let mut candidates = self.candidates;

        if candidates.is_empty() {
            return FinalAnswer::no_answer();
        }

        let index = candidates
            .iter()
            .position(Candidate::is_geocoded)
            .unwrap_or(0);

        FinalAnswer::Located(candidates.swap_remove(index))
    }
}
