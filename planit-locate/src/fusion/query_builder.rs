//! Search query construction and place-type fan-out
//!
//! # Query Policy
//! 1. Non-null `placeName, city, state, country`, in that order
//! 2. If none of those: the free-text `bestGuess`
//! 3. Region hint appended when present
//! 4. No recognition pieces: region hint alone
//! 5. Nothing at all: no query, zero search calls
//!
//! Configured bias terms are appended to any query that exists.
//!
//! # Fan-out
//! The query is tried against each place-type hint in order, stopping at the
//! first type that returns a record. Calls are serial; a failing call counts
//! as an empty result for that type.

use crate::types::{PlaceRecord, PlaceSearch, RecognitionResult};
use tracing::{debug, warn};

/// Build the free-text search query, or `None` when there is nothing to search
pub fn build_query(
    recognition: Option<&RecognitionResult>,
    region_hint: Option<&str>,
    bias_terms: &[String],
) -> Option<String> {
    let region_hint = region_hint.map(str::trim).filter(|h| !h.is_empty());

    let mut pieces: Vec<&str> = recognition
        .map(recognition_pieces)
        .unwrap_or_default();

    if let Some(hint) = region_hint {
        pieces.push(hint);
    }

    if pieces.is_empty() {
        return None;
    }

    pieces.extend(
        bias_terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty()),
    );

    Some(pieces.join(" "))
}

fn recognition_pieces(result: &RecognitionResult) -> Vec<&str> {
    let structured: Vec<&str> = [
        &result.place_name,
        &result.city,
        &result.state,
        &result.country,
    ]
    .into_iter()
    .filter_map(|f| f.as_deref())
    .collect();

    if !structured.is_empty() {
        return structured;
    }

    result.best_guess.as_deref().into_iter().collect()
}

/// Run `query` against each place type until one returns records
///
/// # Returns
/// The first non-empty record list, or an empty list when every type came
/// back empty or failed.
pub async fn search_place_types(
    search: &dyn PlaceSearch,
    query: &str,
    place_types: &[String],
) -> Vec<PlaceRecord> {
    for place_type in place_types {
        match search.search(query, place_type).await {
            Ok(records) if !records.is_empty() => {
                debug!(
                    oracle = search.name(),
                    query = %query,
                    place_type = %place_type,
                    result_count = records.len(),
                    "Place search matched"
                );
                return records;
            }
            Ok(_) => {
                debug!(
                    oracle = search.name(),
                    query = %query,
                    place_type = %place_type,
                    "Place search returned no results"
                );
            }
            Err(e) => {
                warn!(
                    oracle = search.name(),
                    query = %query,
                    place_type = %place_type,
                    error = %e,
                    "Place search failed, treating as empty"
                );
            }
        }
    }

    Vec::new()
}
