//! Candidate fusion layer
//!
//! # Architecture
//! - **json_extract** - recover structured guesses from oracle prose
//! - **query_builder** - search query policy and place-type fan-out
//! - **candidate_ranker** - confidence scoring and final selection
//! - **engine** - `LocationResolver`, the request-level orchestration
//! - **prompt** - recognition prompt contract

pub mod candidate_ranker;
pub mod engine;
pub mod json_extract;
pub mod prompt;
pub mod query_builder;

pub use candidate_ranker::{CandidateSet, ScoringConfig};
pub use engine::{LocateError, LocationResolver};
pub use json_extract::extract_recognition;
pub use query_builder::{build_query, search_place_types};
