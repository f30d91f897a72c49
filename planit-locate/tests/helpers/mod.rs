//! Test Helper Utilities
//!
//! In-memory oracles for exercising the fusion engine and router without
//! network access. Each fake records its calls so tests can assert on
//! fan-out behavior.

pub mod fake_oracles;

pub use fake_oracles::{
    place, resolver_with, FakeRecognizer, FakeSearch, PassThroughNormalizer, TEST_IMAGE_BASE64,
};
