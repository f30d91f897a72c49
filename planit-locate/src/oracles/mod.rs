//! External oracle clients
//!
//! HTTP-backed implementations of the traits in `types`:
//! 1. **image_normalizer** - inline/URL image → canonical base64 + media type
//! 2. **gemini_client** - recognition oracle (Gemini `generateContent`)
//! 3. **places_client** - search oracle (Places Text Search) and browser proxy
//!
//! Clients report failures as `OracleError`; the fusion engine decides what
//! a failure means for the request.

pub mod gemini_client;
pub mod image_normalizer;
pub mod places_client;

pub use gemini_client::GeminiClient;
pub use image_normalizer::HttpImageNormalizer;
pub use places_client::{PlacesClient, ProxyResponse};
