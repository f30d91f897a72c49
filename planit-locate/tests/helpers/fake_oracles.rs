#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use planit_locate::config::FusionConfig;
use planit_locate::fusion::LocationResolver;
use planit_locate::types::{
    ImageInput, ImageNormalizer, NormalizeError, NormalizedImage, OracleError, PlaceRecord,
    PlaceSearch, RecognitionOracle,
};

/// Base64 of a JPEG header, enough for the real normalizer to sniff
pub const TEST_IMAGE_BASE64: &str = "/9j/4AAQSkZJRgABAQ==";

/// Normalizer that accepts anything with an image and never touches the network
pub struct PassThroughNormalizer;

#[async_trait]
impl ImageNormalizer for PassThroughNormalizer {
    async fn normalize(&self, input: &ImageInput) -> Result<NormalizedImage, NormalizeError> {
        if !input.has_image() {
            return Err(NormalizeError::Missing);
        }
        Ok(NormalizedImage {
            data_base64: TEST_IMAGE_BASE64.to_string(),
            media_type: "image/jpeg".to_string(),
            byte_len: 13,
        })
    }
}

/// Recognition oracle with a canned reply
pub struct FakeRecognizer {
    reply: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeRecognizer {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RecognitionOracle for FakeRecognizer {
    fn name(&self) -> &'static str {
        "FakeRecognizer"
    }

    async fn identify(&self, _image: &NormalizedImage, prompt: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(OracleError::Network)
    }
}

/// Place search oracle answering per place type
pub struct FakeSearch {
    by_type: HashMap<String, Vec<PlaceRecord>>,
    failing_types: Vec<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeSearch {
    pub fn empty() -> Arc<Self> {
        Self::builder().build()
    }

    /// Same records for every place type
    pub fn always(records: Vec<PlaceRecord>) -> Arc<Self> {
        Self::builder()
            .with_type("tourist_attraction", records.clone())
            .with_type("point_of_interest", records.clone())
            .with_type("establishment", records)
            .build()
    }

    pub fn builder() -> FakeSearchBuilder {
        FakeSearchBuilder {
            by_type: HashMap::new(),
            failing_types: Vec::new(),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub struct FakeSearchBuilder {
    by_type: HashMap<String, Vec<PlaceRecord>>,
    failing_types: Vec<String>,
}

impl FakeSearchBuilder {
    pub fn with_type(mut self, place_type: &str, records: Vec<PlaceRecord>) -> Self {
        self.by_type.insert(place_type.to_string(), records);
        self
    }

    pub fn failing_on(mut self, place_type: &str) -> Self {
        self.failing_types.push(place_type.to_string());
        self
    }

    pub fn build(self) -> Arc<FakeSearch> {
        Arc::new(FakeSearch {
            by_type: self.by_type,
            failing_types: self.failing_types,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PlaceSearch for FakeSearch {
    fn name(&self) -> &'static str {
        "FakeSearch"
    }

    async fn search(&self, query: &str, place_type: &str) -> Result<Vec<PlaceRecord>, OracleError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), place_type.to_string()));

        if self.failing_types.iter().any(|t| t == place_type) {
            return Err(OracleError::Api("REQUEST_DENIED".to_string()));
        }
        Ok(self.by_type.get(place_type).cloned().unwrap_or_default())
    }
}

/// Place record with coordinates
pub fn place(name: &str, lat: f64, lng: f64, ratings: Option<u64>) -> PlaceRecord {
    PlaceRecord {
        name: name.to_string(),
        formatted_address: Some(format!("{}, Somewhere", name)),
        lat: Some(lat),
        lng: Some(lng),
        user_ratings_total: ratings,
        place_id: Some(format!("place-{}", name.to_lowercase().replace(' ', "-"))),
    }
}

/// Resolver with the pass-through normalizer and whichever fakes are given
pub fn resolver_with(
    recognizer: Option<Arc<FakeRecognizer>>,
    search: Option<Arc<FakeSearch>>,
) -> LocationResolver {
    let mut resolver = LocationResolver::new(FusionConfig::default(), Arc::new(PassThroughNormalizer));
    if let Some(recognizer) = recognizer {
        resolver = resolver.with_recognizer(recognizer);
    }
    if let Some(search) = search {
        resolver = resolver.with_place_search(search);
    }
    resolver
}
