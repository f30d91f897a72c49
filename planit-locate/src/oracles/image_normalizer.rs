//! Image Normalizer
//!
//! Turns caller input into the canonical payload the recognition oracle
//! accepts: standard padded base64 plus a media type.
//!
//! # Inputs
//! - Inline base64, optionally in a `data:<type>;base64,` envelope
//! - Remote URL, fetched over HTTP
//!
//! Inline input wins when both are supplied. Decoded or downloaded images
//! larger than the configured ceiling are rejected; remote bodies are read
//! chunk by chunk and abandoned as soon as they cross it.
//!
//! # Media Type
//! Magic-byte sniffing (`infer`) takes precedence. Otherwise the declared type
//! (data-URL header or `Content-Type`) is used. Unknown bytes with no usable
//! declaration default to `image/jpeg`; the recognition oracle tolerates it.

use crate::types::{ImageInput, ImageNormalizer, NormalizeError, NormalizedImage, OracleError};
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::debug;

/// Media types the recognition oracle accepts
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Fallback when neither sniffing nor declaration identifies the image
const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Declared types that carry no information
const GENERIC_MEDIA_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// Default timeout for image fetches
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Normalizer backed by an HTTP client for URL inputs
pub struct HttpImageNormalizer {
    http_client: Client,
    max_image_bytes: usize,
}

impl HttpImageNormalizer {
    pub fn new(max_image_bytes: usize) -> Result<Self, OracleError> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| OracleError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            max_image_bytes,
        })
    }

    fn too_large(&self) -> NormalizeError {
        NormalizeError::FetchFailed(format!("image exceeds {} bytes", self.max_image_bytes))
    }

    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>), NormalizeError> {
        debug!(url = %url, "Fetching image URL");

        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| NormalizeError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NormalizeError::FetchFailed(format!(
                "{} returned {}",
                url, status
            )));
        }

        let declared = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(length) = response.content_length() {
            if length > self.max_image_bytes as u64 {
                debug!(url = %url, content_length = length, "Remote image over size ceiling");
                return Err(self.too_large());
            }
        }

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NormalizeError::FetchFailed(e.to_string()))?
        {
            if bytes.len() + chunk.len() > self.max_image_bytes {
                debug!(url = %url, "Remote image crossed size ceiling mid-body");
                return Err(self.too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(NormalizeError::FetchFailed(format!("{} returned an empty body", url)));
        }

        Ok((bytes, declared))
    }
}

#[async_trait]
impl ImageNormalizer for HttpImageNormalizer {
    async fn normalize(&self, input: &ImageInput) -> Result<NormalizedImage, NormalizeError> {
        if let Some(inline) = input.inline() {
            let (declared, payload) = split_data_url(inline);
            let bytes = decode_base64(payload)?;
            if bytes.len() > self.max_image_bytes {
                return Err(NormalizeError::InvalidEncoding(format!(
                    "image exceeds {} bytes",
                    self.max_image_bytes
                )));
            }
            return canonicalize(bytes, declared.as_deref());
        }

        if let Some(url) = input.url() {
            let (bytes, declared) = self.fetch(url).await?;
            return canonicalize(bytes, declared.as_deref());
        }

        Err(NormalizeError::Missing)
    }
}

/// Split a `data:` URL into (declared media type, payload)
///
/// Input without the envelope is returned unchanged with no declared type.
pub fn split_data_url(input: &str) -> (Option<String>, &str) {
    let trimmed = input.trim();
    let Some(prefix) = trimmed.get(..5) else {
        return (None, trimmed);
    };
    if !prefix.eq_ignore_ascii_case("data:") {
        return (None, trimmed);
    }

    let Some(comma) = trimmed.find(',') else {
        return (None, trimmed);
    };

    let declared = trimmed[5..comma]
        .split(';')
        .next()
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty());

    (declared, &trimmed[comma + 1..])
}

/// Decode base64, tolerating whitespace, missing padding, and the URL-safe alphabet
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, NormalizeError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = LENIENT_STANDARD
        .decode(&compact)
        .or_else(|_| LENIENT_URL_SAFE.decode(&compact))
        .map_err(|e| NormalizeError::InvalidEncoding(e.to_string()))?;

    if bytes.is_empty() {
        return Err(NormalizeError::InvalidEncoding("empty image payload".to_string()));
    }

    Ok(bytes)
}

/// Pick the media type for `bytes`
pub fn resolve_media_type(bytes: &[u8], declared: Option<&str>) -> Result<String, NormalizeError> {
    if let Some(kind) = infer::get(bytes) {
        let sniffed = kind.mime_type();
        return if is_supported(sniffed) {
            Ok(sniffed.to_string())
        } else {
            Err(NormalizeError::UnsupportedFormat(sniffed.to_string()))
        };
    }

    let declared = declared
        .and_then(|d| d.split(';').next())
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty());

    match declared {
        Some(d) if d == "image/jpg" => Ok(DEFAULT_MEDIA_TYPE.to_string()),
        Some(d) if is_supported(&d) => Ok(d),
        Some(d) if !GENERIC_MEDIA_TYPES.contains(&d.as_str()) => {
            Err(NormalizeError::UnsupportedFormat(d))
        }
        _ => Ok(DEFAULT_MEDIA_TYPE.to_string()),
    }
}

fn is_supported(media_type: &str) -> bool {
    SUPPORTED_MEDIA_TYPES.contains(&media_type)
}

fn canonicalize(bytes: Vec<u8>, declared: Option<&str>) -> Result<NormalizedImage, NormalizeError> {
    let media_type = resolve_media_type(&bytes, declared)?;
    Ok(NormalizedImage {
        data_base64: STANDARD.encode(&bytes),
        media_type,
        byte_len: bytes.len(),
    })
}
