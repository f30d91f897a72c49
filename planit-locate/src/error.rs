//! Error types for planit-locate
//!
//! Handler errors render as `{"error": {"code", "message"}}` with a status
//! code per variant.

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::fusion::LocateError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request body over the configured limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Image format not accepted (415)
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Required credential not configured (500)
    #[error("{0} not configured")]
    MissingApiKey(&'static str),

    /// Upstream or internal failure (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<LocateError> for ApiError {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::MissingImage
            | LocateError::InvalidImage(_)
            | LocateError::ImageFetch(_) => ApiError::BadRequest(err.to_string()),
            LocateError::UnsupportedMediaType(_) => ApiError::UnsupportedMediaType(err.to_string()),
            LocateError::MissingRecognitionCredentials => ApiError::MissingApiKey("Gemini API key"),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::MissingApiKey(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::MissingApiKey(_) => "MISSING_API_KEY",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::MissingApiKey(_) => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Router fallback: unknown paths get the JSON error envelope
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_error_status_mapping() {
        let cases = [
            (LocateError::MissingImage, StatusCode::BAD_REQUEST),
            (LocateError::InvalidImage("bad".into()), StatusCode::BAD_REQUEST),
            (LocateError::ImageFetch("404".into()), StatusCode::BAD_REQUEST),
            (
                LocateError::UnsupportedMediaType("image/tiff".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                LocateError::MissingRecognitionCredentials,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_missing_key_code() {
        let err = ApiError::MissingApiKey("Places API key");
        assert_eq!(err.code(), "MISSING_API_KEY");
        assert_eq!(err.to_string(), "Places API key not configured");
    }

    #[test]
    fn test_payload_too_large_status() {
        let err = ApiError::PayloadTooLarge("length limit exceeded".into());
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.code(), "PAYLOAD_TOO_LARGE");
    }
}
