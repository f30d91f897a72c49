//! Location API handler
//!
//! POST /api/location

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    types::{FinalAnswer, ImageInput},
    AppState,
};

/// POST /api/location request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    #[serde(flatten)]
    pub image: ImageInput,
    /// Free-text locality hint ("Paris", "near Lake Tahoe")
    #[serde(default)]
    pub region_hint: Option<String>,
}

impl LocationRequest {
    /// Parse a request body; an empty body is an empty request
    ///
    /// The content type is not checked, so form-less clients that post raw
    /// JSON still work and an empty POST reaches the missing-image check.
    pub fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
    }
}

/// POST /api/location
///
/// Returns the selected candidate, or the `no_idea` sentinel when nothing
/// could be located. Input problems are 400/415; a missing Gemini key is 500.
pub async fn locate(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<FinalAnswer>> {
    let request_id = Uuid::new_v4();
    let span = info_span!("locate", request_id = %request_id);

    async move {
        let body = body.map_err(|rejection| match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
            _ => ApiError::BadRequest(rejection.body_text()),
        })?;

        let request = match LocationRequest::from_body(&body) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Location request body rejected");
                state.record_error(e.to_string()).await;
                return Err(e);
            }
        };

        tracing::debug!(
            inline = request.image.inline().is_some(),
            url = request.image.url().is_some(),
            region_hint = ?request.region_hint,
            "Location request"
        );

        match state
            .resolver
            .resolve_location(&request.image, request.region_hint.as_deref())
            .await
        {
            Ok(answer) => Ok(Json(answer)),
            Err(e) => {
                warn!(error = %e, "Location request rejected");
                state.record_error(e.to_string()).await;
                Err(ApiError::from(e))
            }
        }
    }
    .instrument(span)
    .await
}

/// Build location routes
pub fn location_routes() -> Router<AppState> {
    Router::new().route("/api/location", post(locate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let request: LocationRequest = serde_json::from_str(
            r#"{"imageUrl":"https://example.com/a.jpg","regionHint":"Paris"}"#,
        )
        .unwrap();
        assert_eq!(request.image.url(), Some("https://example.com/a.jpg"));
        assert!(request.image.inline().is_none());
        assert_eq!(request.region_hint.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_empty_request_has_no_image() {
        let request: LocationRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.image.has_image());
        assert!(request.region_hint.is_none());
    }

    #[test]
    fn test_empty_body_is_empty_request() {
        for body in [&b""[..], b"  \n"] {
            let request = LocationRequest::from_body(body).unwrap();
            assert!(!request.image.has_image());
        }
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let result = LocationRequest::from_body(b"{imageUrl: nope}");
        assert!(matches!(result, Err(ApiError::BadRequest(msg)) if msg.starts_with("Invalid JSON body")));

        let result = LocationRequest::from_body(b"[1, 2]");
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
