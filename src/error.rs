//! Error types for image acquisition and transformation.

use std::time::Duration;

/// Message shown when the upstream transformation fails for any reason.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate image. Please try again.";

/// Message shown when generate is requested before any image is loaded.
pub const NO_SOURCE_MESSAGE: &str = "Please upload an image first.";

/// Message shown when camera access is denied or unavailable.
pub const CAMERA_UNAVAILABLE_MESSAGE: &str =
    "Could not access the camera. Please check your browser permissions.";

/// Message shown when a capture is attempted before a frame is decodable.
pub const CAMERA_NOT_READY_MESSAGE: &str = "Camera is not ready yet. Please wait a moment.";

/// Longest upstream error body kept inside an error value.
const MAX_ERROR_BODY: usize = 500;

/// Errors that can occur while acquiring or transforming an image.
#[derive(Debug, thiserror::Error)]
pub enum RoleMorphError {
    /// Camera permission denied or no device present.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// Capture requested before the stream had a decodable frame.
    #[error("camera is not ready")]
    CameraNotReady,

    /// Encoding or decoding a raster failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generate requested with no source image.
    #[error("no source image loaded")]
    NoSourceImage,

    /// A transformation is already in flight.
    #[error("a generation is already in progress")]
    GenerationInFlight,

    /// A string that should have been a data URL was not.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay requested by the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The upstream call did not finish in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Response parsed but did not contain what was expected.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading a picked file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RoleMorphError {
    /// Returns true if this error came from the upstream transformation.
    pub fn is_transformation(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Api { .. }
                | Self::RateLimited { .. }
                | Self::Timeout(_)
                | Self::ContentBlocked(_)
                | Self::InvalidRequest(_)
                | Self::UnexpectedResponse(_)
                | Self::Network(_)
                | Self::Decode(_)
                | Self::Json(_)
        )
    }

    /// Returns the single human-readable message shown for this error.
    ///
    /// Upstream details are collapsed into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::CameraUnavailable(_) => CAMERA_UNAVAILABLE_MESSAGE.to_string(),
            Self::CameraNotReady => CAMERA_NOT_READY_MESSAGE.to_string(),
            Self::NoSourceImage => NO_SOURCE_MESSAGE.to_string(),
            Self::GenerationInFlight => "Please wait for the current image to finish.".to_string(),
            Self::Image(_) | Self::InvalidDataUrl(_) | Self::Io(_) => {
                "Could not read that image. Please try another one.".to_string()
            }
            _ => GENERATION_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, RoleMorphError>;

/// Parses a `Retry-After` header value given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Redacts anything that looks like an API key and caps the length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let trimmed = word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-');
            if trimmed.starts_with("AIza") && trimmed.len() >= 30 {
                word.replace(trimmed, "[REDACTED]")
            } else if let Some(idx) = word.find("key=") {
                format!("{}key=[REDACTED]", &word[..idx])
            } else {
                word.to_string()
            }
        })
        .collect();
    let mut joined = redacted.join(" ");
    if joined.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !joined.is_char_boundary(cut) {
            cut -= 1;
        }
        joined.truncate(cut);
        joined.push_str("...");
    }
    joined
}
