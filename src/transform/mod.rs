//! Transformation client: sends a portrait and prompt upstream.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiModel, GeminiTransformer, GeminiTransformerBuilder};

use crate::error::Result;
use async_trait::async_trait;

/// Trait for services that transform an image according to a prompt.
///
/// Implementations make a single attempt and never retry.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Transforms `image_base64` (raw base64, no data URL prefix) of type
    /// `mime_type` according to `prompt`.
    ///
    /// Returns the generated image as a base64 PNG payload, unmodified.
    async fn transform(&self, image_base64: &str, mime_type: &str, prompt: &str)
        -> Result<String>;

    /// Returns the name of this service for display.
    fn name(&self) -> &str;
}

