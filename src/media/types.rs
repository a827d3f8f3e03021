//! Core image types: formats, data URLs, source and generated images.

use crate::error::{Result, RoleMorphError};
use base64::Engine;
use std::path::{Path, PathBuf};

/// MIME type every generated image is labelled with.
pub const GENERATED_MIME_TYPE: &str = "image/png";

/// File name offered for downloading a generated image.
pub const DOWNLOAD_FILE_NAME: &str = "transformed-image.png";

/// Image formats the uploader advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from a MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Builds a `data:<mime>;base64,<payload>` URL from raw bytes.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Splits a base64 data URL into its MIME type and payload.
pub fn split_data_url(url: &str) -> Result<(&str, &str)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RoleMorphError::InvalidDataUrl("missing data: scheme".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RoleMorphError::InvalidDataUrl("missing payload separator".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| RoleMorphError::InvalidDataUrl("payload is not base64".into()))?;
    Ok((mime, payload))
}

/// The image the user supplied, as a data URL plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    data_url: String,
    mime_type: String,
}

impl SourceImage {
    /// Encodes raw bytes into a source image.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            data_url: encode_data_url(&mime_type, bytes),
            mime_type,
        }
    }

    /// Wraps an existing data URL, checking its shape.
    pub fn from_data_url(data_url: impl Into<String>) -> Result<Self> {
        let data_url = data_url.into();
        let mime_type = split_data_url(&data_url)?.0.to_string();
        Ok(Self {
            data_url,
            mime_type,
        })
    }

    /// Returns the full data URL.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Returns the declared MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the base64 payload with the `data:...;base64,` prefix stripped.
    pub fn base64_payload(&self) -> &str {
        self.data_url
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }
}

/// A transformed image returned by the upstream service.
///
/// Holds the data URL built from the service's base64 string, which is
/// kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated image should be displayed or saved"]
pub struct GeneratedImage {
    data_url: String,
}

impl GeneratedImage {
    /// Wraps a base64 PNG payload returned by the service.
    pub fn from_base64_png(payload: &str) -> Self {
        Self {
            data_url: format!("data:{GENERATED_MIME_TYPE};base64,{payload}"),
        }
    }

    /// Returns the data URL.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Returns the base64 payload exactly as the service returned it.
    pub fn base64_payload(&self) -> &str {
        self.data_url
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    /// Decodes the payload into the exact bytes the service produced.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.base64_payload())
            .map_err(|e| RoleMorphError::Decode(e.to_string()))
    }

    /// Saves the image bytes to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.bytes()?)?;
        Ok(())
    }

    /// Saves the image into `dir` under the download file name.
    pub fn save_in(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(DOWNLOAD_FILE_NAME);
        self.save(&path)?;
        Ok(path)
    }
}
