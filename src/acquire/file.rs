//! Picked and dropped files.

use crate::error::Result;
use crate::media::{ImageFormat, SourceImage};
use std::path::Path;

/// MIME types the file picker advertises.
pub const ACCEPTED_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

const FALLBACK_TYPE: &str = "application/octet-stream";

/// A file chosen through the picker or dropped onto the upload target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    /// File name as shown to the user.
    pub name: String,
    /// MIME type declared for the file.
    pub declared_type: String,
    /// Full file contents.
    pub bytes: Vec<u8>,
}

impl PickedFile {
    /// Creates a file from its parts.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk; the declared type comes from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let declared_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(type_for_extension)
            .unwrap_or(FALLBACK_TYPE);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, declared_type, bytes))
    }

    /// Returns true if the declared type is an image type.
    pub fn is_image(&self) -> bool {
        self.declared_type.starts_with("image/")
    }
}

fn type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => FALLBACK_TYPE,
    }
}

/// Converts an image file into a source image; non-images yield `None`.
pub fn accept_file(file: &PickedFile) -> Option<SourceImage> {
    if !file.is_image() {
        tracing::debug!(
            name = %file.name,
            declared_type = %file.declared_type,
            "ignoring non-image file"
        );
        return None;
    }
    if let (Some(declared), Some(detected)) = (
        ImageFormat::from_mime_type(&file.declared_type),
        ImageFormat::from_magic_bytes(&file.bytes),
    ) {
        if declared != detected {
            tracing::warn!(
                name = %file.name,
                declared = declared.mime_type(),
                detected = detected.mime_type(),
                "file contents do not match declared type"
            );
        }
    }
    Some(SourceImage::from_bytes(&file.bytes, file.declared_type.as_str()))
}

/// Drag-and-drop upload target.
#[derive(Debug, Default)]
pub struct DropZone {
    dragging: bool,
}

impl DropZone {
    /// Creates an idle drop zone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while something is dragged over the zone.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Marks the zone as hovered.
    pub fn drag_enter(&mut self) {
        self.dragging = true;
    }

    /// Clears the hover mark.
    pub fn drag_leave(&mut self) {
        self.dragging = false;
    }

    /// Handles a drop; only the first file is considered.
    pub fn drop_files(&mut self, files: &[PickedFile]) -> Option<SourceImage> {
        self.dragging = false;
        files.first().and_then(accept_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_accept_image_file() {
        let file = PickedFile::new("photo.jpg", "image/jpeg", b"foo".to_vec());
        let source = accept_file(&file).unwrap();
        assert_eq!(source.data_url(), "data:image/jpeg;base64,Zm9v");
        assert_eq!(source.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_reject_non_image_file() {
        let file = PickedFile::new("notes.txt", "text/plain", b"hello".to_vec());
        assert!(accept_file(&file).is_none());
    }

    #[test]
    fn test_from_path_declares_type_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.JPEG");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[0xFF, 0xD8, 0xFF, 0xE0])
            .unwrap();

        let file = PickedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "portrait.JPEG");
        assert_eq!(file.declared_type, "image/jpeg");
        assert_eq!(file.bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn test_from_path_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        std::fs::write(&path, b"PK").unwrap();

        let file = PickedFile::from_path(&path).unwrap();
        assert!(!file.is_image());
        assert!(accept_file(&file).is_none());
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(PickedFile::from_path("/definitely/not/here.png").is_err());
    }

    #[test]
    fn test_drop_zone_uses_first_file() {
        let mut zone = DropZone::new();
        zone.drag_enter();
        assert!(zone.is_dragging());

        let files = [
            PickedFile::new("a.png", "image/png", b"foo".to_vec()),
            PickedFile::new("b.png", "image/png", b"bar".to_vec()),
        ];
        let source = zone.drop_files(&files).unwrap();
        assert_eq!(source.base64_payload(), "Zm9v");
        assert!(!zone.is_dragging());
    }

    #[test]
    fn test_drop_zone_ignores_non_image_and_empty() {
        let mut zone = DropZone::new();
        zone.drag_enter();
        assert!(zone
            .drop_files(&[PickedFile::new("a.pdf", "application/pdf", vec![1])])
            .is_none());
        assert!(!zone.is_dragging());
        assert!(zone.drop_files(&[]).is_none());

        zone.drag_enter();
        zone.drag_leave();
        assert!(!zone.is_dragging());
    }

    #[test]
    fn test_accepted_types_are_images() {
        assert!(ACCEPTED_TYPES.iter().all(|t| t.starts_with("image/")));
    }
}
