//! Camera capture over a platform capability interface.
//!
//! The platform supplies a [`CameraDevice`]; [`CameraCapture`] owns the
//! opened stream for as long as the camera view is shown and stops every
//! track when it is captured from, cancelled, or dropped.

use crate::error::{Result, RoleMorphError, CAMERA_NOT_READY_MESSAGE};
use crate::media::SourceImage;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, RgbImage};

/// JPEG quality used for captured frames (0.9 on a 0-1 scale).
pub const CAPTURE_JPEG_QUALITY: u8 = 90;

/// MIME type of captured frames.
pub const CAPTURE_MIME_TYPE: &str = "image/jpeg";

/// Which way the requested camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Front camera, pointing at the user.
    #[default]
    User,
    /// Rear camera.
    Environment,
}

/// How much of the stream has been buffered, mirroring media element states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    /// Nothing is known about the stream yet.
    HaveNothing = 0,
    /// Dimensions are known but no frame is decodable.
    HaveMetadata = 1,
    /// The current frame can be decoded.
    HaveCurrentData = 2,
    /// The current and at least the next frame are available.
    HaveFutureData = 3,
    /// Enough data is buffered to play through.
    HaveEnoughData = 4,
}

/// An open video stream from a camera.
pub trait VideoStream: Send {
    /// Returns how far the stream has buffered.
    fn ready_state(&self) -> ReadyState;

    /// Returns the current frame at the stream's native resolution.
    fn current_frame(&self) -> Option<RgbImage>;

    /// Stops every track of the stream. Must be idempotent.
    fn stop(&mut self);
}

/// Platform access to camera devices.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Requests permission and opens a stream from a camera facing `facing`.
    ///
    /// The error string is the platform's reason, used for logging only.
    async fn open(&self, facing: Facing) -> std::result::Result<Box<dyn VideoStream>, String>;
}

/// The camera view: an opened stream plus the message to show, if any.
pub struct CameraCapture {
    stream: Option<Box<dyn VideoStream>>,
    error: Option<String>,
}

impl CameraCapture {
    /// Opens the user-facing camera.
    ///
    /// Denial is not an error for the caller: the returned capture holds no
    /// stream and carries a message instead.
    pub async fn open(device: &dyn CameraDevice) -> Self {
        match device.open(Facing::User).await {
            Ok(stream) => {
                tracing::debug!("camera stream opened");
                Self {
                    stream: Some(stream),
                    error: None,
                }
            }
            Err(reason) => {
                let err = RoleMorphError::CameraUnavailable(reason);
                tracing::error!("error accessing camera: {err}");
                Self {
                    stream: None,
                    error: Some(err.user_message()),
                }
            }
        }
    }

    /// Returns the message to show in the camera view.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns true if a stream is open, so "Take Photo" is offered.
    pub fn can_capture(&self) -> bool {
        self.stream.is_some()
    }

    /// Captures the current frame, mirrored, as a JPEG source image.
    ///
    /// On success the stream is released. If no frame is decodable yet the
    /// stream stays open and the view shows a retry message.
    pub fn capture(&mut self) -> Result<SourceImage> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| RoleMorphError::CameraUnavailable("no open stream".into()))?;

        let frame = if stream.ready_state() >= ReadyState::HaveCurrentData {
            stream.current_frame()
        } else {
            None
        };
        let Some(frame) = frame else {
            self.error = Some(CAMERA_NOT_READY_MESSAGE.to_string());
            return Err(RoleMorphError::CameraNotReady);
        };

        let bytes = encode_mirrored_jpeg(&frame)?;
        self.release();
        Ok(SourceImage::from_bytes(&bytes, CAPTURE_MIME_TYPE))
    }

    /// Leaves the camera view, releasing the stream.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::debug!("camera stream stopped");
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("streaming", &self.stream.is_some())
            .field("error", &self.error)
            .finish()
    }
}

/// Flips a frame horizontally and encodes it as JPEG.
///
/// The live preview is mirrored, so the flip makes the stored image match
/// what the user saw.
pub fn encode_mirrored_jpeg(frame: &RgbImage) -> Result<Vec<u8>> {
    let mirrored = DynamicImage::ImageRgb8(imageops::flip_horizontal(frame));
    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, CAPTURE_JPEG_QUALITY);
    mirrored.write_with_encoder(encoder)?;
    Ok(output)
}
