//! Application controller: the view state machine.
//!
//! ```text
//! NoImage --load--> HasImage --begin--> Generating --ok--> HasResult
//!                      ^                    |                  |
//!                      +------- err --------+                  |
//!                      ^                                       |
//!                      +<------------ begin (regenerate) ------+
//! ```
//!
//! `reset` returns to `NoImage` from anywhere. The error message is an
//! overlay that can accompany any state. While the camera view is shown the
//! controller holds the open camera; leaving the view stops it.

mod view;

pub use view::{
    AfterSlot, Controls, Download, Panel, View, Workspace, LOADING_HINT_TEXT, LOADING_TEXT,
    PLACEHOLDER_TEXT,
};

use crate::acquire::{CameraCapture, CameraDevice};
use crate::error::{Result, RoleMorphError, GENERATION_FAILED_MESSAGE};
use crate::media::{GeneratedImage, SourceImage};
use crate::roles::Role;
use crate::transform::Transformer;

/// Where the application is in its cycle.
///
/// A result can only exist next to a source, and a request can only be in
/// flight for a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing loaded yet; the camera view may be open.
    NoImage {
        /// True while the camera view is shown instead of the uploader.
        camera_open: bool,
    },
    /// A source is loaded and no result exists.
    HasImage {
        /// The loaded image.
        source: SourceImage,
    },
    /// A transformation request is in flight.
    Generating {
        /// The loaded image.
        source: SourceImage,
        /// Identifies the request so late responses can be discarded.
        ticket: u64,
    },
    /// A transformation succeeded.
    HasResult {
        /// The loaded image.
        source: SourceImage,
        /// The transformed image.
        result: GeneratedImage,
    },
}

impl Default for ViewState {
    fn default() -> Self {
        Self::NoImage { camera_open: false }
    }
}

impl ViewState {
    /// Returns the loaded image, if any.
    pub fn source(&self) -> Option<&SourceImage> {
        match self {
            Self::NoImage { .. } => None,
            Self::HasImage { source }
            | Self::Generating { source, .. }
            | Self::HasResult { source, .. } => Some(source),
        }
    }

    /// Returns the transformed image, if any.
    pub fn result(&self) -> Option<&GeneratedImage> {
        match self {
            Self::HasResult { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Returns true while a request is in flight.
    pub fn is_generating(&self) -> bool {
        matches!(self, Self::Generating { .. })
    }

    /// Returns true while the camera view is open.
    pub fn is_camera_open(&self) -> bool {
        matches!(self, Self::NoImage { camera_open: true })
    }
}

/// Everything the transformation client needs for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending generation must be completed with finish_generation"]
pub struct PendingGeneration {
    /// Request identifier to hand back to [`AppController::finish_generation`].
    pub ticket: u64,
    /// Source payload with the data URL prefix stripped.
    pub image_base64: String,
    /// Source MIME type.
    pub mime_type: String,
    /// Prompt active when the request started.
    pub prompt: String,
}

/// Owns the view state, the selected role and prompt, the error overlay
/// and, while the camera view is shown, the open camera.
#[derive(Debug)]
pub struct AppController {
    state: ViewState,
    camera: Option<CameraCapture>,
    role: Role,
    prompt: String,
    error: Option<String>,
    next_ticket: u64,
}

impl Default for AppController {
    fn default() -> Self {
        Self::new()
    }
}

impl AppController {
    /// Creates a controller with nothing loaded and the first role selected.
    pub fn new() -> Self {
        let role = Role::default();
        Self {
            state: ViewState::default(),
            camera: None,
            role,
            prompt: role.default_prompt().to_string(),
            error: None,
            next_ticket: 0,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Returns the selected role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the active prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the error message currently shown, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the open camera while the camera view is shown.
    pub fn camera(&self) -> Option<&CameraCapture> {
        self.camera.as_ref()
    }

    /// Opens the front camera and shows the camera view. Ignored once an
    /// image is loaded.
    ///
    /// A denied camera still opens the view; it shows the reason and
    /// offers no capture.
    pub async fn open_camera(&mut self, device: &dyn CameraDevice) {
        if !matches!(self.state, ViewState::NoImage { .. }) {
            return;
        }
        self.close_camera();
        self.camera = Some(CameraCapture::open(device).await);
        self.state = ViewState::NoImage { camera_open: true };
    }

    /// Returns to the uploader, stopping the camera.
    pub fn close_camera(&mut self) {
        if let Some(camera) = self.camera.take() {
            camera.cancel();
        }
        if let ViewState::NoImage { camera_open } = &mut self.state {
            *camera_open = false;
        }
    }

    /// Captures a frame from the open camera and loads it.
    ///
    /// When the stream has no frame yet the camera view stays open and
    /// shows a retry message.
    pub fn take_photo(&mut self) -> Result<()> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| RoleMorphError::CameraUnavailable("camera view is not open".into()))?;
        let source = camera.capture()?;
        self.capture_image(source);
        Ok(())
    }

    /// Selects a role, replacing the prompt with that role's default.
    pub fn select_role(&mut self, role: Role) {
        self.role = role;
        self.prompt = role.default_prompt().to_string();
    }

    /// Replaces the prompt with free text; the role stays selected.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Loads a new source image from an upload, dropping any result and
    /// closing the camera.
    ///
    /// A request still in flight for the previous image is orphaned.
    pub fn load_image(&mut self, source: SourceImage) {
        if self.state.is_generating() {
            tracing::debug!("new image loaded while generating; response will be discarded");
        }
        self.close_camera();
        self.state = ViewState::HasImage { source };
        self.error = None;
    }

    /// Loads a captured camera frame and leaves the camera view.
    pub fn capture_image(&mut self, source: SourceImage) {
        self.load_image(source);
    }

    /// Starts a transformation of the loaded image.
    ///
    /// Fails with [`RoleMorphError::NoSourceImage`] (and shows a message)
    /// when nothing is loaded, and with [`RoleMorphError::GenerationInFlight`]
    /// (changing nothing) while another request is running.
    pub fn begin_generation(&mut self) -> Result<PendingGeneration> {
        let source = match &self.state {
            ViewState::NoImage { .. } => {
                let err = RoleMorphError::NoSourceImage;
                self.error = Some(err.user_message());
                return Err(err);
            }
            ViewState::Generating { .. } => return Err(RoleMorphError::GenerationInFlight),
            ViewState::HasImage { source } | ViewState::HasResult { source, .. } => source.clone(),
        };

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let pending = PendingGeneration {
            ticket,
            image_base64: source.base64_payload().to_string(),
            mime_type: source.mime_type().to_string(),
            prompt: self.prompt.clone(),
        };

        self.error = None;
        self.state = ViewState::Generating { source, ticket };
        tracing::debug!(ticket, role = %self.role, "generation started");
        Ok(pending)
    }

    /// Applies the outcome of a request started by [`begin_generation`].
    ///
    /// Returns false, changing nothing, if the request is no longer the
    /// current one (the user reset or loaded another image meanwhile).
    ///
    /// [`begin_generation`]: Self::begin_generation
    pub fn finish_generation(&mut self, ticket: u64, outcome: Result<String>) -> bool {
        let source = match &self.state {
            ViewState::Generating { source, ticket: current } if *current == ticket => {
                source.clone()
            }
            _ => {
                tracing::warn!(ticket, "discarding stale generation response");
                return false;
            }
        };

        match outcome {
            Ok(payload) => {
                self.state = ViewState::HasResult {
                    source,
                    result: GeneratedImage::from_base64_png(&payload),
                };
            }
            Err(e) => {
                tracing::error!(ticket, "image generation failed: {e}");
                self.error = Some(GENERATION_FAILED_MESSAGE.to_string());
                self.state = ViewState::HasImage { source };
            }
        }
        true
    }

    /// Abandons the in-flight request, returning to the loaded image.
    ///
    /// Returns false if `ticket` is not the current request.
    pub fn cancel_generation(&mut self, ticket: u64) -> bool {
        let source = match &self.state {
            ViewState::Generating { source, ticket: current } if *current == ticket => {
                source.clone()
            }
            _ => return false,
        };
        self.state = ViewState::HasImage { source };
        tracing::debug!(ticket, "generation cancelled");
        true
    }

    /// Runs one full transformation through `transformer`.
    pub async fn generate(&mut self, transformer: &dyn Transformer) -> Result<()> {
        let pending = self.begin_generation()?;
        let outcome = transformer
            .transform(&pending.image_base64, &pending.mime_type, &pending.prompt)
            .await;
        self.finish_generation(pending.ticket, outcome);
        Ok(())
    }

    /// Clears everything and returns to the uploader.
    pub fn reset(&mut self) {
        self.close_camera();
        self.state = ViewState::default();
        self.error = None;
    }

    /// Describes what should be on screen.
    pub fn view(&self) -> View<'_> {
        View::from_controller(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::camera::fakes::FakeCamera;
    use crate::acquire::ReadyState;
    use crate::error::{CAMERA_NOT_READY_MESSAGE, CAMERA_UNAVAILABLE_MESSAGE, NO_SOURCE_MESSAGE};
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Call = (String, String, String);

    /// Records calls and answers with a canned outcome.
    struct FakeTransformer {
        reply: std::result::Result<String, String>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeTransformer {
        fn ok(payload: &str) -> Self {
            Self {
                reply: Ok(payload.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("upstream exploded".to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transformer for FakeTransformer {
        async fn transform(
            &self,
            image_base64: &str,
            mime_type: &str,
            prompt: &str,
        ) -> Result<String> {
            self.calls.lock().unwrap().push((
                image_base64.to_string(),
                mime_type.to_string(),
                prompt.to_string(),
            ));
            self.reply.clone().map_err(|m| RoleMorphError::Api {
                status: 500,
                message: m,
            })
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn jpeg_source() -> SourceImage {
        SourceImage::from_bytes(b"photo", "image/jpeg")
    }

    #[test]
    fn test_initial_state() {
        let app = AppController::new();
        assert_eq!(app.state(), &ViewState::NoImage { camera_open: false });
        assert_eq!(app.role(), Role::ALL[0]);
        assert_eq!(app.prompt(), Role::ALL[0].default_prompt());
        assert!(app.error().is_none());
    }

    #[test]
    fn test_select_role_sets_default_prompt() {
        let mut app = AppController::new();
        app.set_prompt("something custom");
        for role in Role::ALL {
            app.select_role(role);
            assert_eq!(app.role(), role);
            assert_eq!(app.prompt(), role.default_prompt());
        }
    }

    #[tokio::test]
    async fn test_camera_only_without_image() {
        let camera = FakeCamera::new(ReadyState::HaveEnoughData);
        let mut app = AppController::new();
        app.open_camera(&camera).await;
        assert!(app.state().is_camera_open());
        assert!(app.camera().unwrap().can_capture());
        app.close_camera();
        assert!(!app.state().is_camera_open());
        assert!(app.camera().is_none());
        assert_eq!(camera.stops(), 1);

        app.load_image(jpeg_source());
        app.open_camera(&camera).await;
        assert!(matches!(app.state(), ViewState::HasImage { .. }));
        assert!(app.camera().is_none());
    }

    #[tokio::test]
    async fn test_take_photo_loads_frame_and_stops_camera() {
        let camera = FakeCamera::new(ReadyState::HaveEnoughData);
        let mut app = AppController::new();
        app.open_camera(&camera).await;

        app.take_photo().unwrap();
        let source = app.state().source().unwrap();
        assert_eq!(source.mime_type(), "image/jpeg");
        assert!(!app.state().is_camera_open());
        assert!(app.camera().is_none());
        assert_eq!(camera.stops(), 1);
    }

    #[tokio::test]
    async fn test_take_photo_before_frame_ready_stays_in_camera() {
        let camera = FakeCamera::new(ReadyState::HaveMetadata);
        let mut app = AppController::new();
        app.open_camera(&camera).await;

        assert!(matches!(app.take_photo(), Err(RoleMorphError::CameraNotReady)));
        assert!(app.state().is_camera_open());
        assert_eq!(app.camera().unwrap().error(), Some(CAMERA_NOT_READY_MESSAGE));
        assert_eq!(camera.stops(), 0);
    }

    #[tokio::test]
    async fn test_denied_camera_offers_no_capture() {
        let camera = FakeCamera::denied();
        let mut app = AppController::new();
        app.open_camera(&camera).await;

        assert!(app.state().is_camera_open());
        let capture = app.camera().unwrap();
        assert_eq!(capture.error(), Some(CAMERA_UNAVAILABLE_MESSAGE));
        assert!(!capture.can_capture());
        assert!(matches!(
            app.take_photo(),
            Err(RoleMorphError::CameraUnavailable(_))
        ));
        assert!(app.state().source().is_none());
    }

    #[tokio::test]
    async fn test_reset_with_camera_open_stops_tracks() {
        let camera = FakeCamera::new(ReadyState::HaveEnoughData);
        let mut app = AppController::new();
        app.open_camera(&camera).await;

        app.reset();
        assert_eq!(camera.stops(), 1);
        assert!(app.camera().is_none());
        assert_eq!(app.state(), &ViewState::NoImage { camera_open: false });
    }

    #[tokio::test]
    async fn test_reopening_camera_stops_previous_stream() {
        let camera = FakeCamera::new(ReadyState::HaveEnoughData);
        let mut app = AppController::new();
        app.open_camera(&camera).await;
        app.open_camera(&camera).await;
        assert_eq!(camera.stops(), 1);
        assert!(app.camera().unwrap().can_capture());
    }

    #[tokio::test]
    async fn test_generate_without_source_never_calls_client() {
        let mut app = AppController::new();
        let transformer = FakeTransformer::ok("Zm9v");

        let err = app.generate(&transformer).await.unwrap_err();
        assert!(matches!(err, RoleMorphError::NoSourceImage));
        assert_eq!(app.error(), Some(NO_SOURCE_MESSAGE));
        assert!(transformer.calls().is_empty());
        assert!(matches!(app.state(), ViewState::NoImage { .. }));
    }

    #[tokio::test]
    async fn test_surgeon_scenario() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());
        app.select_role(Role::Surgeon);

        let transformer = FakeTransformer::ok("Zm9v");
        app.generate(&transformer).await.unwrap();

        let calls = transformer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, jpeg_source().base64_payload());
        assert_eq!(calls[0].1, "image/jpeg");
        assert_eq!(calls[0].2, Role::Surgeon.default_prompt());

        let result = app.state().result().unwrap();
        assert_eq!(result.data_url(), "data:image/png;base64,Zm9v");
        assert!(app.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_source() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());

        let transformer = FakeTransformer::failing();
        app.generate(&transformer).await.unwrap();

        assert_eq!(app.error(), Some(GENERATION_FAILED_MESSAGE));
        assert!(app.state().result().is_none());
        assert_eq!(app.state().source(), Some(&jpeg_source()));
        assert!(!app.state().is_generating());
    }

    #[tokio::test]
    async fn test_regenerate_clears_previous_result_first() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());
        app.generate(&FakeTransformer::ok("Zm9v")).await.unwrap();
        assert!(app.state().result().is_some());

        let pending = app.begin_generation().unwrap();
        assert!(app.state().result().is_none());
        assert!(app.finish_generation(pending.ticket, Ok("YmFy".into())));
        assert_eq!(
            app.state().result().unwrap().data_url(),
            "data:image/png;base64,YmFy"
        );
    }

    #[test]
    fn test_second_request_rejected_while_generating() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());
        let first = app.begin_generation().unwrap();
        let before = app.state().clone();

        assert!(matches!(
            app.begin_generation(),
            Err(RoleMorphError::GenerationInFlight)
        ));
        assert_eq!(app.state(), &before);
        assert!(app.finish_generation(first.ticket, Ok("Zm9v".into())));
    }

    #[test]
    fn test_upload_clears_result_and_error() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());
        let pending = app.begin_generation().unwrap();
        app.finish_generation(pending.ticket, Ok("Zm9v".into()));

        let other = SourceImage::from_bytes(b"other", "image/png");
        app.load_image(other.clone());
        assert_eq!(app.state(), &ViewState::HasImage { source: other });
        assert!(app.error().is_none());

        let pending = app.begin_generation().unwrap();
        app.finish_generation(pending.ticket, Err(RoleMorphError::Timeout(Default::default())));
        assert!(app.error().is_some());
        app.load_image(jpeg_source());
        assert!(app.error().is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());
        let _pending = app.begin_generation().unwrap();

        app.reset();
        assert_eq!(app.state(), &ViewState::NoImage { camera_open: false });
        assert!(app.error().is_none());
        assert!(app.state().source().is_none());
        assert!(app.state().result().is_none());
        assert!(!app.state().is_generating());
    }

    #[test]
    fn test_stale_response_after_reset_is_ignored() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());
        let pending = app.begin_generation().unwrap();

        app.reset();
        app.load_image(jpeg_source());
        assert!(!app.finish_generation(pending.ticket, Ok("Zm9v".into())));
        assert!(app.state().result().is_none());

        // A fresh request after the reset gets a different ticket.
        let fresh = app.begin_generation().unwrap();
        assert_ne!(fresh.ticket, pending.ticket);
        assert!(!app.finish_generation(pending.ticket, Ok("Zm9v".into())));
        assert!(app.state().is_generating());
    }

    #[test]
    fn test_cancel_generation() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());
        let pending = app.begin_generation().unwrap();

        assert!(!app.cancel_generation(pending.ticket + 1));
        assert!(app.cancel_generation(pending.ticket));
        assert_eq!(app.state(), &ViewState::HasImage { source: jpeg_source() });
        assert!(app.error().is_none());
        assert!(!app.finish_generation(pending.ticket, Ok("Zm9v".into())));
    }

    #[test]
    fn test_custom_prompt_is_sent() {
        let mut app = AppController::new();
        app.load_image(jpeg_source());
        app.set_prompt("Make them a veterinarian");
        let pending = app.begin_generation().unwrap();
        assert_eq!(pending.prompt, "Make them a veterinarian");
        assert_eq!(pending.mime_type, "image/jpeg");
    }
}
