#![warn(missing_docs)]
//! RoleMorph - transform a portrait into a medical professional.
//!
//! The crate acquires a photo (picked file, dropped file or camera frame),
//! sends it to a generative image model together with a role-specific
//! prompt, and tracks the before/after view state.
//!
//! # Quick Start
//!
//! ```no_run
//! use rolemorph::{accept_file, AppController, GeminiTransformer, PickedFile, Role};
//!
//! #[tokio::main]
//! async fn main() -> rolemorph::Result<()> {
//!     let transformer = GeminiTransformer::builder().build()?;
//!     let mut app = AppController::new();
//!
//!     let file = PickedFile::from_path("photo.jpg")?;
//!     if let Some(source) = accept_file(&file) {
//!         app.load_image(source);
//!     }
//!     app.select_role(Role::Surgeon);
//!     app.generate(&transformer).await?;
//!
//!     if let Some(result) = app.state().result() {
//!         result.save("transformed-image.png")?;
//!     }
//!     println!("{}", app.view());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini` (default): Gemini image transformation client
//! - `cli`: Command-line interface

pub mod acquire;
pub mod app;
mod error;
pub mod media;
pub mod roles;
pub mod transform;

// Re-export error types at crate root
pub use error::{
    Result, RoleMorphError, CAMERA_NOT_READY_MESSAGE, CAMERA_UNAVAILABLE_MESSAGE,
    GENERATION_FAILED_MESSAGE, NO_SOURCE_MESSAGE,
};

pub use acquire::{accept_file, CameraCapture, CameraDevice, DropZone, PickedFile};
pub use app::{AppController, PendingGeneration, View, ViewState};
pub use media::{GeneratedImage, SourceImage};
pub use roles::Role;
pub use transform::Transformer;

#[cfg(feature = "gemini")]
pub use transform::{GeminiModel, GeminiTransformer, GeminiTransformerBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::acquire::{accept_file, CameraCapture, CameraDevice, PickedFile};
    pub use crate::app::{AppController, View, ViewState};
    pub use crate::error::{Result, RoleMorphError};
    pub use crate::media::{GeneratedImage, SourceImage};
    pub use crate::roles::Role;
    pub use crate::transform::Transformer;

    #[cfg(feature = "gemini")]
    pub use crate::transform::GeminiTransformer;
}
