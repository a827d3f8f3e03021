//! What is on screen for a given controller state.

use super::{AppController, ViewState};
use crate::error::Result;
use crate::media::{GeneratedImage, DOWNLOAD_FILE_NAME};
use crate::roles::Role;
use std::fmt;
use std::path::{Path, PathBuf};

/// Text shown in the empty "after" slot.
pub const PLACEHOLDER_TEXT: &str = "AI Result Appears Here";

/// Text shown next to the loading indicator.
pub const LOADING_TEXT: &str = "AI is working its magic...";

/// Second line under the loading indicator.
pub const LOADING_HINT_TEXT: &str = "This can take a moment. Please wait.";

/// The screen for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View<'a> {
    /// Drop target, file picker and camera button.
    Uploader {
        /// Error overlay, if any.
        error: Option<&'a str>,
    },
    /// Live camera view.
    Camera {
        /// Camera message, if any.
        error: Option<&'a str>,
        /// True when a frame can be taken; "Take Photo" is hidden otherwise.
        can_capture: bool,
    },
    /// Before/after images with the control panel.
    Workspace(Workspace<'a>),
}

/// Side-by-side comparison plus controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace<'a> {
    /// Data URL of the source image.
    pub before: &'a str,
    /// The result slot.
    pub after: AfterSlot<'a>,
    /// Controls or the loading indicator.
    pub panel: Panel<'a>,
    /// Error overlay, if any.
    pub error: Option<&'a str>,
}

/// Contents of the "after" slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSlot<'a> {
    /// No result yet.
    Placeholder,
    /// Data URL of the result.
    Image(&'a str),
}

/// The right-hand panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel<'a> {
    /// Shown while generating; replaces the generate button.
    Loading,
    /// Role selection and actions.
    Controls(Controls<'a>),
}

/// Role buttons and action buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls<'a> {
    /// Roles in display order.
    pub roles: &'static [Role],
    /// The highlighted role.
    pub selected: Role,
    /// Label of the generate button.
    pub generate_label: &'static str,
    /// Present only when a result exists.
    pub download: Option<Download<'a>>,
}

/// A download link pointing at an already produced result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download<'a> {
    image: &'a GeneratedImage,
}

impl<'a> Download<'a> {
    /// Returns the suggested file name.
    pub fn file_name(&self) -> &'static str {
        DOWNLOAD_FILE_NAME
    }

    /// Returns the link target: the result's own data URL.
    pub fn href(&self) -> &'a str {
        self.image.data_url()
    }

    /// Writes the result's bytes into `dir`.
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        self.image.save_in(dir)
    }
}

impl<'a> View<'a> {
    pub(super) fn from_controller(app: &'a AppController) -> Self {
        let error = app.error();
        let (source, after, panel) = match app.state() {
            ViewState::NoImage { camera_open: true } => {
                return View::Camera {
                    error: app.camera().and_then(|c| c.error()),
                    can_capture: app.camera().is_some_and(|c| c.can_capture()),
                }
            }
            ViewState::NoImage { camera_open: false } => return View::Uploader { error },
            ViewState::Generating { source, .. } => (source, AfterSlot::Placeholder, Panel::Loading),
            ViewState::HasImage { source } => (
                source,
                AfterSlot::Placeholder,
                Panel::Controls(Controls::new(app.role(), None)),
            ),
            ViewState::HasResult { source, result } => (
                source,
                AfterSlot::Image(result.data_url()),
                Panel::Controls(Controls::new(app.role(), Some(Download { image: result }))),
            ),
        };
        View::Workspace(Workspace {
            before: source.data_url(),
            after,
            panel,
            error,
        })
    }

    /// Returns the download action, if one is offered.
    pub fn download(&self) -> Option<Download<'a>> {
        match self {
            View::Workspace(Workspace {
                panel: Panel::Controls(controls),
                ..
            }) => controls.download,
            _ => None,
        }
    }
}

impl<'a> Controls<'a> {
    fn new(selected: Role, download: Option<Download<'a>>) -> Self {
        Self {
            roles: &Role::ALL,
            selected,
            generate_label: if download.is_some() {
                "Regenerate"
            } else {
                "Generate Image"
            },
            download,
        }
    }
}

/// Shortens a data URL to its header and payload size.
fn abbreviate(data_url: &str) -> String {
    match data_url.split_once(',') {
        Some((header, payload)) => format!("{header},... ({} base64 chars)", payload.len()),
        None => data_url.to_string(),
    }
}

impl fmt::Display for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Uploader { error } => {
                writeln!(f, "Start Your Transformation")?;
                writeln!(f, "  Load an image (PNG, JPG, WEBP accepted) to begin.")?;
                if let Some(error) = error {
                    writeln!(f, "  ! {error}")?;
                }
            }
            View::Camera { error, can_capture } => {
                writeln!(f, "Capture Your Photo")?;
                if let Some(error) = error {
                    writeln!(f, "  ! {error}")?;
                }
                if *can_capture {
                    writeln!(f, "  [Cancel] [Take Photo]")?;
                } else {
                    writeln!(f, "  [Cancel]")?;
                }
            }
            View::Workspace(ws) => {
                writeln!(f, "Before: {}", abbreviate(ws.before))?;
                match ws.after {
                    AfterSlot::Placeholder => writeln!(f, "After:  <{PLACEHOLDER_TEXT}>")?,
                    AfterSlot::Image(url) => writeln!(f, "After:  {}", abbreviate(url))?,
                }
                match &ws.panel {
                    Panel::Loading => {
                        writeln!(f, "  {LOADING_TEXT}")?;
                        writeln!(f, "  {LOADING_HINT_TEXT}")?;
                    }
                    Panel::Controls(controls) => {
                        let roles: Vec<String> = controls
                            .roles
                            .iter()
                            .map(|r| {
                                if *r == controls.selected {
                                    format!("[{r}]")
                                } else {
                                    r.to_string()
                                }
                            })
                            .collect();
                        writeln!(f, "Role:   {}", roles.join("  "))?;
                        let mut actions = vec![controls.generate_label, "Start Over"];
                        if controls.download.is_some() {
                            actions.insert(0, "Download Image");
                        }
                        writeln!(f, "Actions: {}", actions.join(" | "))?;
                    }
                }
                if let Some(error) = ws.error {
                    writeln!(f, "  ! {error}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::camera::fakes::FakeCamera;
    use crate::acquire::ReadyState;
    use crate::error::{RoleMorphError, CAMERA_UNAVAILABLE_MESSAGE, GENERATION_FAILED_MESSAGE};
    use crate::media::SourceImage;

    fn loaded() -> AppController {
        let mut app = AppController::new();
        app.load_image(SourceImage::from_bytes(b"photo", "image/jpeg"));
        app
    }

    #[tokio::test]
    async fn test_uploader_and_camera_views() {
        let camera = FakeCamera::new(ReadyState::HaveEnoughData);
        let mut app = AppController::new();
        assert_eq!(app.view(), View::Uploader { error: None });
        app.open_camera(&camera).await;
        assert_eq!(
            app.view(),
            View::Camera {
                error: None,
                can_capture: true
            }
        );
        assert!(app.view().to_string().contains("[Take Photo]"));

        app.close_camera();
        assert_eq!(app.view(), View::Uploader { error: None });
    }

    #[tokio::test]
    async fn test_denied_camera_view_hides_take_photo() {
        let camera = FakeCamera::denied();
        let mut app = AppController::new();
        app.open_camera(&camera).await;

        assert_eq!(
            app.view(),
            View::Camera {
                error: Some(CAMERA_UNAVAILABLE_MESSAGE),
                can_capture: false
            }
        );
        let text = app.view().to_string();
        assert!(text.contains(CAMERA_UNAVAILABLE_MESSAGE));
        assert!(text.contains("[Cancel]"));
        assert!(!text.contains("Take Photo"));
    }

    #[test]
    fn test_workspace_placeholder_without_result() {
        let app = loaded();
        let View::Workspace(ws) = app.view() else {
            panic!("expected workspace");
        };
        assert_eq!(ws.before, "data:image/jpeg;base64,cGhvdG8=");
        assert_eq!(ws.after, AfterSlot::Placeholder);
        let Panel::Controls(controls) = ws.panel else {
            panic!("expected controls");
        };
        assert_eq!(controls.generate_label, "Generate Image");
        assert!(controls.download.is_none());
        assert_eq!(controls.selected, Role::default());
    }

    #[test]
    fn test_loading_replaces_controls() {
        let mut app = loaded();
        let _pending = app.begin_generation().unwrap();
        let View::Workspace(ws) = app.view() else {
            panic!("expected workspace");
        };
        assert_eq!(ws.panel, Panel::Loading);
        let text = app.view().to_string();
        assert!(text.contains(LOADING_TEXT));
        assert!(text.contains(LOADING_HINT_TEXT));
        assert!(!text.contains("Generate Image"));
    }

    #[test]
    fn test_download_references_result() {
        let mut app = loaded();
        let pending = app.begin_generation().unwrap();
        app.finish_generation(pending.ticket, Ok("Zm9v".into()));

        let View::Workspace(ws) = app.view() else {
            panic!("expected workspace");
        };
        assert_eq!(ws.after, AfterSlot::Image("data:image/png;base64,Zm9v"));
        let Panel::Controls(controls) = ws.panel else {
            panic!("expected controls");
        };
        assert_eq!(controls.generate_label, "Regenerate");
        let download = controls.download.unwrap();
        assert_eq!(app.view().download(), Some(download));
        assert_eq!(download.file_name(), "transformed-image.png");
        assert_eq!(download.href(), "data:image/png;base64,Zm9v");

        let dir = tempfile::tempdir().unwrap();
        let path = download.save_to(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"foo");
    }

    #[test]
    fn test_error_overlay_in_workspace() {
        let mut app = loaded();
        let pending = app.begin_generation().unwrap();
        app.finish_generation(pending.ticket, Err(RoleMorphError::Decode("bad".into())));

        let View::Workspace(ws) = app.view() else {
            panic!("expected workspace");
        };
        assert_eq!(ws.error, Some(GENERATION_FAILED_MESSAGE));
        assert_eq!(ws.after, AfterSlot::Placeholder);
        assert!(app.view().to_string().contains(GENERATION_FAILED_MESSAGE));
    }

    #[test]
    fn test_display_abbreviates_data_urls() {
        let app = loaded();
        let text = app.view().to_string();
        assert!(text.contains("data:image/jpeg;base64,... (8 base64 chars)"));
        assert!(text.contains("[Doctor]"));
        assert!(text.contains(PLACEHOLDER_TEXT));
    }
}
