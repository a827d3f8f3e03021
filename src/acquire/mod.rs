//! Image source acquisition: picked files, dropped files and camera frames.

pub mod camera;
mod file;

pub use camera::{CameraCapture, CameraDevice, Facing, ReadyState, VideoStream};
pub use file::{accept_file, DropZone, PickedFile, ACCEPTED_TYPES};
