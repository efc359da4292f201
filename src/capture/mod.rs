//! Webcam input and capture session management.
//!
//! The camera is reached only through [`CaptureSession`], which owns the
//! stream from activation until release. Backends plug in behind the
//! [`CameraAccess`] trait; the native one needs the `camera` feature.

mod camera;
mod config;
mod frame;
#[cfg(feature = "camera")]
mod native;
mod preview;
mod session;

pub use camera::{
    CameraAccess, CameraError, MediaStream, MockCamera, MockStream, StreamInfo, UnavailableCamera,
};
pub use config::{CaptureConfig, CaptureConfigError};
pub use frame::Frame;
#[cfg(feature = "camera")]
pub use native::NativeCamera;
pub use preview::{LogPreview, PreviewSurface};
pub use session::{CaptureError, CaptureSession, CaptureState};

/// Returns the camera backend compiled into this build.
pub fn default_camera() -> Box<dyn CameraAccess> {
    #[cfg(feature = "camera")]
    {
        Box::new(NativeCamera::new())
    }
    #[cfg(not(feature = "camera"))]
    {
        tracing::debug!("Built without the `camera` feature; webcam capture unavailable");
        Box::new(UnavailableCamera)
    }
}
