//! Webcam capture session controller.
//!
//! The controller is the only owner of the camera stream. Callers may ask it
//! to `activate`, `capture` or `close`; every path out of `Active` stops all
//! tracks before the session reports itself closed.

use super::{CameraAccess, CameraError, CaptureConfig, MediaStream, PreviewSurface};
use crate::source::{adapter, EncodedImage, SourceError};
use std::fmt;
use thiserror::Error;

/// Lifecycle state of the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No stream held.
    Closed,
    /// Waiting on the platform permission prompt.
    RequestingPermission,
    /// Stream granted and attached to the preview.
    Active,
}

/// Errors surfaced by the capture session.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Permission denied or the device would not open.
    #[error("camera access failed: {0}")]
    CameraAccess(#[source] CameraError),
    /// `capture` called with no live stream.
    #[error("no active capture session")]
    NotActive,
    /// The live stream produced no frame.
    #[error("frame read failed: {0}")]
    Frame(#[source] CameraError),
    /// The frame could not be encoded.
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] SourceError),
}

/// Owns the webcam stream between activation and release.
pub struct CaptureSession {
    config: CaptureConfig,
    camera: Box<dyn CameraAccess>,
    preview: Box<dyn PreviewSurface>,
    state: CaptureState,
    stream: Option<Box<dyn MediaStream>>,
}

impl CaptureSession {
    /// Creates a closed session over the given camera and preview surface.
    pub fn new(
        camera: Box<dyn CameraAccess>,
        preview: Box<dyn PreviewSurface>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            config,
            camera,
            preview,
            state: CaptureState::Closed,
            stream: None,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// True while a stream is held.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == CaptureState::Active
    }

    /// Capture settings.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Tracks of the held stream that still hold the device.
    pub fn live_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.live_tracks())
    }

    /// Requests camera access and attaches the stream to the preview.
    ///
    /// Activating an already active session is a no-op. A denied or failed
    /// request leaves the session closed.
    pub fn activate(&mut self) -> Result<(), CaptureError> {
        if self.is_active() {
            tracing::debug!("Capture session already active");
            return Ok(());
        }

        self.state = CaptureState::RequestingPermission;
        tracing::info!(device = self.config.device_id, "Requesting camera access");

        match self.camera.request_stream(&self.config) {
            Ok(stream) => {
                let info = stream.info();
                self.preview.attach(&info);
                self.preview.bring_into_view();
                self.stream = Some(stream);
                self.state = CaptureState::Active;
                tracing::info!(
                    device = %info.label,
                    tracks = info.tracks,
                    "Capture session active"
                );
                Ok(())
            }
            Err(e) => {
                self.state = CaptureState::Closed;
                tracing::warn!(error = %e, "Camera access failed");
                Err(CaptureError::CameraAccess(e))
            }
        }
    }

    /// Snapshots the current frame and closes the session.
    ///
    /// The session is closed whether or not the snapshot succeeds.
    pub fn capture(&mut self) -> Result<EncodedImage, CaptureError> {
        let (width, height, quality) = (
            self.config.width,
            self.config.height,
            self.config.jpeg_quality,
        );

        let stream = match (self.state, self.stream.as_mut()) {
            (CaptureState::Active, Some(stream)) => stream,
            _ => {
                tracing::warn!(state = ?self.state, "Capture requested without an active session");
                return Err(CaptureError::NotActive);
            }
        };

        let result = stream
            .read_frame()
            .map_err(CaptureError::Frame)
            .and_then(|frame| {
                adapter::from_video_frame_with_quality(&frame, width, height, quality)
                    .map_err(CaptureError::from)
            });

        self.close();

        match &result {
            Ok(image) => tracing::info!(bytes = image.len(), "Webcam snapshot captured"),
            Err(e) => tracing::warn!(error = %e, "Webcam snapshot failed"),
        }
        result
    }

    /// Stops all tracks and closes the session. Safe to call when closed.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            let remaining = stream.live_tracks();
            if remaining > 0 {
                tracing::warn!(remaining, "Camera tracks still live after stop");
            }
            self.preview.detach();
            tracing::info!("Capture session closed");
        }
        self.state = CaptureState::Closed;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("live_tracks", &self.live_tracks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{LogPreview, MockCamera};

    fn session_with(camera: &MockCamera) -> CaptureSession {
        CaptureSession::new(
            Box::new(camera.clone()),
            Box::new(LogPreview::new()),
            CaptureConfig::with_dimensions(32, 24),
        )
    }

    #[test]
    fn test_activate_then_capture_releases_camera() {
        let camera = MockCamera::new().with_tracks(2);
        let mut session = session_with(&camera);

        session.activate().unwrap();
        assert_eq!(session.state(), CaptureState::Active);
        assert_eq!(camera.live_tracks(), 2);

        let image = session.capture().unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(session.state(), CaptureState::Closed);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_capture_without_session() {
        let camera = MockCamera::new();
        let mut session = session_with(&camera);

        assert!(matches!(session.capture(), Err(CaptureError::NotActive)));
        assert_eq!(session.state(), CaptureState::Closed);
        assert_eq!(camera.streams_opened(), 0);
    }

    #[test]
    fn test_denied_access_stays_closed() {
        let camera = MockCamera::denying("blocked");
        let mut session = session_with(&camera);

        assert!(matches!(
            session.activate(),
            Err(CaptureError::CameraAccess(CameraError::PermissionDenied(_)))
        ));
        assert_eq!(session.state(), CaptureState::Closed);
    }

    #[test]
    fn test_frame_failure_closes_session() {
        let camera = MockCamera::new().with_frame_failure();
        let mut session = session_with(&camera);

        session.activate().unwrap();
        assert!(matches!(session.capture(), Err(CaptureError::Frame(_))));
        assert_eq!(session.state(), CaptureState::Closed);
        assert_eq!(camera.live_tracks(), 0);

        // Retrying activation opens a fresh stream
        session.activate().unwrap();
        assert_eq!(camera.streams_opened(), 2);
    }

    #[test]
    fn test_activate_twice_opens_one_stream() {
        let camera = MockCamera::new();
        let mut session = session_with(&camera);

        session.activate().unwrap();
        session.activate().unwrap();
        assert_eq!(camera.streams_opened(), 1);
        assert_eq!(camera.live_tracks(), 1);
    }

    #[test]
    fn test_cancel_stops_tracks() {
        let camera = MockCamera::new().with_tracks(3);
        let mut session = session_with(&camera);

        session.activate().unwrap();
        session.close();
        assert_eq!(session.state(), CaptureState::Closed);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_drop_releases_camera() {
        let camera = MockCamera::new();
        {
            let mut session = session_with(&camera);
            session.activate().unwrap();
            assert_eq!(camera.live_tracks(), 1);
        }
        assert_eq!(camera.live_tracks(), 0);
    }
}
