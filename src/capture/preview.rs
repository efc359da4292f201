//! Live preview surface for an active camera stream.

use super::StreamInfo;

/// Where an active stream is shown while the user frames the shot.
pub trait PreviewSurface {
    /// Binds the stream to the surface.
    fn attach(&mut self, info: &StreamInfo);

    /// Scrolls or focuses the surface so the preview is visible.
    fn bring_into_view(&mut self);

    /// Unbinds the stream.
    fn detach(&mut self);
}

/// Preview that only reports through the log.
///
/// A terminal has no video surface; the user is told the camera is live
/// and that `capture` takes the snapshot.
#[derive(Debug, Default)]
pub struct LogPreview {
    attached: Option<StreamInfo>,
}

impl LogPreview {
    /// A preview with nothing attached.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewSurface for LogPreview {
    fn attach(&mut self, info: &StreamInfo) {
        tracing::info!(
            device = %info.label,
            width = info.width,
            height = info.height,
            "Camera preview attached"
        );
        self.attached = Some(info.clone());
    }

    fn bring_into_view(&mut self) {
        if let Some(info) = &self.attached {
            tracing::info!(device = %info.label, "Camera is live; run `capture` to take the photo");
        }
    }

    fn detach(&mut self) {
        if self.attached.take().is_some() {
            tracing::debug!("Camera preview detached");
        }
    }
}
