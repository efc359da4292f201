//! Camera abstraction for stream acquisition.
//!
//! [`CameraAccess`] stands in for the platform's camera permission prompt:
//! asking it for a stream either yields a live [`MediaStream`] or an error.
//! The stream owns the device until every one of its tracks is stopped.

use super::{CaptureConfig, Frame};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    /// The user or the OS refused camera access.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// No device at the configured index.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device exists but could not be opened.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The stream produced no frame.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// No camera backend was compiled in.
    #[error("no camera backend available")]
    Unavailable,
}

/// Description of a granted stream, handed to the preview surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Human-readable device name.
    pub label: String,
    /// Negotiated frame width.
    pub width: u32,
    /// Negotiated frame height.
    pub height: u32,
    /// Number of tracks carried by the stream.
    pub tracks: usize,
}

/// Platform camera access.
pub trait CameraAccess {
    /// Requests camera access and starts streaming.
    fn request_stream(
        &mut self,
        config: &CaptureConfig,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// A live camera stream made of one or more tracks.
pub trait MediaStream {
    /// Describes the stream.
    fn info(&self) -> StreamInfo;

    /// Reads the current frame.
    fn read_frame(&mut self) -> Result<Frame, CameraError>;

    /// Number of tracks still holding the device.
    fn live_tracks(&self) -> usize;

    /// Stops every track, releasing the device.
    fn stop_tracks(&mut self);
}

/// Camera access that always fails; used when no backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCamera;

impl CameraAccess for UnavailableCamera {
    fn request_stream(
        &mut self,
        _config: &CaptureConfig,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        Err(CameraError::Unavailable)
    }
}

/// Mock camera that produces synthetic frames.
///
/// Clones share their track and stream counters, so a test can keep a
/// clone to observe it after handing the camera to a session.
#[derive(Debug, Clone)]
pub struct MockCamera {
    denial: Option<String>,
    frame_failure: bool,
    tracks_per_stream: usize,
    live_tracks: Arc<AtomicUsize>,
    streams_opened: Arc<AtomicUsize>,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            denial: None,
            frame_failure: false,
            tracks_per_stream: 1,
            live_tracks: Arc::new(AtomicUsize::new(0)),
            streams_opened: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockCamera {
    /// A mock camera granting one track per stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera whose permission prompt is always declined.
    pub fn denying(reason: impl Into<String>) -> Self {
        Self {
            denial: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Streams from this camera fail every frame read.
    pub fn with_frame_failure(mut self) -> Self {
        self.frame_failure = true;
        self
    }

    /// Sets how many tracks each stream carries (e.g. video plus audio).
    pub fn with_tracks(mut self, tracks: usize) -> Self {
        self.tracks_per_stream = tracks.max(1);
        self
    }

    /// Tracks currently live across all streams from this camera.
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }

    /// Total streams ever granted.
    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }
}

impl CameraAccess for MockCamera {
    fn request_stream(
        &mut self,
        config: &CaptureConfig,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        if let Some(reason) = &self.denial {
            return Err(CameraError::PermissionDenied(reason.clone()));
        }
        config
            .validate()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        self.streams_opened.fetch_add(1, Ordering::SeqCst);
        self.live_tracks
            .fetch_add(self.tracks_per_stream, Ordering::SeqCst);
        tracing::info!(
            width = config.width,
            height = config.height,
            tracks = self.tracks_per_stream,
            "MockCamera stream started"
        );

        Ok(Box::new(MockStream {
            width: config.width,
            height: config.height,
            sequence: 0,
            tracks: self.tracks_per_stream,
            frame_failure: self.frame_failure,
            live_tracks: Arc::clone(&self.live_tracks),
        }))
    }
}

/// Stream granted by [`MockCamera`].
///
/// Dropping it without calling [`MediaStream::stop_tracks`] leaves the
/// shared live-track count raised, which is how leaks show up in tests.
#[derive(Debug)]
pub struct MockStream {
    width: u32,
    height: u32,
    sequence: u64,
    tracks: usize,
    frame_failure: bool,
    live_tracks: Arc<AtomicUsize>,
}

impl MediaStream for MockStream {
    fn info(&self) -> StreamInfo {
        StreamInfo {
            label: "Mock Camera".to_string(),
            width: self.width,
            height: self.height,
            tracks: self.tracks,
        }
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        if self.tracks == 0 {
            return Err(CameraError::CaptureFailed("stream stopped".into()));
        }
        if self.frame_failure {
            return Err(CameraError::CaptureFailed("no frame decoded".into()));
        }

        // Deterministic gradient mixed with the sequence number
        let pixel_count = self.width as usize * self.height as usize;
        let pixels: Vec<u8> = (0..pixel_count)
            .flat_map(|i| {
                let v = (i as u64 ^ self.sequence) as u8;
                [v, v.wrapping_add(85), v.wrapping_add(170)]
            })
            .collect();

        self.sequence += 1;
        Ok(Frame::new(pixels, self.width, self.height, self.sequence))
    }

    fn live_tracks(&self) -> usize {
        self.tracks
    }

    fn stop_tracks(&mut self) {
        if self.tracks > 0 {
            self.live_tracks.fetch_sub(self.tracks, Ordering::SeqCst);
            self.tracks = 0;
            tracing::info!("MockCamera stream stopped");
        }
    }
}
