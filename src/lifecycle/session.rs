//! The liveness session: one image, one set of flags, one request.

use super::state::{transition, LifecycleEvent, LifecycleState, TransitionError};
use crate::capture::{CaptureError, CaptureSession, CaptureState};
use crate::metrics::MetricsSnapshot;
use crate::request::{Flag, LivenessOutcome, LivenessRequest, LivenessTransport, RequestConfig};
use crate::source::{adapter, EncodedImage, SourceError};
use std::path::Path;
use thiserror::Error;

/// Why a submit was refused. No request is sent in either case.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Neither a file nor a snapshot has been supplied.
    #[error("no image selected")]
    NoImage,
    /// The life cycle does not accept a submit right now.
    #[error("check is disabled: {0}")]
    Disabled(#[from] TransitionError),
}

/// Why a new image did not become the active one.
#[derive(Debug, Error)]
pub enum ImageSourceError {
    /// The file could not be read.
    #[error(transparent)]
    File(#[from] SourceError),
    /// The webcam gave no snapshot.
    #[error(transparent)]
    Capture(#[from] CaptureError),
    /// The life cycle refused the image.
    #[error("image refused: {0}")]
    Refused(#[from] TransitionError),
}

/// Everything the session holds, reset together.
#[derive(Debug)]
pub struct SessionState {
    image: Option<EncodedImage>,
    config: RequestConfig,
    capture: CaptureSession,
    lifecycle: LifecycleState,
}

impl SessionState {
    /// Fresh state around a closed capture session.
    pub fn new(mut capture: CaptureSession) -> Self {
        capture.close();
        Self {
            image: None,
            config: RequestConfig::default(),
            capture,
            lifecycle: LifecycleState::Idle,
        }
    }

    /// The active image, if any.
    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    /// Flags for the next request.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// The webcam session.
    pub fn capture(&self) -> &CaptureSession {
        &self.capture
    }

    /// Where the request life cycle stands.
    pub fn lifecycle(&self) -> &LifecycleState {
        &self.lifecycle
    }

    /// Moves the life cycle, or leaves it untouched if `event` is refused.
    fn apply(&mut self, event: LifecycleEvent) -> Result<(), TransitionError> {
        self.lifecycle = transition(&self.lifecycle, event)?;
        Ok(())
    }

    /// Returns every piece of state to its initial value.
    fn reset(&mut self) -> Result<(), TransitionError> {
        self.capture.close();
        self.image = None;
        self.config = RequestConfig::default();
        self.apply(LifecycleEvent::Reset)
    }
}

/// Drives the request life cycle for a single user.
///
/// All operations take `&mut self`, so each runs to completion before the
/// next one starts and at most one request can be in flight.
pub struct LivenessSession {
    state: SessionState,
    transport: Box<dyn LivenessTransport>,
    stats: MetricsSnapshot,
}

impl LivenessSession {
    /// A fresh session; the capture session is closed first.
    pub fn new(transport: Box<dyn LivenessTransport>, capture: CaptureSession) -> Self {
        Self {
            state: SessionState::new(capture),
            transport,
            stats: MetricsSnapshot::default(),
        }
    }

    /// The whole aggregate.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Where the request life cycle stands.
    pub fn lifecycle(&self) -> &LifecycleState {
        &self.state.lifecycle
    }

    /// The active image, if any.
    pub fn image(&self) -> Option<&EncodedImage> {
        self.state.image.as_ref()
    }

    /// Flags for the next request.
    pub fn config(&self) -> &RequestConfig {
        &self.state.config
    }

    /// State of the webcam session.
    pub fn capture_state(&self) -> CaptureState {
        self.state.capture.state()
    }

    /// Counters for the metrics registry.
    pub fn stats(&self) -> &MetricsSnapshot {
        &self.stats
    }

    /// Sets a request flag. Takes effect on the next submit.
    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        self.state.config.set(flag, value);
        tracing::debug!(%flag, value, "Flag set");
    }

    /// Flips a request flag and returns its new value.
    pub fn toggle_flag(&mut self, flag: Flag) -> bool {
        let value = self.state.config.toggle(flag);
        tracing::debug!(%flag, value, "Flag toggled");
        value
    }

    /// Reads an image file and makes it the active image.
    ///
    /// Any earlier image, result or open camera is discarded first. On a
    /// read error the session is left without an image.
    pub async fn select_file(&mut self, path: impl AsRef<Path>) -> Result<(), ImageSourceError> {
        self.begin_new_source();
        self.state.capture.close();

        match adapter::from_file(path.as_ref()).await {
            Ok(image) => {
                self.supply_image(image)?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Image file could not be read");
                Err(e.into())
            }
        }
    }

    /// Opens the webcam as the next image source.
    pub fn activate_webcam(&mut self) -> Result<(), CaptureError> {
        self.begin_new_source();
        self.state.capture.activate().map_err(|e| {
            self.stats.capture_failures += 1;
            e
        })
    }

    /// Closes the webcam without taking a photo.
    pub fn cancel_webcam(&mut self) {
        self.state.capture.close();
    }

    /// Takes a snapshot from the open webcam and makes it the active image.
    pub fn capture_webcam(&mut self) -> Result<(), ImageSourceError> {
        match self.state.capture.capture() {
            Ok(image) => {
                self.stats.captures += 1;
                self.supply_image(image)?;
                Ok(())
            }
            Err(e) => {
                self.stats.capture_failures += 1;
                Err(e.into())
            }
        }
    }

    /// Sends the active image and flags to the liveness API.
    ///
    /// Rejected unless an image is held and the session is `ImageReady`.
    /// Transport and parse failures are not errors here: they move the
    /// session to `Failed` and the returned state says so.
    pub async fn submit(&mut self) -> Result<&LifecycleState, SubmitError> {
        let Some(image) = self.state.image.as_ref() else {
            self.stats.rejected += 1;
            tracing::warn!("Submit rejected: no image");
            return Err(SubmitError::NoImage);
        };

        let requesting = match transition(&self.state.lifecycle, LifecycleEvent::SubmitRequested) {
            Ok(next) => next,
            Err(e) => {
                self.stats.rejected += 1;
                tracing::warn!(error = %e, "Submit rejected");
                return Err(e.into());
            }
        };
        self.state.lifecycle = requesting;
        self.stats.submitted += 1;

        let request = LivenessRequest::new(self.state.config, image);
        tracing::info!(
            flags = ?self.state.config,
            image_bytes = image.len(),
            "Submitting liveness check"
        );
        let result = self.transport.send(&request).await;

        let event = match result {
            Ok(response) => {
                let outcome = LivenessOutcome::new(response.status, response.body);
                self.stats.completed += 1;
                self.stats.last_probability = outcome.probability().as_f64();
                tracing::info!(
                    status = outcome.status(),
                    probability = %outcome.probability(),
                    received_at = %outcome.received_at().to_rfc3339(),
                    "Liveness check completed"
                );
                LifecycleEvent::ResponseReceived(outcome)
            }
            Err(e) => {
                self.stats.failed += 1;
                tracing::warn!(error = %e, "Liveness check failed");
                LifecycleEvent::RequestFailed
            }
        };
        self.apply(event)?;
        Ok(&self.state.lifecycle)
    }

    /// Clears image, flags, camera and result in one step.
    pub fn reset(&mut self) {
        let from = self.state.lifecycle.name();
        if let Err(e) = self.state.reset() {
            tracing::error!(error = %e, "Life cycle refused reset");
            return;
        }
        self.stats.resets += 1;
        tracing::info!(from, "Session reset");
    }

    /// A new source was chosen; stale images and results must not survive.
    fn begin_new_source(&mut self) {
        if self.state.lifecycle != LifecycleState::Idle {
            tracing::debug!(
                state = self.state.lifecycle.name(),
                "New image source selected; resetting session"
            );
            self.reset();
        }
    }

    /// Only `Idle` accepts an image, so any earlier result is cleared first.
    fn supply_image(&mut self, image: EncodedImage) -> Result<(), TransitionError> {
        self.begin_new_source();
        self.apply(LifecycleEvent::ImageSupplied)?;
        tracing::info!(mime = image.mime_type(), bytes = image.len(), "Image ready");
        self.state.image = Some(image);
        Ok(())
    }

    fn apply(&mut self, event: LifecycleEvent) -> Result<(), TransitionError> {
        self.state.apply(event)
    }
}

impl std::fmt::Debug for LivenessSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessSession")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, LogPreview, MockCamera};
    use crate::request::{
        MockReply, MockTransport, Probability, TransportResponse, TRANSPORT_ERROR_MESSAGE,
    };
    use serde_json::json;
    use std::io::Write;

    const SAMPLE: &str = "data:image/jpeg;base64,AAA";

    fn session(transport: &MockTransport, camera: &MockCamera) -> LivenessSession {
        let capture = CaptureSession::new(
            Box::new(camera.clone()),
            Box::new(LogPreview::new()),
            CaptureConfig::with_dimensions(32, 24),
        );
        LivenessSession::new(Box::new(transport.clone()), capture)
    }

    fn ready(session: &mut LivenessSession) {
        session
            .supply_image(EncodedImage::parse(SAMPLE).unwrap())
            .unwrap();
    }

    fn image_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[tokio::test]
    async fn test_probability_reported() {
        let transport = MockTransport::responding(json!({"liveness": {"probability": 87}}));
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);

        let state = s.submit().await.unwrap();
        let LifecycleState::Completed(outcome) = state else {
            panic!("expected completed, got {}", state.name());
        };
        assert_eq!(outcome.probability().to_string(), "87");

        let body = transport.last_body().unwrap();
        assert_eq!(body["image"], json!(SAMPLE));
        for flag in Flag::ALL {
            assert_eq!(body[flag.wire_key()], json!(true));
        }
    }

    #[tokio::test]
    async fn test_missing_probability_is_not_available() {
        let transport = MockTransport::responding(json!({"status": "ok"}));
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);

        match s.submit().await.unwrap() {
            LifecycleState::Completed(outcome) => {
                assert_eq!(outcome.probability(), &Probability::NotAvailable);
                assert_eq!(outcome.probability().to_string(), "N/A");
            }
            other => panic!("expected completed, got {}", other.name()),
        }
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let transport = MockTransport::failing();
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);

        let state = s.submit().await.unwrap();
        assert_eq!(state, &LifecycleState::Failed(TRANSPORT_ERROR_MESSAGE.into()));
        assert_eq!(s.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_unparseable_body_fails() {
        let transport = MockTransport::new(MockReply::Garbage);
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);

        assert!(matches!(
            s.submit().await.unwrap(),
            LifecycleState::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_error_status_still_completes() {
        let transport = MockTransport::new(MockReply::Respond(TransportResponse {
            status: 400,
            body: json!({"error": "face not found"}),
        }));
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);

        match s.submit().await.unwrap() {
            LifecycleState::Completed(outcome) => assert_eq!(outcome.status(), 400),
            other => panic!("expected completed, got {}", other.name()),
        }
    }

    #[tokio::test]
    async fn test_submit_without_image_rejected() {
        let transport = MockTransport::responding(json!({}));
        let mut s = session(&transport, &MockCamera::new());

        assert_eq!(s.submit().await, Err(SubmitError::NoImage));
        assert_eq!(s.lifecycle(), &LifecycleState::Idle);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_second_call_after_completion() {
        let transport = MockTransport::responding(json!({"liveness": {"probability": 12}}));
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);

        s.submit().await.unwrap();
        let before = s.lifecycle().clone();
        assert!(matches!(s.submit().await, Err(SubmitError::Disabled(_))));
        assert!(matches!(s.submit().await, Err(SubmitError::Disabled(_))));

        assert_eq!(transport.calls(), 1);
        assert_eq!(s.lifecycle(), &before);
        assert_eq!(s.stats().rejected, 2);
    }

    #[tokio::test]
    async fn test_no_second_call_after_failure() {
        let transport = MockTransport::failing();
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);

        s.submit().await.unwrap();
        assert!(s.submit().await.is_err());
        assert_eq!(transport.calls(), 1);

        s.reset();
        ready(&mut s);
        s.submit().await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_reset_restores_everything() {
        let transport = MockTransport::responding(json!({"status": "ok"}));
        let camera = MockCamera::new().with_tracks(2);
        let mut s = session(&transport, &camera);

        ready(&mut s);
        s.set_flag(Flag::UseQuality, false);
        s.toggle_flag(Flag::ValidateNFace);
        s.submit().await.unwrap();
        // Camera opened after the result is shown: a new source, so it
        // resets first and then holds the device.
        s.activate_webcam().unwrap();
        assert_eq!(camera.live_tracks(), 2);
        s.set_flag(Flag::UseAttribute, false);

        s.reset();
        assert_eq!(s.lifecycle(), &LifecycleState::Idle);
        assert!(s.image().is_none());
        assert_eq!(s.config(), &RequestConfig::default());
        assert_eq!(s.capture_state(), CaptureState::Closed);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn test_new_file_after_completion_resets_first() {
        let transport = MockTransport::responding(json!({"status": "ok"}));
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);
        s.set_flag(Flag::ValidateQuality, false);
        s.submit().await.unwrap();

        let file = image_file(b"second image");
        s.select_file(file.path()).await.unwrap();

        assert_eq!(s.lifecycle(), &LifecycleState::ImageReady);
        assert_eq!(s.config(), &RequestConfig::default());
        assert_eq!(s.image().unwrap().decode_payload().unwrap(), b"second image");
        assert_eq!(s.stats().resets, 1);
    }

    #[tokio::test]
    async fn test_new_source_after_failure_resets_first() {
        let transport = MockTransport::failing();
        let camera = MockCamera::new();
        let mut s = session(&transport, &camera);
        ready(&mut s);
        s.submit().await.unwrap();

        s.activate_webcam().unwrap();
        assert_eq!(s.lifecycle(), &LifecycleState::Idle);
        assert!(s.image().is_none());

        s.capture_webcam().unwrap();
        assert_eq!(s.lifecycle(), &LifecycleState::ImageReady);
        assert_eq!(s.image().unwrap().mime_type(), "image/jpeg");
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn test_image_refused_while_result_shown() {
        let transport = MockTransport::responding(json!({"status": "ok"}));
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);
        s.submit().await.unwrap();

        // Without the new-source reset the life cycle refuses the image
        let err = s.apply(LifecycleEvent::ImageSupplied).unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                state: "completed",
                event: "image-supplied",
            }
        );
        assert!(s.lifecycle().is_terminal());

        s.supply_image(EncodedImage::parse(SAMPLE).unwrap()).unwrap();
        assert_eq!(s.lifecycle(), &LifecycleState::ImageReady);
        assert_eq!(s.stats().resets, 1);
    }

    #[tokio::test]
    async fn test_failed_file_read_leaves_no_image() {
        let transport = MockTransport::responding(json!({}));
        let mut s = session(&transport, &MockCamera::new());
        ready(&mut s);

        let dir = tempfile::tempdir().unwrap();
        let result = s.select_file(dir.path().join("missing.jpg")).await;

        assert!(matches!(
            result,
            Err(ImageSourceError::File(SourceError::FileRead { .. }))
        ));
        assert!(s.image().is_none());
        assert_eq!(s.lifecycle(), &LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_file_selection_closes_open_camera() {
        let transport = MockTransport::responding(json!({}));
        let camera = MockCamera::new();
        let mut s = session(&transport, &camera);

        s.activate_webcam().unwrap();
        let file = image_file(b"upload");
        s.select_file(file.path()).await.unwrap();

        assert_eq!(s.capture_state(), CaptureState::Closed);
        assert_eq!(camera.live_tracks(), 0);
        assert_eq!(s.lifecycle(), &LifecycleState::ImageReady);
    }

    #[test]
    fn test_capture_without_session() {
        let transport = MockTransport::responding(json!({}));
        let camera = MockCamera::new();
        let mut s = session(&transport, &camera);

        assert!(matches!(
            s.capture_webcam(),
            Err(ImageSourceError::Capture(CaptureError::NotActive))
        ));
        assert!(s.image().is_none());
        assert_eq!(s.capture_state(), CaptureState::Closed);
        assert_eq!(s.lifecycle(), &LifecycleState::Idle);
    }

    #[test]
    fn test_denied_camera_keeps_upload_path() {
        let transport = MockTransport::responding(json!({}));
        let mut s = session(&transport, &MockCamera::denying("blocked"));

        assert!(matches!(
            s.activate_webcam(),
            Err(CaptureError::CameraAccess(_))
        ));
        assert_eq!(s.capture_state(), CaptureState::Closed);
        assert_eq!(s.stats().capture_failures, 1);

        ready(&mut s);
        assert_eq!(s.lifecycle(), &LifecycleState::ImageReady);
    }

    #[test]
    fn test_cancel_webcam_keeps_image() {
        let transport = MockTransport::responding(json!({}));
        let camera = MockCamera::new();
        let mut s = session(&transport, &camera);

        s.activate_webcam().unwrap();
        s.capture_webcam().unwrap();
        s.cancel_webcam();
        assert_eq!(s.lifecycle(), &LifecycleState::ImageReady);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_dropping_session_releases_camera() {
        let transport = MockTransport::responding(json!({}));
        let camera = MockCamera::new();
        {
            let mut s = session(&transport, &camera);
            s.activate_webcam().unwrap();
            assert_eq!(camera.live_tracks(), 1);
        }
        assert_eq!(camera.live_tracks(), 0);
    }
}
