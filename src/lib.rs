//! Liveness Check Client Library
//!
//! Supplies a face photo, from a file or a webcam snapshot, to a remote
//! liveness-detection API together with five boolean feature flags, and
//! interprets the JSON result including the liveness probability.
//!
//! # Architecture
//!
//! ```text
//! file ──────────────┐
//!                    ├──▶ source (EncodedImage) ──▶ lifecycle ──▶ request (HTTP)
//! capture (webcam) ──┘                                  │
//!                                                       └──▶ present (text view)
//! ```
//!
//! # Design Principles
//!
//! - **One request per session**: after a response or a failure the check
//!   stays disabled until the session is reset
//! - **One camera owner**: only the capture session touches the stream, and
//!   every exit path stops its tracks
//! - **Missing probability is not a failure**: it is shown as `N/A`
//!
//! # Example
//!
//! ```no_run
//! use liveness_check::{
//!     capture::{CaptureConfig, CaptureSession, LogPreview, MockCamera},
//!     lifecycle::{LifecycleState, LivenessSession},
//!     request::MockTransport,
//! };
//!
//! # async fn run() {
//! let transport = MockTransport::responding(
//!     serde_json::json!({"liveness": {"probability": 87}}),
//! );
//! let capture = CaptureSession::new(
//!     Box::new(MockCamera::new()),
//!     Box::new(LogPreview::new()),
//!     CaptureConfig::default(),
//! );
//! let mut session = LivenessSession::new(Box::new(transport), capture);
//!
//! session.activate_webcam().unwrap();
//! session.capture_webcam().unwrap();
//!
//! if let Ok(LifecycleState::Completed(outcome)) = session.submit().await {
//!     println!("Liveness: {}%", outcome.probability());
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod console;
pub mod lifecycle;
pub mod metrics;
pub mod present;
pub mod request;
pub mod source;

// Re-export commonly used types at crate root
pub use capture::{CaptureConfig, CaptureSession, CaptureState, Frame, MockCamera};
pub use config::{ApiConfig, AppConfig};
pub use lifecycle::{LifecycleState, LivenessSession, SubmitError};
pub use request::{Flag, HttpTransport, LivenessOutcome, Probability, RequestConfig};
pub use source::EncodedImage;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
