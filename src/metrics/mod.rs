//! Prometheus metrics for the liveness client.
//!
//! # Metrics Exposed
//!
//! ## Request Metrics
//! - `liveness_requests_submitted_total` - Requests sent to the API
//! - `liveness_requests_completed_total` - Requests answered with JSON
//! - `liveness_requests_failed_total` - Transport or parse failures
//! - `liveness_submit_rejected_total` - Submits refused without a request
//! - `liveness_last_probability` - Most recent probability (-1 when not available)
//!
//! ## Capture Metrics
//! - `liveness_webcam_captures_total` - Webcam snapshots taken
//! - `liveness_webcam_failures_total` - Camera access or snapshot failures
//!
//! ## Session Metrics
//! - `liveness_session_resets_total` - Full session resets
//!
//! # Example
//!
//! ```no_run
//! use liveness_check::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     submitted: 1,
//!     completed: 1,
//!     last_probability: Some(87.0),
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
