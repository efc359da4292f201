//! Text rendering of a liveness session.
//!
//! Pure functions of the session state; nothing here mutates anything.

use crate::capture::CaptureState;
use crate::lifecycle::{LifecycleState, LivenessSession, TriggerState};
use crate::request::{Flag, Probability, RequestConfig};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;

/// What the result pane shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    /// Nothing sent yet.
    Idle,
    /// Request in flight.
    Loading,
    /// Headline probability and the pretty-printed body.
    Success {
        /// Value for the `Liveness: {probability}%` headline.
        probability: Probability,
        /// Pretty-printed response body.
        raw: String,
        /// When the response arrived.
        received_at: DateTime<Utc>,
    },
    /// Fixed error message; no raw pane.
    Error {
        /// Text shown in place of the result.
        message: String,
    },
}

impl ResultView {
    /// Picks the pane for a life cycle state.
    pub fn from_lifecycle(state: &LifecycleState) -> Self {
        match state {
            LifecycleState::Idle | LifecycleState::ImageReady => ResultView::Idle,
            LifecycleState::Requesting => ResultView::Loading,
            LifecycleState::Completed(outcome) => ResultView::Success {
                probability: outcome.probability().clone(),
                raw: outcome.pretty_body(),
                received_at: outcome.received_at(),
            },
            LifecycleState::Failed(message) => ResultView::Error {
                message: message.clone(),
            },
        }
    }

    /// The JSON pane, present only after a successful response.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ResultView::Success { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Renders just the result pane.
    pub fn render(&self) -> String {
        match self {
            ResultView::Idle => String::new(),
            ResultView::Loading => "Loading...\n".to_string(),
            ResultView::Success { probability, raw, .. } => {
                format!("Liveness: {probability}%\n{raw}\n")
            }
            ResultView::Error { message } => format!("{message}\n"),
        }
    }
}

/// Snapshot of everything the user sees.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// Request flags as they will be sent.
    pub flags: RequestConfig,
    /// MIME type and size of the active image.
    pub image: Option<(String, usize)>,
    /// Webcam session state.
    pub camera: CaptureState,
    /// Whether the check can be triggered.
    pub trigger: TriggerState,
    /// The result pane.
    pub result: ResultView,
}

impl SessionView {
    /// Takes a snapshot of the session.
    pub fn of(session: &LivenessSession) -> Self {
        Self {
            flags: *session.config(),
            image: session
                .image()
                .map(|image| (image.mime_type().to_string(), image.len())),
            camera: session.capture_state(),
            trigger: session.lifecycle().trigger(),
            result: ResultView::from_lifecycle(session.lifecycle()),
        }
    }

    /// Renders the full screen: flags, image, trigger and result.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("Conditions\n");
        out.push_str(&render_flags(&self.flags));

        match &self.image {
            Some((mime, len)) => {
                let _ = writeln!(out, "Image: {mime} ({len} bytes encoded)");
            }
            None => out.push_str("Image: none\n"),
        }
        let _ = writeln!(out, "Camera: {}", camera_label(self.camera));

        let suffix = match self.trigger {
            TriggerState::Enabled => "",
            TriggerState::Loading => " (busy)",
            TriggerState::Disabled => " (disabled)",
        };
        let _ = writeln!(out, "[ {} ]{suffix}", self.trigger.label());

        let result = self.result.render();
        if !result.is_empty() {
            out.push_str("API Response\n");
            if let ResultView::Success { received_at, .. } = &self.result {
                let _ = writeln!(
                    out,
                    "Received {}",
                    received_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                );
            }
            out.push_str(&result);
        }
        out
    }
}

/// One line per flag: checkbox, name, label.
pub fn render_flags(flags: &RequestConfig) -> String {
    let mut out = String::new();
    for flag in Flag::ALL {
        let mark = if flags.get(flag) { 'x' } else { ' ' };
        let _ = writeln!(
            out,
            "  [{mark}] {:<19} {}: {}",
            flag.name(),
            flag.label(),
            flag.description()
        );
    }
    out
}

fn camera_label(state: CaptureState) -> &'static str {
    match state {
        CaptureState::Closed => "closed",
        CaptureState::RequestingPermission => "requesting permission",
        CaptureState::Active => "live",
    }
}
