//! Request life cycle states and the transition function.
//!
//! ```text
//!  Idle ──image──▶ ImageReady ──submit──▶ Requesting ──response──▶ Completed
//!   ▲                                         │
//!   │                                         └──failure──▶ Failed
//!   └──────────────────── reset (from any state) ─────────────────────
//! ```
//!
//! `Completed` and `Failed` accept nothing but `Reset`, which is what keeps
//! the trigger disabled until the session is cleared.

use crate::request::{LivenessOutcome, TRANSPORT_ERROR_MESSAGE};
use thiserror::Error;

/// Where the session is in its single request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LifecycleState {
    /// No image yet.
    #[default]
    Idle,
    /// Image held, nothing sent.
    ImageReady,
    /// Request in flight.
    Requesting,
    /// Response received and parsed.
    Completed(LivenessOutcome),
    /// Call failed; carries the user-facing message.
    Failed(String),
}

impl LifecycleState {
    /// Short lowercase name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::ImageReady => "image-ready",
            LifecycleState::Requesting => "requesting",
            LifecycleState::Completed(_) => "completed",
            LifecycleState::Failed(_) => "failed",
        }
    }

    /// True once the request has finished either way.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Completed(_) | LifecycleState::Failed(_))
    }

    /// State of the "check" trigger derived from the life cycle.
    pub fn trigger(&self) -> TriggerState {
        match self {
            LifecycleState::ImageReady => TriggerState::Enabled,
            LifecycleState::Requesting => TriggerState::Loading,
            LifecycleState::Idle | LifecycleState::Completed(_) | LifecycleState::Failed(_) => {
                TriggerState::Disabled
            }
        }
    }
}

/// The check trigger as the user sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// Nothing to send, or already sent.
    Disabled,
    /// Ready to send.
    Enabled,
    /// Request in flight.
    Loading,
}

impl TriggerState {
    /// Caption shown on the trigger.
    pub fn label(self) -> &'static str {
        match self {
            TriggerState::Loading => "Loading...",
            TriggerState::Disabled | TriggerState::Enabled => "Perform Liveness Check",
        }
    }
}

/// Inputs that drive the life cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// A file or snapshot became the active image.
    ImageSupplied,
    /// The user asked for the check.
    SubmitRequested,
    /// The API answered with a JSON body.
    ResponseReceived(LivenessOutcome),
    /// The call failed or the body was not JSON.
    RequestFailed,
    /// Clear everything.
    Reset,
}

impl LifecycleEvent {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::ImageSupplied => "image-supplied",
            LifecycleEvent::SubmitRequested => "submit",
            LifecycleEvent::ResponseReceived(_) => "response-received",
            LifecycleEvent::RequestFailed => "request-failed",
            LifecycleEvent::Reset => "reset",
        }
    }
}

/// An event the current state does not accept.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("`{event}` is not allowed while {state}")]
pub struct TransitionError {
    /// State that refused the event.
    pub state: &'static str,
    /// Event that was refused.
    pub event: &'static str,
}

/// Computes the next state, or rejects the event.
pub fn transition(
    state: &LifecycleState,
    event: LifecycleEvent,
) -> Result<LifecycleState, TransitionError> {
    use LifecycleEvent as E;
    use LifecycleState as S;

    match (state, event) {
        (_, E::Reset) => Ok(S::Idle),
        (S::Idle, E::ImageSupplied) => Ok(S::ImageReady),
        (S::ImageReady, E::SubmitRequested) => Ok(S::Requesting),
        (S::Requesting, E::ResponseReceived(outcome)) => Ok(S::Completed(outcome)),
        (S::Requesting, E::RequestFailed) => Ok(S::Failed(TRANSPORT_ERROR_MESSAGE.to_string())),
        (state, event) => Err(TransitionError {
            state: state.name(),
            event: event.name(),
        }),
    }
}
