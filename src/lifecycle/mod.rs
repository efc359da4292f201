//! Liveness request life cycle.
//!
//! [`LivenessSession`] owns the single [`SessionState`] aggregate and is the
//! only thing that moves it between states, always through [`transition`].

mod session;
mod state;

pub use session::{ImageSourceError, LivenessSession, SessionState, SubmitError};
pub use state::{transition, LifecycleEvent, LifecycleState, TransitionError, TriggerState};
