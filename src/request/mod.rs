//! Liveness request construction, transport and response handling.
//!
//! The wire contract is fixed by the remote API: a JSON `POST` carrying
//! five boolean switches and the encoded image, answered by a JSON object
//! that may contain `liveness.probability`.

mod flags;
mod payload;
mod response;
mod transport;

pub use flags::{Flag, RequestConfig, UnknownFlag};
pub use payload::LivenessRequest;
pub use response::{LivenessOutcome, Probability, NOT_AVAILABLE};
pub use transport::{
    HttpTransport, LivenessTransport, MockReply, MockTransport, TransportError,
    TransportResponse, TRANSPORT_ERROR_MESSAGE,
};
