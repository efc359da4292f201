//! Image sources.
//!
//! Both acquisition paths, file selection and webcam snapshot, end in the
//! same [`EncodedImage`] value so the rest of the client never needs to
//! know where an image came from.

pub mod adapter;
mod encoded;

pub use adapter::{from_file, from_video_frame, SourceError, DEFAULT_JPEG_QUALITY};
pub use encoded::{EncodedImage, EncodingError};
