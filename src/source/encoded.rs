//! Canonical encoded-image value.
//!
//! Every image the client handles, whether read from disk or snapshotted
//! from a camera, is normalized into a data URL of the form
//! `data:<mime>;base64,<payload>`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Errors produced when interpreting a string as an [`EncodedImage`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Does not start with `data:`.
    #[error("missing `data:` prefix")]
    MissingPrefix,
    /// No `;base64,` marker.
    #[error("missing `;base64,` marker")]
    MissingMarker,
    /// Nothing between `data:` and the marker.
    #[error("empty MIME type")]
    EmptyMimeType,
    /// The payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// An image embedded as a base64 data URL.
///
/// Immutable once produced. The wrapped string is exactly what goes into
/// the `image` field of the outbound request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncodedImage {
    url: String,
    /// Byte offset where the base64 payload starts.
    payload_start: usize,
}

impl EncodedImage {
    /// Encodes raw bytes under the given MIME type.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        let head = format!("{DATA_PREFIX}{mime_type}{BASE64_MARKER}");
        let payload_start = head.len();
        let mut url = head;
        BASE64.encode_string(bytes, &mut url);
        Self { url, payload_start }
    }

    /// Parses an existing data URL.
    ///
    /// The payload is not decoded here; use [`EncodedImage::decode_payload`].
    pub fn parse(url: impl Into<String>) -> Result<Self, EncodingError> {
        let url = url.into();
        let rest = url
            .strip_prefix(DATA_PREFIX)
            .ok_or(EncodingError::MissingPrefix)?;
        let marker = rest.find(BASE64_MARKER).ok_or(EncodingError::MissingMarker)?;
        if marker == 0 {
            return Err(EncodingError::EmptyMimeType);
        }
        let payload_start = DATA_PREFIX.len() + marker + BASE64_MARKER.len();
        Ok(Self { url, payload_start })
    }

    /// MIME type tag, e.g. `image/jpeg`.
    pub fn mime_type(&self) -> &str {
        &self.url[DATA_PREFIX.len()..self.payload_start - BASE64_MARKER.len()]
    }

    /// The base64 payload without the header.
    pub fn payload(&self) -> &str {
        &self.url[self.payload_start..]
    }

    /// Decodes the payload back into raw bytes.
    pub fn decode_payload(&self) -> Result<Vec<u8>, EncodingError> {
        BASE64
            .decode(self.payload())
            .map_err(|e| EncodingError::InvalidPayload(e.to_string()))
    }

    /// The full data URL.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Length of the data URL in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.url.len()
    }

    /// True if the payload carries no data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }
}

impl TryFrom<String> for EncodedImage {
    type Error = EncodingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EncodedImage> for String {
    fn from(image: EncodedImage) -> Self {
        image.url
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

// Payloads run to hundreds of kilobytes; keep logs readable.
impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type())
            .field("payload_len", &self.payload().len())
            .finish()
    }
}
