//! Outbound request body.

use super::RequestConfig;
use crate::source::EncodedImage;
use serde::Serialize;

/// JSON body of a liveness check: the five flags plus the image.
#[derive(Debug, Clone, Serialize)]
pub struct LivenessRequest<'a> {
    #[serde(flatten)]
    config: RequestConfig,
    image: &'a EncodedImage,
}

impl<'a> LivenessRequest<'a> {
    /// Pairs the flags with the image to send.
    pub fn new(config: RequestConfig, image: &'a EncodedImage) -> Self {
        Self { config, image }
    }

    /// Serializes the body.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
