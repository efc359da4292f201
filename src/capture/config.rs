//! Camera capture configuration.

use crate::source::DEFAULT_JPEG_QUALITY;
use serde::{Deserialize, Serialize};

/// Configuration for webcam capture.
///
/// `width` and `height` are both the requested stream resolution and the
/// fixed size of the snapshot bitmap sent to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index.
    pub device_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target frames per second.
    pub fps: u32,
    /// JPEG quality of the snapshot (1-100).
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(CaptureConfigError::InvalidFrameRate);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(CaptureConfigError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }
}

/// Capture configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Frame rate outside 1-120.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// Quality outside 1-100.
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
}
