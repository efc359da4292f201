//! Native webcam backend built on `nokhwa`.

use super::{CameraAccess, CameraError, CaptureConfig, Frame, MediaStream, StreamInfo};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera as Device, NokhwaError,
};

/// Opens the system webcam selected by [`CaptureConfig::device_id`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCamera;

impl NativeCamera {
    /// Camera backend over the platform device API.
    pub fn new() -> Self {
        Self
    }
}

impl CameraAccess for NativeCamera {
    fn request_stream(
        &mut self,
        config: &CaptureConfig,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.width, config.height),
                FrameFormat::MJPEG,
                config.fps,
            ),
        ));

        let mut device = Device::new(CameraIndex::Index(config.device_id), requested)
            .map_err(|e| classify(config.device_id, e))?;
        device
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        let resolution = device.resolution();
        let info = StreamInfo {
            label: device.info().human_name(),
            width: resolution.width(),
            height: resolution.height(),
            tracks: 1,
        };
        tracing::info!(
            device = %info.label,
            width = info.width,
            height = info.height,
            "Native camera stream opened"
        );

        Ok(Box::new(NativeStream {
            device,
            info,
            live: true,
            sequence: 0,
        }))
    }
}

fn classify(index: u32, error: NokhwaError) -> CameraError {
    let message = error.to_string();
    if message.to_ascii_lowercase().contains("permission") {
        CameraError::PermissionDenied(message)
    } else if matches!(error, NokhwaError::OpenDeviceError(..)) {
        CameraError::DeviceNotFound(format!("index {index}: {message}"))
    } else {
        CameraError::OpenFailed(message)
    }
}

/// Stream held open on a native device. Video only, so one track.
struct NativeStream {
    device: Device,
    info: StreamInfo,
    live: bool,
    sequence: u64,
}

impl MediaStream for NativeStream {
    fn info(&self) -> StreamInfo {
        self.info.clone()
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.live {
            return Err(CameraError::CaptureFailed("stream stopped".into()));
        }

        let buffer = self
            .device
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        self.sequence += 1;
        // nokhwa pins its own `image` version, so hand over the raw buffer
        let (width, height) = (decoded.width(), decoded.height());
        Ok(Frame::new(decoded.into_raw(), width, height, self.sequence))
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live)
    }

    fn stop_tracks(&mut self) {
        if !self.live {
            return;
        }
        if let Err(e) = self.device.stop_stream() {
            tracing::warn!(error = %e, "Failed to stop native camera stream");
        }
        self.live = false;
    }
}
