//! Conversion of files and camera frames into [`EncodedImage`] values.

use super::EncodedImage;
use crate::capture::Frame;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ImageFormat};
use std::path::Path;
use thiserror::Error;

/// JPEG quality used for frame snapshots when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

const FALLBACK_MIME: &str = "application/octet-stream";
const JPEG_MIME: &str = "image/jpeg";

/// Errors raised while producing an encoded image.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path as given.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The camera frame was empty or malformed.
    #[error("no frame available: {0}")]
    NoFrame(String),
    /// Requested snapshot size has a zero side.
    #[error("invalid snapshot size {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// JPEG encoding failed.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

/// Reads a file to completion and encodes it as a data URL.
///
/// The MIME type is sniffed from the content first and the extension
/// second, the way a browser file reader tags its result.
pub async fn from_file(path: impl AsRef<Path>) -> Result<EncodedImage, SourceError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| SourceError::FileRead {
        path: path.display().to_string(),
        source,
    })?;

    let mime = sniff_mime(path, &bytes);
    tracing::debug!(
        path = %path.display(),
        bytes = bytes.len(),
        mime,
        "Encoded image file"
    );
    Ok(EncodedImage::from_bytes(mime, &bytes))
}

/// Rasterizes a frame into a `width` x `height` bitmap and encodes it as JPEG.
pub fn from_video_frame(
    frame: &Frame,
    width: u32,
    height: u32,
) -> Result<EncodedImage, SourceError> {
    from_video_frame_with_quality(frame, width, height, DEFAULT_JPEG_QUALITY)
}

/// Same as [`from_video_frame`] with an explicit JPEG quality (1-100).
pub fn from_video_frame_with_quality(
    frame: &Frame,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<EncodedImage, SourceError> {
    if width == 0 || height == 0 {
        return Err(SourceError::InvalidSize { width, height });
    }
    let bitmap = frame
        .to_rgb_image()
        .filter(|bitmap| bitmap.width() > 0 && bitmap.height() > 0)
        .ok_or_else(|| SourceError::NoFrame(format!("{:?} has no usable pixels", frame)))?;

    let bitmap = if bitmap.dimensions() == (width, height) {
        bitmap
    } else {
        image::imageops::resize(&bitmap, width, height, FilterType::Triangle)
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100)).encode_image(&bitmap)?;

    tracing::debug!(
        sequence = frame.sequence(),
        width,
        height,
        jpeg_bytes = jpeg.len(),
        "Encoded video frame"
    );
    Ok(EncodedImage::from_bytes(JPEG_MIME, &jpeg))
}

fn sniff_mime(path: &Path, bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use proptest::prelude::*;
    use std::io::Write;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let pixels = (0..width * height)
            .flat_map(|i| [(i % 256) as u8, (i / 7 % 256) as u8, 128])
            .collect();
        Frame::new(pixels, width, height, 1)
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let bytes: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
        file.write_all(&bytes).unwrap();

        let image = from_file(file.path()).await.unwrap();
        assert_eq!(image.mime_type(), FALLBACK_MIME);
        assert_eq!(image.decode_payload().unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_file_mime_sniffed_from_content() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(PNG_MAGIC).unwrap();
        file.write_all(&[0u8; 16]).unwrap();

        let image = from_file(file.path()).await.unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_file_mime_from_extension() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"not really a jpeg").unwrap();

        let image = from_file(file.path()).await.unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = from_file(dir.path().join("absent.png")).await;
        assert!(matches!(result, Err(SourceError::FileRead { .. })));
    }

    #[test]
    fn test_frame_encodes_as_jpeg_at_requested_size() {
        let frame = gradient_frame(64, 48);
        let image = from_video_frame(&frame, 32, 24).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");

        let decoded = image::load_from_memory(&image.decode_payload().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_invalid_frame_rejected() {
        let frame = Frame::new(vec![0u8; 10], 64, 48, 1);
        assert!(matches!(
            from_video_frame(&frame, 32, 24),
            Err(SourceError::NoFrame(_))
        ));
    }

    #[test]
    fn test_zero_target_size_rejected() {
        let frame = gradient_frame(8, 8);
        assert!(matches!(
            from_video_frame(&frame, 0, 8),
            Err(SourceError::InvalidSize { .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_file_bytes_survive_encoding(bytes in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(&bytes).unwrap();

            let image = rt.block_on(from_file(file.path())).unwrap();
            prop_assert_eq!(image.decode_payload().unwrap(), bytes);
        }
    }
}
