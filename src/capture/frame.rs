//! A still taken from a camera stream, ready for snapshot encoding.

use image::RgbImage;

/// Bytes per pixel of a packed RGB8 frame.
pub const RGB_CHANNELS: usize = 3;

/// One RGB8 still from a stream.
///
/// Pixels are row-major with no padding between rows. Backends may hand
/// over any buffer; [`Frame::to_rgb_image`] is where a mismatch between
/// buffer and dimensions surfaces.
#[derive(Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

impl Frame {
    /// Wraps a packed RGB8 buffer of `width` x `height` pixels.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of this frame within its stream, starting at 1.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Width times height.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the buffer holds exactly one RGB triple per pixel.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * RGB_CHANNELS
    }

    /// Copies the frame into an [`RgbImage`], or `None` if the buffer does
    /// not match the dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if !self.is_valid() {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_rgb_image_round_trip() {
        let mut bitmap = RgbImage::new(4, 3);
        bitmap.put_pixel(2, 1, Rgb([10, 20, 30]));

        let frame = Frame::new(bitmap.clone().into_raw(), 4, 3, 7);
        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert_eq!(frame.sequence(), 7);
        assert!(frame.is_valid());
        assert_eq!(frame.to_rgb_image(), Some(bitmap));
    }

    #[test]
    fn test_grayscale_buffer_has_no_bitmap() {
        // One byte per pixel is not RGB
        let frame = Frame::new(vec![0u8; 640 * 480], 640, 480, 1);
        assert!(!frame.is_valid());
        assert_eq!(frame.to_rgb_image(), None);
    }

    #[test]
    fn test_pixel_count_does_not_overflow_u32() {
        let frame = Frame::new(Vec::new(), 100_000, 100_000, 1);
        assert_eq!(frame.pixel_count(), 10_000_000_000);
        assert!(!frame.is_valid());
    }
}
