use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::PhotoCheckError;

/// Decoded RGBA8 source image.
///
/// Immutable once constructed; every analysis or normalization call borrows
/// it and produces new buffers of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// Wrap a row-major RGBA8 buffer of `width × height × 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PhotoCheckError> {
        if width == 0 || height == 0 {
            return Err(PhotoCheckError::ZeroDimensions);
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(PhotoCheckError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let actual = data.len();
        let pixels = RgbaImage::from_raw(width, height, data)
            .ok_or(PhotoCheckError::BufferSizeMismatch { expected, actual })?;
        Ok(Self { pixels })
    }

    /// Decode encoded image bytes (JPEG, PNG, WebP, ...).
    pub fn decode(input: &[u8]) -> Result<Self, PhotoCheckError> {
        let decoded =
            image::load_from_memory(input).map_err(|e| PhotoCheckError::DecodeError(e.to_string()))?;
        Self::from_dynamic(&decoded)
    }

    /// Convert an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, PhotoCheckError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PhotoCheckError::ZeroDimensions);
        }
        Ok(Self {
            pixels: image.to_rgba8(),
        })
    }

    /// Build from a buffer the crate produced itself. Dimensions are non-zero.
    pub(crate) fn from_buffer(pixels: RgbaImage) -> Self {
        debug_assert!(pixels.width() > 0 && pixels.height() > 0);
        Self { pixels }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// RGBA value at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Raw row-major RGBA8 bytes.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Borrow as an `image` buffer for encoders and resamplers.
    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Consume into the underlying `image` buffer.
    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }
}

/// File-level facts about the encoded source, supplied by the uploader.
///
/// Size and format checks are skipped when no metadata is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Encoded file size in bytes.
    pub size_bytes: u64,
    /// Declared MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
}

impl FileMetadata {
    /// Metadata from an explicit size and MIME type.
    pub fn new(size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            size_bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Derive metadata from encoded bytes by sniffing the format signature.
    ///
    /// Returns `None` when the signature matches no known image format.
    pub fn sniff(input: &[u8]) -> Option<Self> {
        let format = image::guess_format(input).ok()?;
        Some(Self::new(input.len() as u64, format.to_mime_type()))
    }

    /// Size in KiB, as used by the file-size rules.
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    /// Whether the declared MIME type is JPEG.
    pub fn is_jpeg(&self) -> bool {
        matches!(self.mime_type.as_str(), "image/jpeg" | "image/jpg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buffer
    }

    #[test]
    fn from_rgba_rejects_zero_dimensions() {
        assert_eq!(
            RasterImage::from_rgba(0, 10, vec![]),
            Err(PhotoCheckError::ZeroDimensions)
        );
    }

    #[test]
    fn from_rgba_rejects_short_buffer() {
        let err = RasterImage::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            PhotoCheckError::BufferSizeMismatch {
                expected: 16,
                actual: 15
            }
        );
        assert!(err.is_invalid_input());
    }

    #[test]
    fn decode_png_yields_rgba() {
        let image = RasterImage::decode(&make_test_png(7, 5)).unwrap();
        assert_eq!((image.width(), image.height()), (7, 5));
        assert_eq!(image.pixel(3, 2), [10, 20, 30, 255]);
    }

    #[test]
    fn decode_garbage_fails() {
        let err = RasterImage::decode(b"not an image").unwrap_err();
        assert!(matches!(err, PhotoCheckError::DecodeError(_)));
    }

    #[test]
    fn sniff_png_metadata() {
        let png = make_test_png(4, 4);
        let meta = FileMetadata::sniff(&png).unwrap();
        assert_eq!(meta.mime_type, "image/png");
        assert_eq!(meta.size_bytes, png.len() as u64);
        assert!(!meta.is_jpeg());
    }

    #[test]
    fn jpg_alias_counts_as_jpeg() {
        assert!(FileMetadata::new(1, "image/jpg").is_jpeg());
        assert!(FileMetadata::new(1, "image/jpeg").is_jpeg());
        assert!(!FileMetadata::new(1, "image/webp").is_jpeg());
    }
}
