use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::PhotoCheckError;
use crate::raster::RasterImage;

/// Resolution used by the heuristic face detector and the sharpness check.
pub const ANALYSIS_RESOLUTION: u32 = 200;

/// Resolution used by the colour variance check.
pub const COLOR_SAMPLE_RESOLUTION: u32 = 100;

/// Small fixed-resolution downsample of a source image.
///
/// Lives only for the duration of one analysis call.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pixels: RgbaImage,
}

impl SampleBuffer {
    /// Width in samples.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in samples.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Red channel at `(x, y)`.
    pub fn red(&self, x: u32, y: u32) -> u8 {
        self.pixels.get_pixel(x, y).0[0]
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.pixels.width() as usize * self.pixels.height() as usize
    }

    /// Whether the buffer has no samples. Never true for a buffer built by [`PixelSampler`].
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major iterator over `(x, y, rgba)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, [u8; 4])> + '_ {
        self.pixels.enumerate_pixels().map(|(x, y, p)| (x, y, p.0))
    }
}

/// Downsamples a [`RasterImage`] into a bounded [`SampleBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct PixelSampler {
    filter: FilterType,
}

impl Default for PixelSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelSampler {
    /// Area-weighted (triangle) resampling, the closest match to a canvas draw.
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    /// Nearest-neighbour resampling.
    pub fn nearest() -> Self {
        Self {
            filter: FilterType::Nearest,
        }
    }

    /// Resample `image` into exactly `width × height` samples.
    pub fn sample(
        &self,
        image: &RasterImage,
        width: u32,
        height: u32,
    ) -> Result<SampleBuffer, PhotoCheckError> {
        if width == 0 || height == 0 {
            return Err(PhotoCheckError::InvalidDimension { width, height });
        }

        let source = image.as_rgba();
        let pixels = if source.dimensions() == (width, height) {
            source.clone()
        } else {
            imageops::resize(source, width, height, self.filter)
        };

        if pixels.dimensions() != (width, height) {
            return Err(PhotoCheckError::AnalysisFailure(format!(
                "resampler produced {}x{}, expected {width}x{height}",
                pixels.width(),
                pixels.height()
            )));
        }

        Ok(SampleBuffer { pixels })
    }
}

/// Resample with the default sampler.
pub fn sample(image: &RasterImage, width: u32, height: u32) -> Result<SampleBuffer, PhotoCheckError> {
    PixelSampler::new().sample(image, width, height)
}
