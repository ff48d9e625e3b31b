use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::PhotoCheckError;
use crate::raster::RasterImage;

/// Default side length of the normalized canvas.
pub const DEFAULT_TARGET_SIZE: u32 = 600;

/// Side length of every exported artifact (2×2 in at 300 dpi).
pub const EXPORT_SIZE: u32 = 600;

/// Default fraction of the canvas the photo may occupy.
pub const DEFAULT_MARGIN_FACTOR: f32 = 0.90;

/// Looser margin used by the batch fixer.
pub const WIDE_MARGIN_FACTOR: f32 = 0.95;

/// Largest accepted `target_size`.
pub const MAX_TARGET_SIZE: u32 = 8192;

/// Mean brightness below which the result is brightened.
const DARK_THRESHOLD: f64 = 120.0;

const BRIGHTNESS_GAIN: f32 = 1.2;
const CONTRAST_GAIN: f32 = 1.1;

/// Named margin configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// 90% of the canvas, as used by the interactive fix.
    #[default]
    Standard,
    /// 95% of the canvas.
    Wide,
}

/// Normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizeOptions {
    /// Minimum canvas side, in `1..=MAX_TARGET_SIZE`. The canvas grows to fit larger sources.
    pub target_size: u32,
    /// Fraction of the canvas the scaled photo may occupy, in `(0, 1]`.
    pub margin_factor: f32,
    /// Brighten dark results.
    pub enhance: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::preset(Preset::Standard)
    }
}

impl NormalizeOptions {
    /// Options for a named preset.
    pub fn preset(preset: Preset) -> Self {
        let margin_factor = match preset {
            Preset::Standard => DEFAULT_MARGIN_FACTOR,
            Preset::Wide => WIDE_MARGIN_FACTOR,
        };
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            margin_factor,
            enhance: true,
        }
    }

    /// Reject unusable sizes and margins.
    pub fn validate(&self) -> Result<(), PhotoCheckError> {
        if self.target_size == 0 || self.target_size > MAX_TARGET_SIZE {
            return Err(PhotoCheckError::InvalidTargetSize(self.target_size));
        }
        if !(self.margin_factor > 0.0 && self.margin_factor <= 1.0) {
            return Err(PhotoCheckError::InvalidMarginFactor(self.margin_factor));
        }
        Ok(())
    }
}

/// Where the scaled source landed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Scaled width.
    pub width: u32,
    /// Scaled height.
    pub height: u32,
}

/// Square, white-padded, centred result of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedArtifact {
    image: RasterImage,
    placement: Placement,
    enhanced: bool,
}

impl NormalizedArtifact {
    /// The square canvas.
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    /// Canvas side length.
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Position and size of the source on the canvas.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Whether the brightness correction was applied.
    pub fn enhanced(&self) -> bool {
        self.enhanced
    }

    /// Consume into the canvas.
    pub fn into_image(self) -> RasterImage {
        self.image
    }
}

/// Fit `image` centred on a white square canvas and brighten it if dark.
pub fn normalize(
    image: &RasterImage,
    options: &NormalizeOptions,
) -> Result<NormalizedArtifact, PhotoCheckError> {
    options.validate()?;

    let (w, h) = (image.width(), image.height());
    let size = options.target_size.max(w.max(h));
    let margin = options.margin_factor as f64;
    let scale = (size as f64 * margin / w as f64).min(size as f64 * margin / h as f64);

    let scaled_w = ((w as f64 * scale).round() as u32).clamp(1, size);
    let scaled_h = ((h as f64 * scale).round() as u32).clamp(1, size);
    let placement = Placement {
        x: (size - scaled_w) / 2,
        y: (size - scaled_h) / 2,
        width: scaled_w,
        height: scaled_h,
    };

    let source = image.as_rgba();
    let scaled = if source.dimensions() == (scaled_w, scaled_h) {
        source.clone()
    } else {
        imageops::resize(source, scaled_w, scaled_h, FilterType::Triangle)
    };

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
    composite_over_white(&mut canvas, &scaled, placement.x, placement.y);

    let enhanced = options.enhance && mean_brightness(&canvas) < DARK_THRESHOLD;
    if enhanced {
        brighten(&mut canvas);
    }

    info!(
        "normalized {w}x{h} onto {size}x{size} canvas at ({}, {}) as {scaled_w}x{scaled_h}, enhanced={enhanced}",
        placement.x, placement.y
    );

    Ok(NormalizedArtifact {
        image: RasterImage::from_buffer(canvas),
        placement,
        enhanced,
    })
}

/// Resample to the fixed export size, regardless of canvas size.
pub fn export(artifact: &NormalizedArtifact) -> RasterImage {
    resample_square(artifact.image(), EXPORT_SIZE)
}

/// Resample any image to a `size × size` square.
pub fn resample_square(image: &RasterImage, size: u32) -> RasterImage {
    let source = image.as_rgba();
    if source.dimensions() == (size, size) {
        return image.clone();
    }
    RasterImage::from_buffer(imageops::resize(source, size, size, FilterType::Triangle))
}

/// Draw `layer` onto `canvas` at `(left, top)`, compositing alpha over white.
fn composite_over_white(canvas: &mut RgbaImage, layer: &RgbaImage, left: u32, top: u32) {
    for (x, y, pixel) in layer.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let inv_alpha = 1.0 - alpha;
        let out_r = (r as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        let out_g = (g as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        let out_b = (b as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        canvas.put_pixel(left + x, top + y, Rgba([out_r, out_g, out_b, 255]));
    }
}

/// Mean of `(r + g + b) / 3` over the whole buffer.
fn mean_brightness(canvas: &RgbaImage) -> f64 {
    let total: u64 = canvas
        .pixels()
        .map(|p| p.0[0] as u64 + p.0[1] as u64 + p.0[2] as u64)
        .sum();
    let count = canvas.width() as u64 * canvas.height() as u64;
    total as f64 / 3.0 / count as f64
}

fn brighten(canvas: &mut RgbaImage) {
    let gain = BRIGHTNESS_GAIN * CONTRAST_GAIN;
    for pixel in canvas.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (*channel as f32 * gain).round().min(255.0) as u8;
        }
    }
}
