use log::{debug, warn};
use serde::Serialize;

use crate::error::PhotoCheckError;
use crate::face_detector::{DetectionMethod, DetectionReason, FaceDetection};
use crate::raster::RasterImage;
use crate::sampler::{PixelSampler, SampleBuffer, ANALYSIS_RESOLUTION};
use crate::skin::is_skin;

/// Below this overall skin ratio (together with [`MIN_CENTER_SKIN_RATIO`]) no face is assumed.
const MIN_SKIN_RATIO: f64 = 0.005;

/// Below this centre-box skin ratio (together with [`MIN_SKIN_RATIO`]) no face is assumed.
const MIN_CENTER_SKIN_RATIO: f64 = 0.01;

/// Above this skin ratio the subject is too close to the camera.
const MAX_SKIN_RATIO: f64 = 0.8;

/// Mean horizontal red-channel edge magnitude required for facial detail.
const MIN_EDGE_VARIANCE: f64 = 1.0;

/// Largest analysis resolution the detector will sample at.
pub const MAX_ANALYSIS_RESOLUTION: u32 = 1024;

/// Confidence reported when analysis fails and presence is assumed.
const FAIL_OPEN_CONFIDENCE: f64 = 0.5;

/// Pixel statistics gathered by the heuristic detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinStats {
    /// Skin pixels / all pixels.
    pub skin_ratio: f64,
    /// Centre-box skin pixels / (all pixels × 0.25).
    pub center_skin_ratio: f64,
    /// Mean `|red(i) - red(i+1)|` over the sample in row-major order.
    pub edge_variance: f64,
    /// Number of samples analysed.
    pub total_pixels: usize,
}

/// Fallback face-presence classifier based on skin tone and edge statistics.
///
/// Used when no trained [`crate::FaceDetector`] is configured or when it fails.
/// Never returns an error: an internal sampling fault is reported as a face
/// being present with [`DetectionReason::AnalysisFailed`], so that a broken
/// analysis never blocks the user.
#[derive(Debug, Clone)]
pub struct HeuristicFaceDetector {
    resolution: u32,
    sampler: PixelSampler,
}

impl Default for HeuristicFaceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicFaceDetector {
    /// Detector sampling at 200×200.
    pub fn new() -> Self {
        Self {
            resolution: ANALYSIS_RESOLUTION,
            sampler: PixelSampler::new(),
        }
    }

    /// Override the square analysis resolution.
    ///
    /// Values above [`MAX_ANALYSIS_RESOLUTION`] make detection fail open.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Analysis resolution in samples per side.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Detect face presence in `image`.
    pub fn detect(&self, image: &RasterImage) -> FaceDetection {
        match self.measure(image) {
            Ok(stats) => classify(stats),
            Err(e) => {
                warn!("heuristic face analysis failed, assuming a face is present: {e}");
                FaceDetection::new(
                    true,
                    1,
                    FAIL_OPEN_CONFIDENCE,
                    DetectionMethod::Heuristic,
                    DetectionReason::AnalysisFailed,
                )
            }
        }
    }

    /// Sample `image` and gather skin and edge statistics.
    pub fn measure(&self, image: &RasterImage) -> Result<SkinStats, PhotoCheckError> {
        if self.resolution > MAX_ANALYSIS_RESOLUTION {
            return Err(PhotoCheckError::AnalysisFailure(format!(
                "analysis resolution {} exceeds {MAX_ANALYSIS_RESOLUTION}",
                self.resolution
            )));
        }
        let buffer = self
            .sampler
            .sample(image, self.resolution, self.resolution)?;
        let stats = skin_stats(&buffer)?;
        debug!(
            "heuristic face stats: skin_ratio={:.4} center_skin_ratio={:.4} edge_variance={:.3} total={}",
            stats.skin_ratio, stats.center_skin_ratio, stats.edge_variance, stats.total_pixels
        );
        Ok(stats)
    }
}

/// Accumulate skin ratios and horizontal edge energy over a sample buffer.
fn skin_stats(buffer: &SampleBuffer) -> Result<SkinStats, PhotoCheckError> {
    if buffer.is_empty() {
        return Err(PhotoCheckError::AnalysisFailure(
            "empty sample buffer".to_string(),
        ));
    }

    let (w, h) = (buffer.width() as f64, buffer.height() as f64);
    let (x_lo, x_hi) = (w * 0.25, w * 0.75);
    let (y_lo, y_hi) = (h * 0.25, h * 0.75);

    let mut skin = 0usize;
    let mut center_skin = 0usize;
    let mut edge_sum = 0u64;
    let mut previous_red: Option<u8> = None;

    for (x, y, [r, g, b, _]) in buffer.iter() {
        if is_skin(r, g, b) {
            skin += 1;
            let (xf, yf) = (x as f64, y as f64);
            if xf > x_lo && xf < x_hi && yf > y_lo && yf < y_hi {
                center_skin += 1;
            }
        }
        // Row-major neighbour, wrapping onto the next row.
        if let Some(prev) = previous_red {
            edge_sum += prev.abs_diff(r) as u64;
        }
        previous_red = Some(r);
    }

    let total = buffer.len();
    Ok(SkinStats {
        skin_ratio: skin as f64 / total as f64,
        center_skin_ratio: center_skin as f64 / (total as f64 * 0.25),
        edge_variance: edge_sum as f64 / total as f64,
        total_pixels: total,
    })
}

/// Apply the decision policy to gathered statistics. First match wins.
pub fn classify(stats: SkinStats) -> FaceDetection {
    let SkinStats {
        skin_ratio,
        center_skin_ratio,
        edge_variance,
        ..
    } = stats;

    let detection = if skin_ratio < MIN_SKIN_RATIO && center_skin_ratio < MIN_CENTER_SKIN_RATIO {
        FaceDetection::new(
            false,
            0,
            skin_ratio.max(center_skin_ratio),
            DetectionMethod::Heuristic,
            DetectionReason::NoSkinDetected,
        )
    } else if skin_ratio > MAX_SKIN_RATIO {
        FaceDetection::new(
            false,
            0,
            skin_ratio,
            DetectionMethod::Heuristic,
            DetectionReason::TooClose,
        )
    } else if edge_variance < MIN_EDGE_VARIANCE {
        FaceDetection::new(
            false,
            0,
            skin_ratio,
            DetectionMethod::Heuristic,
            DetectionReason::TooBlurry,
        )
    } else {
        FaceDetection::new(
            true,
            1,
            skin_ratio.max(center_skin_ratio * 2.0).min(1.0),
            DetectionMethod::Heuristic,
            DetectionReason::Detected,
        )
    };

    detection.with_stats(stats)
}
