use serde::Serialize;

use crate::error::PhotoCheckError;
use crate::heuristic::SkinStats;
use crate::raster::RasterImage;

/// Bounding box of a detected face within an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    /// Width of the bounding box (pixels).
    pub width: f64,
    /// Height of the bounding box (pixels).
    pub height: f64,
    /// Detection confidence score.
    pub confidence: f64,
}

impl FaceBounds {
    /// Box area in square pixels.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Finite coordinates and a finite, positive size.
    pub fn is_usable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Centre point `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to plug in a trained detector (ONNX, SeetaFace, a
/// remote service, ...). When a detector returns an error the pipeline falls
/// back to [`crate::HeuristicFaceDetector`]; the error is logged, not surfaced.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in `image`.
    ///
    /// Return [`PhotoCheckError::DetectorUnavailable`] when the backend cannot
    /// run (model missing, service down).
    fn detect(&self, image: &RasterImage) -> Result<Vec<FaceBounds>, PhotoCheckError>;
}

/// Which backend produced a [`FaceDetection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMethod {
    /// A [`FaceDetector`] implementation.
    External,
    /// The built-in skin-tone heuristic.
    Heuristic,
}

/// Machine-readable explanation attached to every detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionReason {
    /// Exactly one acceptable face.
    Detected,
    /// Heuristic: almost no skin-coloured pixels.
    NoSkinDetected,
    /// Heuristic: skin fills most of the frame.
    TooClose,
    /// Heuristic: too little horizontal detail.
    TooBlurry,
    /// Heuristic could not sample the image; presence is assumed.
    AnalysisFailed,
    /// External detector found no face.
    NoFaceDetected,
    /// External detector found more than one face.
    MultipleFaces,
    /// External detector found a face below the minimum area ratio.
    FaceTooSmall,
    /// External detector found a face above the maximum area ratio.
    FaceTooLarge,
}

impl DetectionReason {
    /// Stable message identifier for the presentation layer.
    pub fn message_id(self) -> &'static str {
        match self {
            DetectionReason::Detected => "face.detected",
            DetectionReason::NoSkinDetected => "face.no_skin_detected",
            DetectionReason::TooClose => "face.too_close",
            DetectionReason::TooBlurry => "face.too_blurry",
            DetectionReason::AnalysisFailed => "face.analysis_failed",
            DetectionReason::NoFaceDetected => "face.not_detected",
            DetectionReason::MultipleFaces => "face.multiple",
            DetectionReason::FaceTooSmall => "face.too_small",
            DetectionReason::FaceTooLarge => "face.too_large",
        }
    }
}

/// Outcome of face detection, independent of the backend that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetection {
    /// Whether an acceptable face is present.
    pub present: bool,
    /// Number of faces the backend reported.
    pub count: u32,
    /// Bounding box of the accepted face, when the backend localizes faces.
    pub bounding_box: Option<FaceBounds>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Backend that produced this result.
    pub method: DetectionMethod,
    /// Why `present` has its value.
    pub reason: DetectionReason,
    /// Pixel statistics, for heuristic detections.
    pub stats: Option<SkinStats>,
}

impl FaceDetection {
    pub(crate) fn new(
        present: bool,
        count: u32,
        confidence: f64,
        method: DetectionMethod,
        reason: DetectionReason,
    ) -> Self {
        Self {
            present,
            count,
            bounding_box: None,
            confidence: clamp_confidence(confidence),
            method,
            reason,
            stats: None,
        }
    }

    pub(crate) fn with_bounding_box(mut self, bounds: FaceBounds) -> Self {
        self.bounding_box = Some(bounds);
        self
    }

    pub(crate) fn with_stats(mut self, stats: SkinStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
