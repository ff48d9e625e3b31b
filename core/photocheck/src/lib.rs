//! ID photo compliance checking: detect a face, run the rule battery, and
//! normalize the photo onto a square white canvas for export.
//!
//! # Example
//!
//! ```no_run
//! use photocheck::{FileMetadata, PhotoChecker, RasterImage};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = RasterImage::decode(&bytes).unwrap();
//! let metadata = FileMetadata::sniff(&bytes);
//!
//! let checker = PhotoChecker::new();
//! let verdict = checker.analyze(&image, metadata.as_ref()).unwrap();
//! println!("{:?}: {} critical issue(s)", verdict.overall, verdict.summary.critical);
//!
//! let exported = checker.export(&image).unwrap();
//! assert_eq!(exported.width(), 600);
//! ```
#![warn(missing_docs)]

/// The compliance check battery.
///
/// Every check is a pure function of the source image, optional file metadata
/// and a [`FaceDetection`]. Checks run in [`CHECK_ORDER`]; a check whose input
/// is missing is skipped and produces no result.
pub mod analyzer;
/// Folding check results into a verdict.
pub mod classifier;
/// Face detection with external-first fallback.
pub mod detect;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
/// Skin-tone face presence heuristic.
pub mod heuristic;
/// Square canvas normalization and export.
pub mod normalize;
mod raster;
#[cfg(feature = "rustface")]
/// SeetaFace-based face detector backend.
pub mod rustface_backend;
/// Fixed-resolution resampling for analysis.
pub mod sampler;
/// Per-photo state machine.
pub mod session;
/// RGB skin-tone classification.
///
/// A pixel counts as skin when any rule in [`skin::SKIN_RULES`] accepts it. The
/// rules overlap on purpose so that a wide range of complexions is covered.
pub mod skin;

pub use analyzer::{
    CheckId, CheckResult, CheckStatus, ComplianceAnalyzer, ComplianceRules, Measurement,
    CHECK_ORDER,
};
pub use classifier::{aggregate, OverallStatus, Summary, Verdict};
pub use detect::detect_face;
/// Error type returned by photocheck operations.
pub use error::PhotoCheckError;
pub use face_detector::{
    DetectionMethod, DetectionReason, FaceBounds, FaceDetection, FaceDetector,
};
pub use heuristic::{HeuristicFaceDetector, SkinStats};
pub use normalize::{NormalizeOptions, NormalizedArtifact, Placement, Preset};
pub use raster::{FileMetadata, RasterImage};
#[cfg(feature = "rustface")]
/// Detector that runs a caller-supplied SeetaFace model.
pub use rustface_backend::RustfaceDetector;
pub use sampler::PixelSampler;
pub use session::{PhotoSession, SessionState};

use log::info;

/// Builder holding everything needed to check and normalize photos.
///
/// One checker can be reused for any number of images; it holds no per-image
/// state.
pub struct PhotoChecker {
    analyzer: ComplianceAnalyzer,
    heuristic: HeuristicFaceDetector,
    /// User-provided face detector. When `None`, the heuristic is used alone.
    detector: Option<Box<dyn FaceDetector>>,
    normalize: NormalizeOptions,
}

impl Default for PhotoChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoChecker {
    /// Checker with the default rules, heuristic detection and the standard preset.
    pub fn new() -> Self {
        Self {
            analyzer: ComplianceAnalyzer::default(),
            heuristic: HeuristicFaceDetector::new(),
            detector: None,
            normalize: NormalizeOptions::default(),
        }
    }

    /// Replace the check thresholds.
    pub fn rules(mut self, rules: ComplianceRules) -> Self {
        self.analyzer = ComplianceAnalyzer::new(rules);
        self
    }

    /// Provide a trained face detector.
    ///
    /// It is tried first; if it returns an error the heuristic takes over.
    ///
    /// ```no_run
    /// use photocheck::{FaceBounds, FaceDetector, PhotoCheckError, PhotoChecker, RasterImage};
    ///
    /// struct MyDetector;
    /// impl FaceDetector for MyDetector {
    ///     fn detect(&self, image: &RasterImage) -> Result<Vec<FaceBounds>, PhotoCheckError> {
    ///         Ok(vec![])
    ///     }
    /// }
    ///
    /// let checker = PhotoChecker::new().face_detector(Box::new(MyDetector));
    /// ```
    pub fn face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Replace the fallback heuristic detector.
    pub fn heuristic(mut self, heuristic: HeuristicFaceDetector) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Replace the normalization settings.
    pub fn normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.normalize = options;
        self
    }

    /// Apply a margin preset, keeping the other normalization settings.
    pub fn preset(mut self, preset: Preset) -> Self {
        self.normalize.margin_factor = NormalizeOptions::preset(preset).margin_factor;
        self
    }

    /// Active thresholds.
    pub fn compliance_rules(&self) -> &ComplianceRules {
        self.analyzer.rules()
    }

    /// Active normalization settings.
    pub fn options(&self) -> &NormalizeOptions {
        &self.normalize
    }

    /// Decide whether `image` shows a face.
    pub fn detect(&self, image: &RasterImage) -> FaceDetection {
        detect_face(image, self.detector.as_deref(), &self.heuristic)
    }

    /// Detect the face, run the battery and aggregate the results.
    pub fn analyze(
        &self,
        image: &RasterImage,
        metadata: Option<&FileMetadata>,
    ) -> Result<Verdict, PhotoCheckError> {
        let detection = self.detect(image);
        self.analyze_with(image, metadata, &detection)
    }

    /// Run the battery against an existing detection.
    pub fn analyze_with(
        &self,
        image: &RasterImage,
        metadata: Option<&FileMetadata>,
        detection: &FaceDetection,
    ) -> Result<Verdict, PhotoCheckError> {
        let results = self.analyzer.analyze(image, metadata, detection)?;
        let verdict = aggregate(results);
        info!(
            "verdict {:?}: {} checks, {} critical, {} warnings",
            verdict.overall,
            verdict.summary.total,
            verdict.summary.critical,
            verdict.summary.warnings
        );
        Ok(verdict)
    }

    /// Decode encoded bytes, sniff their metadata and analyze them.
    pub fn analyze_encoded(&self, input: &[u8]) -> Result<Verdict, PhotoCheckError> {
        let image = RasterImage::decode(input)?;
        let metadata = FileMetadata::sniff(input);
        self.analyze(&image, metadata.as_ref())
    }

    /// Fit `image` onto a white square canvas.
    pub fn normalize(&self, image: &RasterImage) -> Result<NormalizedArtifact, PhotoCheckError> {
        normalize::normalize(image, &self.normalize)
    }

    /// Normalize and resample to the 600×600 export size.
    pub fn export(&self, image: &RasterImage) -> Result<RasterImage, PhotoCheckError> {
        let artifact = self.normalize(image)?;
        Ok(normalize::export(&artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder;
        use image::RgbImage;

        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new(&mut buffer);
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buffer
    }

    struct CentredFace;

    impl FaceDetector for CentredFace {
        fn detect(&self, image: &RasterImage) -> Result<Vec<FaceBounds>, PhotoCheckError> {
            let (w, h) = (image.width() as f64, image.height() as f64);
            Ok(vec![FaceBounds {
                x: w * 0.35,
                y: h * 0.2,
                width: w * 0.3,
                height: h * 0.6,
                confidence: 0.97,
            }])
        }
    }

    #[test]
    fn analyze_encoded_png() {
        let png = make_test_png(200, 300);
        let verdict = PhotoChecker::new().analyze_encoded(&png).unwrap();
        // 200x300 is neither square nor large enough.
        assert_eq!(verdict.overall, OverallStatus::Fail);
        let ids: Vec<_> = verdict.results.iter().map(|r| r.id).collect();
        assert!(ids.contains(&CheckId::AspectRatio));
        assert!(ids.contains(&CheckId::FormatJpeg));
    }

    #[test]
    fn invalid_bytes_are_rejected() {
        let err = PhotoChecker::new()
            .analyze_encoded(b"not an image")
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn custom_detector_is_used() {
        let image = RasterImage::decode(&make_test_png(600, 600)).unwrap();
        let checker = PhotoChecker::new().face_detector(Box::new(CentredFace));
        let detection = checker.detect(&image);
        assert_eq!(detection.method, DetectionMethod::External);
        assert!(detection.present);
        assert!(detection.bounding_box.is_some());

        let verdict = checker.analyze(&image, None).unwrap();
        assert!(verdict.results.iter().any(|r| r.id == CheckId::HeadRatio));
    }

    #[test]
    fn preset_overrides_margin_only() {
        let checker = PhotoChecker::new()
            .normalize_options(NormalizeOptions {
                target_size: 800,
                ..NormalizeOptions::default()
            })
            .preset(Preset::Wide);
        assert_eq!(checker.options().target_size, 800);
        assert_eq!(checker.options().margin_factor, normalize::WIDE_MARGIN_FACTOR);
    }

    #[test]
    fn export_is_600_square() {
        let image = RasterImage::decode(&make_test_png(200, 300)).unwrap();
        let out = PhotoChecker::new().export(&image).unwrap();
        assert_eq!((out.width(), out.height()), (600, 600));
    }

    #[test]
    fn invalid_options_surface_on_normalize() {
        let image = RasterImage::decode(&make_test_png(20, 20)).unwrap();
        let checker = PhotoChecker::new().normalize_options(NormalizeOptions {
            margin_factor: 1.5,
            ..NormalizeOptions::default()
        });
        assert_eq!(
            checker.normalize(&image).unwrap_err(),
            PhotoCheckError::InvalidMarginFactor(1.5)
        );
    }

    #[test]
    fn huge_target_size_is_rejected_before_allocating() {
        let image = RasterImage::decode(&make_test_png(10, 10)).unwrap();
        let checker = PhotoChecker::new().normalize_options(NormalizeOptions {
            target_size: u32::MAX,
            ..NormalizeOptions::default()
        });
        let err = checker.normalize(&image).unwrap_err();
        assert_eq!(err, PhotoCheckError::InvalidTargetSize(u32::MAX));
        assert!(err.is_configuration());
        assert!(checker.export(&image).is_err());
    }
}
