use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PhotoCheckError;
use crate::face_detector::FaceDetection;
use crate::raster::{FileMetadata, RasterImage};
use crate::sampler::{PixelSampler, SampleBuffer, ANALYSIS_RESOLUTION, COLOR_SAMPLE_RESOLUTION};

/// Identifier of one rule in the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckId {
    /// A face must be present.
    FacePresence,
    /// The image must be (nearly) square.
    AspectRatio,
    /// Both sides must reach the minimum resolution.
    MinResolution,
    /// Encoded file must not exceed the size limit.
    MaxFileSize,
    /// Encoded file must reach the minimum size.
    MinFileSize,
    /// Encoded file must be JPEG.
    FormatJpeg,
    /// The image should be in colour.
    ColorVariance,
    /// The border should be close to white.
    BackgroundWhiteness,
    /// The image should not be blurred.
    Sharpness,
    /// Estimated head height should be within the printed range.
    HeadSizeEstimate,
    /// The face should be centred.
    FacePosition,
    /// The eye line should sit near the target height.
    EyeLevel,
    /// The face box height should be a set fraction of the image.
    HeadRatio,
}

/// Declared evaluation order of the battery.
pub const CHECK_ORDER: [CheckId; 13] = [
    CheckId::FacePresence,
    CheckId::AspectRatio,
    CheckId::MinResolution,
    CheckId::MaxFileSize,
    CheckId::MinFileSize,
    CheckId::FormatJpeg,
    CheckId::ColorVariance,
    CheckId::BackgroundWhiteness,
    CheckId::Sharpness,
    CheckId::HeadSizeEstimate,
    CheckId::FacePosition,
    CheckId::EyeLevel,
    CheckId::HeadRatio,
];

impl CheckId {
    /// Whether failing this check rejects the photo outright.
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            CheckId::FacePresence
                | CheckId::AspectRatio
                | CheckId::MinResolution
                | CheckId::MaxFileSize
                | CheckId::MinFileSize
                | CheckId::FormatJpeg
        )
    }

    /// Stable title identifier for the presentation layer.
    pub fn title_id(self) -> &'static str {
        match self {
            CheckId::FacePresence => "check.face_presence",
            CheckId::AspectRatio => "check.aspect_ratio",
            CheckId::MinResolution => "check.min_resolution",
            CheckId::MaxFileSize => "check.max_file_size",
            CheckId::MinFileSize => "check.min_file_size",
            CheckId::FormatJpeg => "check.format_jpeg",
            CheckId::ColorVariance => "check.color",
            CheckId::BackgroundWhiteness => "check.background",
            CheckId::Sharpness => "check.sharpness",
            CheckId::HeadSizeEstimate => "check.head_size",
            CheckId::FacePosition => "check.face_position",
            CheckId::EyeLevel => "check.eye_level",
            CheckId::HeadRatio => "check.head_ratio",
        }
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Rule satisfied.
    Pass,
    /// Advisory rule not satisfied.
    Warn,
    /// Critical rule not satisfied.
    Fail,
}

/// Value measured by a check, for display next to the verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Measurement {
    /// Detector confidence in `[0, 1]`.
    Confidence(f64),
    /// Width / height.
    Ratio(f64),
    /// Pixel dimensions.
    Dimensions {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// File size in KiB.
    Kilobytes(f64),
    /// Declared MIME type.
    MimeType(String),
    /// Unitless score (colour variance, Laplacian energy).
    Score(f64),
    /// Average colour.
    Rgb {
        /// Red.
        r: u8,
        /// Green.
        g: u8,
        /// Blue.
        b: u8,
    },
    /// Length in millimetres on the printed photo.
    Millimetres(f64),
    /// Normalised offset per axis.
    Offset {
        /// Horizontal offset.
        x: f64,
        /// Vertical offset.
        y: f64,
    },
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Confidence(c) => write!(f, "{:.0}%", c * 100.0),
            Measurement::Ratio(r) => write!(f, "{r:.2}"),
            Measurement::Dimensions { width, height } => write!(f, "{width}x{height}"),
            Measurement::Kilobytes(kb) => write!(f, "{kb:.1} KB"),
            Measurement::MimeType(mime) => f.write_str(mime),
            Measurement::Score(s) => write!(f, "{s:.1}"),
            Measurement::Rgb { r, g, b } => write!(f, "RGB({r}, {g}, {b})"),
            Measurement::Millimetres(mm) => write!(f, "~{}mm", mm.round()),
            Measurement::Offset { x, y } => write!(f, "({x:.2}, {y:.2})"),
        }
    }
}

/// Result of one check. `critical` is only ever set together with [`CheckStatus::Fail`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    /// Which rule produced this result.
    pub id: CheckId,
    /// Title identifier, see [`CheckId::title_id`].
    pub title: &'static str,
    /// Pass, warn or fail.
    pub status: CheckStatus,
    /// What was measured.
    pub value: Measurement,
    /// Message identifier for the presentation layer.
    pub message: &'static str,
    /// Whether this result alone rejects the photo.
    pub critical: bool,
}

impl CheckResult {
    /// Build a result whose severity on failure follows [`CheckId::is_critical`].
    pub fn evaluate(
        id: CheckId,
        ok: bool,
        value: Measurement,
        pass_message: &'static str,
        fail_message: &'static str,
    ) -> Self {
        let (status, critical, message) = match (ok, id.is_critical()) {
            (true, _) => (CheckStatus::Pass, false, pass_message),
            (false, true) => (CheckStatus::Fail, true, fail_message),
            (false, false) => (CheckStatus::Warn, false, fail_message),
        };
        Self {
            id,
            title: id.title_id(),
            status,
            value,
            message,
            critical,
        }
    }
}

/// Thresholds used by the battery. Defaults are the published ID-photo rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComplianceRules {
    /// Maximum `|w/h - 1|` accepted as square.
    pub aspect_tolerance: f64,
    /// Minimum width and height in pixels.
    pub min_resolution: u32,
    /// Maximum encoded size in KiB.
    pub max_file_kb: f64,
    /// Minimum encoded size in KiB.
    pub min_file_kb: f64,
    /// Average channel spread above which the photo counts as colour.
    pub min_color_variance: f64,
    /// Pixel stride of the colour sample.
    pub color_stride: usize,
    /// Per-channel average the border must exceed.
    pub min_background_level: f64,
    /// Pixel stride along each border.
    pub background_stride: usize,
    /// Mean Laplacian magnitude above which the photo counts as sharp.
    pub min_sharpness: f64,
    /// Head height estimate as a fraction of image height.
    pub head_height_fraction: f64,
    /// Printed photo height in millimetres.
    pub photo_height_mm: f64,
    /// Shortest acceptable head height in millimetres.
    pub min_head_mm: f64,
    /// Tallest acceptable head height in millimetres.
    pub max_head_mm: f64,
    /// Maximum normalised distance between face centre and image centre, per axis.
    pub max_center_offset: f64,
    /// Eye line position inside the face box, from its top.
    pub eye_line_fraction: f64,
    /// Target eye line height as a fraction of image height.
    pub eye_level_target: f64,
    /// Maximum normalised eye line deviation.
    pub max_eye_deviation: f64,
    /// Smallest face box height / image height.
    pub min_head_ratio: f64,
    /// Largest face box height / image height.
    pub max_head_ratio: f64,
}

impl Default for ComplianceRules {
    fn default() -> Self {
        Self {
            aspect_tolerance: 0.1,
            min_resolution: 600,
            max_file_kb: 240.0,
            min_file_kb: 54.0,
            min_color_variance: 10.0,
            color_stride: 4,
            min_background_level: 200.0,
            background_stride: 10,
            min_sharpness: 15.0,
            head_height_fraction: 0.6,
            photo_height_mm: 51.0,
            min_head_mm: 22.0,
            max_head_mm: 35.0,
            max_center_offset: 0.15,
            eye_line_fraction: 0.3,
            eye_level_target: 0.6,
            max_eye_deviation: 0.1,
            min_head_ratio: 0.5,
            max_head_ratio: 0.7,
        }
    }
}

/// Runs the check battery over one image.
#[derive(Debug, Clone, Default)]
pub struct ComplianceAnalyzer {
    rules: ComplianceRules,
    sampler: PixelSampler,
}

impl ComplianceAnalyzer {
    /// Analyzer with custom thresholds.
    pub fn new(rules: ComplianceRules) -> Self {
        Self {
            rules,
            sampler: PixelSampler::new(),
        }
    }

    /// Active thresholds.
    pub fn rules(&self) -> &ComplianceRules {
        &self.rules
    }

    /// Run every applicable check in [`CHECK_ORDER`].
    ///
    /// Fails only when no pixel data can be sampled at all.
    pub fn analyze(
        &self,
        image: &RasterImage,
        metadata: Option<&FileMetadata>,
        detection: &FaceDetection,
    ) -> Result<Vec<CheckResult>, PhotoCheckError> {
        let mut results = Vec::with_capacity(CHECK_ORDER.len());
        for id in CHECK_ORDER {
            if let Some(result) = self.run(id, image, metadata, detection)? {
                results.push(result);
            }
        }
        Ok(results)
    }

    fn run(
        &self,
        id: CheckId,
        image: &RasterImage,
        metadata: Option<&FileMetadata>,
        detection: &FaceDetection,
    ) -> Result<Option<CheckResult>, PhotoCheckError> {
        let rules = &self.rules;
        let (w, h) = (image.width(), image.height());

        let result = match id {
            CheckId::FacePresence => CheckResult::evaluate(
                id,
                detection.present,
                Measurement::Confidence(detection.confidence),
                detection.reason.message_id(),
                detection.reason.message_id(),
            ),
            CheckId::AspectRatio => {
                let ratio = w as f64 / h as f64;
                CheckResult::evaluate(
                    id,
                    (ratio - 1.0).abs() < rules.aspect_tolerance,
                    Measurement::Ratio(ratio),
                    "aspect_ratio.square",
                    "aspect_ratio.not_square",
                )
            }
            CheckId::MinResolution => CheckResult::evaluate(
                id,
                w >= rules.min_resolution && h >= rules.min_resolution,
                Measurement::Dimensions {
                    width: w,
                    height: h,
                },
                "resolution.ok",
                "resolution.too_low",
            ),
            CheckId::MaxFileSize => {
                let Some(meta) = metadata else {
                    return Ok(None);
                };
                let kb = meta.size_kb();
                CheckResult::evaluate(
                    id,
                    kb <= rules.max_file_kb,
                    Measurement::Kilobytes(kb),
                    "file_size.ok",
                    "file_size.too_large",
                )
            }
            CheckId::MinFileSize => {
                let Some(meta) = metadata else {
                    return Ok(None);
                };
                let kb = meta.size_kb();
                CheckResult::evaluate(
                    id,
                    kb >= rules.min_file_kb,
                    Measurement::Kilobytes(kb),
                    "file_size.ok",
                    "file_size.too_small",
                )
            }
            CheckId::FormatJpeg => {
                let Some(meta) = metadata else {
                    return Ok(None);
                };
                CheckResult::evaluate(
                    id,
                    meta.is_jpeg(),
                    Measurement::MimeType(meta.mime_type.clone()),
                    "format.jpeg",
                    "format.not_jpeg",
                )
            }
            CheckId::ColorVariance => {
                let buffer =
                    self.sampler
                        .sample(image, COLOR_SAMPLE_RESOLUTION, COLOR_SAMPLE_RESOLUTION)?;
                let variance = color_variance(&buffer, rules.color_stride);
                CheckResult::evaluate(
                    id,
                    variance > rules.min_color_variance,
                    Measurement::Score(variance),
                    "color.ok",
                    "color.check_required",
                )
            }
            CheckId::BackgroundWhiteness => {
                let [r, g, b] = border_average(image, rules.background_stride);
                let level = rules.min_background_level;
                CheckResult::evaluate(
                    id,
                    r > level && g > level && b > level,
                    Measurement::Rgb {
                        r: r.round() as u8,
                        g: g.round() as u8,
                        b: b.round() as u8,
                    },
                    "background.white",
                    "background.check_required",
                )
            }
            CheckId::Sharpness => {
                let buffer = self
                    .sampler
                    .sample(image, ANALYSIS_RESOLUTION, ANALYSIS_RESOLUTION)?;
                let energy = laplacian_energy(&buffer);
                CheckResult::evaluate(
                    id,
                    energy > rules.min_sharpness,
                    Measurement::Score(energy),
                    "sharpness.ok",
                    "sharpness.blurry",
                )
            }
            CheckId::HeadSizeEstimate => {
                let mm = estimate_head_mm(h, rules);
                CheckResult::evaluate(
                    id,
                    mm >= rules.min_head_mm && mm <= rules.max_head_mm,
                    Measurement::Millimetres(mm),
                    "head_size.ok",
                    "head_size.out_of_range",
                )
            }
            CheckId::FacePosition => {
                let Some(face) = detection.bounding_box.as_ref() else {
                    return Ok(None);
                };
                let (cx, cy) = face.center();
                let offset_x = (cx - w as f64 / 2.0).abs() / w as f64;
                let offset_y = (cy - h as f64 / 2.0).abs() / h as f64;
                CheckResult::evaluate(
                    id,
                    offset_x < rules.max_center_offset && offset_y < rules.max_center_offset,
                    Measurement::Offset {
                        x: offset_x,
                        y: offset_y,
                    },
                    "face_position.centered",
                    "face_position.off_center",
                )
            }
            CheckId::EyeLevel => {
                let Some(face) = detection.bounding_box.as_ref() else {
                    return Ok(None);
                };
                let eye_line = face.y + face.height * rules.eye_line_fraction;
                let deviation = (eye_line - h as f64 * rules.eye_level_target).abs() / h as f64;
                CheckResult::evaluate(
                    id,
                    deviation < rules.max_eye_deviation,
                    Measurement::Ratio(deviation),
                    "eye_level.ok",
                    "eye_level.adjust",
                )
            }
            CheckId::HeadRatio => {
                let Some(face) = detection.bounding_box.as_ref() else {
                    return Ok(None);
                };
                let ratio = face.height / h as f64;
                let message = if ratio < rules.min_head_ratio {
                    "head_ratio.too_small"
                } else {
                    "head_ratio.too_large"
                };
                CheckResult::evaluate(
                    id,
                    ratio >= rules.min_head_ratio && ratio <= rules.max_head_ratio,
                    Measurement::Ratio(ratio),
                    "head_ratio.ok",
                    message,
                )
            }
        };

        Ok(Some(result))
    }
}

/// Mean of `|r-g| + |g-b| + |r-b|` over every `stride`-th sample.
pub fn color_variance(buffer: &SampleBuffer, stride: usize) -> f64 {
    let (sum, count) = buffer
        .iter()
        .step_by(stride.max(1))
        .fold((0u64, 0u64), |(sum, count), (_, _, [r, g, b, _])| {
            let spread = r.abs_diff(g) as u64 + g.abs_diff(b) as u64 + r.abs_diff(b) as u64;
            (sum + spread, count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Average RGB of border pixels on all four edges, every `stride` pixels.
pub fn border_average(image: &RasterImage, stride: usize) -> [f64; 3] {
    let (w, h) = (image.width(), image.height());
    let stride = stride.max(1);
    let mut total = [0u64; 3];
    let mut count = 0u64;
    let mut add = |[r, g, b, _]: [u8; 4]| {
        total[0] += r as u64;
        total[1] += g as u64;
        total[2] += b as u64;
        count += 1;
    };

    for x in (0..w).step_by(stride) {
        add(image.pixel(x, 0));
        add(image.pixel(x, h - 1));
    }
    for y in (0..h).step_by(stride) {
        add(image.pixel(0, y));
        add(image.pixel(w - 1, y));
    }

    let count = count.max(1) as f64;
    [
        total[0] as f64 / count,
        total[1] as f64 / count,
        total[2] as f64 / count,
    ]
}

/// Mean `|4·c - top - bottom - left - right|` of the red channel over interior samples.
pub fn laplacian_energy(buffer: &SampleBuffer) -> f64 {
    let (w, h) = (buffer.width(), buffer.height());
    if w < 3 || h < 3 {
        return 0.0;
    }

    let mut sum = 0u64;
    let mut count = 0u64;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = 4 * buffer.red(x, y) as i32;
            let neighbours = buffer.red(x, y - 1) as i32
                + buffer.red(x, y + 1) as i32
                + buffer.red(x - 1, y) as i32
                + buffer.red(x + 1, y) as i32;
            sum += (center - neighbours).unsigned_abs() as u64;
            count += 1;
        }
    }
    sum as f64 / count as f64
}

/// Rough head height on the printed photo.
///
/// The head is assumed to span a fixed fraction of the frame, so the result
/// does not depend on the pixel height at all (30.6 mm with default rules).
pub fn estimate_head_mm(image_height: u32, rules: &ComplianceRules) -> f64 {
    let height = image_height as f64;
    let head_pixels = height * rules.head_height_fraction;
    head_pixels / height * rules.photo_height_mm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face_detector::{DetectionMethod, DetectionReason, FaceBounds};
    use image::{Rgba, RgbaImage};

    fn image_from_fn(w: u32, h: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> RasterImage {
        RasterImage::from_buffer(RgbaImage::from_fn(w, h, |x, y| Rgba(f(x, y))))
    }

    fn flat(w: u32, h: u32, rgba: [u8; 4]) -> RasterImage {
        image_from_fn(w, h, |_, _| rgba)
    }

    fn checkerboard(w: u32, h: u32, cell: u32) -> RasterImage {
        image_from_fn(w, h, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                [255, 255, 255, 255]
            } else {
                [0, 0, 0, 255]
            }
        })
    }

    fn present() -> FaceDetection {
        FaceDetection::new(
            true,
            1,
            0.9,
            DetectionMethod::Heuristic,
            DetectionReason::Detected,
        )
    }

    fn run(image: &RasterImage, meta: Option<&FileMetadata>, d: &FaceDetection) -> Vec<CheckResult> {
        ComplianceAnalyzer::default().analyze(image, meta, d).unwrap()
    }

    fn find(results: &[CheckResult], id: CheckId) -> Option<&CheckResult> {
        results.iter().find(|r| r.id == id)
    }

    #[test]
    fn square_image_passes_aspect_ratio() {
        let results = run(&flat(600, 600, [255, 255, 255, 255]), None, &present());
        let r = find(&results, CheckId::AspectRatio).unwrap();
        assert_eq!(r.status, CheckStatus::Pass);
        assert!(!r.critical);
    }

    #[test]
    fn portrait_image_fails_aspect_ratio() {
        let results = run(&flat(600, 800, [255, 255, 255, 255]), None, &present());
        let r = find(&results, CheckId::AspectRatio).unwrap();
        assert_eq!(r.status, CheckStatus::Fail);
        assert!(r.critical);
        assert_eq!(r.value, Measurement::Ratio(0.75));
    }

    #[test]
    fn resolution_boundary() {
        let results = run(&flat(599, 600, [255, 255, 255, 255]), None, &present());
        assert_eq!(
            find(&results, CheckId::MinResolution).unwrap().status,
            CheckStatus::Fail
        );
        let results = run(&flat(600, 600, [255, 255, 255, 255]), None, &present());
        assert_eq!(
            find(&results, CheckId::MinResolution).unwrap().status,
            CheckStatus::Pass
        );
    }

    #[test]
    fn file_checks_skipped_without_metadata() {
        let results = run(&flat(600, 600, [255, 255, 255, 255]), None, &present());
        assert!(find(&results, CheckId::MaxFileSize).is_none());
        assert!(find(&results, CheckId::MinFileSize).is_none());
        assert!(find(&results, CheckId::FormatJpeg).is_none());
        // No bounding box, so no geometry checks either.
        assert!(find(&results, CheckId::FacePosition).is_none());
        assert_eq!(results.len(), 7);
    }

    #[test]
    fn file_size_and_format_rules() {
        let img = flat(600, 600, [255, 255, 255, 255]);

        let ok = FileMetadata::new(100 * 1024, "image/jpeg");
        let results = run(&img, Some(&ok), &present());
        for id in [CheckId::MaxFileSize, CheckId::MinFileSize, CheckId::FormatJpeg] {
            assert_eq!(find(&results, id).unwrap().status, CheckStatus::Pass, "{id:?}");
        }

        let big = FileMetadata::new(240 * 1024 + 1, "image/png");
        let results = run(&img, Some(&big), &present());
        assert_eq!(find(&results, CheckId::MaxFileSize).unwrap().status, CheckStatus::Fail);
        assert_eq!(find(&results, CheckId::MinFileSize).unwrap().status, CheckStatus::Pass);
        let fmt = find(&results, CheckId::FormatJpeg).unwrap();
        assert_eq!(fmt.status, CheckStatus::Fail);
        assert_eq!(fmt.value, Measurement::MimeType("image/png".into()));

        let small = FileMetadata::new(53 * 1024, "image/jpg");
        let results = run(&img, Some(&small), &present());
        assert_eq!(find(&results, CheckId::MinFileSize).unwrap().status, CheckStatus::Fail);
        assert_eq!(find(&results, CheckId::FormatJpeg).unwrap().status, CheckStatus::Pass);

        // Exactly at the limits passes.
        let edge = FileMetadata::new(240 * 1024, "image/jpeg");
        let results = run(&img, Some(&edge), &present());
        assert_eq!(find(&results, CheckId::MaxFileSize).unwrap().status, CheckStatus::Pass);
    }

    #[test]
    fn results_follow_declared_order() {
        let meta = FileMetadata::new(100 * 1024, "image/jpeg");
        let results = run(&flat(600, 600, [255, 255, 255, 255]), Some(&meta), &present());
        let ids: Vec<_> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, CHECK_ORDER[..10].to_vec());
    }

    #[test]
    fn grey_image_warns_on_colour() {
        let results = run(&flat(600, 600, [128, 128, 128, 255]), None, &present());
        let r = find(&results, CheckId::ColorVariance).unwrap();
        assert_eq!(r.status, CheckStatus::Warn);
        assert!(!r.critical);
        assert_eq!(r.value, Measurement::Score(0.0));
    }

    #[test]
    fn colourful_image_passes_colour() {
        let results = run(&flat(600, 600, [200, 120, 60, 255]), None, &present());
        let r = find(&results, CheckId::ColorVariance).unwrap();
        assert_eq!(r.status, CheckStatus::Pass);
        assert_eq!(r.value, Measurement::Score(280.0));
    }

    #[test]
    fn background_uses_all_four_borders() {
        // White top/bottom rows, dark left/right columns.
        let img = image_from_fn(600, 600, |x, y| {
            if y == 0 || y == 599 {
                [255, 255, 255, 255]
            } else if x == 0 || x == 599 {
                [0, 0, 0, 255]
            } else {
                [128, 128, 128, 255]
            }
        });
        let [r, _, _] = border_average(&img, 10);
        assert!(r < 200.0, "{r}");
        let results = run(&img, None, &present());
        assert_eq!(
            find(&results, CheckId::BackgroundWhiteness).unwrap().status,
            CheckStatus::Warn
        );

        let results = run(&flat(600, 600, [250, 250, 250, 255]), None, &present());
        let r = find(&results, CheckId::BackgroundWhiteness).unwrap();
        assert_eq!(r.status, CheckStatus::Pass);
        assert_eq!(
            r.value,
            Measurement::Rgb {
                r: 250,
                g: 250,
                b: 250
            }
        );
    }

    #[test]
    fn flat_image_is_not_sharp() {
        let results = run(&flat(200, 200, [90, 140, 30, 255]), None, &present());
        let r = find(&results, CheckId::Sharpness).unwrap();
        assert_eq!(r.status, CheckStatus::Warn);
        assert_eq!(r.value, Measurement::Score(0.0));
    }

    #[test]
    fn checkerboard_is_sharp() {
        let results = run(&checkerboard(200, 200, 2), None, &present());
        let r = find(&results, CheckId::Sharpness).unwrap();
        assert_eq!(r.status, CheckStatus::Pass, "{:?}", r.value);
    }

    #[test]
    fn head_size_estimate_is_constant() {
        let rules = ComplianceRules::default();
        approx::assert_relative_eq!(estimate_head_mm(600, &rules), 30.6, epsilon = 1e-9);
        approx::assert_relative_eq!(estimate_head_mm(4321, &rules), 30.6, epsilon = 1e-9);
        let results = run(&flat(600, 600, [255, 255, 255, 255]), None, &present());
        assert_eq!(
            find(&results, CheckId::HeadSizeEstimate).unwrap().status,
            CheckStatus::Pass
        );
    }

    #[test]
    fn missing_face_is_a_critical_failure() {
        let absent = FaceDetection::new(
            false,
            0,
            0.0,
            DetectionMethod::Heuristic,
            DetectionReason::NoSkinDetected,
        );
        let results = run(&flat(600, 600, [255, 255, 255, 255]), None, &absent);
        let r = &results[0];
        assert_eq!(r.id, CheckId::FacePresence);
        assert_eq!(r.status, CheckStatus::Fail);
        assert!(r.critical);
        assert_eq!(r.message, "face.no_skin_detected");
    }

    #[test]
    fn face_geometry_checks_run_with_bounding_box() {
        let centred = present().with_bounding_box(FaceBounds {
            x: 180.0,
            y: 150.0,
            width: 240.0,
            height: 360.0,
            confidence: 0.9,
        });
        let results = run(&flat(600, 600, [255, 255, 255, 255]), None, &centred);
        let position = find(&results, CheckId::FacePosition).unwrap();
        assert_eq!(position.status, CheckStatus::Pass);
        // Eye line 150 + 108 = 258 vs target 360: deviation 0.17.
        let eyes = find(&results, CheckId::EyeLevel).unwrap();
        assert_eq!(eyes.status, CheckStatus::Warn);
        // 360 / 600 = 0.6
        let head = find(&results, CheckId::HeadRatio).unwrap();
        assert_eq!(head.status, CheckStatus::Pass);

        let corner = present().with_bounding_box(FaceBounds {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            confidence: 0.9,
        });
        let results = run(&flat(600, 600, [255, 255, 255, 255]), None, &corner);
        assert_eq!(
            find(&results, CheckId::FacePosition).unwrap().status,
            CheckStatus::Warn
        );
        let head = find(&results, CheckId::HeadRatio).unwrap();
        assert_eq!(head.message, "head_ratio.too_small");
    }

    #[test]
    fn critical_only_with_fail() {
        let meta = FileMetadata::new(10, "image/gif");
        let results = run(&flat(300, 500, [0, 0, 0, 255]), Some(&meta), &present());
        for r in &results {
            assert_eq!(r.critical, r.status == CheckStatus::Fail, "{:?}", r.id);
        }
    }

    #[test]
    fn measurement_display() {
        assert_eq!(Measurement::Ratio(0.754).to_string(), "0.75");
        assert_eq!(
            Measurement::Dimensions {
                width: 600,
                height: 800
            }
            .to_string(),
            "600x800"
        );
        assert_eq!(Measurement::Kilobytes(53.96).to_string(), "54.0 KB");
        assert_eq!(Measurement::Millimetres(30.6).to_string(), "~31mm");
    }
}
