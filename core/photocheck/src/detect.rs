use log::{info, warn};

use crate::face_detector::{
    DetectionMethod, DetectionReason, FaceBounds, FaceDetection, FaceDetector,
};
use crate::heuristic::HeuristicFaceDetector;
use crate::raster::RasterImage;

/// Faces covering less than this fraction of the image are rejected as too small.
pub const MIN_FACE_AREA_RATIO: f64 = 0.015;

/// Faces covering more than this fraction of the image are rejected as too large.
pub const MAX_FACE_AREA_RATIO: f64 = 0.6;

/// Run face detection, preferring `external` and falling back to `heuristic`.
///
/// A failing external detector is logged and never reported to the caller.
pub fn detect_face(
    image: &RasterImage,
    external: Option<&dyn FaceDetector>,
    heuristic: &HeuristicFaceDetector,
) -> FaceDetection {
    if let Some(detector) = external {
        match detector.detect(image) {
            Ok(faces) => return interpret_faces(faces, image.width(), image.height()),
            Err(e) => warn!("external face detector failed, using heuristic: {e}"),
        }
    }
    heuristic.detect(image)
}

/// Turn raw detector boxes into a single presence decision.
///
/// Boxes with non-finite coordinates or a non-positive size are discarded.
pub fn interpret_faces(faces: Vec<FaceBounds>, width: u32, height: u32) -> FaceDetection {
    let total = faces.len();
    let faces: Vec<FaceBounds> = faces.into_iter().filter(FaceBounds::is_usable).collect();
    if faces.len() < total {
        warn!("discarded {} unusable face box(es)", total - faces.len());
    }
    let count = faces.len() as u32;
    let mut faces = faces.into_iter();
    let Some(face) = faces.next() else {
        return FaceDetection::new(
            false,
            0,
            0.0,
            DetectionMethod::External,
            DetectionReason::NoFaceDetected,
        );
    };

    if count > 1 {
        return FaceDetection::new(
            false,
            count,
            face.confidence,
            DetectionMethod::External,
            DetectionReason::MultipleFaces,
        );
    }

    let image_area = width as f64 * height as f64;
    let face_ratio = face.area() / image_area;
    let reason = if face_ratio < MIN_FACE_AREA_RATIO {
        DetectionReason::FaceTooSmall
    } else if face_ratio > MAX_FACE_AREA_RATIO {
        DetectionReason::FaceTooLarge
    } else {
        DetectionReason::Detected
    };
    info!(
        "external detector: face ratio {face_ratio:.3}, score {:.2}, {reason:?}",
        face.confidence
    );

    FaceDetection::new(
        reason == DetectionReason::Detected,
        1,
        face.confidence,
        DetectionMethod::External,
        reason,
    )
    .with_bounding_box(face)
}
