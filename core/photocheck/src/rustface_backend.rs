use std::io::Cursor;
use std::path::Path;

use image::imageops;
use log::debug;

use crate::error::PhotoCheckError;
use crate::face_detector::{FaceBounds, FaceDetector};
use crate::raster::RasterImage;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is supplied by the caller, either as bytes or as a file path.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
}

impl RustfaceDetector {
    /// Load a SeetaFace frontal model from memory.
    pub fn from_model_bytes(model: &[u8]) -> Result<Self, PhotoCheckError> {
        let model = rustface::read_model(Cursor::new(model)).map_err(|e| {
            PhotoCheckError::DetectorUnavailable(format!("failed to read SeetaFace model: {e}"))
        })?;
        Ok(Self {
            model,
            min_face_size: 20,
        })
    }

    /// Load a SeetaFace frontal model from disk.
    pub fn from_model_file(path: impl AsRef<Path>) -> Result<Self, PhotoCheckError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            PhotoCheckError::DetectorUnavailable(format!("{}: {e}", path.display()))
        })?;
        Self::from_model_bytes(&bytes)
    }

    /// Smallest face side in pixels the detector looks for (default: 20).
    pub fn min_face_size(mut self, size: u32) -> Self {
        self.min_face_size = size;
        self
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image: &RasterImage) -> Result<Vec<FaceBounds>, PhotoCheckError> {
        let (width, height) = (image.width(), image.height());
        if width < self.min_face_size || height < self.min_face_size {
            return Err(PhotoCheckError::DetectorUnavailable(format!(
                "{width}x{height} is below the minimum face size {}",
                self.min_face_size
            )));
        }

        let gray = imageops::grayscale(image.as_rgba());

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));
        debug!("rustface found {} face(s) in {width}x{height}", faces.len());

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBounds {
                    x: bbox.x() as f64,
                    y: bbox.y() as f64,
                    width: bbox.width() as f64,
                    height: bbox.height() as f64,
                    confidence: face.score(),
                }
            })
            .collect())
    }
}
