use thiserror::Error;

/// Errors returned by photocheck operations.
///
/// Per-check outcomes are never errors: they are reported as
/// [`crate::CheckResult`] values inside a [`crate::Verdict`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhotoCheckError {
    /// The input bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    /// The source image has a zero width or height.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// A raw RGBA buffer does not match the declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected} for the given dimensions")]
    BufferSizeMismatch {
        /// Bytes required by `width × height × 4`.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// A resample target has a zero width or height.
    #[error("sample dimensions must be > 0, got {width}x{height}")]
    InvalidDimension {
        /// Requested sample width.
        width: u32,
        /// Requested sample height.
        height: u32,
    },

    /// Pixel data could not be sampled for analysis.
    #[error("image analysis failed: {0}")]
    AnalysisFailure(String),

    /// The external face detector is missing or failed.
    #[error("face detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// The normalization target size is unusable.
    #[error("target size must be in 1..=8192, got {0}")]
    InvalidTargetSize(u32),

    /// The normalization margin factor is outside `(0.0, 1.0]`.
    #[error("margin factor must be in (0.0, 1.0], got {0}")]
    InvalidMarginFactor(f32),

    /// A session operation was requested from a state that does not allow it.
    #[error("cannot {action} while session is {from}")]
    InvalidTransition {
        /// Name of the state the session was in.
        from: &'static str,
        /// Name of the rejected operation.
        action: &'static str,
    },
}

impl PhotoCheckError {
    /// Whether this error belongs to the invalid-input family.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PhotoCheckError::DecodeError(_)
                | PhotoCheckError::ZeroDimensions
                | PhotoCheckError::BufferSizeMismatch { .. }
        )
    }

    /// Whether this error is a configuration error (unsupported size or margin).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PhotoCheckError::InvalidTargetSize(_) | PhotoCheckError::InvalidMarginFactor(_)
        )
    }
}
