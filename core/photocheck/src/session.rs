use std::fmt;
use std::sync::Arc;

use log::info;

use crate::classifier::Verdict;
use crate::error::PhotoCheckError;
use crate::normalize::{self, NormalizedArtifact};
use crate::raster::{FileMetadata, RasterImage};
use crate::PhotoChecker;

/// Lifecycle of one photo in an interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nothing loaded.
    Empty,
    /// A source image is loaded.
    Loaded,
    /// The source has a verdict.
    Analyzed,
    /// A normalized artifact exists.
    Fixed,
    /// The artifact was resampled for export.
    Exported,
}

impl SessionState {
    /// Lower-case state name.
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Loaded => "loaded",
            SessionState::Analyzed => "analyzed",
            SessionState::Fixed => "fixed",
            SessionState::Exported => "exported",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drives `Empty → Loaded → Analyzed → [Fixed] → Exported`.
///
/// Every product (verdict, artifact, export) is held behind an `Arc` and
/// replaced wholesale; a repeated [`fix`](Self::fix) swaps in a new artifact
/// without touching one a reader already holds.
pub struct PhotoSession {
    checker: PhotoChecker,
    state: SessionState,
    source: Option<Arc<RasterImage>>,
    metadata: Option<FileMetadata>,
    verdict: Option<Arc<Verdict>>,
    artifact: Option<Arc<NormalizedArtifact>>,
    exported: Option<Arc<RasterImage>>,
}

impl PhotoSession {
    /// Empty session using `checker` for analysis and normalization.
    pub fn new(checker: PhotoChecker) -> Self {
        Self {
            checker,
            state: SessionState::Empty,
            source: None,
            metadata: None,
            verdict: None,
            artifact: None,
            exported: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Loaded source image.
    pub fn source(&self) -> Option<&Arc<RasterImage>> {
        self.source.as_ref()
    }

    /// File metadata supplied on load.
    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.metadata.as_ref()
    }

    /// Latest verdict.
    pub fn verdict(&self) -> Option<&Arc<Verdict>> {
        self.verdict.as_ref()
    }

    /// Latest normalized artifact.
    pub fn artifact(&self) -> Option<&Arc<NormalizedArtifact>> {
        self.artifact.as_ref()
    }

    /// Latest export.
    pub fn exported(&self) -> Option<&Arc<RasterImage>> {
        self.exported.as_ref()
    }

    /// Load a source image. Only valid from [`SessionState::Empty`].
    pub fn load(
        &mut self,
        image: RasterImage,
        metadata: Option<FileMetadata>,
    ) -> Result<(), PhotoCheckError> {
        self.expect(&[SessionState::Empty], "load")?;
        info!("session: loaded {}x{} image", image.width(), image.height());
        self.source = Some(Arc::new(image));
        self.metadata = metadata;
        self.state = SessionState::Loaded;
        Ok(())
    }

    /// Analyze the loaded source. Re-analysis from [`SessionState::Analyzed`] is allowed.
    pub fn analyze(&mut self) -> Result<Arc<Verdict>, PhotoCheckError> {
        self.expect(&[SessionState::Loaded, SessionState::Analyzed], "analyze")?;
        let source = self.loaded_source("analyze")?;
        let verdict = Arc::new(self.checker.analyze(&source, self.metadata.as_ref())?);
        self.verdict = Some(Arc::clone(&verdict));
        self.state = SessionState::Analyzed;
        Ok(verdict)
    }

    /// Normalize the source. Repeating the fix replaces the previous artifact.
    pub fn fix(&mut self) -> Result<Arc<NormalizedArtifact>, PhotoCheckError> {
        self.expect(&[SessionState::Analyzed, SessionState::Fixed], "fix")?;
        let source = self.loaded_source("fix")?;
        let artifact = Arc::new(self.checker.normalize(&source)?);
        self.artifact = Some(Arc::clone(&artifact));
        self.exported = None;
        self.state = SessionState::Fixed;
        Ok(artifact)
    }

    /// Resample the artifact to the export size.
    ///
    /// From [`SessionState::Analyzed`] the source is fixed first.
    pub fn export(&mut self) -> Result<Arc<RasterImage>, PhotoCheckError> {
        self.expect(
            &[
                SessionState::Analyzed,
                SessionState::Fixed,
                SessionState::Exported,
            ],
            "export",
        )?;
        let current = match self.state {
            SessionState::Fixed | SessionState::Exported => self.artifact.clone(),
            _ => None,
        };
        let artifact = match current {
            Some(artifact) => artifact,
            None => self.fix()?,
        };
        let exported = Arc::new(normalize::export(&artifact));
        self.exported = Some(Arc::clone(&exported));
        self.state = SessionState::Exported;
        Ok(exported)
    }

    /// Drop everything and return to [`SessionState::Empty`].
    pub fn reset(&mut self) {
        self.source = None;
        self.metadata = None;
        self.verdict = None;
        self.artifact = None;
        self.exported = None;
        self.state = SessionState::Empty;
    }

    fn expect(&self, allowed: &[SessionState], action: &'static str) -> Result<(), PhotoCheckError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PhotoCheckError::InvalidTransition {
                from: self.state.name(),
                action,
            })
        }
    }

    fn loaded_source(&self, action: &'static str) -> Result<Arc<RasterImage>, PhotoCheckError> {
        self.source
            .clone()
            .ok_or(PhotoCheckError::InvalidTransition {
                from: self.state.name(),
                action,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::OverallStatus;
    use image::{Rgba, RgbaImage};

    fn flat(w: u32, h: u32) -> RasterImage {
        RasterImage::from_buffer(RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255])))
    }

    fn session() -> PhotoSession {
        PhotoSession::new(PhotoChecker::new())
    }

    #[test]
    fn happy_path_reaches_exported() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Empty);
        s.load(flat(300, 400), None).unwrap();
        assert_eq!(s.state(), SessionState::Loaded);
        let verdict = s.analyze().unwrap();
        assert_eq!(verdict.overall, OverallStatus::Fail);
        assert_eq!(s.state(), SessionState::Analyzed);
        let artifact = s.fix().unwrap();
        assert_eq!(artifact.size(), 600);
        assert_eq!(s.state(), SessionState::Fixed);
        let out = s.export().unwrap();
        assert_eq!((out.width(), out.height()), (600, 600));
        assert_eq!(s.state(), SessionState::Exported);
    }

    #[test]
    fn out_of_order_actions_are_rejected() {
        let mut s = session();
        assert_eq!(
            s.analyze().unwrap_err(),
            PhotoCheckError::InvalidTransition {
                from: "empty",
                action: "analyze"
            }
        );
        s.load(flat(10, 10), None).unwrap();
        assert!(s.fix().is_err());
        assert!(s.export().is_err());
        assert!(s.load(flat(10, 10), None).is_err());
    }

    #[test]
    fn repeated_fix_replaces_artifact() {
        let mut s = session();
        s.load(flat(50, 50), None).unwrap();
        s.analyze().unwrap();
        let first = s.fix().unwrap();
        let second = s.fix().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(s.artifact().unwrap(), &second));
        // A reader holding the old artifact still sees it intact.
        assert_eq!(first.size(), 600);
    }

    #[test]
    fn export_from_analyzed_fixes_first() {
        let mut s = session();
        s.load(flat(50, 50), None).unwrap();
        s.analyze().unwrap();
        s.export().unwrap();
        assert!(s.artifact().is_some());
        assert_eq!(s.state(), SessionState::Exported);
    }

    #[test]
    fn reset_from_any_state() {
        let mut s = session();
        s.load(flat(20, 20), None).unwrap();
        s.analyze().unwrap();
        s.fix().unwrap();
        s.reset();
        assert_eq!(s.state(), SessionState::Empty);
        assert!(s.source().is_none());
        assert!(s.verdict().is_none());
        assert!(s.artifact().is_none());
        s.load(flat(20, 20), None).unwrap();
        assert_eq!(s.state(), SessionState::Loaded);
    }
}
