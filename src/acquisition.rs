//! Image acquisition from a camera or gallery.
//!
//! The workflow only needs a file handle back. Returning `Ok(None)` means the
//! user cancelled and leaves the workflow untouched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::artifact::{ArtifactKind, CaptureSource, CapturedArtifact};

/// Errors that can occur while acquiring an image.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Not an image: {path} ({detected})")]
    NotAnImage { path: PathBuf, detected: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which camera lens a capture prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    Front,
    Rear,
}

/// A request for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub kind: ArtifactKind,
    pub source: CaptureSource,
    pub facing: CameraFacing,
}

impl CaptureRequest {
    /// Identity document from the given source, rear camera when using the camera.
    pub fn document(source: CaptureSource) -> Self {
        Self {
            kind: ArtifactKind::Document,
            source,
            facing: CameraFacing::Rear,
        }
    }

    /// Live selfie from the front camera.
    pub fn selfie() -> Self {
        Self {
            kind: ArtifactKind::Selfie,
            source: CaptureSource::Camera,
            facing: CameraFacing::Front,
        }
    }
}

/// Supplies captured images.
///
/// Camera-backed implementations should open the lens named by
/// [`CaptureRequest::facing`].
#[async_trait]
pub trait ImageAcquisition: Send + Sync {
    async fn acquire(
        &self,
        request: CaptureRequest,
    ) -> Result<Option<CapturedArtifact>, AcquisitionError>;
}

/// Acquisition backed by image files already on disk.
///
/// Each artifact kind maps to at most one path. A kind without a path behaves
/// like a cancelled capture.
#[derive(Debug, Clone, Default)]
pub struct FileAcquisition {
    document: Option<PathBuf>,
    selfie: Option<PathBuf>,
}

impl FileAcquisition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.document = Some(path.into());
        self
    }

    pub fn with_selfie(mut self, path: impl Into<PathBuf>) -> Self {
        self.selfie = Some(path.into());
        self
    }

    fn path_for(&self, kind: ArtifactKind) -> Option<&Path> {
        match kind {
            ArtifactKind::Document => self.document.as_deref(),
            ArtifactKind::Selfie => self.selfie.as_deref(),
        }
    }
}

/// Check a file's magic bytes and require an image type.
fn ensure_image(path: &Path) -> Result<(), AcquisitionError> {
    match infer::get_from_path(path)? {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(()),
        Some(kind) => Err(AcquisitionError::NotAnImage {
            path: path.to_path_buf(),
            detected: kind.mime_type().to_string(),
        }),
        None => Err(AcquisitionError::NotAnImage {
            path: path.to_path_buf(),
            detected: "unknown".to_string(),
        }),
    }
}

#[async_trait]
impl ImageAcquisition for FileAcquisition {
    async fn acquire(
        &self,
        request: CaptureRequest,
    ) -> Result<Option<CapturedArtifact>, AcquisitionError> {
        let Some(path) = self.path_for(request.kind) else {
            tracing::debug!(kind = %request.kind, "No file configured, treating as cancelled");
            return Ok(None);
        };

        let owned = path.to_path_buf();
        let checked = owned.clone();
        tokio::task::spawn_blocking(move || ensure_image(&checked))
            .await
            .map_err(|e| AcquisitionError::Io(std::io::Error::other(e)))??;

        tracing::debug!(
            kind = %request.kind,
            source = %request.source,
            facing = ?request.facing,
            path = %owned.display(),
            "Acquired image"
        );
        Ok(Some(CapturedArtifact::new(
            request.kind,
            owned,
            request.source,
        )))
    }
}
