//! Captured image artifacts.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Camera,
    Gallery,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Camera => f.write_str("camera"),
            CaptureSource::Gallery => f.write_str("gallery"),
        }
    }
}

/// Role of an artifact within a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Identity document photo.
    Document,
    /// Live selfie.
    Selfie,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Document => f.write_str("id document"),
            ArtifactKind::Selfie => f.write_str("selfie"),
        }
    }
}

/// Identity of a single capture. Two captures of the same file are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reference to a locally stored image.
///
/// Artifacts are never mutated; a re-capture produces a new artifact with a new id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedArtifact {
    id: ArtifactId,
    kind: ArtifactKind,
    path: PathBuf,
    source: CaptureSource,
    captured_at: DateTime<Utc>,
}

impl CapturedArtifact {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>, source: CaptureSource) -> Self {
        Self {
            id: ArtifactId::new(),
            kind,
            path: path.into(),
            source,
            captured_at: Utc::now(),
        }
    }

    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> CaptureSource {
        self.source
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// File name used when uploading, falling back to the kind.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| match self.kind {
                ArtifactKind::Document => "id_image".to_string(),
                ArtifactKind::Selfie => "selfie".to_string(),
            })
    }
}
