//! Capture session: the artifacts of one verification attempt and the text
//! derived from the id document.
//!
//! Extraction is split in two so the OCR call can run without holding the
//! session. [`CaptureSession::set_id_artifact`] hands out an
//! [`ExtractionTicket`]; running the ticket produces a
//! [`CompletedExtraction`], which is applied with
//! [`CaptureSession::complete_extraction`]. A completion whose artifact is no
//! longer the current id artifact is dropped, so a slow OCR call can never
//! overwrite the result of a newer capture.

use serde::Serialize;
use uuid::Uuid;

use crate::artifact::{ArtifactId, CapturedArtifact};
use crate::classifier::{classify, DocumentType};
use crate::ocr::{OcrEngine, OcrError};

/// Text extracted from the current id artifact and its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    raw_text: String,
    document_type: DocumentType,
}

impl ExtractionResult {
    /// Build a result from recognised text; the type is always derived from it.
    pub fn from_text(raw_text: String) -> Self {
        let document_type = classify(&raw_text);
        Self {
            raw_text,
            document_type,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }
}

/// Progress of extraction for the current id artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// No id artifact yet.
    NotStarted,
    /// OCR is running for this artifact.
    Pending(ArtifactId),
    /// OCR succeeded; the result is stored.
    Completed,
    /// OCR failed. Classification falls back to unknown with empty text.
    Degraded(String),
}

impl ExtractionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ExtractionStatus::Pending(_))
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ExtractionStatus::Completed | ExtractionStatus::Degraded(_)
        )
    }
}

/// Permission to run OCR for one specific id artifact.
#[derive(Debug, Clone)]
pub struct ExtractionTicket {
    artifact: CapturedArtifact,
}

impl ExtractionTicket {
    pub fn artifact(&self) -> &CapturedArtifact {
        &self.artifact
    }

    /// Run OCR on the ticket's artifact.
    pub async fn run(self, ocr: &dyn OcrEngine) -> CompletedExtraction {
        let outcome = ocr.recognize(&self.artifact).await;
        CompletedExtraction {
            artifact_id: self.artifact.id(),
            outcome,
        }
    }
}

/// Outcome of an OCR call, waiting to be applied to the session.
#[derive(Debug)]
pub struct CompletedExtraction {
    artifact_id: ArtifactId,
    outcome: Result<String, OcrError>,
}

impl CompletedExtraction {
    pub fn new(artifact_id: ArtifactId, outcome: Result<String, OcrError>) -> Self {
        Self {
            artifact_id,
            outcome,
        }
    }

    pub fn artifact_id(&self) -> ArtifactId {
        self.artifact_id
    }
}

/// State of a single verification attempt.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    id: Uuid,
    id_artifact: Option<CapturedArtifact>,
    selfie_artifact: Option<CapturedArtifact>,
    extraction: Option<ExtractionResult>,
    status: ExtractionStatus,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            id_artifact: None,
            selfie_artifact: None,
            extraction: None,
            status: ExtractionStatus::NotStarted,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn id_artifact(&self) -> Option<&CapturedArtifact> {
        self.id_artifact.as_ref()
    }

    pub fn selfie_artifact(&self) -> Option<&CapturedArtifact> {
        self.selfie_artifact.as_ref()
    }

    pub fn extraction(&self) -> Option<&ExtractionResult> {
        self.extraction.as_ref()
    }

    pub fn extraction_status(&self) -> &ExtractionStatus {
        &self.status
    }

    /// Text of the current extraction, empty when there is none.
    pub fn raw_text(&self) -> &str {
        self.extraction
            .as_ref()
            .map(|e| e.raw_text())
            .unwrap_or_default()
    }

    /// Type of the current extraction, unknown when there is none.
    pub fn document_type(&self) -> DocumentType {
        self.extraction
            .as_ref()
            .map(|e| e.document_type())
            .unwrap_or_default()
    }

    pub fn has_both_artifacts(&self) -> bool {
        self.id_artifact.is_some() && self.selfie_artifact.is_some()
    }

    /// Replace the id artifact and invalidate any extraction.
    ///
    /// The returned ticket is the only way to produce a result the session
    /// will accept for this artifact.
    pub fn set_id_artifact(&mut self, artifact: CapturedArtifact) -> ExtractionTicket {
        if let ExtractionStatus::Pending(previous) = &self.status {
            tracing::debug!(session = %self.id, previous = %previous, "Superseding in-flight extraction");
        }

        self.status = ExtractionStatus::Pending(artifact.id());
        self.extraction = None;
        self.id_artifact = Some(artifact.clone());

        ExtractionTicket { artifact }
    }

    /// Replace the selfie artifact.
    pub fn set_selfie_artifact(&mut self, artifact: CapturedArtifact) {
        self.selfie_artifact = Some(artifact);
    }

    /// Apply an OCR outcome. Returns false when the outcome is stale.
    pub fn complete_extraction(&mut self, completed: CompletedExtraction) -> bool {
        let current = self.id_artifact.as_ref().map(|a| a.id());
        let pending = matches!(&self.status, ExtractionStatus::Pending(id) if *id == completed.artifact_id);

        if current != Some(completed.artifact_id) || !pending {
            tracing::debug!(
                session = %self.id,
                artifact = %completed.artifact_id,
                "Discarding stale extraction result"
            );
            return false;
        }

        match completed.outcome {
            Ok(text) => {
                let result = ExtractionResult::from_text(text);
                tracing::info!(
                    session = %self.id,
                    artifact = %completed.artifact_id,
                    document_type = %result.document_type(),
                    chars = result.raw_text().len(),
                    "Extraction completed"
                );
                self.extraction = Some(result);
                self.status = ExtractionStatus::Completed;
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.id,
                    artifact = %completed.artifact_id,
                    error = %e,
                    "Extraction failed, continuing with unknown document type"
                );
                self.extraction = None;
                self.status = ExtractionStatus::Degraded(e.to_string());
            }
        }
        true
    }

    /// Run OCR on the current id artifact and apply the result.
    ///
    /// Does nothing when there is no id artifact.
    pub async fn run_extraction(&mut self, ocr: &dyn OcrEngine) {
        let Some(artifact) = self.id_artifact.clone() else {
            return;
        };
        self.status = ExtractionStatus::Pending(artifact.id());
        self.extraction = None;

        let completed = ExtractionTicket { artifact }.run(ocr).await;
        self.complete_extraction(completed);
    }
}
