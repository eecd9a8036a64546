//! Submission of a completed capture session to the verification service.
//!
//! Each call posts at most once. Retrying is always a fresh call by the user.

use std::sync::Arc;

use crate::artifact::ArtifactKind;
use crate::error::{SubmissionFailure, ValidationError};
use crate::session::CaptureSession;
use crate::transport::{MultipartPayload, Transport};

/// Multipart field names expected by the verification service.
pub const FIELD_ID_TYPE: &str = "id_type";
pub const FIELD_RAW_TEXT: &str = "raw_text";
pub const FIELD_ID_IMAGE: &str = "id_image";
pub const FIELD_SELFIE: &str = "selfie";

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success,
    Failure(SubmissionFailure),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success)
    }

    /// Map an HTTP status to an outcome. Only 200 counts as success.
    pub fn from_status(status: u16) -> Self {
        if status == 200 {
            SubmissionOutcome::Success
        } else {
            SubmissionOutcome::Failure(SubmissionFailure::ServerRejected { status })
        }
    }
}

/// Check that a session has both artifacts.
pub fn ensure_ready(session: &CaptureSession) -> Result<(), ValidationError> {
    if session.id_artifact().is_none() {
        return Err(ValidationError::MissingArtifact(ArtifactKind::Document));
    }
    if session.selfie_artifact().is_none() {
        return Err(ValidationError::MissingArtifact(ArtifactKind::Selfie));
    }
    Ok(())
}

/// Build the request payload for a session.
///
/// Fails when either artifact is missing.
pub fn build_payload(session: &CaptureSession) -> Result<MultipartPayload, ValidationError> {
    let id_artifact = session
        .id_artifact()
        .ok_or(ValidationError::MissingArtifact(ArtifactKind::Document))?;
    let selfie_artifact = session
        .selfie_artifact()
        .ok_or(ValidationError::MissingArtifact(ArtifactKind::Selfie))?;

    Ok(MultipartPayload::new()
        .field(FIELD_ID_TYPE, session.document_type().label())
        .field(FIELD_RAW_TEXT, session.raw_text())
        .file(FIELD_ID_IMAGE, id_artifact.clone())
        .file(FIELD_SELFIE, selfie_artifact.clone()))
}

/// Validates, uploads and maps the result of a verification submission.
#[derive(Clone)]
pub struct SubmissionPipeline {
    transport: Arc<dyn Transport>,
    endpoint: String,
}

impl SubmissionPipeline {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit the session's artifacts and classification.
    ///
    /// Validation errors are returned before any network call is made.
    pub async fn submit(
        &self,
        session: &CaptureSession,
    ) -> Result<SubmissionOutcome, ValidationError> {
        let payload = build_payload(session)?;

        tracing::info!(
            session = %session.id(),
            endpoint = %self.endpoint,
            id_type = %session.document_type(),
            "Submitting verification"
        );

        let outcome = match self.transport.post_multipart(&self.endpoint, &payload).await {
            Ok(status) => SubmissionOutcome::from_status(status),
            Err(e) => SubmissionOutcome::Failure(SubmissionFailure::NetworkError(e.to_string())),
        };

        match &outcome {
            SubmissionOutcome::Success => {
                tracing::info!(session = %session.id(), "Verification submitted")
            }
            SubmissionOutcome::Failure(failure) => {
                tracing::warn!(session = %session.id(), %failure, "Verification submission failed")
            }
        }
        Ok(outcome)
    }
}
