//! Error types shared across the verification workflow.

use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::artifact::ArtifactKind;

/// Local validation failures. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing artifact: please capture the {0}")]
    MissingArtifact(ArtifactKind),
}

/// Why a submission attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionFailure {
    #[error("Submission rejected by server (HTTP {status})")]
    ServerRejected { status: u16 },

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Errors returned to the caller of a workflow action.
///
/// None of these change the workflow state.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Image acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),
}

pub type Result<T, E = WorkflowError> = std::result::Result<T, E>;
