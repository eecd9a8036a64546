//! Workflow controller: sequences captures, extraction and submission for a
//! single verification attempt.
//!
//! The controller owns the live [`CaptureSession`]. Every mutation goes through
//! one of its methods, which take `&mut self`, so user actions are serialized.
//! Extraction runs as a spawned task that re-enters the session only through
//! [`CaptureSession::complete_extraction`]; results for an id artifact that has
//! since been replaced are dropped there.
//!
//! State changes are published on a `watch` channel for presentation.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::acquisition::{CaptureRequest, ImageAcquisition};
use crate::artifact::{ArtifactId, CaptureSource};
use crate::error::Result;
use crate::ocr::{OcrEngine, OcrError};
use crate::session::{CaptureSession, CompletedExtraction, ExtractionStatus, ExtractionTicket};
use crate::submission::{ensure_ready, SubmissionOutcome, SubmissionPipeline};

/// Observable state of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    IdCaptured,
    Extracting,
    Classified,
    SelfieCaptured,
    Submitting,
    Succeeded,
    Failed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::IdCaptured => "id captured",
            WorkflowState::Extracting => "extracting",
            WorkflowState::Classified => "classified",
            WorkflowState::SelfieCaptured => "selfie captured",
            WorkflowState::Submitting => "submitting",
            WorkflowState::Succeeded => "succeeded",
            WorkflowState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Resting state implied by the session contents.
///
/// A selfie without an id document leaves the workflow idle; it is merged
/// once the document arrives.
fn settled_state(session: &CaptureSession) -> WorkflowState {
    match (session.id_artifact(), session.selfie_artifact()) {
        (None, _) => WorkflowState::Idle,
        (Some(_), _) if session.extraction_status().is_pending() => WorkflowState::Extracting,
        (Some(_), None) => WorkflowState::Classified,
        (Some(_), Some(_)) => WorkflowState::SelfieCaptured,
    }
}

fn publish_state(state_tx: &watch::Sender<WorkflowState>, state: WorkflowState) {
    let previous = state_tx.send_replace(state);
    if previous != state {
        tracing::debug!(from = %previous, to = %state, "Workflow state changed");
    }
}

/// Apply an extraction outcome and publish the resulting state if it was current.
async fn apply_extraction(
    session: &Mutex<CaptureSession>,
    state_tx: &watch::Sender<WorkflowState>,
    completed: CompletedExtraction,
) {
    let mut session = session.lock().await;
    if session.complete_extraction(completed) {
        publish_state(state_tx, settled_state(&session));
    }
}

/// OCR task failure, recorded as a degraded extraction.
fn task_failure(artifact_id: ArtifactId, err: tokio::task::JoinError) -> CompletedExtraction {
    tracing::error!(artifact = %artifact_id, error = %err, "Extraction task failed");
    CompletedExtraction::new(
        artifact_id,
        Err(OcrError::RecognitionFailed(format!("extraction task failed: {}", err))),
    )
}

/// Drives one verification attempt at a time.
pub struct WorkflowController {
    acquisition: Arc<dyn ImageAcquisition>,
    ocr: Arc<dyn OcrEngine>,
    pipeline: SubmissionPipeline,
    session: Arc<Mutex<CaptureSession>>,
    state_tx: Arc<watch::Sender<WorkflowState>>,
    /// Extraction task for the current id document. Superseded tasks are detached.
    extraction: Option<(ArtifactId, JoinHandle<()>)>,
    last_outcome: Option<SubmissionOutcome>,
}

impl WorkflowController {
    pub fn new(
        acquisition: Arc<dyn ImageAcquisition>,
        ocr: Arc<dyn OcrEngine>,
        pipeline: SubmissionPipeline,
    ) -> Self {
        let (state_tx, _) = watch::channel(WorkflowState::Idle);
        Self {
            acquisition,
            ocr,
            pipeline,
            session: Arc::new(Mutex::new(CaptureSession::new())),
            state_tx: Arc::new(state_tx),
            extraction: None,
            last_outcome: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> WorkflowState {
        *self.state_tx.borrow()
    }

    /// Receive state changes.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_tx.subscribe()
    }

    /// Copy of the live session.
    pub async fn snapshot(&self) -> CaptureSession {
        self.session.lock().await.clone()
    }

    /// Outcome of the most recent submission, if any.
    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }

    fn publish(&self, state: WorkflowState) {
        publish_state(&self.state_tx, state);
    }

    /// Capture the identity document and start extracting its text.
    ///
    /// A cancelled capture leaves everything unchanged. Re-capturing replaces
    /// the previous document and restarts extraction from any state.
    pub async fn capture_id(&mut self, source: CaptureSource) -> Result<WorkflowState> {
        let Some(artifact) = self
            .acquisition
            .acquire(CaptureRequest::document(source))
            .await?
        else {
            tracing::debug!("Id capture cancelled");
            return Ok(self.state());
        };

        let ticket = {
            let mut session = self.session.lock().await;
            tracing::info!(
                session = %session.id(),
                artifact = %artifact.id(),
                %source,
                captured_at = %artifact.captured_at(),
                "Id document captured"
            );
            session.set_id_artifact(artifact)
        };
        self.publish(WorkflowState::IdCaptured);
        self.publish(WorkflowState::Extracting);
        self.spawn_extraction(ticket);

        Ok(WorkflowState::Extracting)
    }

    fn spawn_extraction(&mut self, ticket: ExtractionTicket) {
        let ocr = Arc::clone(&self.ocr);
        let session = Arc::clone(&self.session);
        let state_tx = Arc::clone(&self.state_tx);

        let artifact_id = ticket.artifact().id();

        // OCR runs in its own task so a panicking engine still completes the extraction.
        let handle = tokio::spawn(async move {
            let recognition = tokio::spawn(async move { ticket.run(ocr.as_ref()).await });
            let completed = match recognition.await {
                Ok(completed) => completed,
                Err(e) => task_failure(artifact_id, e),
            };
            apply_extraction(&session, &state_tx, completed).await;
        });

        if let Some((previous, _)) = self.extraction.replace((artifact_id, handle)) {
            tracing::debug!(artifact = %previous, "Detached superseded extraction task");
        }
    }

    /// Capture the live selfie. Independent of document state.
    pub async fn capture_selfie(&mut self) -> Result<WorkflowState> {
        let Some(artifact) = self.acquisition.acquire(CaptureRequest::selfie()).await? else {
            tracing::debug!("Selfie capture cancelled");
            return Ok(self.state());
        };

        let mut session = self.session.lock().await;
        tracing::info!(
            session = %session.id(),
            artifact = %artifact.id(),
            captured_at = %artifact.captured_at(),
            "Selfie captured"
        );
        session.set_selfie_artifact(artifact);
        // Published under the lock so a finishing extraction cannot interleave.
        let state = settled_state(&session);
        self.publish(state);

        Ok(state)
    }

    /// Wait for the extraction of the current id document, if one is running.
    ///
    /// Extractions of superseded documents are never awaited; their results
    /// are discarded when they land.
    pub async fn settle(&mut self) {
        let current = match self.session.lock().await.extraction_status() {
            ExtractionStatus::Pending(id) => Some(*id),
            _ => None,
        };

        let Some((artifact_id, handle)) = self.extraction.take() else {
            return;
        };
        if current != Some(artifact_id) {
            return;
        }
        if let Err(e) = handle.await {
            let completed = task_failure(artifact_id, e);
            apply_extraction(&self.session, &self.state_tx, completed).await;
        }
    }

    /// Submit the current attempt.
    ///
    /// Queues behind the current document's extraction. Missing artifacts are reported as
    /// a validation error without a state change. On success the session is
    /// discarded; on failure the artifacts are kept so the user can retry.
    pub async fn submit(&mut self) -> Result<SubmissionOutcome> {
        ensure_ready(&*self.session.lock().await)?;
        self.settle().await;

        let mut session = self.session.lock().await;
        self.publish(WorkflowState::Submitting);
        let outcome = self.pipeline.submit(&session).await?;

        match &outcome {
            SubmissionOutcome::Success => {
                *session = CaptureSession::new();
                self.publish(WorkflowState::Succeeded);
            }
            SubmissionOutcome::Failure(_) => {
                self.publish(WorkflowState::Failed);
                self.publish(settled_state(&session));
            }
        }
        drop(session);

        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }
}
