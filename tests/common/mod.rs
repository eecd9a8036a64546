//! Test doubles for the workflow collaborators.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use idcheck::acquisition::{AcquisitionError, CaptureRequest};
use idcheck::{
    ArtifactKind, CapturedArtifact, ImageAcquisition, MultipartPayload, OcrEngine, OcrError,
    SubmissionPipeline, Transport, TransportError, WorkflowController,
};

/// Acquisition that hands out queued paths per artifact kind.
/// An empty queue or a queued `None` is a cancelled capture.
#[derive(Default)]
pub struct QueueAcquisition {
    documents: Mutex<VecDeque<Option<PathBuf>>>,
    selfies: Mutex<VecDeque<Option<PathBuf>>>,
    requests: Mutex<Vec<CaptureRequest>>,
}

impl QueueAcquisition {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_document(&self, path: Option<&str>) {
        self.documents
            .lock()
            .unwrap()
            .push_back(path.map(PathBuf::from));
    }

    pub fn push_selfie(&self, path: Option<&str>) {
        self.selfies
            .lock()
            .unwrap()
            .push_back(path.map(PathBuf::from));
    }

    pub fn requests(&self) -> Vec<CaptureRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageAcquisition for QueueAcquisition {
    async fn acquire(
        &self,
        request: CaptureRequest,
    ) -> Result<Option<CapturedArtifact>, AcquisitionError> {
        self.requests.lock().unwrap().push(request);
        let queue = match request.kind {
            ArtifactKind::Document => &self.documents,
            ArtifactKind::Selfie => &self.selfies,
        };
        let next = queue.lock().unwrap().pop_front().flatten();
        Ok(next.map(|path| CapturedArtifact::new(request.kind, path, request.source)))
    }
}

#[derive(Clone)]
struct Script {
    text: Option<String>,
    gate: Option<Arc<Notify>>,
    panics: bool,
}

/// OCR engine answering from a per-path script.
/// Gated entries wait for the returned `Notify` before answering.
#[derive(Default)]
pub struct ScriptedOcr {
    scripts: Mutex<HashMap<PathBuf, Script>>,
    calls: AtomicUsize,
}

impl ScriptedOcr {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn text(&self, path: &str, text: &str) {
        self.insert(path, Some(text), None);
    }

    pub fn fail(&self, path: &str) {
        self.insert(path, None, None);
    }

    pub fn gated(&self, path: &str, text: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.insert(path, Some(text), Some(gate.clone()));
        gate
    }

    /// Engine panics while recognising this path.
    pub fn panics(&self, path: &str) {
        self.scripts.lock().unwrap().insert(
            PathBuf::from(path),
            Script {
                text: None,
                gate: None,
                panics: true,
            },
        );
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn insert(&self, path: &str, text: Option<&str>, gate: Option<Arc<Notify>>) {
        self.scripts.lock().unwrap().insert(
            PathBuf::from(path),
            Script {
                text: text.map(str::to_string),
                gate,
                panics: false,
            },
        );
    }

    fn script_for(&self, path: &Path) -> Option<Script> {
        self.scripts.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl OcrEngine for ScriptedOcr {
    async fn recognize(&self, artifact: &CapturedArtifact) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script_for(artifact.path()).ok_or_else(|| {
            OcrError::RecognitionFailed(format!("no script for {}", artifact.path().display()))
        })?;

        if script.panics {
            panic!("ocr engine crashed on {}", artifact.path().display());
        }
        if let Some(gate) = script.gate {
            gate.notified().await;
        }

        script
            .text
            .ok_or_else(|| OcrError::RecognitionFailed("engine error".to_string()))
    }
}

/// Transport replying with queued results; `None` is a network failure.
/// Replies 200 once the queue is empty.
#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<VecDeque<Option<u16>>>,
    payloads: Mutex<Vec<MultipartPayload>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: Option<u16>) {
        self.replies.lock().unwrap().push_back(status);
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn last_payload(&self) -> Option<MultipartPayload> {
        self.payloads.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn post_multipart(
        &self,
        _url: &str,
        payload: &MultipartPayload,
    ) -> Result<u16, TransportError> {
        self.payloads.lock().unwrap().push(payload.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(status)) => Ok(status),
            Some(None) => Err(TransportError::Connection("connection reset".to_string())),
            None => Ok(200),
        }
    }
}

pub struct Harness {
    pub acquisition: Arc<QueueAcquisition>,
    pub ocr: Arc<ScriptedOcr>,
    pub transport: Arc<StubTransport>,
    pub controller: WorkflowController,
}

pub fn harness() -> Harness {
    let acquisition = QueueAcquisition::new();
    let ocr = ScriptedOcr::new();
    let transport = StubTransport::new();
    let pipeline = SubmissionPipeline::new(transport.clone(), "http://verify.test/api/kyc/submit");
    let controller = WorkflowController::new(acquisition.clone(), ocr.clone(), pipeline);

    Harness {
        acquisition,
        ocr,
        transport,
        controller,
    }
}

/// Minimal PNG header, enough for magic-byte detection.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];
