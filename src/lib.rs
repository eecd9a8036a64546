//! Identity verification capture workflow.
//!
//! Captures an identity document and a live selfie, extracts text from the
//! document with OCR, classifies the document type from that text and submits
//! everything to a verification service.
//!
//! - [`classifier`]: text to [`DocumentType`]
//! - [`session`]: artifacts and extraction state of one attempt
//! - [`submission`]: payload building and upload outcome mapping
//! - [`workflow`]: the state machine tying captures to submission
//!
//! Image acquisition, OCR and HTTP transport sit behind the
//! [`ImageAcquisition`], [`OcrEngine`] and [`Transport`] traits, with
//! file, Tesseract and `reqwest` implementations.

pub mod acquisition;
pub mod artifact;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ocr;
pub mod session;
pub mod submission;
pub mod transport;
pub mod workflow;

pub use acquisition::{CaptureRequest, FileAcquisition, ImageAcquisition};
pub use artifact::{ArtifactKind, CaptureSource, CapturedArtifact};
pub use classifier::{classify, DocumentType};
pub use config::{load_settings, Config, Settings};
pub use error::{SubmissionFailure, ValidationError, WorkflowError};
pub use ocr::{OcrEngine, OcrError, TesseractOcr};
pub use session::{CaptureSession, ExtractionResult, ExtractionStatus};
pub use submission::{SubmissionOutcome, SubmissionPipeline};
pub use transport::{HttpTransport, MultipartPayload, Transport, TransportError};
pub use workflow::{WorkflowController, WorkflowState};
