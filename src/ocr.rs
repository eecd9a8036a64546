//! Text recognition for captured documents using Tesseract.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::artifact::CapturedArtifact;

/// Errors that can occur during text recognition.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recognises text in an image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Return the recognised text. An empty string means no text was found.
    async fn recognize(&self, artifact: &CapturedArtifact) -> Result<String, OcrError>;
}

/// Clean up tesseract's stdout.
///
/// Tesseract ends each page with a form feed and pads with blank lines. A
/// successful run that printed nothing means no text was found.
fn recognised_text(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout).trim_end().to_string()
}

/// OCR engine that runs the `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    /// Tesseract executable name or path.
    binary: String,
    /// Tesseract language setting.
    language: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Tesseract language.
    pub fn with_language(mut self, lang: &str) -> Self {
        self.language = lang.to_string();
        self
    }

    /// Use a different executable.
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Whether the executable can be found on PATH.
    pub fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    async fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = match Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::ToolNotFound(format!(
                    "{} (install tesseract-ocr)",
                    self.binary
                )));
            }
            Err(e) => return Err(OcrError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RecognitionFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = recognised_text(&output.stdout);
        if text.is_empty() {
            tracing::debug!(path = %image_path.display(), "Tesseract found no text");
        }
        Ok(text)
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, artifact: &CapturedArtifact) -> Result<String, OcrError> {
        tracing::debug!(artifact = %artifact.id(), path = %artifact.path().display(), lang = %self.language, "Running tesseract");
        self.run_tesseract(artifact.path()).await
    }
}
