//! Multipart upload transport.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;

use crate::artifact::CapturedArtifact;

const USER_AGENT: &str = "idcheck/0.1";

/// Transport-level failures. Any HTTP status, including errors, is not one of these.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read {path}: {source}")]
    ReadArtifact {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Text fields and files of a multipart request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    pub fields: BTreeMap<String, String>,
    pub files: BTreeMap<String, CapturedArtifact>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn file(mut self, name: &str, artifact: CapturedArtifact) -> Self {
        self.files.insert(name.to_string(), artifact);
        self
    }
}

/// Posts multipart payloads and reports the HTTP status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_multipart(
        &self,
        url: &str,
        payload: &MultipartPayload,
    ) -> Result<u16, TransportError>;
}

/// Transport backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a new HTTP transport with a custom user agent.
    pub fn with_user_agent(
        timeout: Duration,
        user_agent: Option<&str>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(USER_AGENT))
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    async fn file_part(artifact: &CapturedArtifact) -> Result<Part, TransportError> {
        let path = artifact.path();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TransportError::ReadArtifact {
                path: path.display().to_string(),
                source,
            })?;

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(artifact.file_name())
            .mime_str(mime.essence_str())?;
        Ok(part)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_multipart(
        &self,
        url: &str,
        payload: &MultipartPayload,
    ) -> Result<u16, TransportError> {
        let mut form = Form::new();
        for (name, value) in &payload.fields {
            form = form.text(name.clone(), value.clone());
        }
        for (name, artifact) in &payload.files {
            form = form.part(name.clone(), Self::file_part(artifact).await?);
        }

        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(e.to_string())
                } else if e.is_connect() {
                    TransportError::Connection(e.to_string())
                } else {
                    TransportError::Http(e)
                }
            })?;
        let status = response.status().as_u16();

        tracing::debug!(
            url,
            status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Multipart POST completed"
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactKind, CaptureSource};

    #[test]
    fn test_payload_builder() {
        let artifact =
            CapturedArtifact::new(ArtifactKind::Selfie, "/tmp/me.jpg", CaptureSource::Camera);
        let payload = MultipartPayload::new()
            .field("a", "1")
            .field("b", String::from("2"))
            .file("selfie", artifact.clone());

        assert_eq!(payload.fields.get("a").map(String::as_str), Some("1"));
        assert_eq!(payload.fields.len(), 2);
        assert_eq!(payload.files.get("selfie"), Some(&artifact));
    }

    #[tokio::test]
    async fn test_unreadable_artifact_fails_before_sending() {
        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();
        let artifact = CapturedArtifact::new(
            ArtifactKind::Document,
            "/nonexistent/id.jpg",
            CaptureSource::Gallery,
        );
        let payload = MultipartPayload::new().file("id_image", artifact);

        let err = transport
            .post_multipart("http://127.0.0.1:9/unused", &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ReadArtifact { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        let payload = MultipartPayload::new().field("id_type", "Unknown ID");

        // Bind and drop a listener to get a port nothing is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = transport
            .post_multipart(&format!("http://{addr}/submit"), &payload)
            .await;
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }
}
