//! Speech-transcription client.
//!
//! [`HttpTranscriber`] ships a finalized recording to the remote
//! transcription endpoint as a multipart upload and resolves the recognized
//! text. All connection details come from [`ApiConfig`]; nothing is
//! hardcoded.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ApiConfig;

// ---------------------------------------------------------------------------
// TranscriptionError
// ---------------------------------------------------------------------------

/// Errors that can occur while transcribing a recording.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// HTTP transport or connection error.
    #[error("transcription request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("transcription request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("transcription endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body could not be parsed as expected JSON.
    #[error("failed to parse transcription response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranscriptionError::Timeout
        } else {
            TranscriptionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TranscriptionClient trait
// ---------------------------------------------------------------------------

/// Async trait for speech-to-text backends.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn TranscriptionClient>`.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// Transcribe a WAV-encoded recording and return the recognized text.
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, TranscriptionError>;
}

// ---------------------------------------------------------------------------
// HttpTranscriber
// ---------------------------------------------------------------------------

/// Uploads recordings to `POST {base_url}/transcription`.
///
/// The recording is sent as the `audio` part of a multipart form
/// (`recording.wav`, `audio/wav`); the endpoint answers `{ "text": … }`.
pub struct HttpTranscriber {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl HttpTranscriber {
    /// Build a transcriber from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl TranscriptionClient for HttpTranscriber {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, TranscriptionError> {
        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("recording.wav")
            .mime_str("audio/wav")?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let url = format!("{}/transcription", self.base_url);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(TranscriptionError::Status(response.status().as_u16()));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        Ok(body.text)
    }
}

// ---------------------------------------------------------------------------
// MockTranscriber  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without any network
/// access. Records the size of each upload so ordering tests can assert that
/// the audio blob was complete before the call.
#[cfg(test)]
pub struct MockTranscriber {
    response: std::sync::Mutex<Result<String, String>>,
    pub uploads: std::sync::Mutex<Vec<usize>>,
}

#[cfg(test)]
impl MockTranscriber {
    /// Create a mock that always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: std::sync::Mutex::new(Ok(text.into())),
            uploads: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always fails with `TranscriptionError::Request`.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            response: std::sync::Mutex::new(Err(message.into())),
            uploads: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TranscriptionClient for MockTranscriber {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, TranscriptionError> {
        self.uploads.lock().unwrap().push(wav.len());
        match &*self.response.lock().unwrap() {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(TranscriptionError::Request(msg.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> ApiConfig {
        ApiConfig {
            base_url: "http://localhost:8080".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _transcriber = HttpTranscriber::from_config(&make_config());
    }

    /// Verify that `HttpTranscriber` is object-safe.
    #[test]
    fn transcriber_is_object_safe() {
        let client: Box<dyn TranscriptionClient> =
            Box::new(HttpTranscriber::from_config(&make_config()));
        drop(client);
    }

    #[tokio::test]
    async fn mock_records_upload_sizes() {
        let mock = MockTranscriber::ok("pump three offline");
        let text = mock.transcribe(vec![0u8; 44]).await.unwrap();
        assert_eq!(text, "pump three offline");
        assert_eq!(*mock.uploads.lock().unwrap(), vec![44]);
    }

    #[tokio::test]
    async fn mock_err_maps_to_request_error() {
        let mock = MockTranscriber::err("boom");
        let err = mock.transcribe(Vec::new()).await.unwrap_err();
        assert!(matches!(err, TranscriptionError::Request(_)));
    }

    #[test]
    fn error_display_includes_status() {
        assert!(TranscriptionError::Status(503).to_string().contains("503"));
    }
}
