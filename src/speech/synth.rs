//! Speech-synthesis client.
//!
//! [`HttpSynthesizer`] requests synthesized speech for a text string from the
//! remote endpoint and returns the raw audio payload for
//! [`crate::speech::playback`] to decode and play.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ApiConfig;

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching synthesized speech.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// HTTP transport or connection error.
    #[error("speech synthesis request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("speech synthesis request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("speech synthesis endpoint returned HTTP {0}")]
    Status(u16),

    /// The endpoint returned an empty payload.
    #[error("speech synthesis returned no audio")]
    EmptyPayload,
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else {
            SynthesisError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Async trait for text-to-speech backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return the encoded audio payload.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;
}

// ---------------------------------------------------------------------------
// HttpSynthesizer
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/speech-synthesis` with `{ "text": … }` and returns
/// the binary audio body.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSynthesizer {
    /// Build a synthesizer from application config; see
    /// [`crate::speech::HttpTranscriber::from_config`] for the timeout
    /// handling.
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
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let url = format!("{}/speech-synthesis", self.base_url);
        let body = serde_json::json!({ "text": text });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(SynthesisError::Status(response.status().as_u16()));
        }

        let payload = response.bytes().await?.to_vec();
        if payload.is_empty() {
            return Err(SynthesisError::EmptyPayload);
        }

        Ok(payload)
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double returning a pre-configured payload.
#[cfg(test)]
pub struct MockSynthesizer {
    response: Result<Vec<u8>, String>,
}

#[cfg(test)]
impl MockSynthesizer {
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            response: Ok(payload),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SynthesisError> {
        match &self.response {
            Ok(payload) => Ok(payload.clone()),
            Err(msg) => Err(SynthesisError::Request(msg.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_builds_without_panic() {
        let config = ApiConfig {
            base_url: "http://localhost:8080".into(),
            timeout_secs: 5,
        };
        let _synth = HttpSynthesizer::from_config(&config);
    }

    #[tokio::test]
    async fn mock_ok_returns_payload() {
        let mock = MockSynthesizer::ok(vec![1, 2, 3]);
        assert_eq!(mock.synthesize("hello").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn mock_err_maps_to_request_error() {
        let mock = MockSynthesizer::err("down");
        assert!(matches!(
            mock.synthesize("hello").await.unwrap_err(),
            SynthesisError::Request(_)
        ));
    }
}
