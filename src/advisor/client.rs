//! HTTP client for the generative-language API.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::advisor::AdvisorConfig;

/// The reply used when the API answers without any text.
pub const FALLBACK_RESPONSE: &str = "Sorry, I could not process that.";

/// The ways a request to the generative-language API can fail.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    /// The request could not be sent or no response arrived in time.
    #[error("could not reach the advisor: {0}")]
    Transport(reqwest::Error),

    /// The API responded with a non-success status code.
    #[error("the advisor responded with status {0}")]
    Status(u16),

    /// The response body is not JSON.
    #[error("the advisor response is not valid JSON: {0}")]
    MalformedBody(String),
}

impl From<reqwest::Error> for AdvisorError {
    fn from(error: reqwest::Error) -> Self {
        // The URL holds the API key.
        AdvisorError::Transport(error.without_url())
    }
}

/// Sends prompts to the configured model and returns its text reply.
#[derive(Debug, Clone)]
pub struct AdvisorClient {
    http: reqwest::Client,
    config: Arc<AdvisorConfig>,
}

impl AdvisorClient {
    /// Create a client whose requests time out after the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [AdvisorError::Transport] if the HTTP client could not be built,
    /// e.g. because the TLS backend failed to initialise.
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Ask the model to complete `prompt`.
    ///
    /// The first text part of the first candidate is returned with surrounding
    /// whitespace removed, or [FALLBACK_RESPONSE] if the response has no such part.
    ///
    /// # Errors
    ///
    /// Returns an [AdvisorError] if the request fails, the status code is not
    /// a success or the body is not JSON. Requests are not retried.
    pub async fn generate(&self, prompt: &str) -> Result<String, AdvisorError> {
        let response = self
            .http
            .post(self.config.generate_content_url())
            .query(&[("key", self.config.api_key())])
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let body: Value = serde_json::from_slice(&body)
            .map_err(|error| AdvisorError::MalformedBody(error.to_string()))?;

        Ok(extract_reply(&body))
    }
}

fn extract_reply(body: &Value) -> String {
    match body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
    {
        Some(text) => text.trim().to_owned(),
        None => {
            tracing::warn!("Advisor response did not contain any text: {body}");
            FALLBACK_RESPONSE.to_owned()
        }
    }
}
