//! Settings for the generative-language API used by the advisor.

use std::time::Duration;

use reqwest::Url;

/// The public endpoint of the generative-language API.
pub const DEFAULT_ADVISOR_URL: &str = "https://generativelanguage.googleapis.com";
/// The model asked for advice.
pub const DEFAULT_ADVISOR_MODEL: &str = "gemini-pro";
/// How long to wait for the model before giving up.
pub const DEFAULT_ADVISOR_TIMEOUT: Duration = Duration::from_secs(30);

/// The value of the API key in sample configuration files, never a real key.
const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Errors for advisor settings that would make every request fail.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// No API key was given.
    #[error("the API key for the advisor is empty")]
    MissingApiKey,

    /// The API key was copied from the sample configuration without being replaced.
    #[error("the API key for the advisor is the placeholder \"YOUR_API_KEY_HERE\"")]
    PlaceholderApiKey,

    /// The base URL could not be parsed.
    #[error("invalid advisor URL \"{0}\": {1}")]
    InvalidBaseUrl(String, String),

    /// The model name is empty.
    #[error("the advisor model name is empty")]
    MissingModel,
}

/// Where and how to reach the generative-language API.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    api_key: String,
    base_url: Url,
    model: String,
    timeout: Duration,
}

impl AdvisorConfig {
    /// Check and bundle the advisor settings.
    ///
    /// # Errors
    ///
    /// Returns a [ConfigError] if the API key is empty or the placeholder,
    /// `base_url` is not a URL or `model` is empty.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.trim();

        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if api_key == PLACEHOLDER_API_KEY {
            return Err(ConfigError::PlaceholderApiKey);
        }

        let base_url = Url::parse(base_url)
            .map_err(|error| ConfigError::InvalidBaseUrl(base_url.to_owned(), error.to_string()))?;

        let model = model.trim();
        if model.is_empty() {
            return Err(ConfigError::MissingModel);
        }

        Ok(Self {
            api_key: api_key.to_owned(),
            base_url,
            model: model.to_owned(),
            timeout,
        })
    }

    /// The URL for generating content with the configured model, without the API key.
    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            self.model
        )
    }

    /// The key sent with every request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The limit on the duration of each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
