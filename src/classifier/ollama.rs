//! Ollama Local LLM Provider
//!
//! Minimal text-generation client for a locally running Ollama
//! instance, behind the `TextGenerator` seam so tests can point the
//! classifier at a stub endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OllamaConfig;
use crate::types::{PersonaError, Result};

/// Text-generation backend used by the origin classifier.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a prompt and return the raw response text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model(&self) -> &str;
}

pub struct OllamaGenerator {
    endpoint: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let endpoint = Self::validate_endpoint(&config.endpoint)?;

        // The timeout is the only cancellation mechanism for a wedged
        // model; expiry surfaces as an Err and the classifier turns it
        // into an Unknown outcome.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PersonaError::Llm(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }

    /// Validate endpoint URL for security (SSRF prevention)
    ///
    /// Only allows http/https schemes and warns for non-localhost endpoints.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            PersonaError::Config(format!("Invalid Ollama endpoint URL '{endpoint}': {e}"))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(PersonaError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1")
        {
            warn!("Ollama endpoint is not localhost: {host}. Ensure this is intentional.");
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: self.temperature,
            }),
            format: Some("json".to_string()),
        };

        debug!("Sending classification prompt to Ollama (model: {})", self.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    PersonaError::Llm(format!(
                        "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                        self.endpoint
                    ))
                } else {
                    PersonaError::Llm(format!("Ollama request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PersonaError::Llm(format!(
                "Ollama API error ({status}): {body}"
            )));
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| PersonaError::Llm(format!("Failed to parse Ollama response: {e}")))?;

        Ok(body.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let provider = OllamaGenerator::new(&OllamaConfig::default()).unwrap();
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model(), "mistral");
    }

    #[test]
    fn test_endpoint_scheme_rejected() {
        let config = OllamaConfig {
            endpoint: "ftp://localhost:11434".to_string(),
            ..Default::default()
        };
        assert!(OllamaGenerator::new(&config).is_err());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let config = OllamaConfig {
            endpoint: "http://localhost:11434/".to_string(),
            ..Default::default()
        };
        let provider = OllamaGenerator::new(&config).unwrap();
        assert_eq!(provider.endpoint, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_err_not_panic() {
        let config = OllamaConfig {
            // Reserved port on localhost that nothing listens on.
            endpoint: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let provider = OllamaGenerator::new(&config).unwrap();
        let result = provider.generate("hello").await;
        assert!(result.is_err());
    }
}
