//! Ollama Generator Implementation
//!
//! Integration with Ollama's local generate API, used for the hybrid
//! narrative. Generation failures never surface to the sheet's caller
//! (the engine falls back to the deterministic narrative), so this client
//! favors bounded timeouts and a few retries over aggressive recovery.
//!
//! # Examples
//!
//! ```no_run
//! use litis_llm::OllamaGenerator;
//!
//! let provider = OllamaGenerator::new("http://localhost:11434", "llama3.2:1b");
//! // The async generate is wrapped by the sync TextGenerator impl.
//! ```

use crate::LlmError;
use litis_domain::traits::TextGenerator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for generation requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API provider for local narrative generation
pub struct OllamaGenerator {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for the Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from the Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaGenerator {
    /// Create a new Ollama generator
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g. "http://localhost:11434")
    /// - `model`: model to use (e.g. "llama3.2:1b")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap();

        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create a generator against the default local endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Generate text using the Ollama API
    ///
    /// # Errors
    ///
    /// Returns an error if Ollama is unreachable, the model is not
    /// available, or the response cannot be parsed.
    pub async fn generate_async(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        match response.json::<OllamaGenerateResponse>().await {
                            Ok(body) => return Ok(body.response),
                            Err(e) => {
                                return Err(LlmError::InvalidResponse(format!(
                                    "Failed to parse response: {}",
                                    e
                                )));
                            }
                        }
                    } else if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else {
                        let status = response.status();
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, ...
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

impl TextGenerator for OllamaGenerator {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        // Blocking wrapper; the engine calls this through spawn_blocking.
        tokio::runtime::Runtime::new()
            .map_err(|e| LlmError::Other(format!("Runtime error: {}", e)))?
            .block_on(async { self.generate_async(prompt).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_creation() {
        let provider = OllamaGenerator::new("http://localhost:11434", "llama3.2:1b");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model, "llama3.2:1b");
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_generator_default_endpoint() {
        let provider = OllamaGenerator::default_endpoint("mistral");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model, "mistral");
    }

    #[test]
    fn test_generator_with_max_retries() {
        let provider = OllamaGenerator::new("http://localhost:11434", "m").with_max_retries(5);
        assert_eq!(provider.max_retries, 5);
    }

    #[tokio::test]
    async fn test_generator_unreachable_endpoint() {
        let provider =
            OllamaGenerator::new("http://127.0.0.1:1", "llama3.2:1b").with_max_retries(1);

        let result = provider.generate_async("test").await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }

    // Integration test (requires running Ollama)
    #[tokio::test]
    #[ignore]
    async fn test_generate_integration() {
        let provider = OllamaGenerator::default_endpoint("llama3.2:1b");
        let result = provider.generate_async("Di 'hola' y nada mas").await;
        if let Ok(response) = result {
            assert!(!response.is_empty());
        }
    }
}
