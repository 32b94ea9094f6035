//! Litis Generation Layer
//!
//! Pluggable text-generation providers behind the `TextGenerator` trait
//! from `litis-domain`. The engine uses generation for exactly one thing:
//! upgrading the deterministic narrative to a model-written one, and only
//! when the result survives the traceability check. Providers are
//! therefore best-effort by contract.
//!
//! # Providers
//!
//! - `MockGenerator`: deterministic mock for testing
//! - `OllamaGenerator`: local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use litis_llm::MockGenerator;
//! use litis_domain::traits::TextGenerator;
//!
//! let provider = MockGenerator::new("Resumen de la litis.");
//! let result = provider.generate("prompt").unwrap();
//! assert_eq!(result, "Resumen de la litis.");
//! ```

#![warn(missing_docs)]

pub mod ollama;

use litis_domain::traits::TextGenerator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use ollama::OllamaGenerator;

/// Errors that can occur during generation
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("Generation error: {0}")]
    Other(String),
}

/// Mock generator for deterministic testing
///
/// Returns pre-configured responses without any network calls. Specific
/// prompts can be mapped to specific responses or injected errors; every
/// other prompt gets the default response.
///
/// # Examples
///
/// ```
/// use litis_llm::MockGenerator;
/// use litis_domain::traits::TextGenerator;
///
/// let mut provider = MockGenerator::new("default");
/// provider.add_response("p1", "r1");
/// assert_eq!(provider.generate("p1").unwrap(), "r1");
/// assert_eq!(provider.generate("other").unwrap(), "default");
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockGenerator {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerator {
    /// Create a mock with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), response.into());
    }

    /// Configure an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), "ERROR".to_string());
    }

    /// Number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("Default mock narrative")
    }
}

impl TextGenerator for MockGenerator {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(prompt) {
            if response == "ERROR" {
                return Err(LlmError::Other("Mock error".to_string()));
            }
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }
}

/// A generator that always fails. Useful for exercising the silent
/// fallback path of the narrative builder.
#[derive(Debug, Clone, Default)]
pub struct FailingGenerator;

impl TextGenerator for FailingGenerator {
    type Error = LlmError;

    fn generate(&self, _prompt: &str) -> Result<String, Self::Error> {
        Err(LlmError::Communication("provider unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_default_response() {
        let provider = MockGenerator::new("Resumen");
        assert_eq!(provider.generate("any prompt").unwrap(), "Resumen");
    }

    #[test]
    fn test_mock_specific_responses() {
        let mut provider = MockGenerator::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").unwrap(), "world");
        assert_eq!(provider.generate("foo").unwrap(), "bar");
        assert_eq!(provider.generate("unknown").unwrap(), "Default mock narrative");
    }

    #[test]
    fn test_mock_call_count_shared_across_clones() {
        let provider = MockGenerator::new("test");
        let clone = provider.clone();

        provider.generate("p1").unwrap();
        clone.generate("p2").unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(clone.call_count(), 2);
    }

    #[test]
    fn test_mock_error_injection() {
        let mut provider = MockGenerator::default();
        provider.add_error("bad prompt");

        let result = provider.generate("bad prompt");
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[test]
    fn test_failing_generator() {
        let provider = FailingGenerator;
        assert!(matches!(
            provider.generate("anything"),
            Err(LlmError::Communication(_))
        ));
    }
}
