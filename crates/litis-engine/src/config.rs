//! Configuration for the sheet engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`crate::SheetBuilder`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chunks retrieved per query during candidate collection
    pub top_k_chunks: usize,

    /// Maximum length of the excerpt stored with a fact (characters)
    pub excerpt_max_len: usize,

    /// Whether to attempt the model-generated narrative at all
    pub hybrid_narrative: bool,

    /// Maximum time for one narrative generation call (seconds)
    pub generation_timeout_secs: u64,

    /// Maximum fact summaries included in the generation prompt
    pub max_prompt_facts: usize,

    /// Maximum alert messages included in the generation prompt
    pub max_prompt_alerts: usize,

    /// Word budget requested from the generator
    pub narrative_word_limit: usize,
}

impl EngineConfig {
    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k_chunks == 0 {
            return Err("top_k_chunks must be greater than 0".to_string());
        }
        if self.excerpt_max_len == 0 {
            return Err("excerpt_max_len must be greater than 0".to_string());
        }
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if self.narrative_word_limit == 0 {
            return Err("narrative_word_limit must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Preset with the model-generated narrative disabled
    pub fn deterministic_only() -> Self {
        Self {
            hybrid_narrative: false,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k_chunks: 3,
            excerpt_max_len: 220,
            hybrid_narrative: true,
            generation_timeout_secs: 30,
            max_prompt_facts: 30,
            max_prompt_alerts: 20,
            narrative_word_limit: 70,
        }
    }
}
