//! The per-case snapshot: overall status, narrative, dimension scores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Case-level semaphore derived from the worst fact/alert severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    /// A critical alert or critical-risk fact exists
    Red,
    /// High alerts or high/medium-risk facts exist
    Yellow,
    /// Nothing above low risk
    Green,
}

impl OverallStatus {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Red => "RED",
            OverallStatus::Yellow => "YELLOW",
            OverallStatus::Green => "GREEN",
        }
    }

    /// Parse the storage form back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RED" => Some(OverallStatus::Red),
            "YELLOW" => Some(OverallStatus::Yellow),
            "GREEN" => Some(OverallStatus::Green),
            _ => None,
        }
    }
}

/// Which narrative actually ended up on the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NarrativeMode {
    /// The deterministic template
    Deterministic,
    /// A generated narrative that passed the traceability check
    HybridLlm,
}

impl NarrativeMode {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeMode::Deterministic => "DETERMINISTIC",
            NarrativeMode::HybridLlm => "HYBRID_LLM",
        }
    }

    /// Parse the storage form back into a mode.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DETERMINISTIC" => Some(NarrativeMode::Deterministic),
            "HYBRID_LLM" => Some(NarrativeMode::HybridLlm),
            _ => None,
        }
    }
}

/// Risk dimension the scoring engine aggregates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Economic exposure
    Economico,
    /// Documentary completeness and consistency
    Documental,
    /// Regulatory compliance
    Compliance,
}

impl Dimension {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Economico => "economico",
            Dimension::Documental => "documental",
            Dimension::Compliance => "compliance",
        }
    }

    /// Parse the storage form back into a dimension.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "economico" => Some(Dimension::Economico),
            "documental" => Some(Dimension::Documental),
            "compliance" => Some(Dimension::Compliance),
            _ => None,
        }
    }

    /// All dimensions, in scoring order.
    pub fn all() -> [Dimension; 3] {
        [
            Dimension::Economico,
            Dimension::Documental,
            Dimension::Compliance,
        ]
    }
}

/// Qualitative band for a dimension score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreLevel {
    /// Score >= 80
    Low,
    /// Score >= 50
    Medium,
    /// Score < 50
    High,
}

/// Score of one risk dimension: 0 (worst) to 100 (clean).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Penalty-adjusted score, clamped to [0, 100]
    pub score: u8,
    /// Band derived from the score
    pub level: ScoreLevel,
}

impl DimensionScore {
    /// Derive a score + band from the accumulated penalty.
    pub fn from_penalty(penalty: u32) -> Self {
        let score = 100u32.saturating_sub(penalty).min(100) as u8;
        let level = if score >= 80 {
            ScoreLevel::Low
        } else if score >= 50 {
            ScoreLevel::Medium
        } else {
            ScoreLevel::High
        };
        Self { score, level }
    }
}

/// The single per-case summary row. Upserted on every build, never
/// multiplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    /// Case this snapshot summarizes
    pub case_id: Uuid,
    /// Case-level semaphore
    pub overall_status: OverallStatus,
    /// Narrative summary of the dispute
    pub litis_narrative: String,
    /// Which narrative mode produced it
    pub narrative_mode: NarrativeMode,
    /// Per-dimension risk scores
    pub dimension_scores: BTreeMap<Dimension, DimensionScore>,
    /// Messages of HIGH/CRITICAL alerts, in emission order
    pub high_impact_alerts: Vec<String>,
    /// When this snapshot was last rebuilt
    pub updated_at: DateTime<Utc>,
}
