//! The assembled technical-sheet response

use chrono::{DateTime, Utc};
use litis_domain::{
    Dimension, DimensionScore, NarrativeMode, OverallStatus, TechnicalAlert, TechnicalFact,
};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Case-level summary shown at the top of the sheet.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    /// Case-level semaphore
    pub overall_status: OverallStatus,
    /// Narrative of the dispute
    pub litis_narrative: String,
    /// Messages of HIGH/CRITICAL alerts
    pub high_impact_alerts: Vec<String>,
    /// Per-dimension risk scores
    pub dimension_scores: BTreeMap<Dimension, DimensionScore>,
    /// Which narrative mode produced the text
    pub narrative_mode: NarrativeMode,
}

/// The full technical sheet for a case, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalSheet {
    /// Case the sheet belongs to
    pub case_id: Uuid,
    /// Summary block
    pub executive_summary: ExecutiveSummary,
    /// Facts grouped under human-facing pillar titles
    pub pillars: BTreeMap<String, Vec<TechnicalFact>>,
    /// All facts, ordered by pillar then field key
    pub facts: Vec<TechnicalFact>,
    /// Facts with CONFLICT truth status (or a conflict group)
    pub conflicts: Vec<TechnicalFact>,
    /// Alerts whose code starts with `MISSING_`
    pub missing_required_docs: Vec<TechnicalAlert>,
    /// All alerts, newest first
    pub alerts: Vec<TechnicalAlert>,
    /// Snapshot timestamp (or assembly time when no snapshot exists)
    pub generated_at: DateTime<Utc>,
}
