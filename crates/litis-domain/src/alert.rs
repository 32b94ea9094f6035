//! Technical alerts - gaps and contradictions surfaced to the reviewer

use crate::fact::FactId;
use crate::levels::Severity;
use crate::snapshot::Dimension;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an alert, based on UUIDv7.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Generate a new UUIDv7-based AlertId
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID (storage layer deserialization).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse an AlertId from its string form.
    pub fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid alert id: {}", e))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted alert: a missing required document, a cross-document
/// conflict, or a compliance failure.
///
/// Alerts whose `code` starts with `MISSING_` are surfaced separately on
/// the assembled sheet as missing-required-document entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAlert {
    /// Unique identifier
    pub id: AlertId,
    /// Case this alert belongs to
    pub case_id: Uuid,
    /// How serious the gap is
    pub severity: Severity,
    /// Stable machine-readable code (e.g. `MISSING_SALARY_SD`)
    pub code: String,
    /// Human-facing message
    pub message: String,
    /// Scoring dimension this alert penalizes (documentary when unset)
    pub dimension: Option<Dimension>,
    /// Why the rule flagged this
    pub why_flagged: Option<String>,
    /// The document type whose presence would resolve the alert
    pub required_doc_type: Option<String>,
    /// Catalog field this alert is about, if any
    pub field_key: Option<String>,
    /// Facts this alert is evidenced by
    pub evidence_fact_ids: Vec<FactId>,
}

impl TechnicalAlert {
    /// Standard message for a missing-evidence alert.
    pub fn missing_message(field_key: &str, doc_type: &str) -> String {
        format!("FALTA_EVIDENCIA:{}:{}", field_key, doc_type)
    }

    /// Whether this alert reports a missing required document or field.
    pub fn is_missing_doc(&self) -> bool {
        self.code.starts_with("MISSING_")
    }

    /// Whether this alert should appear in the executive summary.
    pub fn is_high_impact(&self) -> bool {
        matches!(self.severity, Severity::High | Severity::Critical)
    }
}
