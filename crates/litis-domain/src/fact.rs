//! Technical facts - the evidence-traceable statements the engine extracts

use crate::levels::{ComplianceStatus, DefenseStrength, PartySide, Pillar, RiskLevel, TruthStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a technical fact, based on UUIDv7.
///
/// UUIDv7 keeps fact ids chronologically sortable and lets the engine mint
/// ids before anything is persisted, so alerts can reference their evidence
/// facts within the same in-memory build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FactId(Uuid);

impl FactId {
    /// Generate a new UUIDv7-based FactId
    ///
    /// # Examples
    ///
    /// ```
    /// use litis_domain::FactId;
    ///
    /// let id = FactId::new();
    /// assert_eq!(id.to_string().len(), 36);
    /// ```
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID (storage layer deserialization).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse a FactId from its string form.
    pub fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid fact id: {}", e))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed payload of a fact after parsing and normalization.
///
/// Persisted as a tagged JSON object; the `Conflict` variant is the only
/// payload allowed on facts with `truth_status == Conflict` and always
/// carries at least two distinct values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedValue {
    /// A monetary amount
    Money {
        /// Decimal amount
        amount: f64,
        /// ISO currency code; the engine only emits "MXN"
        currency: String,
    },
    /// A calendar date
    Date {
        /// Normalized ISO date
        iso_date: NaiveDate,
    },
    /// Contract modality (indeterminado / determinado / prueba)
    ContractType {
        /// Canonical contract type label
        contract_type: String,
    },
    /// Free-text excerpt capture (position, category)
    Excerpt {
        /// The captured line, capped by the parser
        excerpt: String,
    },
    /// Derived cause of termination of the employment relationship
    TerminationCause {
        /// Canonical cause label
        cause: String,
    },
    /// Compliance checklist outcome
    Compliance {
        /// Status of the checklist item
        status: ComplianceStatus,
    },
    /// Cross-document disagreement payload
    Conflict {
        /// All distinct values observed, sorted
        values: Vec<String>,
        /// The value the precedence resolver selected, if any
        winner: Option<String>,
    },
}

impl NormalizedValue {
    /// Build a conflict payload from the distinct observed values.
    ///
    /// Values are deduplicated case-insensitively after whitespace
    /// normalization and sorted for deterministic output.
    pub fn conflict<I, S>(values: I, winner: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: Vec<String> = Vec::new();
        for value in values {
            let normalized = value.as_ref().trim().to_lowercase();
            if !normalized.is_empty() && !distinct.contains(&normalized) {
                distinct.push(normalized);
            }
        }
        distinct.sort();
        NormalizedValue::Conflict {
            values: distinct,
            winner,
        }
    }

    /// The monetary amount, when this payload carries one.
    pub fn amount(&self) -> Option<f64> {
        match self {
            NormalizedValue::Money { amount, .. } => Some(*amount),
            _ => None,
        }
    }
}

/// One extracted, persisted statement about the case.
///
/// Facts are immutable within a build; every rebuild of the sheet replaces
/// the full fact set for the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalFact {
    /// Unique identifier
    pub id: FactId,
    /// Case this fact belongs to
    pub case_id: Uuid,
    /// Category grouping on the sheet
    pub pillar: Pillar,
    /// Field identifier from the catalog (or a derived key)
    pub field_key: String,
    /// Raw matched text, if any evidence was found
    pub value_raw: Option<String>,
    /// Typed payload, if any evidence was found
    pub value_normalized: Option<NormalizedValue>,
    /// Source document, when the fact is evidence-backed
    pub source_doc_id: Option<Uuid>,
    /// Page of the source chunk
    pub source_page: Option<i32>,
    /// Short excerpt of the source chunk
    pub source_excerpt: Option<String>,
    /// Canonical type of the source document
    pub source_doc_type: Option<String>,
    /// Risk contribution of this fact
    pub risk_level: RiskLevel,
    /// Confidence in [0, 1]; 0 exactly when the fact is MISSING
    pub confidence: f64,
    /// Epistemic classification
    pub truth_status: TruthStatus,
    /// Identifier of the rule that produced this fact
    pub rule_applied: String,
    /// Party the evidence originates from
    pub party_side: Option<PartySide>,
    /// Groups the conflict fact with its field
    pub conflict_group_id: Option<String>,
    /// Authority rank the resolver assigned to the winning source
    pub precedence_rank: Option<i32>,
    /// Litigation strength of the winning evidence
    pub legal_defense_strength: Option<DefenseStrength>,
    /// Why this fact is critical, when it is
    pub why_critical: Option<String>,
    /// What evidence would resolve or strengthen this fact
    pub evidence_hint: Option<String>,
}

impl TechnicalFact {
    /// Build a MISSING fact for a field with no valid evidence.
    ///
    /// Enforces the invariant that missing facts carry zero confidence and
    /// no source.
    pub fn missing(
        case_id: Uuid,
        pillar: Pillar,
        field_key: impl Into<String>,
        risk_level: RiskLevel,
        rule_applied: impl Into<String>,
    ) -> Self {
        Self {
            id: FactId::new(),
            case_id,
            pillar,
            field_key: field_key.into(),
            value_raw: None,
            value_normalized: None,
            source_doc_id: None,
            source_page: None,
            source_excerpt: None,
            source_doc_type: None,
            risk_level,
            confidence: 0.0,
            truth_status: TruthStatus::Missing,
            rule_applied: rule_applied.into(),
            party_side: Some(PartySide::Neutro),
            conflict_group_id: None,
            precedence_rank: None,
            legal_defense_strength: None,
            why_critical: None,
            evidence_hint: None,
        }
    }

    /// Build a CONFLICT fact listing the distinct values seen for a field.
    ///
    /// Conflict facts carry no single source; the payload names every
    /// distinct value plus the resolver's winner.
    pub fn conflict(
        case_id: Uuid,
        pillar: Pillar,
        field_key: &str,
        payload: NormalizedValue,
        conflict_group_id: impl Into<String>,
    ) -> Self {
        Self {
            id: FactId::new(),
            case_id,
            pillar,
            field_key: format!("{}_conflict", field_key),
            value_raw: Some(format!("Conflicto detectado en {}", field_key)),
            value_normalized: Some(payload),
            source_doc_id: None,
            source_page: None,
            source_excerpt: None,
            source_doc_type: None,
            risk_level: RiskLevel::High,
            confidence: 1.0,
            truth_status: TruthStatus::Conflict,
            rule_applied: "conflict_engine_multi_document".to_string(),
            party_side: Some(PartySide::Neutro),
            conflict_group_id: Some(conflict_group_id.into()),
            precedence_rank: None,
            legal_defense_strength: None,
            why_critical: None,
            evidence_hint: Some(format!(
                "Validar {} con documentos de mayor jerarquia.",
                field_key
            )),
        }
    }

    /// Builder-style setter for the critical explanation.
    pub fn with_why_critical(mut self, why: impl Into<String>) -> Self {
        self.why_critical = Some(why.into());
        self
    }

    /// Builder-style setter for the evidence hint.
    pub fn with_evidence_hint(mut self, hint: impl Into<String>) -> Self {
        self.evidence_hint = Some(hint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_id_display_and_parse() {
        let id = FactId::new();
        let parsed = FactId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_fact_id_invalid_string() {
        assert!(FactId::from_string("not-a-uuid").is_err());
        assert!(FactId::from_string("").is_err());
    }

    #[test]
    fn test_fact_id_chronological() {
        let id1 = FactId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = FactId::new();
        assert!(id1 < id2, "Earlier UUIDv7 should sort first");
    }

    #[test]
    fn test_missing_fact_invariants() {
        let fact = TechnicalFact::missing(
            Uuid::new_v4(),
            Pillar::Economica,
            "salary_sd",
            RiskLevel::Critical,
            "missing_required_doc",
        );
        assert_eq!(fact.confidence, 0.0);
        assert_eq!(fact.truth_status, TruthStatus::Missing);
        assert!(fact.source_doc_id.is_none());
        assert!(fact.value_raw.is_none());
        assert!(fact.value_normalized.is_none());
    }

    #[test]
    fn test_conflict_payload_dedupes_and_sorts() {
        let payload = NormalizedValue::conflict(
            ["500.00", "  210.00 ", "500.00", "210.00"],
            Some("210.00".to_string()),
        );
        match &payload {
            NormalizedValue::Conflict { values, winner } => {
                assert_eq!(values, &vec!["210.00".to_string(), "500.00".to_string()]);
                assert_eq!(winner.as_deref(), Some("210.00"));
            }
            other => panic!("Expected conflict payload, got {:?}", other),
        }
    }

    #[test]
    fn test_conflict_fact_shape() {
        let payload = NormalizedValue::conflict(["200", "210"], Some("210".to_string()));
        let fact = TechnicalFact::conflict(
            Uuid::new_v4(),
            Pillar::Economica,
            "salary_sd",
            payload,
            "case:salary_sd",
        );
        assert_eq!(fact.field_key, "salary_sd_conflict");
        assert_eq!(fact.truth_status, TruthStatus::Conflict);
        assert_eq!(fact.risk_level, RiskLevel::High);
        assert!(fact.source_doc_id.is_none());
        assert!(fact.conflict_group_id.is_some());
    }

    #[test]
    fn test_normalized_value_amount() {
        let money = NormalizedValue::Money {
            amount: 210.0,
            currency: "MXN".to_string(),
        };
        assert_eq!(money.amount(), Some(210.0));
        let date = NormalizedValue::Date {
            iso_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        };
        assert_eq!(date.amount(), None);
    }

    #[test]
    fn test_normalized_value_serde_tagging() {
        let money = NormalizedValue::Money {
            amount: 450.5,
            currency: "MXN".to_string(),
        };
        let json = serde_json::to_value(&money).unwrap();
        assert_eq!(json["kind"], "money");
        assert_eq!(json["amount"], 450.5);
        let back: NormalizedValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, money);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: conflict payloads never contain duplicates and are
        /// always sorted, regardless of input order or casing.
        #[test]
        fn test_conflict_values_distinct_sorted(values in proptest::collection::vec("[a-z0-9 ]{1,12}", 0..8)) {
            let payload = NormalizedValue::conflict(values.iter(), None);
            if let NormalizedValue::Conflict { values, .. } = payload {
                let mut sorted = values.clone();
                sorted.sort();
                sorted.dedup();
                prop_assert_eq!(values, sorted);
            }
        }

        /// Property: FactId string form always round-trips.
        #[test]
        fn test_fact_id_roundtrip(_n in 0..20) {
            let id = FactId::new();
            let parsed = FactId::from_string(&id.to_string());
            prop_assert_eq!(Ok(id), parsed);
        }
    }
}
