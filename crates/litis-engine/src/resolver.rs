//! Precedence resolution and conflict detection
//!
//! Mexican labor litigation has a working hierarchy of evidence: payroll
//! receipts outrank the contract for amounts, registrations outrank both
//! for dates, and the initial claim is an allegation unless the employer
//! cannot produce a signed contract — then the burden of proof shifts and
//! the claim's assertions gain weight. This module encodes that hierarchy
//! twice: over retrieval candidates (the build pipeline) and over
//! already-extracted per-document field maps (the deterministic utility
//! used for synthetic precedence checks).

use crate::collector::Candidate;
use crate::doctype::{doc_types, party_for_doc_type};
use litis_domain::{DefenseStrength, PartySide};
use serde_json::Value;
use std::collections::BTreeMap;

/// Coarse evidentiary domain a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDomain {
    /// Amounts: wages, claims, offers
    Economica,
    /// Identity of the relationship: dates, registration
    Identidad,
    /// Working conditions: schedules, duties
    Condiciones,
}

/// Authority order per domain; earlier is more authoritative.
fn domain_precedence(domain: FieldDomain) -> &'static [&'static str] {
    match domain {
        FieldDomain::Economica => &[
            doc_types::RECIBO_NOMINA,
            doc_types::CONTRATO_INDIVIDUAL,
            doc_types::DEMANDA_INICIAL,
        ],
        FieldDomain::Identidad => &[
            doc_types::ALTA_IMSS,
            doc_types::CONTRATO_INDIVIDUAL,
            doc_types::DEMANDA_INICIAL,
        ],
        FieldDomain::Condiciones => &[
            doc_types::CONTRATO_INDIVIDUAL,
            doc_types::LISTA_ASISTENCIA,
            doc_types::DEMANDA_INICIAL,
        ],
    }
}

/// Map a field key onto its evidentiary domain.
pub fn field_domain(field_key: &str) -> FieldDomain {
    match field_key.to_lowercase().as_str() {
        "daily_salary" | "salary_sd" | "salary_sdi" | "claimed_amount" | "closure_offer" => {
            FieldDomain::Economica
        }
        "start_date" | "start_date_real" => FieldDomain::Identidad,
        _ => FieldDomain::Condiciones,
    }
}

/// Authority rank of a document type for a field.
///
/// When no signed contract is established, the initial claim's assertion
/// ranks just below the top of the hierarchy (85): the burden of proof
/// shifts to the employer.
pub fn precedence_rank(doc_type: &str, field_key: &str, contract_signed: bool) -> i32 {
    let dt = doc_type.to_uppercase();
    if !contract_signed && dt == doc_types::DEMANDA_INICIAL {
        return 85;
    }
    let order = domain_precedence(field_domain(field_key));
    if let Some(position) = order.iter().position(|t| *t == dt) {
        return 100 - (position as i32 * 10);
    }
    if dt == doc_types::DEMANDA_INICIAL {
        return 20;
    }
    40
}

/// Pick the authoritative candidate for a field.
///
/// Selection score is the authority rank plus a confidence nudge
/// (`floor(confidence * 10)`); the highest wins, ties broken by
/// first-seen order.
pub fn resolve_precedence<'a>(
    candidates: &'a [Candidate],
    field_key: &str,
    contract_signed: bool,
) -> Option<&'a Candidate> {
    let mut best: Option<(i32, &Candidate)> = None;
    for candidate in candidates {
        let rank = precedence_rank(&candidate.doc_type, field_key, contract_signed);
        let selection = rank + (candidate.confidence * 10.0).floor() as i32;
        match best {
            Some((best_score, _)) if selection <= best_score => {}
            _ => best = Some((selection, candidate)),
        }
    }
    best.map(|(_, candidate)| candidate)
}

/// Distinct raw values among the candidates, normalized case-insensitively
/// and whitespace-trimmed, sorted. More than one member means the sources
/// disagree.
pub fn distinct_values(candidates: &[Candidate]) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for candidate in candidates {
        let normalized = candidate.value_raw.trim().to_lowercase();
        if !normalized.is_empty() && !values.contains(&normalized) {
            values.push(normalized);
        }
    }
    values.sort();
    values
}

/// Deterministic conflict-group identifier for a case/field pair.
pub fn conflict_group_id(case_id: &str, field_key: &str) -> String {
    format!("{}:{}", case_id, field_key)
}

/// A document with already-extracted field values, for the document-level
/// precedence utility.
#[derive(Debug, Clone)]
pub struct DocumentAssertions {
    /// Canonical (or raw uppercase) document type
    pub doc_type: String,
    /// Extracted field values
    pub fields: BTreeMap<String, Value>,
}

impl DocumentAssertions {
    /// Convenience constructor from (key, value) pairs.
    pub fn new<I, K>(doc_type: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            doc_type: doc_type.to_uppercase(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A losing assertion that contradicts the winner of its field.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictItem {
    /// Field in disagreement
    pub field_key: String,
    /// Type of the contradicting document
    pub source_doc_type: String,
    /// The contradicting value
    pub value: Value,
    /// Human-facing description
    pub message: String,
}

/// Qualitative confidence of a winner, derived from its rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    /// Rank >= 80: top-of-hierarchy evidence
    High,
    /// Anything weaker
    Medium,
}

/// The winning assertion for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct WinnerFact {
    /// Field the value answers
    pub field_key: String,
    /// Winning value
    pub value: Value,
    /// Type of the winning document
    pub source_doc_type: String,
    /// Party the winning document speaks for
    pub party_side: PartySide,
    /// Qualitative confidence from the authority rank
    pub confidence_level: ConfidenceLevel,
    /// Litigation strength, when the winning evidence warrants it
    pub legal_defense_strength: Option<DefenseStrength>,
}

/// Fields where a signed attendance log makes the winning value strongly
/// defensible.
const SCHEDULE_FIELDS: &[&str] = &["work_schedule", "check_in", "check_out"];

/// Resolve winners and contradictions across documents with extracted
/// field maps.
pub fn detect_conflicts(
    documents: &[DocumentAssertions],
    contract_signed: bool,
) -> (Vec<ConflictItem>, Vec<WinnerFact>) {
    struct Entry<'a> {
        value: &'a Value,
        doc_type: &'a str,
        rank: i32,
    }

    let mut by_field: BTreeMap<&str, Vec<Entry<'_>>> = BTreeMap::new();
    for doc in documents {
        for (field_key, value) in &doc.fields {
            by_field.entry(field_key).or_default().push(Entry {
                value,
                doc_type: &doc.doc_type,
                rank: precedence_rank(&doc.doc_type, field_key, contract_signed),
            });
        }
    }

    let mut conflicts = Vec::new();
    let mut winners = Vec::new();

    for (field_key, mut entries) in by_field {
        // Stable sort keeps first-seen order among equal ranks.
        entries.sort_by(|a, b| b.rank.cmp(&a.rank));
        let winner = &entries[0];
        let winner_value = value_key(winner.value);

        for contender in &entries[1..] {
            if value_key(contender.value) != winner_value {
                conflicts.push(ConflictItem {
                    field_key: field_key.to_string(),
                    source_doc_type: contender.doc_type.to_string(),
                    value: contender.value.clone(),
                    message: format!("{} contradice ganador {}.", field_key, winner.doc_type),
                });
            }
        }

        let defense = (SCHEDULE_FIELDS.contains(&field_key)
            && winner.doc_type == doc_types::LISTA_ASISTENCIA)
            .then_some(DefenseStrength::Strong);

        winners.push(WinnerFact {
            field_key: field_key.to_string(),
            value: winner.value.clone(),
            source_doc_type: winner.doc_type.to_string(),
            party_side: party_for_doc_type(winner.doc_type),
            confidence_level: if winner.rank >= 80 {
                ConfidenceLevel::High
            } else {
                ConfidenceLevel::Medium
            },
            legal_defense_strength: defense,
        });
    }

    (conflicts, winners)
}

/// Normalized comparison key for an asserted value.
fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_lowercase(),
        other => other.to_string().trim().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litis_domain::NormalizedValue;
    use serde_json::json;
    use uuid::Uuid;

    fn candidate(doc_type: &str, raw: &str, confidence: f64) -> Candidate {
        Candidate {
            chunk_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            doc_type: doc_type.to_string(),
            page_number: 1,
            excerpt: raw.to_string(),
            value_raw: raw.to_string(),
            value_normalized: NormalizedValue::Excerpt {
                excerpt: raw.to_string(),
            },
            score: 0,
            confidence,
            party_side: party_for_doc_type(doc_type),
        }
    }

    /// Synthetic wage-inflation case: the claim asserts 500, payroll says
    /// 210, the contract says 200.
    fn inflation_case() -> Vec<DocumentAssertions> {
        vec![
            DocumentAssertions::new(
                "CONTRATO_INDIVIDUAL",
                [
                    ("start_date", json!("2022-01-01")),
                    ("daily_salary", json!(200.00)),
                ],
            ),
            DocumentAssertions::new(
                "DEMANDA_INICIAL",
                [
                    ("start_date", json!("2020-01-01")),
                    ("daily_salary", json!(500.00)),
                ],
            ),
            DocumentAssertions::new("RECIBO_NOMINA", [("daily_salary", json!(210.00))]),
            DocumentAssertions::new("ALTA_IMSS", [("start_date", json!("2022-01-05"))]),
        ]
    }

    #[test]
    fn test_field_domain_lookup() {
        assert_eq!(field_domain("salary_sd"), FieldDomain::Economica);
        assert_eq!(field_domain("claimed_amount"), FieldDomain::Economica);
        assert_eq!(field_domain("start_date_real"), FieldDomain::Identidad);
        assert_eq!(field_domain("work_schedule"), FieldDomain::Condiciones);
    }

    #[test]
    fn test_precedence_rank_table() {
        assert_eq!(precedence_rank("RECIBO_NOMINA", "salary_sd", true), 100);
        assert_eq!(precedence_rank("CONTRATO_INDIVIDUAL", "salary_sd", true), 90);
        assert_eq!(precedence_rank("DEMANDA_INICIAL", "salary_sd", true), 80);
        assert_eq!(precedence_rank("ALTA_IMSS", "start_date_real", true), 100);
        assert_eq!(precedence_rank("LISTA_ASISTENCIA", "work_schedule", true), 90);
        // Unlisted type, unlisted field.
        assert_eq!(precedence_rank("PERITAJE", "work_schedule", true), 40);
        // The claim outside its domain order.
        assert_eq!(precedence_rank("DEMANDA_INICIAL", "bonus_plan", true), 20);
    }

    #[test]
    fn test_burden_shift_without_signed_contract() {
        assert_eq!(precedence_rank("DEMANDA_INICIAL", "bonus_plan", false), 85);
        // Types in the domain order are unaffected.
        assert_eq!(precedence_rank("RECIBO_NOMINA", "salary_sd", false), 100);
    }

    #[test]
    fn test_resolve_picks_highest_selection_score() {
        let candidates = vec![
            candidate("CONTRATO_INDIVIDUAL", "200.00", 0.9),
            candidate("DEMANDA_INICIAL", "500.00", 0.3),
            candidate("RECIBO_NOMINA", "210.00", 0.8),
        ];
        let winner = resolve_precedence(&candidates, "salary_sd", true).unwrap();
        assert_eq!(winner.doc_type, "RECIBO_NOMINA");
        assert_eq!(winner.value_raw, "210.00");
    }

    #[test]
    fn test_resolve_tie_keeps_first_seen() {
        let candidates = vec![
            candidate("RECIBO_NOMINA", "primero", 0.5),
            candidate("RECIBO_NOMINA", "segundo", 0.5),
        ];
        let winner = resolve_precedence(&candidates, "salary_sd", true).unwrap();
        assert_eq!(winner.value_raw, "primero");
    }

    #[test]
    fn test_resolve_confidence_breaks_rank_ties() {
        let candidates = vec![
            candidate("RECIBO_NOMINA", "debil", 0.2),
            candidate("RECIBO_NOMINA", "fuerte", 0.9),
        ];
        let winner = resolve_precedence(&candidates, "salary_sd", true).unwrap();
        assert_eq!(winner.value_raw, "fuerte");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(resolve_precedence(&[], "salary_sd", true).is_none());
    }

    #[test]
    fn test_distinct_values_normalization() {
        let candidates = vec![
            candidate("RECIBO_NOMINA", "210.00", 0.8),
            candidate("CONTRATO_INDIVIDUAL", " 210.00 ", 0.8),
            candidate("DEMANDA_INICIAL", "500.00", 0.3),
        ];
        assert_eq!(distinct_values(&candidates), vec!["210.00", "500.00"]);
    }

    #[test]
    fn test_salary_precedence_in_synthetic_case() {
        let (conflicts, winners) = detect_conflicts(&inflation_case(), true);

        let salary = winners.iter().find(|w| w.field_key == "daily_salary").unwrap();
        assert_eq!(salary.value, json!(210.00));
        assert_eq!(salary.source_doc_type, "RECIBO_NOMINA");
        assert_eq!(salary.confidence_level, ConfidenceLevel::High);

        let salary_conflicts: Vec<_> = conflicts
            .iter()
            .filter(|c| c.field_key == "daily_salary")
            .collect();
        assert!(!salary_conflicts.is_empty());
        assert!(salary_conflicts
            .iter()
            .any(|c| c.source_doc_type == "DEMANDA_INICIAL"));
    }

    #[test]
    fn test_start_date_conflict_in_synthetic_case() {
        let (conflicts, winners) = detect_conflicts(&inflation_case(), true);

        let start_date = winners.iter().find(|w| w.field_key == "start_date").unwrap();
        // The registration wins over contract and claim.
        assert_eq!(start_date.source_doc_type, "ALTA_IMSS");
        assert!(start_date.value.to_string().contains("2022"));
        assert!(matches!(
            start_date.party_side,
            PartySide::Empresa | PartySide::Autoridad
        ));
        assert!(!conflicts.is_empty());
    }

    #[test]
    fn test_schedule_override_by_attendance_log() {
        let documents = vec![
            DocumentAssertions::new("DEMANDA_INICIAL", [("work_schedule", json!("08:00 - 22:00"))]),
            DocumentAssertions::new(
                "LISTA_ASISTENCIA",
                [
                    ("work_schedule", json!("09:00 - 18:00")),
                    ("employee_signature", json!(true)),
                ],
            ),
        ];
        let (conflicts, winners) = detect_conflicts(&documents, true);

        let schedule = winners.iter().find(|w| w.field_key == "work_schedule").unwrap();
        assert_eq!(schedule.value, json!("09:00 - 18:00"));
        assert_eq!(schedule.source_doc_type, "LISTA_ASISTENCIA");
        assert_eq!(schedule.legal_defense_strength, Some(DefenseStrength::Strong));
        assert!(!conflicts.is_empty());
    }

    #[test]
    fn test_agreeing_sources_produce_no_conflict() {
        let documents = vec![
            DocumentAssertions::new("RECIBO_NOMINA", [("daily_salary", json!(210.00))]),
            DocumentAssertions::new("CONTRATO_INDIVIDUAL", [("daily_salary", json!(210.00))]),
        ];
        let (conflicts, winners) = detect_conflicts(&documents, true);
        assert!(conflicts.is_empty());
        assert_eq!(winners.len(), 1);
    }

    #[test]
    fn test_claim_wins_when_contract_unsigned() {
        let documents = vec![
            DocumentAssertions::new("DEMANDA_INICIAL", [("work_schedule", json!("08:00 - 22:00"))]),
            DocumentAssertions::new("ACTA_ADMINISTRATIVA", [("work_schedule", json!("09:00 - 18:00"))]),
        ];
        let (_, winners) = detect_conflicts(&documents, false);
        let schedule = winners.iter().find(|w| w.field_key == "work_schedule").unwrap();
        // 85 (shifted burden) beats the default 40.
        assert_eq!(schedule.source_doc_type, "DEMANDA_INICIAL");
        assert_eq!(schedule.party_side, PartySide::Trabajador);
    }
}
