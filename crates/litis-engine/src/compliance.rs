//! Regulatory-compliance checklist evaluation
//!
//! Independent of semantic retrieval: compliance is about which
//! administrative documents exist in the case file, not about what their
//! text asserts. The one time-sensitive item is the specialized-services
//! registration (REPSE), which lapses; its validity date is scanned from
//! the document's filename and chunk text, taking the latest parseable
//! date found.

use crate::doctype::doc_types::*;
use chrono::NaiveDate;
use litis_domain::{ComplianceStatus, Document, RiskLevel};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static COMPLIANCE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})|(\d{2}[/-]\d{2}[/-]\d{2,4})").unwrap());

/// Result of one checklist item.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceCheck {
    /// Stable field key for the resulting fact
    pub field_key: &'static str,
    /// Outcome
    pub status: ComplianceStatus,
    /// Risk contribution of the outcome
    pub risk_level: RiskLevel,
    /// Why the rule flagged (or cleared) this item
    pub why_flagged: String,
    /// What evidence would fix the item
    pub evidence_hint: &'static str,
    /// Document type the item requires
    pub required_doc_type: &'static str,
    /// Document type that satisfied the item, when present
    pub source_doc_type: Option<&'static str>,
}

/// Termination-documentation report.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationReport {
    /// The missing case-deciding document, if any
    pub missing_critical_doc: Option<&'static str>,
    /// 0 when the critical document is missing, 100 otherwise
    pub risk_score: u8,
    /// Recommendation code
    pub recommendation: &'static str,
}

/// Presence-only checklist items: (required type, field key, hint).
const PRESENCE_CHECKS: &[(&str, &str, &str)] = &[
    (CARPETA_NOM035, "nom035_status", "Agregar carpeta NOM-035 y evidencias de aplicacion."),
    (REGLAMENTO_INTERIOR, "reglamento_status", "Agregar reglamento interior depositado/vigente."),
    (COMISION_MIXTA, "comisiones_mixtas_status", "Agregar actas/comisiones mixtas."),
    (CONVENIO_NDA, "nda_status", "Agregar convenio de confidencialidad firmado."),
    (LISTA_ASISTENCIA, "attendance_control", "Agregar listas de asistencia firmadas."),
    (ALTA_IMSS, "imss_registration", "Agregar alta/reporte IMSS."),
];

fn parse_compliance_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y", "%d-%m-%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    None
}

/// Latest parseable date in the text, if any. A document may mention
/// issue and expiry dates; the latest one is the validity horizon.
fn extract_valid_until(text: &str) -> Option<NaiveDate> {
    COMPLIANCE_DATE_RE
        .find_iter(text)
        .filter_map(|m| parse_compliance_date(m.as_str()))
        .max()
}

/// Evaluate the full checklist against the case's grouped documents.
pub fn evaluate_compliance(
    docs_by_type: &BTreeMap<String, Vec<&Document>>,
    now: NaiveDate,
) -> Vec<ComplianceCheck> {
    let mut results = Vec::new();

    // REPSE, the time-sensitive item.
    let repse_docs = docs_by_type
        .get(EXPEDIENTE_REPSE)
        .map(|docs| docs.as_slice())
        .unwrap_or(&[]);
    if repse_docs.is_empty() {
        results.push(ComplianceCheck {
            field_key: "repse_status",
            status: ComplianceStatus::Ausente,
            risk_level: RiskLevel::High,
            why_flagged: "No existe expediente REPSE.".to_string(),
            evidence_hint: "Agregar constancia vigente REPSE.",
            required_doc_type: EXPEDIENTE_REPSE,
            source_doc_type: None,
        });
    } else {
        let mut blob = String::new();
        for doc in repse_docs {
            blob.push_str(&doc.filename);
            blob.push(' ');
            for chunk in &doc.chunks {
                blob.push_str(&chunk.text);
                blob.push(' ');
            }
        }
        let check = match extract_valid_until(&blob) {
            Some(valid_until) if valid_until < now => ComplianceCheck {
                field_key: "repse_status",
                status: ComplianceStatus::Vencido,
                risk_level: RiskLevel::High,
                why_flagged: format!("REPSE vencido desde {}.", valid_until),
                evidence_hint: "Actualizar constancia REPSE vigente.",
                required_doc_type: EXPEDIENTE_REPSE,
                source_doc_type: Some(EXPEDIENTE_REPSE),
            },
            // A registration without a readable date cannot be
            // treated as valid, only as insufficient evidence.
            None => ComplianceCheck {
                field_key: "repse_status",
                status: ComplianceStatus::Insuficiente,
                risk_level: RiskLevel::Medium,
                why_flagged: "REPSE presente pero sin fecha verificable de vigencia."
                    .to_string(),
                evidence_hint: "Agregar constancia REPSE con fecha de vigencia legible.",
                required_doc_type: EXPEDIENTE_REPSE,
                source_doc_type: Some(EXPEDIENTE_REPSE),
            },
            Some(_) => ComplianceCheck {
                field_key: "repse_status",
                status: ComplianceStatus::Presente,
                risk_level: RiskLevel::Low,
                why_flagged: "REPSE presente.".to_string(),
                evidence_hint: "Mantener evidencia de vigencia.",
                required_doc_type: EXPEDIENTE_REPSE,
                source_doc_type: Some(EXPEDIENTE_REPSE),
            },
        };
        results.push(check);
    }

    for &(doc_type, field_key, hint) in PRESENCE_CHECKS {
        let present = docs_by_type.get(doc_type).is_some_and(|docs| !docs.is_empty());
        results.push(ComplianceCheck {
            field_key,
            status: if present {
                ComplianceStatus::Presente
            } else {
                ComplianceStatus::Ausente
            },
            risk_level: if present { RiskLevel::Low } else { RiskLevel::High },
            why_flagged: format!(
                "{} {}.",
                doc_type,
                if present { "presente" } else { "ausente" }
            ),
            evidence_hint: hint,
            required_doc_type: doc_type,
            source_doc_type: present.then_some(doc_type),
        });
    }

    results
}

/// Termination-documentation check.
///
/// A case that alleges termination (initial claim or administrative
/// record present) with no rescission notice is economically exposed in
/// full: the employer cannot prove cause.
pub fn check_termination_documentation<'a, I>(doc_types: I) -> TerminationReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut alleges_termination = false;
    let mut has_notice = false;
    for doc_type in doc_types {
        let dt = doc_type.to_uppercase();
        if dt == DEMANDA_INICIAL || dt == ACTA_ADMINISTRATIVA {
            alleges_termination = true;
        }
        if dt == AVISO_RESCISION {
            has_notice = true;
        }
    }

    if alleges_termination && !has_notice {
        TerminationReport {
            missing_critical_doc: Some(AVISO_RESCISION),
            risk_score: 0,
            recommendation: "RIESGO_ECONOMICO_TOTAL",
        }
    } else {
        TerminationReport {
            missing_critical_doc: None,
            risk_score: 100,
            recommendation: "CUMPLIMIENTO_MINIMO_OK",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litis_domain::DocumentChunk;
    use uuid::Uuid;

    fn doc(doc_type: &str, filename: &str, chunk_texts: &[&str]) -> Document {
        Document {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            raw_doc_type: doc_type.to_string(),
            chunks: chunk_texts
                .iter()
                .enumerate()
                .map(|(i, text)| DocumentChunk {
                    id: Uuid::new_v4(),
                    page_number: 1,
                    chunk_index: i as i32,
                    text: text.to_string(),
                    embedding: None,
                })
                .collect(),
        }
    }

    fn grouped(docs: &[Document]) -> BTreeMap<String, Vec<&Document>> {
        let mut by_type: BTreeMap<String, Vec<&Document>> = BTreeMap::new();
        for d in docs {
            by_type.entry(d.raw_doc_type.clone()).or_default().push(d);
        }
        by_type
    }

    fn repse_check(results: &[ComplianceCheck]) -> &ComplianceCheck {
        results.iter().find(|c| c.field_key == "repse_status").unwrap()
    }

    fn now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 12).unwrap()
    }

    #[test]
    fn test_repse_absent() {
        let results = evaluate_compliance(&BTreeMap::new(), now());
        let repse = repse_check(&results);
        assert_eq!(repse.status, ComplianceStatus::Ausente);
        assert_eq!(repse.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_repse_expired() {
        let docs = vec![doc(
            EXPEDIENTE_REPSE,
            "repse_constancia.pdf",
            &["Registro REPSE con vigencia al 01/01/2020."],
        )];
        let results = evaluate_compliance(&grouped(&docs), now());
        let repse = repse_check(&results);
        assert_eq!(repse.status, ComplianceStatus::Vencido);
        assert_eq!(repse.risk_level, RiskLevel::High);
        assert!(repse.why_flagged.contains("2020-01-01"));
    }

    #[test]
    fn test_repse_valid_uses_latest_date() {
        // Issue date in the past, expiry in the future: the latest
        // parseable date decides.
        let docs = vec![doc(
            EXPEDIENTE_REPSE,
            "repse.pdf",
            &["Expedido el 01/01/2024. Vigente hasta 2027-06-30."],
        )];
        let results = evaluate_compliance(&grouped(&docs), now());
        assert_eq!(repse_check(&results).status, ComplianceStatus::Presente);
        assert_eq!(repse_check(&results).risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_repse_no_parseable_date_is_insufficient() {
        let docs = vec![doc(EXPEDIENTE_REPSE, "repse.pdf", &["Constancia ilegible"])];
        let results = evaluate_compliance(&grouped(&docs), now());
        let repse = repse_check(&results);
        assert_eq!(repse.status, ComplianceStatus::Insuficiente);
        assert_eq!(repse.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_repse_date_in_filename() {
        let docs = vec![doc(EXPEDIENTE_REPSE, "repse_01-01-2020.pdf", &[])];
        let results = evaluate_compliance(&grouped(&docs), now());
        assert_eq!(repse_check(&results).status, ComplianceStatus::Vencido);
    }

    #[test]
    fn test_presence_items() {
        let docs = vec![doc(ALTA_IMSS, "alta.pdf", &[]), doc(LISTA_ASISTENCIA, "lista.pdf", &[])];
        let results = evaluate_compliance(&grouped(&docs), now());

        let imss = results.iter().find(|c| c.field_key == "imss_registration").unwrap();
        assert_eq!(imss.status, ComplianceStatus::Presente);
        assert_eq!(imss.risk_level, RiskLevel::Low);
        assert_eq!(imss.source_doc_type, Some(ALTA_IMSS));

        let nom035 = results.iter().find(|c| c.field_key == "nom035_status").unwrap();
        assert_eq!(nom035.status, ComplianceStatus::Ausente);
        assert_eq!(nom035.risk_level, RiskLevel::High);
        assert_eq!(nom035.source_doc_type, None);
    }

    #[test]
    fn test_checklist_covers_all_items() {
        let results = evaluate_compliance(&BTreeMap::new(), now());
        // REPSE plus the six presence items.
        assert_eq!(results.len(), 1 + PRESENCE_CHECKS.len());
    }

    #[test]
    fn test_termination_missing_notice() {
        let report =
            check_termination_documentation(["DEMANDA_INICIAL", "ACTA_ADMINISTRATIVA"]);
        assert_eq!(report.missing_critical_doc, Some(AVISO_RESCISION));
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.recommendation, "RIESGO_ECONOMICO_TOTAL");
    }

    #[test]
    fn test_termination_with_notice() {
        let report = check_termination_documentation(["DEMANDA_INICIAL", "AVISO_RESCISION"]);
        assert_eq!(report.missing_critical_doc, None);
        assert_eq!(report.risk_score, 100);
        assert_eq!(report.recommendation, "CUMPLIMIENTO_MINIMO_OK");
    }

    #[test]
    fn test_termination_not_alleged() {
        let report = check_termination_documentation(["CONTRATO_INDIVIDUAL", "RECIBO_NOMINA"]);
        assert_eq!(report.missing_critical_doc, None);
        assert_eq!(report.risk_score, 100);
    }
}
