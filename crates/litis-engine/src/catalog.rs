//! Field specification catalog
//!
//! The fixed, declarative table of every fact field the engine extracts.
//! Each entry encodes the domain knowledge for one field: how to ask for
//! it (several query phrasings, because semantic recall on any single
//! phrasing is limited), which document types are authoritative for it
//! (payroll receipts outrank contracts for wage amounts; registrations
//! outrank claims for start dates), how to parse it, and whether its
//! absence is case-critical.

use crate::doctype::doc_types::*;
use crate::parsers::ValueParser;
use litis_domain::Pillar;

/// Immutable specification of one extractable fact field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Pillar the resulting fact is grouped under
    pub pillar: Pillar,
    /// Unique field identifier
    pub field_key: &'static str,
    /// Retrieval phrasings, tried in order
    pub queries: &'static [&'static str],
    /// Field-local precedence: earlier entries are more authoritative
    pub preferred_doc_types: &'static [&'static str],
    /// Whether a MISSING result escalates to a critical alert
    pub is_critical: bool,
    /// Parser strategy for candidate chunks
    pub parser: ValueParser,
    /// What evidence would fill this field
    pub evidence_hint: &'static str,
}

/// The catalog. Field keys are unique across the table.
pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        pillar: Pillar::Identidad,
        field_key: "start_date_real",
        queries: &["fecha de ingreso", "inicio de labores", "comenzo a trabajar"],
        preferred_doc_types: &[CONTRATO_INDIVIDUAL, ALTA_IMSS, CONSTANCIA_LABORAL, DEMANDA_INICIAL],
        is_critical: true,
        parser: ValueParser::Date,
        evidence_hint: "Agregar CONTRATO_INDIVIDUAL o ALTA_IMSS con fecha de ingreso visible.",
    },
    FieldSpec {
        pillar: Pillar::Identidad,
        field_key: "contract_type",
        queries: &["tipo de contrato", "duracion del contrato", "periodo de prueba"],
        preferred_doc_types: &[CONTRATO_INDIVIDUAL],
        is_critical: false,
        parser: ValueParser::ContractType,
        evidence_hint: "Agregar CONTRATO_INDIVIDUAL o CONVENIO_MODIFICATORIO.",
    },
    FieldSpec {
        pillar: Pillar::Identidad,
        field_key: "position",
        queries: &["puesto", "categoria", "funciones"],
        preferred_doc_types: &[CONTRATO_INDIVIDUAL, CONSTANCIA_LABORAL],
        is_critical: false,
        parser: ValueParser::Excerpt,
        evidence_hint: "Agregar documento con puesto/categoria (contrato o constancia).",
    },
    FieldSpec {
        pillar: Pillar::Economica,
        field_key: "salary_sd",
        queries: &["salario diario", "cuota diaria", "sueldo base"],
        preferred_doc_types: &[RECIBO_NOMINA, CONTRATO_INDIVIDUAL],
        is_critical: true,
        parser: ValueParser::Money,
        evidence_hint: "Agregar RECIBO_NOMINA (CFDI) o contrato con salario diario.",
    },
    FieldSpec {
        pillar: Pillar::Economica,
        field_key: "salary_sdi",
        queries: &["salario diario integrado", "sdi"],
        preferred_doc_types: &[RECIBO_NOMINA, CONTRATO_INDIVIDUAL],
        is_critical: false,
        parser: ValueParser::Money,
        evidence_hint: "Agregar recibo o anexo con SDI.",
    },
    FieldSpec {
        pillar: Pillar::Conflicto,
        field_key: "claimed_amount",
        queries: &["monto reclamado", "prestaciones reclamadas", "cantidad reclamada"],
        preferred_doc_types: &[DEMANDA_INICIAL],
        is_critical: false,
        parser: ValueParser::Money,
        evidence_hint: "Agregar DEMANDA_INICIAL con monto reclamado.",
    },
    FieldSpec {
        pillar: Pillar::Conflicto,
        field_key: "closure_offer",
        queries: &["finiquito", "oferta de pago", "liquidacion ofrecida"],
        preferred_doc_types: &[RECIBO_FINIQUITO],
        is_critical: false,
        parser: ValueParser::Money,
        evidence_hint: "Agregar RECIBO_FINIQUITO o documento de oferta.",
    },
];

/// Score bonus for a candidate that parsed into both raw and normalized
/// forms. Candidates that fail to parse are discarded before scoring, so
/// every surviving candidate earns it; kept explicit so the scoring
/// formula reads as specified.
pub const PARSER_VALIDITY_BONUS: i32 = 20;

/// Authority of `doc_type` for a field with the given preference list.
///
/// Preferred types score 100 minus 10 per position; the initial claim is
/// an allegation, not evidence, and scores 10 unless the field prefers
/// it; anything else scores a neutral 30.
pub fn doc_type_priority(doc_type: &str, preferred_doc_types: &[&str]) -> i32 {
    if let Some(position) = preferred_doc_types.iter().position(|t| *t == doc_type) {
        return 100 - 10 * position as i32;
    }
    if doc_type == DEMANDA_INICIAL {
        return 10;
    }
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_keys_unique() {
        let mut seen = HashSet::new();
        for spec in FIELD_SPECS {
            assert!(seen.insert(spec.field_key), "duplicate key {}", spec.field_key);
        }
    }

    #[test]
    fn test_every_spec_has_queries_and_preferences() {
        for spec in FIELD_SPECS {
            assert!(!spec.queries.is_empty(), "{} has no queries", spec.field_key);
            assert!(
                !spec.preferred_doc_types.is_empty(),
                "{} has no preferred types",
                spec.field_key
            );
        }
    }

    #[test]
    fn test_doc_type_priority_preferred_positions() {
        let preferred = &[RECIBO_NOMINA, CONTRATO_INDIVIDUAL];
        assert_eq!(doc_type_priority(RECIBO_NOMINA, preferred), 100);
        assert_eq!(doc_type_priority(CONTRATO_INDIVIDUAL, preferred), 90);
    }

    #[test]
    fn test_doc_type_priority_demanda_is_allegation() {
        assert_eq!(doc_type_priority(DEMANDA_INICIAL, &[RECIBO_NOMINA]), 10);
        // ...unless the field explicitly prefers it.
        assert_eq!(doc_type_priority(DEMANDA_INICIAL, &[DEMANDA_INICIAL]), 100);
    }

    #[test]
    fn test_doc_type_priority_default() {
        assert_eq!(doc_type_priority(LISTA_ASISTENCIA, &[RECIBO_NOMINA]), 30);
        assert_eq!(doc_type_priority(SIN_CLASIFICAR, &[RECIBO_NOMINA]), 30);
    }

    #[test]
    fn test_wage_fields_prefer_payroll_over_contract() {
        let salary = FIELD_SPECS.iter().find(|s| s.field_key == "salary_sd").unwrap();
        assert_eq!(salary.preferred_doc_types[0], RECIBO_NOMINA);
        assert_eq!(salary.preferred_doc_types[1], CONTRATO_INDIVIDUAL);
        assert!(salary.is_critical);
    }
}
