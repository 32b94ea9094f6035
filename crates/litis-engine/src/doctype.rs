//! Document-type canonicalization
//!
//! Upstream classification produces noisy labels (model output, legacy
//! imports, empty strings). Everything downstream — precedence, required
//! document checks, compliance — keys on the canonical vocabulary, so
//! canonicalization happens once per build, up front.

use litis_domain::{Document, PartySide};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Canonical document-type vocabulary.
pub mod doc_types {
    /// Individual employment contract
    pub const CONTRATO_INDIVIDUAL: &str = "CONTRATO_INDIVIDUAL";
    /// Payroll receipt (CFDI)
    pub const RECIBO_NOMINA: &str = "RECIBO_NOMINA";
    /// Initial claim filed by the worker
    pub const DEMANDA_INICIAL: &str = "DEMANDA_INICIAL";
    /// Employer rescission notice
    pub const AVISO_RESCISION: &str = "AVISO_RESCISION";
    /// Resignation letter
    pub const CARTA_RENUNCIA: &str = "CARTA_RENUNCIA";
    /// Social-security registration
    pub const ALTA_IMSS: &str = "ALTA_IMSS";
    /// Employment certificate
    pub const CONSTANCIA_LABORAL: &str = "CONSTANCIA_LABORAL";
    /// Attendance log
    pub const LISTA_ASISTENCIA: &str = "LISTA_ASISTENCIA";
    /// Administrative record
    pub const ACTA_ADMINISTRATIVA: &str = "ACTA_ADMINISTRATIVA";
    /// Internal work regulations
    pub const REGLAMENTO_INTERIOR: &str = "REGLAMENTO_INTERIOR";
    /// Specialized-services registration folder
    pub const EXPEDIENTE_REPSE: &str = "EXPEDIENTE_REPSE";
    /// Psychosocial-risk program folder
    pub const CARPETA_NOM035: &str = "CARPETA_NOM035";
    /// Joint committee minutes
    pub const COMISION_MIXTA: &str = "COMISION_MIXTA";
    /// Confidentiality agreement
    pub const CONVENIO_NDA: &str = "CONVENIO_NDA";
    /// Settlement receipt
    pub const RECIBO_FINIQUITO: &str = "RECIBO_FINIQUITO";
    /// IMSS electronic filing
    pub const IDSE: &str = "IDSE";
    /// IMSS payment system record
    pub const SUA: &str = "SUA";
    /// Fallback for documents nothing could classify
    pub const SIN_CLASIFICAR: &str = "SIN_CLASIFICAR";
}

use doc_types::*;

/// Known aliases for canonical labels.
const ALIASES: &[(&str, &str)] = &[
    ("NOMINA_CFDI", RECIBO_NOMINA),
    ("CFDI_NOMINA", RECIBO_NOMINA),
    ("RECIBO_SUELDO", RECIBO_NOMINA),
    ("CONTRATO_TRABAJO", CONTRATO_INDIVIDUAL),
    ("DEMANDA", DEMANDA_INICIAL),
    ("AVISO_RESCISION_PATRONAL", AVISO_RESCISION),
    ("RENUNCIA", CARTA_RENUNCIA),
    ("ACTA_ADMIN", ACTA_ADMINISTRATIVA),
];

/// Filename substrings checked, in order, when the label is empty.
const FILENAME_HINTS: &[(&str, &str)] = &[
    ("nomina", RECIBO_NOMINA),
    ("cfdi", RECIBO_NOMINA),
    ("contrato", CONTRATO_INDIVIDUAL),
    ("demanda", DEMANDA_INICIAL),
    ("renuncia", CARTA_RENUNCIA),
    ("rescision", AVISO_RESCISION),
    ("asistencia", LISTA_ASISTENCIA),
    ("reglamento", REGLAMENTO_INTERIOR),
    ("imss", ALTA_IMSS),
];

/// Normalize a raw document-type label, falling back to filename
/// inference. Never returns an empty type.
///
/// Non-empty labels with no known alias pass through verbatim: the
/// vocabulary is open and an unknown label is assumed already canonical.
pub fn canonical_doc_type(raw_type: &str, filename: &str) -> String {
    let label = raw_type.trim().to_uppercase();
    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == label) {
        return (*canonical).to_string();
    }
    if !label.is_empty() {
        return label;
    }

    let name = filename.to_lowercase();
    for (hint, canonical) in FILENAME_HINTS {
        if name.contains(hint) {
            return (*canonical).to_string();
        }
    }
    SIN_CLASIFICAR.to_string()
}

/// Group a case's documents by canonical type.
///
/// Returns the grouping plus a per-document lookup used to tag retrieval
/// candidates with their source type.
pub fn group_by_canonical_type(
    documents: &[Document],
) -> (BTreeMap<String, Vec<&Document>>, HashMap<Uuid, String>) {
    let mut by_type: BTreeMap<String, Vec<&Document>> = BTreeMap::new();
    let mut doc_id_to_type = HashMap::new();
    for doc in documents {
        let canonical = canonical_doc_type(&doc.raw_doc_type, &doc.filename);
        by_type.entry(canonical.clone()).or_default().push(doc);
        doc_id_to_type.insert(doc.id, canonical);
    }
    (by_type, doc_id_to_type)
}

/// Which party a canonical document type speaks for.
pub fn party_for_doc_type(doc_type: &str) -> PartySide {
    match doc_type.to_uppercase().as_str() {
        DEMANDA_INICIAL | CARTA_RENUNCIA => PartySide::Trabajador,
        ALTA_IMSS | IDSE | SUA => PartySide::Autoridad,
        CONTRATO_INDIVIDUAL | RECIBO_NOMINA | LISTA_ASISTENCIA | ACTA_ADMINISTRATIVA => {
            PartySide::Empresa
        }
        _ => PartySide::Neutro,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(raw_type: &str, filename: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            raw_doc_type: raw_type.to_string(),
            chunks: Vec::new(),
        }
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(canonical_doc_type("NOMINA_CFDI", ""), RECIBO_NOMINA);
        assert_eq!(canonical_doc_type("demanda", ""), DEMANDA_INICIAL);
        assert_eq!(canonical_doc_type("  contrato_trabajo  ", ""), CONTRATO_INDIVIDUAL);
    }

    #[test]
    fn test_unknown_label_passes_through() {
        assert_eq!(canonical_doc_type("PERITAJE_CALIGRAFICO", "x.pdf"), "PERITAJE_CALIGRAFICO");
        assert_eq!(canonical_doc_type("alta_imss", ""), ALTA_IMSS);
    }

    #[test]
    fn test_filename_inference_when_empty() {
        assert_eq!(canonical_doc_type("", "recibo_nomina_enero.pdf"), RECIBO_NOMINA);
        assert_eq!(canonical_doc_type("", "CONTRATO_firmado.pdf"), CONTRATO_INDIVIDUAL);
        assert_eq!(canonical_doc_type("", "demanda_laboral.pdf"), DEMANDA_INICIAL);
        assert_eq!(canonical_doc_type("", "lista_asistencia_q1.xlsx"), LISTA_ASISTENCIA);
        assert_eq!(canonical_doc_type("", "alta_imss_2022.pdf"), ALTA_IMSS);
    }

    #[test]
    fn test_default_when_nothing_matches() {
        assert_eq!(canonical_doc_type("", "scan0001.pdf"), SIN_CLASIFICAR);
        assert_eq!(canonical_doc_type("", ""), SIN_CLASIFICAR);
    }

    #[test]
    fn test_grouping() {
        let docs = vec![
            doc("RECIBO_NOMINA", "enero.pdf"),
            doc("NOMINA_CFDI", "febrero.pdf"),
            doc("", "demanda.pdf"),
        ];
        let (by_type, id_to_type) = group_by_canonical_type(&docs);
        assert_eq!(by_type.get(RECIBO_NOMINA).map(Vec::len), Some(2));
        assert_eq!(by_type.get(DEMANDA_INICIAL).map(Vec::len), Some(1));
        assert_eq!(id_to_type.get(&docs[1].id).map(String::as_str), Some(RECIBO_NOMINA));
        assert_eq!(id_to_type.len(), 3);
    }

    #[test]
    fn test_party_attribution() {
        assert_eq!(party_for_doc_type(DEMANDA_INICIAL), PartySide::Trabajador);
        assert_eq!(party_for_doc_type(ALTA_IMSS), PartySide::Autoridad);
        assert_eq!(party_for_doc_type(RECIBO_NOMINA), PartySide::Empresa);
        assert_eq!(party_for_doc_type("PERITAJE"), PartySide::Neutro);
    }
}
