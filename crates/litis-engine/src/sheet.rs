//! Technical sheet orchestration
//!
//! `SheetBuilder` sequences the whole build for one case: load and
//! canonicalize, collect and resolve every catalog field, derive the
//! termination cause, evaluate compliance, score, narrate, and atomically
//! replace the persisted sheet. Each build regenerates all facts and
//! alerts from scratch; the snapshot row is upserted, never multiplied.
//! Builds of the same case are serialized through an advisory per-case
//! lock.

use crate::catalog::FIELD_SPECS;
use crate::collector::collect_candidates;
use crate::compliance::{evaluate_compliance, ComplianceCheck};
use crate::config::EngineConfig;
use crate::doctype::{doc_types, group_by_canonical_type, party_for_doc_type};
use crate::error::{BuildPhase, EngineError};
use crate::locks::CaseLocks;
use crate::narrative::{build_deterministic_narrative, build_hybrid_narrative};
use crate::resolver::{conflict_group_id, distinct_values, resolve_precedence};
use crate::response::{ExecutiveSummary, TechnicalSheet};
use crate::scoring::compute_dimension_scores;
use chrono::Utc;
use litis_domain::traits::{ChunkRetriever, SheetStore, TextGenerator};
use litis_domain::{
    AlertId, ComplianceStatus, Dimension, Document, FactId, NarrativeMode, NormalizedValue,
    OverallStatus, PartySide, Pillar, RiskLevel, Severity, TechnicalAlert, TechnicalFact,
    TruthStatus,
};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Document types every case file is expected to contain.
pub const REQUIRED_DOC_TYPES: &[&str] = &[
    doc_types::CONTRATO_INDIVIDUAL,
    doc_types::ALTA_IMSS,
    doc_types::CONSTANCIA_LABORAL,
    doc_types::RECIBO_NOMINA,
    doc_types::DEMANDA_INICIAL,
    doc_types::AVISO_RESCISION,
];

/// Orchestrates technical-sheet builds and reads.
///
/// The store provides both persistence and chunk retrieval; the generator
/// is optional and only consulted for the hybrid narrative. All
/// collaborators are injected, which keeps the decision logic testable
/// with in-memory fakes.
pub struct SheetBuilder<S, G> {
    store: Arc<Mutex<S>>,
    generator: Option<Arc<G>>,
    config: EngineConfig,
    locks: CaseLocks,
}

impl<S, G> SheetBuilder<S, G>
where
    S: SheetStore + ChunkRetriever,
    <S as SheetStore>::Error: Display,
    <S as ChunkRetriever>::Error: Display,
    G: TextGenerator + Send + Sync + 'static,
    G::Error: Display,
{
    /// Create a builder over a store, with an optional narrative
    /// generator.
    pub fn new(store: S, generator: Option<G>, config: EngineConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            generator: generator.map(Arc::new),
            config,
            locks: CaseLocks::new(),
        }
    }

    /// Build (or rebuild) the technical sheet for a case.
    ///
    /// Idempotent and re-runnable: the persisted sheet is replaced
    /// atomically, so a failed build leaves the previous sheet intact.
    pub async fn build(&self, case_id: Uuid) -> Result<TechnicalSheet, EngineError> {
        let case_lock = self.locks.lock_for(case_id);
        let _serial = case_lock.lock().await;

        info!(case_id = %case_id, "Building technical sheet");

        // LOADING
        let case = {
            let store = self.lock_store(BuildPhase::Loading)?;
            store
                .load_case(case_id)
                .map_err(|e| EngineError::build(BuildPhase::Loading, e))?
        };
        let case = case.ok_or(EngineError::CaseNotFound(case_id))?;

        // CANONICALIZING
        let (docs_by_type, doc_id_to_type) = group_by_canonical_type(&case.documents);
        let contract_signed = infer_contract_signed(&docs_by_type);
        debug!(
            doc_types = docs_by_type.len(),
            contract_signed, "Canonicalized documents"
        );

        let mut facts: Vec<TechnicalFact> = Vec::new();
        let mut alerts: Vec<TechnicalAlert> = Vec::new();

        // Required documents absent from the case file.
        let mut missing_doc_types: Vec<&str> = REQUIRED_DOC_TYPES
            .iter()
            .copied()
            .filter(|dt| !docs_by_type.contains_key(*dt))
            .collect();
        missing_doc_types.sort_unstable();
        for doc_type in missing_doc_types {
            alerts.push(TechnicalAlert {
                id: AlertId::new(),
                case_id,
                severity: Severity::Critical,
                code: format!("MISSING_{}", doc_type),
                message: TechnicalAlert::missing_message("required_document", doc_type),
                dimension: Some(Dimension::Documental),
                why_flagged: Some(format!("Documento obligatorio ausente: {}.", doc_type)),
                required_doc_type: Some(doc_type.to_string()),
                field_key: Some("required_document".to_string()),
                evidence_fact_ids: Vec::new(),
            });
        }

        // EXTRACTING_FIELDS
        {
            let store = self.lock_store(BuildPhase::ExtractingFields)?;
            for spec in FIELD_SPECS {
                let candidates = collect_candidates(
                    &*store,
                    case_id,
                    spec,
                    &doc_id_to_type,
                    self.config.top_k_chunks,
                    self.config.excerpt_max_len,
                );

                let Some(winner) =
                    resolve_precedence(&candidates, spec.field_key, contract_signed)
                else {
                    let risk = if spec.is_critical {
                        RiskLevel::Critical
                    } else {
                        RiskLevel::High
                    };
                    let rule = if spec.is_critical {
                        "missing_required_doc"
                    } else {
                        "missing_evidence"
                    };
                    let mut missing =
                        TechnicalFact::missing(case_id, spec.pillar, spec.field_key, risk, rule)
                            .with_evidence_hint(spec.evidence_hint);
                    if spec.is_critical {
                        missing = missing.with_why_critical(format!(
                            "No se encontro evidencia valida para {}.",
                            spec.field_key
                        ));
                    }
                    if spec.is_critical {
                        alerts.push(TechnicalAlert {
                            id: AlertId::new(),
                            case_id,
                            severity: Severity::Critical,
                            code: format!("MISSING_{}", spec.field_key.to_uppercase()),
                            message: TechnicalAlert::missing_message(
                                spec.field_key,
                                spec.preferred_doc_types[0],
                            ),
                            dimension: Some(Dimension::Documental),
                            why_flagged: Some(format!(
                                "Campo critico sin evidencia: {}.",
                                spec.field_key
                            )),
                            required_doc_type: Some(spec.preferred_doc_types[0].to_string()),
                            field_key: Some(spec.field_key.to_string()),
                            evidence_fact_ids: vec![missing.id],
                        });
                    }
                    facts.push(missing);
                    continue;
                };

                let is_claim = winner.doc_type == doc_types::DEMANDA_INICIAL;
                facts.push(TechnicalFact {
                    id: FactId::new(),
                    case_id,
                    pillar: spec.pillar,
                    field_key: spec.field_key.to_string(),
                    value_raw: Some(winner.value_raw.clone()),
                    value_normalized: Some(winner.value_normalized.clone()),
                    source_doc_id: Some(winner.document_id),
                    source_page: Some(winner.page_number),
                    source_excerpt: Some(winner.excerpt.clone()),
                    source_doc_type: Some(winner.doc_type.clone()),
                    risk_level: if is_claim { RiskLevel::Medium } else { RiskLevel::Low },
                    confidence: winner.confidence,
                    truth_status: if is_claim { TruthStatus::Claim } else { TruthStatus::Fact },
                    rule_applied: if is_claim {
                        "demanda_es_pretension".to_string()
                    } else {
                        "precedencia_deterministica".to_string()
                    },
                    party_side: Some(winner.party_side),
                    conflict_group_id: None,
                    precedence_rank: Some(winner.score),
                    legal_defense_strength: None,
                    why_critical: None,
                    evidence_hint: Some(spec.evidence_hint.to_string()),
                });

                let values = distinct_values(&candidates);
                if values.len() > 1 {
                    let group = conflict_group_id(&case_id.to_string(), spec.field_key);
                    facts.push(TechnicalFact::conflict(
                        case_id,
                        spec.pillar,
                        spec.field_key,
                        NormalizedValue::conflict(
                            values.iter(),
                            Some(winner.value_raw.clone()),
                        ),
                        group,
                    ));
                    alerts.push(TechnicalAlert {
                        id: AlertId::new(),
                        case_id,
                        severity: Severity::High,
                        code: format!("CONFLICT_{}", spec.field_key.to_uppercase()),
                        message: format!("Conflicto detectado en campo {}.", spec.field_key),
                        dimension: Some(Dimension::Documental),
                        why_flagged: Some(
                            "Existen fuentes validas con valores distintos.".to_string(),
                        ),
                        required_doc_type: spec
                            .preferred_doc_types
                            .first()
                            .map(|t| t.to_string()),
                        field_key: Some(spec.field_key.to_string()),
                        evidence_fact_ids: Vec::new(),
                    });
                }
            }
        }

        // DERIVING_TERMINATION
        self.derive_termination_cause(case_id, &docs_by_type, &mut facts, &mut alerts);

        // EVALUATING_COMPLIANCE
        let checks = evaluate_compliance(&docs_by_type, Utc::now().date_naive());
        for check in checks {
            self.emit_compliance(case_id, &docs_by_type, check, &mut facts, &mut alerts);
        }

        // SCORING_AND_NARRATIVE
        let high_impact_alerts: Vec<String> = alerts
            .iter()
            .filter(|a| a.is_high_impact())
            .map(|a| a.message.clone())
            .collect();
        let overall_status = resolve_overall_status(&facts, &alerts);
        let cause = facts
            .iter()
            .find(|f| f.field_key == "termination_cause")
            .and_then(|f| f.value_raw.clone())
            .unwrap_or_else(|| "INDETERMINADA".to_string());
        let claimed = fact_amount(&facts, "claimed_amount");
        let offered = fact_amount(&facts, "closure_offer");
        let gap = match (claimed, offered) {
            (Some(claimed), Some(offered)) => Some(claimed - offered),
            _ => None,
        };

        let deterministic = build_deterministic_narrative(&cause, gap, &high_impact_alerts);
        let (litis_narrative, narrative_mode) = match (&self.generator, self.config.hybrid_narrative)
        {
            (Some(generator), true) => {
                build_hybrid_narrative(
                    Arc::clone(generator),
                    deterministic,
                    &facts,
                    &alerts,
                    &self.config,
                )
                .await
            }
            _ => (deterministic, NarrativeMode::Deterministic),
        };

        let snapshot = litis_domain::TechnicalSnapshot {
            case_id,
            overall_status,
            litis_narrative,
            narrative_mode,
            dimension_scores: compute_dimension_scores(&facts, &alerts),
            high_impact_alerts,
            updated_at: Utc::now(),
        };

        // PERSISTING: one atomic replace of the whole sheet.
        {
            let mut store = self.lock_store(BuildPhase::Persisting)?;
            store
                .replace_sheet(case_id, &facts, &alerts, &snapshot)
                .map_err(|e| EngineError::build(BuildPhase::Persisting, e))?;
        }

        info!(
            case_id = %case_id,
            facts = facts.len(),
            alerts = alerts.len(),
            status = overall_status.as_str(),
            "Technical sheet built"
        );

        self.read(case_id)
    }

    /// Read the last persisted sheet without rebuilding.
    pub fn read(&self, case_id: Uuid) -> Result<TechnicalSheet, EngineError> {
        let store = self.lock_store(BuildPhase::Loading)?;
        let snapshot = store
            .snapshot(case_id)
            .map_err(|e| EngineError::build(BuildPhase::Loading, e))?;
        let facts = store
            .facts(case_id)
            .map_err(|e| EngineError::build(BuildPhase::Loading, e))?;
        let alerts = store
            .alerts(case_id)
            .map_err(|e| EngineError::build(BuildPhase::Loading, e))?;
        drop(store);

        let mut pillars: BTreeMap<String, Vec<TechnicalFact>> = [
            Pillar::Identidad,
            Pillar::Economica,
            Pillar::Conflicto,
            Pillar::Compliance,
        ]
        .iter()
        .map(|p| (p.title().to_string(), Vec::new()))
        .collect();
        for fact in &facts {
            pillars
                .entry(fact.pillar.title().to_string())
                .or_default()
                .push(fact.clone());
        }

        let conflicts: Vec<TechnicalFact> = facts
            .iter()
            .filter(|f| {
                f.truth_status == TruthStatus::Conflict || f.conflict_group_id.is_some()
            })
            .cloned()
            .collect();
        let missing_required_docs: Vec<TechnicalAlert> = alerts
            .iter()
            .filter(|a| a.is_missing_doc())
            .cloned()
            .collect();

        let executive_summary = match &snapshot {
            Some(snapshot) => ExecutiveSummary {
                overall_status: snapshot.overall_status,
                litis_narrative: snapshot.litis_narrative.clone(),
                high_impact_alerts: snapshot.high_impact_alerts.clone(),
                dimension_scores: snapshot.dimension_scores.clone(),
                narrative_mode: snapshot.narrative_mode,
            },
            None => ExecutiveSummary {
                overall_status: OverallStatus::Yellow,
                litis_narrative: "Ficha tecnica aun no generada.".to_string(),
                high_impact_alerts: Vec::new(),
                dimension_scores: BTreeMap::new(),
                narrative_mode: NarrativeMode::Deterministic,
            },
        };

        Ok(TechnicalSheet {
            case_id,
            executive_summary,
            pillars,
            facts,
            conflicts,
            missing_required_docs,
            alerts,
            generated_at: snapshot.map(|s| s.updated_at).unwrap_or_else(Utc::now),
        })
    }

    fn lock_store(
        &self,
        phase: BuildPhase,
    ) -> Result<std::sync::MutexGuard<'_, S>, EngineError> {
        self.store
            .lock()
            .map_err(|_| EngineError::build(phase, "store lock poisoned"))
    }

    fn derive_termination_cause(
        &self,
        case_id: Uuid,
        docs_by_type: &BTreeMap<String, Vec<&Document>>,
        facts: &mut Vec<TechnicalFact>,
        alerts: &mut Vec<TechnicalAlert>,
    ) {
        let derived = [
            (doc_types::AVISO_RESCISION, "RESCISION_PATRONAL", TruthStatus::Fact, "aviso_rescision_presente"),
            (doc_types::CARTA_RENUNCIA, "RENUNCIA_VOLUNTARIA", TruthStatus::Fact, "carta_renuncia_presente"),
            (doc_types::DEMANDA_INICIAL, "DESPIDO_INJUSTIFICADO", TruthStatus::Claim, "demanda_es_pretension"),
        ]
        .iter()
        .find_map(|(doc_type, cause, truth, rule)| {
            docs_by_type
                .get(*doc_type)
                .and_then(|docs| docs.first())
                .map(|doc| (*doc_type, *cause, *truth, *rule, doc.id))
        });

        match derived {
            Some((doc_type, cause, truth_status, rule, source_doc_id)) => {
                let is_claim = truth_status == TruthStatus::Claim;
                facts.push(TechnicalFact {
                    id: FactId::new(),
                    case_id,
                    pillar: Pillar::Conflicto,
                    field_key: "termination_cause".to_string(),
                    value_raw: Some(cause.to_string()),
                    value_normalized: Some(NormalizedValue::TerminationCause {
                        cause: cause.to_string(),
                    }),
                    source_doc_id: Some(source_doc_id),
                    source_page: Some(1),
                    source_excerpt: None,
                    source_doc_type: Some(doc_type.to_string()),
                    risk_level: if is_claim { RiskLevel::Medium } else { RiskLevel::Low },
                    confidence: if is_claim { 0.6 } else { 0.9 },
                    truth_status,
                    rule_applied: rule.to_string(),
                    party_side: Some(party_for_doc_type(doc_type)),
                    conflict_group_id: None,
                    precedence_rank: None,
                    legal_defense_strength: None,
                    why_critical: None,
                    evidence_hint: Some(
                        "Agregar aviso de rescision o carta renuncia firmada.".to_string(),
                    ),
                });
            }
            None => {
                let missing = TechnicalFact::missing(
                    case_id,
                    Pillar::Conflicto,
                    "termination_cause",
                    RiskLevel::Critical,
                    "missing_required_doc",
                )
                .with_why_critical("No hay evidencia para determinar causa de terminacion.")
                .with_evidence_hint("Agregar AVISO_RESCISION o CARTA_RENUNCIA.");
                alerts.push(TechnicalAlert {
                    id: AlertId::new(),
                    case_id,
                    severity: Severity::Critical,
                    code: "MISSING_TERMINATION_CAUSE".to_string(),
                    message: TechnicalAlert::missing_message(
                        "termination_cause",
                        doc_types::AVISO_RESCISION,
                    ),
                    dimension: Some(Dimension::Documental),
                    why_flagged: Some(
                        "No existe evidencia juridica para causa de terminacion.".to_string(),
                    ),
                    required_doc_type: Some(doc_types::AVISO_RESCISION.to_string()),
                    field_key: Some("termination_cause".to_string()),
                    evidence_fact_ids: vec![missing.id],
                });
                facts.push(missing);
            }
        }
    }

    fn emit_compliance(
        &self,
        case_id: Uuid,
        docs_by_type: &BTreeMap<String, Vec<&Document>>,
        check: ComplianceCheck,
        facts: &mut Vec<TechnicalFact>,
        alerts: &mut Vec<TechnicalAlert>,
    ) {
        let source_doc = check
            .source_doc_type
            .and_then(|t| docs_by_type.get(t))
            .and_then(|docs| docs.first());

        // An absent document is MISSING evidence (zero confidence, no
        // source); a present-but-expired or undated one is still an
        // evidenced finding.
        let (truth_status, confidence) = match check.status {
            ComplianceStatus::Presente => (TruthStatus::Fact, 1.0),
            ComplianceStatus::Vencido => (TruthStatus::Fact, 0.9),
            ComplianceStatus::Insuficiente => (TruthStatus::Fact, 0.3),
            ComplianceStatus::Ausente => (TruthStatus::Missing, 0.0),
        };

        let flagged = matches!(check.risk_level, RiskLevel::High | RiskLevel::Critical);
        let party = if check.field_key == "repse_status" || check.field_key == "imss_registration"
        {
            PartySide::Autoridad
        } else {
            PartySide::Empresa
        };

        facts.push(TechnicalFact {
            id: FactId::new(),
            case_id,
            pillar: Pillar::Compliance,
            field_key: check.field_key.to_string(),
            value_raw: (check.status != ComplianceStatus::Ausente)
                .then(|| check.status.as_str().to_string()),
            value_normalized: (check.status != ComplianceStatus::Ausente)
                .then_some(NormalizedValue::Compliance {
                    status: check.status,
                }),
            source_doc_id: source_doc.map(|d| d.id),
            source_page: source_doc.map(|_| 1),
            source_excerpt: None,
            source_doc_type: check.source_doc_type.map(|t| t.to_string()),
            risk_level: check.risk_level,
            confidence,
            truth_status,
            rule_applied: "compliance_rules_vigencia".to_string(),
            party_side: Some(party),
            conflict_group_id: None,
            precedence_rank: None,
            legal_defense_strength: None,
            why_critical: flagged.then(|| check.why_flagged.clone()),
            evidence_hint: Some(check.evidence_hint.to_string()),
        });

        if flagged {
            alerts.push(TechnicalAlert {
                id: AlertId::new(),
                case_id,
                severity: severity_for_risk(check.risk_level),
                code: format!("COMPLIANCE_{}", check.field_key.to_uppercase()),
                message: TechnicalAlert::missing_message(
                    check.field_key,
                    check.required_doc_type,
                ),
                dimension: Some(Dimension::Compliance),
                why_flagged: Some(check.why_flagged),
                required_doc_type: Some(check.required_doc_type.to_string()),
                field_key: Some(check.field_key.to_string()),
                evidence_fact_ids: Vec::new(),
            });
        }
    }
}

/// Case-level semaphore from the worst severities present.
pub fn resolve_overall_status(
    facts: &[TechnicalFact],
    alerts: &[TechnicalAlert],
) -> OverallStatus {
    let critical = alerts.iter().any(|a| a.severity == Severity::Critical)
        || facts.iter().any(|f| f.risk_level == RiskLevel::Critical);
    if critical {
        return OverallStatus::Red;
    }
    let elevated = alerts.iter().any(|a| a.severity == Severity::High)
        || facts
            .iter()
            .any(|f| matches!(f.risk_level, RiskLevel::High | RiskLevel::Medium));
    if elevated {
        return OverallStatus::Yellow;
    }
    OverallStatus::Green
}

/// Whether the employment contract can be treated as signed.
///
/// Looks for signature signals ("firma", "huella") in the contract's
/// early chunks or "firmado" in its filename. A contract with no
/// disconfirming signal counts as signed; no contract at all does not.
pub fn infer_contract_signed(docs_by_type: &BTreeMap<String, Vec<&Document>>) -> bool {
    let Some(contracts) = docs_by_type.get(doc_types::CONTRATO_INDIVIDUAL) else {
        return false;
    };
    if contracts.is_empty() {
        return false;
    }
    for doc in contracts {
        let blob: String = doc
            .chunks
            .iter()
            .take(20)
            .map(|c| c.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        if blob.contains("firma") || blob.contains("huella") {
            return true;
        }
        if doc.filename.to_lowercase().contains("firmado") {
            return true;
        }
    }
    true
}

fn severity_for_risk(risk: RiskLevel) -> Severity {
    match risk {
        RiskLevel::Low => Severity::Low,
        RiskLevel::Medium => Severity::Medium,
        RiskLevel::High => Severity::High,
        RiskLevel::Critical => Severity::Critical,
    }
}

fn fact_amount(facts: &[TechnicalFact], field_key: &str) -> Option<f64> {
    facts
        .iter()
        .filter(|f| f.field_key == field_key)
        .find_map(|f| f.value_normalized.as_ref().and_then(NormalizedValue::amount))
}
