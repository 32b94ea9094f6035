//! Narrative construction
//!
//! The deterministic narrative is a fixed template over resolved facts
//! and high-impact alerts; it always exists and is always safe. The
//! hybrid narrative asks a text generator to do better, then verifies
//! every money/number and date token of the result against the raw
//! values of the facts it was shown. Any generation failure, timeout, or
//! traceability violation falls back silently to the deterministic text.

use crate::config::EngineConfig;
use litis_domain::traits::TextGenerator;
use litis_domain::{NarrativeMode, TechnicalAlert, TechnicalFact};
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Arc, LazyLock};
use tokio::time::timeout;
use tracing::{debug, warn};

static MONEY_OR_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?\s?\d+(?:[.,]\d+)?").unwrap());

static DATE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}|\d{2}[/-]\d{2}[/-]\d{2,4}").unwrap());

/// Render the deterministic template.
pub fn build_deterministic_narrative(
    cause: &str,
    gap: Option<f64>,
    high_impact_alerts: &[String],
) -> String {
    let gap_text = match gap {
        Some(gap) => format!("{:.2}", gap),
        None => "N/D".to_string(),
    };
    let risks = if high_impact_alerts.is_empty() {
        "Ninguno".to_string()
    } else {
        high_impact_alerts.join(", ")
    };
    format!(
        "Se identifica {} con brecha economica estimada de {} MXN. Riesgos criticos: {}.",
        cause, gap_text, risks
    )
}

/// Money/number and date tokens present in the facts' raw values. These
/// are the only quantitative tokens a generated narrative may contain.
fn allowed_tokens(facts: &[TechnicalFact]) -> HashSet<String> {
    let mut tokens = HashSet::new();
    for fact in facts {
        let Some(raw) = &fact.value_raw else { continue };
        for m in MONEY_OR_NUMBER_RE.find_iter(raw) {
            tokens.insert(m.as_str().replace(' ', ""));
        }
        for m in DATE_TOKEN_RE.find_iter(raw) {
            tokens.insert(m.as_str().to_string());
        }
    }
    tokens
}

/// Whether every quantitative token in `text` is grounded in the facts.
pub fn is_traceable(text: &str, facts: &[TechnicalFact]) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    let allowed = allowed_tokens(facts);
    let numbers = MONEY_OR_NUMBER_RE
        .find_iter(text)
        .map(|m| m.as_str().replace(' ', ""));
    let dates = DATE_TOKEN_RE.find_iter(text).map(|m| m.as_str().to_string());
    numbers.chain(dates).all(|token| allowed.contains(&token))
}

/// Assemble the generation prompt from the deterministic narrative plus
/// bounded fact/alert context.
pub fn build_prompt(
    deterministic: &str,
    facts: &[TechnicalFact],
    alerts: &[TechnicalAlert],
    config: &EngineConfig,
) -> String {
    let facts_context: Vec<String> = facts
        .iter()
        .take(config.max_prompt_facts)
        .map(|f| {
            format!(
                "{}: {} [{}/{}]",
                f.field_key,
                f.value_raw.as_deref().unwrap_or("-"),
                f.truth_status.as_str(),
                f.risk_level.as_str()
            )
        })
        .collect();
    let alerts_context: Vec<String> = alerts
        .iter()
        .take(config.max_prompt_alerts)
        .map(|a| a.message.clone())
        .collect();

    format!(
        "Resume la litis en espanol juridico claro en maximo {} palabras.\n\
         No inventes cifras ni fechas; solo usa evidencias provistas.\n\n\
         Narrativa base:\n{}\n\n\
         Facts:\n- {}\n\n\
         Alerts:\n- {}\n\n\
         Resumen:",
        config.narrative_word_limit,
        deterministic,
        facts_context.join("\n- "),
        alerts_context.join("\n- "),
    )
}

/// Attempt the hybrid narrative, falling back to the deterministic one.
///
/// Returns the narrative actually selected and the mode that produced it.
pub async fn build_hybrid_narrative<G>(
    generator: Arc<G>,
    deterministic: String,
    facts: &[TechnicalFact],
    alerts: &[TechnicalAlert],
    config: &EngineConfig,
) -> (String, NarrativeMode)
where
    G: TextGenerator + Send + Sync + 'static,
    G::Error: Display,
{
    let prompt = build_prompt(&deterministic, facts, alerts, config);

    let generation = timeout(
        config.generation_timeout(),
        tokio::task::spawn_blocking(move || {
            generator.generate(&prompt).map_err(|e| e.to_string())
        }),
    )
    .await;

    let generated = match generation {
        Ok(Ok(Ok(text))) => text,
        Ok(Ok(Err(e))) => {
            warn!("Narrative generation failed, using deterministic: {}", e);
            return (deterministic, NarrativeMode::Deterministic);
        }
        Ok(Err(e)) => {
            warn!("Narrative generation task failed: {}", e);
            return (deterministic, NarrativeMode::Deterministic);
        }
        Err(_) => {
            warn!("Narrative generation timed out");
            return (deterministic, NarrativeMode::Deterministic);
        }
    };

    if is_traceable(&generated, facts) {
        debug!("Hybrid narrative accepted");
        (generated.trim().to_string(), NarrativeMode::HybridLlm)
    } else {
        warn!("Generated narrative failed traceability, using deterministic");
        (deterministic, NarrativeMode::Deterministic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litis_domain::{FactId, NormalizedValue, Pillar, RiskLevel, TruthStatus};
    use uuid::Uuid;

    fn fact_with_raw(raw: &str) -> TechnicalFact {
        TechnicalFact {
            id: FactId::new(),
            case_id: Uuid::new_v4(),
            pillar: Pillar::Economica,
            field_key: "salary_sd".to_string(),
            value_raw: Some(raw.to_string()),
            value_normalized: Some(NormalizedValue::Excerpt {
                excerpt: raw.to_string(),
            }),
            source_doc_id: None,
            source_page: None,
            source_excerpt: None,
            source_doc_type: None,
            risk_level: RiskLevel::Low,
            confidence: 0.8,
            truth_status: TruthStatus::Fact,
            rule_applied: "r".to_string(),
            party_side: None,
            conflict_group_id: None,
            precedence_rank: None,
            legal_defense_strength: None,
            why_critical: None,
            evidence_hint: None,
        }
    }

    #[test]
    fn test_deterministic_with_gap_and_alerts() {
        let narrative = build_deterministic_narrative(
            "DESPIDO_INJUSTIFICADO",
            Some(12000.0),
            &["alerta uno".to_string(), "alerta dos".to_string()],
        );
        assert_eq!(
            narrative,
            "Se identifica DESPIDO_INJUSTIFICADO con brecha economica estimada de \
             12000.00 MXN. Riesgos criticos: alerta uno, alerta dos."
        );
    }

    #[test]
    fn test_deterministic_without_gap() {
        let narrative = build_deterministic_narrative("INDETERMINADA", None, &[]);
        assert!(narrative.contains("N/D MXN"));
        assert!(narrative.contains("Riesgos criticos: Ninguno."));
    }

    #[test]
    fn test_traceable_when_tokens_grounded() {
        let facts = vec![fact_with_raw("800.00"), fact_with_raw("15/03/2021")];
        assert!(is_traceable("La evidencia acredita 800.00 desde 15/03/2021.", &facts));
    }

    #[test]
    fn test_not_traceable_with_invented_amount() {
        let facts = vec![fact_with_raw("800.00")];
        assert!(!is_traceable("La demanda asciende a 900.00 MXN.", &facts));
    }

    #[test]
    fn test_not_traceable_with_invented_date() {
        let facts = vec![fact_with_raw("800.00")];
        assert!(!is_traceable("Laboro desde 2020-01-01.", &facts));
    }

    #[test]
    fn test_text_without_tokens_is_traceable() {
        assert!(is_traceable("Riesgo alto para la empresa.", &[]));
    }

    #[test]
    fn test_empty_text_is_not_traceable() {
        assert!(!is_traceable("   ", &[]));
    }

    #[test]
    fn test_prompt_bounds_context() {
        let facts: Vec<_> = (0..40).map(|i| fact_with_raw(&format!("{}.00", i))).collect();
        let config = EngineConfig::default();
        let prompt = build_prompt("base", &facts, &[], &config);
        assert!(prompt.contains("maximo 70 palabras"));
        assert!(prompt.contains("29.00"));
        assert!(!prompt.contains("31.00"));
    }

    #[tokio::test]
    async fn test_hybrid_accepts_traceable_narrative() {
        struct FixedGenerator(String);
        impl TextGenerator for FixedGenerator {
            type Error = String;
            fn generate(&self, _prompt: &str) -> Result<String, String> {
                Ok(self.0.clone())
            }
        }

        let facts = vec![fact_with_raw("800.00")];
        let (text, mode) = build_hybrid_narrative(
            Arc::new(FixedGenerator("Se reclaman 800.00 MXN.".to_string())),
            "base".to_string(),
            &facts,
            &[],
            &EngineConfig::default(),
        )
        .await;
        assert_eq!(mode, NarrativeMode::HybridLlm);
        assert_eq!(text, "Se reclaman 800.00 MXN.");
    }

    #[tokio::test]
    async fn test_hybrid_rejects_untraceable_narrative() {
        struct FixedGenerator;
        impl TextGenerator for FixedGenerator {
            type Error = String;
            fn generate(&self, _prompt: &str) -> Result<String, String> {
                Ok("Se reclaman 900.00 MXN.".to_string())
            }
        }

        let facts = vec![fact_with_raw("800.00")];
        let (text, mode) = build_hybrid_narrative(
            Arc::new(FixedGenerator),
            "base".to_string(),
            &facts,
            &[],
            &EngineConfig::default(),
        )
        .await;
        assert_eq!(mode, NarrativeMode::Deterministic);
        assert_eq!(text, "base");
    }

    #[tokio::test]
    async fn test_hybrid_falls_back_on_error() {
        struct BrokenGenerator;
        impl TextGenerator for BrokenGenerator {
            type Error = String;
            fn generate(&self, _prompt: &str) -> Result<String, String> {
                Err("unavailable".to_string())
            }
        }

        let (text, mode) = build_hybrid_narrative(
            Arc::new(BrokenGenerator),
            "base".to_string(),
            &[],
            &[],
            &EngineConfig::default(),
        )
        .await;
        assert_eq!(mode, NarrativeMode::Deterministic);
        assert_eq!(text, "base");
    }
}
