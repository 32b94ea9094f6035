//! Multi-signal risk scoring
//!
//! Facts and alerts both feed the per-dimension scores. Every dimension
//! starts at 100 and accumulates penalties; the result is clamped to
//! [0, 100] and banded LOW / MEDIUM / HIGH.

use litis_domain::{
    Dimension, DimensionScore, Pillar, RiskLevel, Severity, TechnicalAlert, TechnicalFact,
    TruthStatus,
};
use std::collections::BTreeMap;

/// Dimension a fact's pillar contributes to.
pub fn dimension_for_pillar(pillar: Pillar) -> Dimension {
    match pillar {
        Pillar::Economica => Dimension::Economico,
        Pillar::Compliance => Dimension::Compliance,
        Pillar::Identidad | Pillar::Conflicto => Dimension::Documental,
    }
}

/// Aggregate facts and alerts into per-dimension scores.
pub fn compute_dimension_scores(
    facts: &[TechnicalFact],
    alerts: &[TechnicalAlert],
) -> BTreeMap<Dimension, DimensionScore> {
    let mut penalty: BTreeMap<Dimension, u32> =
        Dimension::all().iter().map(|d| (*d, 0)).collect();

    for fact in facts {
        let dim = dimension_for_pillar(fact.pillar);
        let entry = penalty.entry(dim).or_default();
        *entry += match fact.risk_level {
            RiskLevel::Critical => 35,
            RiskLevel::High => 20,
            RiskLevel::Medium => 10,
            RiskLevel::Low => 0,
        };
        match fact.truth_status {
            TruthStatus::Conflict => *entry += 20,
            TruthStatus::Missing => *entry += 15,
            TruthStatus::Fact | TruthStatus::Claim => {}
        }
        if fact.confidence < 0.4 {
            *entry += 5;
        }
    }

    for alert in alerts {
        // Alerts without an explicit dimension count against the
        // documentary one.
        let dim = alert.dimension.unwrap_or(Dimension::Documental);
        let entry = penalty.entry(dim).or_default();
        *entry += match alert.severity {
            Severity::Critical => 30,
            Severity::High => 15,
            Severity::Medium | Severity::Low => 0,
        };
    }

    penalty
        .into_iter()
        .map(|(dim, total)| (dim, DimensionScore::from_penalty(total)))
        .collect()
}
