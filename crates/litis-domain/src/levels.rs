//! Classification vocabularies shared by facts, alerts, and compliance
//! results.
//!
//! Every enum here round-trips through a stable string form (`as_str` /
//! `parse`) so the storage layer can persist them as plain text columns.

use serde::{Deserialize, Serialize};

/// Coarse category grouping related facts on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pillar {
    /// Identity of the employment relationship (start date, position, ...)
    Identidad,
    /// Economic facts (daily wage, integrated daily wage, ...)
    Economica,
    /// The dispute itself (claimed amount, settlement offer, termination)
    Conflicto,
    /// Regulatory/administrative compliance checklist results
    Compliance,
}

impl Pillar {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Identidad => "IDENTIDAD",
            Pillar::Economica => "ECONOMICA",
            Pillar::Conflicto => "CONFLICTO",
            Pillar::Compliance => "COMPLIANCE",
        }
    }

    /// Parse the storage form back into a pillar.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IDENTIDAD" => Some(Pillar::Identidad),
            "ECONOMICA" => Some(Pillar::Economica),
            "CONFLICTO" => Some(Pillar::Conflicto),
            "COMPLIANCE" => Some(Pillar::Compliance),
            _ => None,
        }
    }

    /// Human-facing section title used when the sheet is assembled.
    pub fn title(&self) -> &'static str {
        match self {
            Pillar::Identidad => "A. IDENTIDAD Y VINCULO",
            Pillar::Economica => "B. INGENIERIA ECONOMICA",
            Pillar::Conflicto => "C. EL CONFLICTO",
            Pillar::Compliance => "D. BLINDAJE Y COMPLIANCE",
        }
    }
}

/// Severity of a fact on the LOW..CRITICAL scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Evidence present and unremarkable
    Low,
    /// Worth reviewing
    Medium,
    /// Material risk
    High,
    /// Case-deciding risk
    Critical,
}

impl RiskLevel {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Parse the storage form back into a risk level.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            "CRITICAL" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

/// Severity of an alert. Same scale as [`RiskLevel`] but kept as its own
/// type: alerts and facts are scored through different penalty tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational
    Low,
    /// Worth reviewing
    Medium,
    /// Material gap
    High,
    /// Case-deciding gap
    Critical,
}

impl Severity {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Parse the storage form back into a severity.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Epistemic classification of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruthStatus {
    /// Established by authoritative evidence
    Fact,
    /// One-sided assertion (typically from the initial claim)
    Claim,
    /// Valid sources disagree; the payload lists all values and the winner
    Conflict,
    /// No valid evidence found
    Missing,
}

impl TruthStatus {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TruthStatus::Fact => "FACT",
            TruthStatus::Claim => "CLAIM",
            TruthStatus::Conflict => "CONFLICT",
            TruthStatus::Missing => "MISSING",
        }
    }

    /// Parse the storage form back into a truth status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FACT" => Some(TruthStatus::Fact),
            "CLAIM" => Some(TruthStatus::Claim),
            "CONFLICT" => Some(TruthStatus::Conflict),
            "MISSING" => Some(TruthStatus::Missing),
            _ => None,
        }
    }
}

/// Which party a piece of evidence originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartySide {
    /// The worker (initial claim, resignation letter)
    Trabajador,
    /// The employer (contract, payroll, attendance, administrative record)
    Empresa,
    /// A government authority (social security registrations)
    Autoridad,
    /// No party attribution
    Neutro,
}

impl PartySide {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartySide::Trabajador => "TRABAJADOR",
            PartySide::Empresa => "EMPRESA",
            PartySide::Autoridad => "AUTORIDAD",
            PartySide::Neutro => "NEUTRO",
        }
    }

    /// Parse the storage form back into a party side.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TRABAJADOR" => Some(PartySide::Trabajador),
            "EMPRESA" => Some(PartySide::Empresa),
            "AUTORIDAD" => Some(PartySide::Autoridad),
            "NEUTRO" => Some(PartySide::Neutro),
            _ => None,
        }
    }
}

/// How defensible the winning value of a field is in litigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefenseStrength {
    /// Backed by signed, employer-side operational evidence
    Strong,
    /// Backed by ordinary documentary evidence
    Moderate,
}

impl DefenseStrength {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DefenseStrength::Strong => "STRONG",
            DefenseStrength::Moderate => "MODERATE",
        }
    }

    /// Parse the storage form back into a defense strength.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STRONG" => Some(DefenseStrength::Strong),
            "MODERATE" => Some(DefenseStrength::Moderate),
            _ => None,
        }
    }
}

/// Outcome of a single compliance checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    /// Document present and valid
    Presente,
    /// Document absent from the case file
    Ausente,
    /// Document present but its validity window has lapsed
    Vencido,
    /// Document present but no validity date could be read
    Insuficiente,
}

impl ComplianceStatus {
    /// Stable storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Presente => "PRESENTE",
            ComplianceStatus::Ausente => "AUSENTE",
            ComplianceStatus::Vencido => "VENCIDO",
            ComplianceStatus::Insuficiente => "INSUFICIENTE",
        }
    }

    /// Parse the storage form back into a compliance status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PRESENTE" => Some(ComplianceStatus::Presente),
            "AUSENTE" => Some(ComplianceStatus::Ausente),
            "VENCIDO" => Some(ComplianceStatus::Vencido),
            "INSUFICIENTE" => Some(ComplianceStatus::Insuficiente),
            _ => None,
        }
    }

    /// Whether this status counts as compliant.
    pub fn is_compliant(&self) -> bool {
        matches!(self, ComplianceStatus::Presente)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_round_trip() {
        for level in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            assert_eq!(RiskLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(RiskLevel::parse("SEVERE"), None);
    }

    #[test]
    fn test_pillar_round_trip_and_titles() {
        for pillar in [
            Pillar::Identidad,
            Pillar::Economica,
            Pillar::Conflicto,
            Pillar::Compliance,
        ] {
            assert_eq!(Pillar::parse(pillar.as_str()), Some(pillar));
            assert!(!pillar.title().is_empty());
        }
    }

    #[test]
    fn test_truth_status_round_trip() {
        for status in [
            TruthStatus::Fact,
            TruthStatus::Claim,
            TruthStatus::Conflict,
            TruthStatus::Missing,
        ] {
            assert_eq!(TruthStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_compliance_status_compliant() {
        assert!(ComplianceStatus::Presente.is_compliant());
        assert!(!ComplianceStatus::Ausente.is_compliant());
        assert!(!ComplianceStatus::Vencido.is_compliant());
        assert!(!ComplianceStatus::Insuficiente.is_compliant());
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_serde_forms_match_as_str() {
        let json = serde_json::to_string(&TruthStatus::Conflict).unwrap();
        assert_eq!(json, "\"CONFLICT\"");
        let json = serde_json::to_string(&Pillar::Economica).unwrap();
        assert_eq!(json, "\"ECONOMICA\"");
        let json = serde_json::to_string(&PartySide::Trabajador).unwrap();
        assert_eq!(json, "\"TRABAJADOR\"");
    }
}
