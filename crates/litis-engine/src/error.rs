//! Error types for the sheet engine

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Phase of the build pipeline, reported when a build fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    /// Loading the case, documents, and chunks
    Loading,
    /// Canonicalizing document types
    Canonicalizing,
    /// Collecting and resolving field evidence
    ExtractingFields,
    /// Deriving the termination cause
    DerivingTermination,
    /// Evaluating the compliance checklist
    EvaluatingCompliance,
    /// Computing scores and the narrative
    ScoringAndNarrative,
    /// Atomically replacing the persisted sheet
    Persisting,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Loading => "LOADING",
            BuildPhase::Canonicalizing => "CANONICALIZING",
            BuildPhase::ExtractingFields => "EXTRACTING_FIELDS",
            BuildPhase::DerivingTermination => "DERIVING_TERMINATION",
            BuildPhase::EvaluatingCompliance => "EVALUATING_COMPLIANCE",
            BuildPhase::ScoringAndNarrative => "SCORING_AND_NARRATIVE",
            BuildPhase::Persisting => "PERSISTING",
        };
        write!(f, "{}", name)
    }
}

/// Errors the engine surfaces to its caller
///
/// Everything that goes wrong inside a build collapses into the single
/// `Build` category; a failed build means "sheet unchanged, retry", never
/// "zero facts". Only a nonexistent case is reported distinctly.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The case does not exist; nothing was written
    #[error("Case not found: {0}")]
    CaseNotFound(Uuid),

    /// The build aborted; the previously persisted sheet is intact
    #[error("Build failed during {phase}: {message}")]
    Build {
        /// Pipeline phase that aborted
        phase: BuildPhase,
        /// Underlying failure description
        message: String,
    },
}

impl EngineError {
    /// Wrap an underlying failure in the build-failed category.
    pub fn build(phase: BuildPhase, message: impl fmt::Display) -> Self {
        EngineError::Build {
            phase,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(BuildPhase::ExtractingFields.to_string(), "EXTRACTING_FIELDS");
        assert_eq!(BuildPhase::Persisting.to_string(), "PERSISTING");
    }

    #[test]
    fn test_build_error_message() {
        let err = EngineError::build(BuildPhase::Persisting, "disk full");
        assert_eq!(
            err.to_string(),
            "Build failed during PERSISTING: disk full"
        );
    }
}
