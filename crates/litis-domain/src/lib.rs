//! Litis Domain Layer
//!
//! Core types for the technical sheet of a labor-dispute case file. This
//! crate defines the entities the engine produces (facts, alerts, the
//! per-case snapshot), the vocabulary enums they are classified with, and
//! the trait seams behind which persistence, chunk retrieval, and text
//! generation live.
//!
//! ## Key Concepts
//!
//! - **TechnicalFact**: one extracted, evidence-traceable statement about
//!   the case (a wage, a date, a contract type), tagged with its truth
//!   status and risk level
//! - **TechnicalAlert**: a gap or contradiction worth surfacing (missing
//!   required document, cross-document conflict, compliance failure)
//! - **TechnicalSnapshot**: the single per-case summary row (overall
//!   status, narrative, dimension scores)
//! - **CaseFile**: the read model the engine consumes (documents and their
//!   text chunks)
//!
//! ## Architecture
//!
//! Infrastructure implementations live in other crates; this crate keeps
//! its dependency surface minimal (ids, serialization, calendar dates) and
//! carries no decision logic beyond the invariants its constructors
//! enforce.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alert;
pub mod casefile;
pub mod fact;
pub mod levels;
pub mod snapshot;
pub mod traits;

// Re-exports for convenience
pub use alert::{AlertId, TechnicalAlert};
pub use casefile::{CaseFile, Document, DocumentChunk, RetrievedChunk};
pub use fact::{FactId, NormalizedValue, TechnicalFact};
pub use levels::{
    ComplianceStatus, DefenseStrength, PartySide, Pillar, RiskLevel, Severity, TruthStatus,
};
pub use snapshot::{
    Dimension, DimensionScore, NarrativeMode, OverallStatus, ScoreLevel, TechnicalSnapshot,
};
