//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the engine and its
//! infrastructure. Implementations live in other crates (`litis-store`,
//! `litis-llm`); the engine receives them by injection so the decision
//! logic stays unit-testable without a database or network.

use crate::alert::TechnicalAlert;
use crate::casefile::{CaseFile, RetrievedChunk};
use crate::fact::TechnicalFact;
use crate::snapshot::TechnicalSnapshot;
use uuid::Uuid;

/// Persistence seam for the technical sheet.
///
/// Implemented by the infrastructure layer (`litis-store`).
pub trait SheetStore {
    /// Error type for store operations
    type Error;

    /// Load a case with its documents and chunks. `None` when the case
    /// does not exist.
    fn load_case(&self, case_id: Uuid) -> Result<Option<CaseFile>, Self::Error>;

    /// Atomically replace the case's sheet: delete all existing facts and
    /// alerts, insert the new rows, and upsert the snapshot. A failure
    /// must leave the previous sheet intact.
    fn replace_sheet(
        &mut self,
        case_id: Uuid,
        facts: &[TechnicalFact],
        alerts: &[TechnicalAlert],
        snapshot: &TechnicalSnapshot,
    ) -> Result<(), Self::Error>;

    /// The last persisted snapshot, if any build has run.
    fn snapshot(&self, case_id: Uuid) -> Result<Option<TechnicalSnapshot>, Self::Error>;

    /// Current fact rows, ordered by pillar then field key.
    fn facts(&self, case_id: Uuid) -> Result<Vec<TechnicalFact>, Self::Error>;

    /// Current alert rows, newest first.
    fn alerts(&self, case_id: Uuid) -> Result<Vec<TechnicalAlert>, Self::Error>;
}

/// Semantic retrieval seam over a case's embedded chunks.
///
/// Results are ordered by ascending distance and restricted to chunks
/// that have a computed vector.
pub trait ChunkRetriever {
    /// Error type for retrieval operations
    type Error;

    /// Top-`k` chunks of `case_id` semantically closest to `query`.
    fn search(
        &self,
        case_id: Uuid,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, Self::Error>;
}

/// Short-text generation seam, used for the hybrid narrative.
///
/// Best-effort: implementations may fail or be unavailable, and the
/// caller always has a deterministic fallback.
pub trait TextGenerator {
    /// Error type for generation operations
    type Error;

    /// Generate a completion for the prompt.
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}
