//! Candidate collection: semantic retrieval + parsing + scoring
//!
//! For each catalog field, every query phrasing is run through top-K
//! retrieval over the case's embedded chunks. Retrieved chunks are
//! deduplicated across queries, tagged with their document's canonical
//! type, and parsed with the field's parser; chunks that do not parse
//! are dropped. A retrieval failure on one query skips that query only —
//! a flaky embedding call must never cost the whole field.

use crate::catalog::{doc_type_priority, FieldSpec, PARSER_VALIDITY_BONUS};
use crate::doctype::{doc_types, party_for_doc_type};
use litis_domain::traits::ChunkRetriever;
use litis_domain::{NormalizedValue, PartySide};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use tracing::{debug, warn};
use uuid::Uuid;

/// A scored extraction candidate for one (field, chunk) pair. Transient:
/// candidates feed the resolver and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Chunk the value was parsed from
    pub chunk_id: Uuid,
    /// Document the chunk belongs to
    pub document_id: Uuid,
    /// Canonical type of that document
    pub doc_type: String,
    /// Page of the chunk
    pub page_number: i32,
    /// Leading excerpt of the chunk text
    pub excerpt: String,
    /// Raw matched value
    pub value_raw: String,
    /// Typed value
    pub value_normalized: NormalizedValue,
    /// Collector score (doc-type priority + validity bonus - rank decay)
    pub score: i32,
    /// Confidence derived from the score, in [0.1, 1.0]
    pub confidence: f64,
    /// Party the source document speaks for
    pub party_side: PartySide,
}

/// Collect scored candidates for one field.
///
/// `doc_id_to_type` is the canonical-type lookup produced at the start of
/// the build; chunks from unknown documents fall back to `SIN_CLASIFICAR`.
pub fn collect_candidates<R>(
    retriever: &R,
    case_id: Uuid,
    spec: &FieldSpec,
    doc_id_to_type: &HashMap<Uuid, String>,
    top_k: usize,
    excerpt_max_len: usize,
) -> Vec<Candidate>
where
    R: ChunkRetriever,
    R::Error: Display,
{
    let mut candidates = Vec::new();
    let mut seen: HashSet<Uuid> = HashSet::new();

    for query in spec.queries {
        let chunks = match retriever.search(case_id, query, top_k) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(
                    field = spec.field_key,
                    query = %query,
                    "Retrieval failed, skipping query: {}", e
                );
                continue;
            }
        };

        for (rank, chunk) in chunks.into_iter().enumerate() {
            if !seen.insert(chunk.chunk_id) {
                continue;
            }
            let canonical = doc_id_to_type
                .get(&chunk.document_id)
                .cloned()
                .unwrap_or_else(|| doc_types::SIN_CLASIFICAR.to_string());

            let Some(parsed) = spec.parser.parse(&chunk.text) else {
                continue;
            };

            let score = doc_type_priority(&canonical, spec.preferred_doc_types)
                + PARSER_VALIDITY_BONUS
                - (rank as i32 * 5);
            let confidence = (f64::from(score) / 120.0).clamp(0.1, 1.0);

            candidates.push(Candidate {
                chunk_id: chunk.chunk_id,
                document_id: chunk.document_id,
                party_side: party_for_doc_type(&canonical),
                doc_type: canonical,
                page_number: chunk.page_number,
                excerpt: chunk.text.chars().take(excerpt_max_len).collect(),
                value_raw: parsed.raw,
                value_normalized: parsed.value,
                score,
                confidence,
            });
        }
    }

    debug!(
        field = spec.field_key,
        count = candidates.len(),
        "Collected candidates"
    );
    candidates
}
