//! Litis Storage Layer
//!
//! SQLite-backed persistence for case files and their technical sheets,
//! plus the semantic chunk retriever the candidate collector queries.
//!
//! # Architecture
//!
//! - SQLite for structured rows (cases, documents, chunks, facts, alerts,
//!   snapshots), schema in `schema.sql`
//! - Chunk vectors stored as f32 blobs; retrieval is a case-scoped cosine
//!   scan, which is the right shape here: the universe is one case's
//!   chunks and the sheet is rebuilt from scratch each time
//! - `replace_sheet` performs the delete + insert + snapshot upsert in a
//!   single transaction, so a failed build leaves the previous sheet
//!   intact
//!
//! # Thread Safety
//!
//! SQLite connections are not thread-safe; callers wrap the store in
//! their own synchronization (the engine holds it behind a mutex).
//!
//! # Examples
//!
//! ```no_run
//! use litis_store::SqliteStore;
//!
//! let store = SqliteStore::open("litis.db").unwrap();
//! ```

#![warn(missing_docs)]

pub mod embedding;

use chrono::{DateTime, Utc};
use embedding::{cosine_similarity, EmbeddingModel, HashEmbedder};
use litis_domain::traits::{ChunkRetriever, SheetStore};
use litis_domain::{
    AlertId, CaseFile, DefenseStrength, Dimension, Document, DocumentChunk, FactId, NarrativeMode,
    NormalizedValue, OverallStatus, PartySide, Pillar, RetrievedChunk, RiskLevel, Severity,
    TechnicalAlert, TechnicalFact, TechnicalSnapshot, TruthStatus,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Default dimension of the bundled query embedder
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format in a stored row
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Query embedding failure
    #[error("Embedding error: {0}")]
    Embedding(#[from] embedding::EmbeddingError),
}

/// SQLite-based store for case files and technical sheets
pub struct SqliteStore {
    conn: Connection,
    embedder: Box<dyn EmbeddingModel + Send>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    ///
    /// Use [`SqliteStore::in_memory`] for tests.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn,
            embedder: Box::new(HashEmbedder::new(DEFAULT_EMBEDDING_DIMENSION)),
        };
        store.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(store)
    }

    /// Replace the query embedder (e.g. with a real model)
    pub fn with_embedder(mut self, embedder: Box<dyn EmbeddingModel + Send>) -> Self {
        self.embedder = embedder;
        self
    }

    /// Insert a case row
    pub fn insert_case(&mut self, case_id: Uuid, title: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO cases (id, title) VALUES (?1, ?2)",
            params![case_id.to_string(), title],
        )?;
        Ok(())
    }

    /// Insert a document row for a case
    pub fn insert_document(
        &mut self,
        case_id: Uuid,
        document_id: Uuid,
        filename: &str,
        doc_type: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO documents (id, case_id, filename, doc_type) VALUES (?1, ?2, ?3, ?4)",
            params![
                document_id.to_string(),
                case_id.to_string(),
                filename,
                doc_type
            ],
        )?;
        Ok(())
    }

    /// Insert a chunk row for a document
    pub fn insert_chunk(
        &mut self,
        document_id: Uuid,
        chunk: &DocumentChunk,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO document_chunks \
             (id, document_id, page_number, chunk_index, text_content, embedding) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                chunk.id.to_string(),
                document_id.to_string(),
                chunk.page_number,
                chunk.chunk_index,
                chunk.text,
                chunk.embedding.as_deref().map(vec_to_blob),
            ],
        )?;
        Ok(())
    }

    /// Insert a full case file (case + documents + chunks) in one call
    pub fn insert_case_file(&mut self, case: &CaseFile) -> Result<(), StoreError> {
        self.insert_case(case.id, &case.title)?;
        for doc in &case.documents {
            self.insert_document(case.id, doc.id, &doc.filename, &doc.raw_doc_type)?;
            for chunk in &doc.chunks {
                self.insert_chunk(doc.id, chunk)?;
            }
        }
        Ok(())
    }

    fn fact_from_row(row: &Row<'_>) -> Result<TechnicalFact, StoreError> {
        let id: String = row.get("id")?;
        let case_id: String = row.get("case_id")?;
        let pillar: String = row.get("pillar")?;
        let value_normalized: Option<String> = row.get("value_normalized")?;
        let source_doc_id: Option<String> = row.get("source_doc_id")?;
        let risk_level: String = row.get("risk_level")?;
        let truth_status: String = row.get("truth_status")?;
        let party_side: Option<String> = row.get("party_side")?;
        let defense: Option<String> = row.get("legal_defense_strength")?;

        Ok(TechnicalFact {
            id: FactId::from_string(&id).map_err(StoreError::InvalidData)?,
            case_id: parse_uuid(&case_id)?,
            pillar: Pillar::parse(&pillar)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown pillar: {}", pillar)))?,
            field_key: row.get("field_key")?,
            value_raw: row.get("value_raw")?,
            value_normalized: value_normalized
                .map(|json| {
                    serde_json::from_str::<NormalizedValue>(&json)
                        .map_err(|e| StoreError::InvalidData(format!("Bad payload: {}", e)))
                })
                .transpose()?,
            source_doc_id: source_doc_id.map(|s| parse_uuid(&s)).transpose()?,
            source_page: row.get("source_page")?,
            source_excerpt: row.get("source_excerpt")?,
            source_doc_type: row.get("source_doc_type")?,
            risk_level: RiskLevel::parse(&risk_level).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown risk level: {}", risk_level))
            })?,
            confidence: row.get("confidence")?,
            truth_status: TruthStatus::parse(&truth_status).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown truth status: {}", truth_status))
            })?,
            rule_applied: row.get("rule_applied")?,
            party_side: party_side
                .map(|s| {
                    PartySide::parse(&s)
                        .ok_or_else(|| StoreError::InvalidData(format!("Unknown party: {}", s)))
                })
                .transpose()?,
            conflict_group_id: row.get("conflict_group_id")?,
            precedence_rank: row.get("precedence_rank")?,
            legal_defense_strength: defense
                .map(|s| {
                    DefenseStrength::parse(&s)
                        .ok_or_else(|| StoreError::InvalidData(format!("Unknown strength: {}", s)))
                })
                .transpose()?,
            why_critical: row.get("why_critical")?,
            evidence_hint: row.get("evidence_hint")?,
        })
    }

    fn alert_from_row(row: &Row<'_>) -> Result<TechnicalAlert, StoreError> {
        let id: String = row.get("id")?;
        let case_id: String = row.get("case_id")?;
        let severity: String = row.get("severity")?;
        let dimension: Option<String> = row.get("dimension")?;
        let evidence_ids: String = row.get("evidence_fact_ids")?;

        let evidence_fact_ids: Vec<String> = serde_json::from_str(&evidence_ids)
            .map_err(|e| StoreError::InvalidData(format!("Bad evidence ids: {}", e)))?;
        let evidence_fact_ids = evidence_fact_ids
            .iter()
            .map(|s| FactId::from_string(s).map_err(StoreError::InvalidData))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TechnicalAlert {
            id: AlertId::from_string(&id).map_err(StoreError::InvalidData)?,
            case_id: parse_uuid(&case_id)?,
            severity: Severity::parse(&severity).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown severity: {}", severity))
            })?,
            code: row.get("code")?,
            message: row.get("message")?,
            dimension: dimension
                .map(|s| {
                    Dimension::parse(&s)
                        .ok_or_else(|| StoreError::InvalidData(format!("Unknown dimension: {}", s)))
                })
                .transpose()?,
            why_flagged: row.get("why_flagged")?,
            required_doc_type: row.get("required_doc_type")?,
            field_key: row.get("field_key")?,
            evidence_fact_ids,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("Invalid uuid: {}", e)))
}

/// Encode an f32 vector as little-endian bytes
fn vec_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Decode little-endian bytes back into an f32 vector
fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>, StoreError> {
    if blob.len() % 4 != 0 {
        return Err(StoreError::InvalidData(format!(
            "Embedding blob length {} is not a multiple of 4",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

impl SheetStore for SqliteStore {
    type Error = StoreError;

    fn load_case(&self, case_id: Uuid) -> Result<Option<CaseFile>, Self::Error> {
        let case_key = case_id.to_string();
        let title: Option<String> = self
            .conn
            .query_row(
                "SELECT title FROM cases WHERE id = ?1",
                params![&case_key],
                |row| row.get(0),
            )
            .optional()?;
        let Some(title) = title else {
            return Ok(None);
        };

        let mut documents = Vec::new();
        let mut doc_stmt = self.conn.prepare(
            "SELECT id, filename, doc_type FROM documents WHERE case_id = ?1 ORDER BY created_at, id",
        )?;
        let doc_rows = doc_stmt.query_map(params![&case_key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut chunk_stmt = self.conn.prepare(
            "SELECT id, page_number, chunk_index, text_content, embedding \
             FROM document_chunks WHERE document_id = ?1 ORDER BY chunk_index",
        )?;

        for doc_row in doc_rows {
            let (doc_id, filename, doc_type) = doc_row?;
            let chunk_rows = chunk_stmt.query_map(params![&doc_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<Vec<u8>>>(4)?,
                ))
            })?;

            let mut chunks = Vec::new();
            for chunk_row in chunk_rows {
                let (chunk_id, page_number, chunk_index, text, blob) = chunk_row?;
                chunks.push(DocumentChunk {
                    id: parse_uuid(&chunk_id)?,
                    page_number,
                    chunk_index,
                    text,
                    embedding: blob.as_deref().map(blob_to_vec).transpose()?,
                });
            }

            documents.push(Document {
                id: parse_uuid(&doc_id)?,
                filename,
                raw_doc_type: doc_type,
                chunks,
            });
        }

        Ok(Some(CaseFile {
            id: case_id,
            title,
            documents,
        }))
    }

    fn replace_sheet(
        &mut self,
        case_id: Uuid,
        facts: &[TechnicalFact],
        alerts: &[TechnicalAlert],
        snapshot: &TechnicalSnapshot,
    ) -> Result<(), Self::Error> {
        let case_key = case_id.to_string();
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM technical_facts WHERE case_id = ?1",
            params![&case_key],
        )?;
        tx.execute(
            "DELETE FROM technical_alerts WHERE case_id = ?1",
            params![&case_key],
        )?;

        {
            let mut fact_stmt = tx.prepare(
                "INSERT INTO technical_facts \
                 (id, case_id, pillar, field_key, value_raw, value_normalized, \
                  source_doc_id, source_page, source_excerpt, source_doc_type, \
                  risk_level, confidence, truth_status, rule_applied, party_side, \
                  conflict_group_id, precedence_rank, legal_defense_strength, \
                  why_critical, evidence_hint) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, \
                         ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            )?;
            for fact in facts {
                let payload = fact
                    .value_normalized
                    .as_ref()
                    .map(|v| {
                        serde_json::to_string(v)
                            .map_err(|e| StoreError::InvalidData(format!("Bad payload: {}", e)))
                    })
                    .transpose()?;
                fact_stmt.execute(params![
                    fact.id.to_string(),
                    &case_key,
                    fact.pillar.as_str(),
                    fact.field_key,
                    fact.value_raw,
                    payload,
                    fact.source_doc_id.map(|id| id.to_string()),
                    fact.source_page,
                    fact.source_excerpt,
                    fact.source_doc_type,
                    fact.risk_level.as_str(),
                    fact.confidence,
                    fact.truth_status.as_str(),
                    fact.rule_applied,
                    fact.party_side.map(|p| p.as_str()),
                    fact.conflict_group_id,
                    fact.precedence_rank,
                    fact.legal_defense_strength.map(|d| d.as_str()),
                    fact.why_critical,
                    fact.evidence_hint,
                ])?;
            }

            let mut alert_stmt = tx.prepare(
                "INSERT INTO technical_alerts \
                 (id, case_id, severity, code, message, dimension, why_flagged, \
                  required_doc_type, field_key, evidence_fact_ids) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for alert in alerts {
                let evidence: Vec<String> = alert
                    .evidence_fact_ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect();
                let evidence_json = serde_json::to_string(&evidence)
                    .map_err(|e| StoreError::InvalidData(format!("Bad evidence ids: {}", e)))?;
                alert_stmt.execute(params![
                    alert.id.to_string(),
                    &case_key,
                    alert.severity.as_str(),
                    alert.code,
                    alert.message,
                    alert.dimension.map(|d| d.as_str()),
                    alert.why_flagged,
                    alert.required_doc_type,
                    alert.field_key,
                    evidence_json,
                ])?;
            }

            let scores_json = serde_json::to_string(&snapshot.dimension_scores)
                .map_err(|e| StoreError::InvalidData(format!("Bad scores: {}", e)))?;
            let alerts_json = serde_json::to_string(&snapshot.high_impact_alerts)
                .map_err(|e| StoreError::InvalidData(format!("Bad alert list: {}", e)))?;
            tx.execute(
                "INSERT INTO technical_snapshots \
                 (case_id, overall_status, litis_narrative, narrative_mode, \
                  dimension_scores, high_impact_alerts, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT(case_id) DO UPDATE SET \
                   overall_status = excluded.overall_status, \
                   litis_narrative = excluded.litis_narrative, \
                   narrative_mode = excluded.narrative_mode, \
                   dimension_scores = excluded.dimension_scores, \
                   high_impact_alerts = excluded.high_impact_alerts, \
                   updated_at = excluded.updated_at",
                params![
                    &case_key,
                    snapshot.overall_status.as_str(),
                    snapshot.litis_narrative,
                    snapshot.narrative_mode.as_str(),
                    scores_json,
                    alerts_json,
                    snapshot.updated_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn snapshot(&self, case_id: Uuid) -> Result<Option<TechnicalSnapshot>, Self::Error> {
        self.conn
            .query_row(
                "SELECT overall_status, litis_narrative, narrative_mode, \
                 dimension_scores, high_impact_alerts, updated_at \
                 FROM technical_snapshots WHERE case_id = ?1",
                params![case_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?
            .map(|(status, narrative, mode, scores, alerts, updated_at)| {
                Ok(TechnicalSnapshot {
                    case_id,
                    overall_status: OverallStatus::parse(&status).ok_or_else(|| {
                        StoreError::InvalidData(format!("Unknown status: {}", status))
                    })?,
                    litis_narrative: narrative,
                    narrative_mode: NarrativeMode::parse(&mode).ok_or_else(|| {
                        StoreError::InvalidData(format!("Unknown mode: {}", mode))
                    })?,
                    dimension_scores: serde_json::from_str(&scores)
                        .map_err(|e| StoreError::InvalidData(format!("Bad scores: {}", e)))?,
                    high_impact_alerts: serde_json::from_str(&alerts)
                        .map_err(|e| StoreError::InvalidData(format!("Bad alert list: {}", e)))?,
                    updated_at: DateTime::parse_from_rfc3339(&updated_at)
                        .map_err(|e| StoreError::InvalidData(format!("Bad timestamp: {}", e)))?
                        .with_timezone(&Utc),
                })
            })
            .transpose()
    }

    fn facts(&self, case_id: Uuid) -> Result<Vec<TechnicalFact>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM technical_facts WHERE case_id = ?1 \
             ORDER BY pillar ASC, field_key ASC",
        )?;
        let rows = stmt.query_and_then(params![case_id.to_string()], Self::fact_from_row)?;
        rows.collect()
    }

    fn alerts(&self, case_id: Uuid) -> Result<Vec<TechnicalAlert>, Self::Error> {
        // UUIDv7 ids sort chronologically, so id DESC is newest-first.
        let mut stmt = self.conn.prepare(
            "SELECT * FROM technical_alerts WHERE case_id = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt.query_and_then(params![case_id.to_string()], Self::alert_from_row)?;
        rows.collect()
    }
}

impl ChunkRetriever for SqliteStore {
    type Error = StoreError;

    fn search(
        &self,
        case_id: Uuid,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, Self::Error> {
        let query_vector = self.embedder.embed(query)?;

        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.document_id, c.page_number, c.text_content, c.embedding \
             FROM document_chunks c \
             JOIN documents d ON d.id = c.document_id \
             WHERE d.case_id = ?1 AND c.embedding IS NOT NULL \
             ORDER BY c.id",
        )?;
        let rows = stmt.query_map(params![case_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (chunk_id, document_id, page_number, text, blob) = row?;
            let chunk_vector = blob_to_vec(&blob)?;
            let similarity = cosine_similarity(&query_vector, &chunk_vector);
            scored.push((
                similarity,
                RetrievedChunk {
                    chunk_id: parse_uuid(&chunk_id)?,
                    document_id: parse_uuid(&document_id)?,
                    page_number,
                    text,
                },
            ));
        }

        // Ascending distance == descending similarity.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(k).map(|(_, chunk)| chunk).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_round_trip() {
        let vector = vec![0.5f32, -1.25, 3.75];
        let blob = vec_to_blob(&vector);
        assert_eq!(blob.len(), 12);
        assert_eq!(blob_to_vec(&blob).unwrap(), vector);
    }

    #[test]
    fn test_blob_invalid_length() {
        assert!(blob_to_vec(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_load_missing_case() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.load_case(Uuid::new_v4()).unwrap().is_none());
    }
}
