//! Litis Technical Sheet Engine
//!
//! Turns a pile of classified, chunked documents belonging to one
//! labor-dispute case into a structured, evidence-traceable set of facts:
//! candidates are collected by semantic retrieval and parsed into typed
//! values, cross-document contradictions are flagged and resolved through
//! a legal-precedence hierarchy, a regulatory checklist is evaluated,
//! risk is scored along economic / documentary / compliance dimensions,
//! and a narrative summary is produced that is provably grounded in the
//! extracted evidence.
//!
//! # Architecture
//!
//! - `parsers`: pure text-to-typed-value extractors
//! - `doctype`: canonicalization of noisy document-type labels
//! - `catalog`: the declarative table of extractable fields
//! - `collector`: retrieval, parsing, and scoring of candidates
//! - `resolver`: precedence resolution and conflict detection
//! - `compliance`: the regulatory checklist
//! - `scoring`: per-dimension risk scores
//! - `narrative`: deterministic template + traceability-checked hybrid
//! - `sheet`: the orchestrator tying it all together
//!
//! Persistence, retrieval, and generation are injected through the trait
//! seams in `litis-domain`; every decision-logic module is testable
//! without a database or network.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod collector;
pub mod compliance;
pub mod config;
pub mod doctype;
pub mod error;
pub mod locks;
pub mod narrative;
pub mod parsers;
pub mod resolver;
pub mod response;
pub mod scoring;
pub mod sheet;

pub use config::EngineConfig;
pub use error::{BuildPhase, EngineError};
pub use response::{ExecutiveSummary, TechnicalSheet};
pub use sheet::SheetBuilder;
