//! Per-case build serialization
//!
//! Two concurrent builds for the same case would race on the
//! delete-then-insert of the sheet. Rather than relying on an external
//! scheduler to serialize builds, the engine takes an advisory per-case
//! lock for the duration of each build.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Keyed async locks, one per case id.
///
/// Locks are created lazily and shared by all builds of the same case;
/// builds of different cases never contend.
#[derive(Debug, Default)]
pub struct CaseLocks {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl CaseLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding builds of `case_id`.
    pub fn lock_for(&self, case_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut table = self.inner.lock().expect("lock table poisoned");
        Arc::clone(table.entry(case_id).or_default())
    }
}
