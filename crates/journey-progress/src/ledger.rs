//! Progress ledger access
//!
//! [`ProgressLedger`] is the seam to the remote ledger table. Upserts are keyed
//! on (user, step) and must be idempotent; [`InMemoryLedger`] implements the
//! contract with [`ProgressRecord::merge`].

use crate::error::StoreError;
use crate::record::{ProgressRecord, UserId};
use dashmap::DashMap;
use journey_registry::StepId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Remote progress ledger
#[async_trait::async_trait]
pub trait ProgressLedger: Send + Sync {
    /// All records of a user, in no particular order
    async fn records(&self, user: &UserId) -> Result<Vec<ProgressRecord>, StoreError>;

    /// Insert or merge a record keyed on (user, step); returns the stored row
    async fn upsert(&self, record: ProgressRecord) -> Result<ProgressRecord, StoreError>;
}

/// Ledger statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Users with at least one record
    pub users: usize,
    /// Total records
    pub records: usize,
    /// Upserts accepted
    pub upserts: u64,
}

/// Process-local ledger
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    rows: DashMap<UserId, BTreeMap<StepId, ProgressRecord>>,
    upserts: AtomicU64,
}

impl InMemoryLedger {
    /// Create empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store rows verbatim, bypassing merge
    ///
    /// Used to reproduce legacy or drifted ledger contents.
    pub fn seed(&self, records: impl IntoIterator<Item = ProgressRecord>) {
        for record in records {
            self.rows
                .entry(record.user_id.clone())
                .or_default()
                .insert(record.step_id, record);
        }
    }

    /// Single record lookup
    #[must_use]
    pub fn get(&self, user: &UserId, step: StepId) -> Option<ProgressRecord> {
        self.rows.get(user).and_then(|r| r.get(&step).cloned())
    }

    /// Ledger statistics
    #[must_use]
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            users: self.rows.len(),
            records: self.rows.iter().map(|r| r.value().len()).sum(),
            upserts: self.upserts.load(Ordering::Relaxed),
        }
    }
}

#[async_trait::async_trait]
impl ProgressLedger for InMemoryLedger {
    async fn records(&self, user: &UserId) -> Result<Vec<ProgressRecord>, StoreError> {
        Ok(self
            .rows
            .get(user)
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(&self, record: ProgressRecord) -> Result<ProgressRecord, StoreError> {
        let mut user_rows = self.rows.entry(record.user_id.clone()).or_default();
        let stored = match user_rows.get(&record.step_id) {
            Some(existing) => existing.merge(&record),
            None => record,
        };
        user_rows.insert(stored.step_id, stored.clone());
        self.upserts.fetch_add(1, Ordering::Relaxed);
        Ok(stored)
    }
}
