//! Per-step form storage
//!
//! Every step writes its answers to its own storage table. [`FormStore`] is
//! the seam to those tables; rows carry the raw JSON payload and are handed to
//! the step's normalizer unchanged.

use crate::error::StoreError;
use crate::record::UserId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use journey_registry::StepId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

/// One stored answer row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    /// Row id; ULIDs sort by insertion time
    pub row_id: Ulid,
    /// Storage table
    pub table: String,
    /// Owner
    pub user_id: UserId,
    /// Step discriminator, set only on tables shared by several steps
    pub step_id: Option<StepId>,
    /// Raw answer payload as stored
    pub payload: Value,
    /// Insert time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl StoredRow {
    fn matches(&self, user: &UserId, step: Option<StepId>) -> bool {
        &self.user_id == user && self.step_id == step
    }
}

/// Remote step tables
#[async_trait::async_trait]
pub trait FormStore: Send + Sync {
    /// Most recently inserted row for (user, step) in `table`
    async fn latest(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
    ) -> Result<Option<StoredRow>, StoreError>;

    /// All rows for (user, step) in `table`, oldest first
    async fn history(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
    ) -> Result<Vec<StoredRow>, StoreError>;

    /// Insert a new row
    async fn insert(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
        payload: Value,
    ) -> Result<StoredRow, StoreError>;

    /// Replace the payload of an existing row
    async fn update(&self, table: &str, row_id: Ulid, payload: Value) -> Result<StoredRow, StoreError>;
}

/// Process-local step tables
///
/// Rows are kept in insertion order per table.
#[derive(Debug, Default)]
pub struct InMemoryFormStore {
    tables: DashMap<String, Vec<StoredRow>>,
}

impl InMemoryFormStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row synchronously, e.g. a legacy payload for a fixture
    pub fn seed(&self, table: &str, user: &UserId, step: Option<StepId>, payload: Value) -> StoredRow {
        let row = new_row(table, user, step, payload);
        self.tables.entry(table.to_string()).or_default().push(row.clone());
        row
    }

    /// Number of rows for (user, step) in `table`
    #[must_use]
    pub fn row_count(&self, table: &str, user: &UserId, step: Option<StepId>) -> usize {
        self.tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| r.matches(user, step)).count())
            .unwrap_or(0)
    }

    /// Number of rows across all tables
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.value().len()).sum()
    }
}

fn new_row(table: &str, user: &UserId, step: Option<StepId>, payload: Value) -> StoredRow {
    let now = Utc::now();
    StoredRow {
        row_id: Ulid::new(),
        table: table.to_string(),
        user_id: user.clone(),
        step_id: step,
        payload,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait::async_trait]
impl FormStore for InMemoryFormStore {
    async fn latest(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
    ) -> Result<Option<StoredRow>, StoreError> {
        Ok(self
            .tables
            .get(table)
            .and_then(|rows| rows.iter().rev().find(|r| r.matches(user, step)).cloned()))
    }

    async fn history(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
    ) -> Result<Vec<StoredRow>, StoreError> {
        Ok(self
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| r.matches(user, step)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
        payload: Value,
    ) -> Result<StoredRow, StoreError> {
        Ok(self.seed(table, user, step, payload))
    }

    async fn update(&self, table: &str, row_id: Ulid, payload: Value) -> Result<StoredRow, StoreError> {
        let mut rows = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::RowNotFound(format!("{table}/{row_id}")))?;
        let row = rows
            .iter_mut()
            .find(|r| r.row_id == row_id)
            .ok_or_else(|| StoreError::RowNotFound(format!("{table}/{row_id}")))?;

        row.payload = payload;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn latest_returns_last_inserted() {
        let store = InMemoryFormStore::new();
        let user = UserId::new("u1");

        store.insert("reflection_entries", &user, None, json!({"entry": "one"})).await.unwrap();
        store.insert("reflection_entries", &user, None, json!({"entry": "two"})).await.unwrap();

        let latest = store.latest("reflection_entries", &user, None).await.unwrap().unwrap();
        assert_eq!(latest.payload["entry"], "two");
        assert_eq!(store.history("reflection_entries", &user, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn latest_filters_user_and_step() {
        let store = InMemoryFormStore::new();
        let a = UserId::new("a");
        let b = UserId::new("b");

        store.insert("step_reviews", &a, Some(StepId(22)), json!({"n": 1})).await.unwrap();
        store.insert("step_reviews", &a, Some(StepId(30)), json!({"n": 2})).await.unwrap();
        store.insert("step_reviews", &b, Some(StepId(22)), json!({"n": 3})).await.unwrap();

        let row = store.latest("step_reviews", &a, Some(StepId(22))).await.unwrap().unwrap();
        assert_eq!(row.payload["n"], 1);
        assert!(store.latest("step_reviews", &b, Some(StepId(30))).await.unwrap().is_none());
        assert!(store.latest("missing", &a, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_payload_in_place() {
        let store = InMemoryFormStore::new();
        let user = UserId::new("u1");
        let row = store.insert("vision_statements", &user, None, json!({"v": 1})).await.unwrap();

        let updated = store.update("vision_statements", row.row_id, json!({"v": 2})).await.unwrap();

        assert_eq!(updated.row_id, row.row_id);
        assert_eq!(updated.payload["v"], 2);
        assert!(updated.updated_at >= row.updated_at);
        assert_eq!(store.row_count("vision_statements", &user, None), 1);
    }

    #[tokio::test]
    async fn update_unknown_row_fails() {
        let store = InMemoryFormStore::new();
        let err = store.update("vision_statements", Ulid::new(), json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::RowNotFound(_)));
    }
}
