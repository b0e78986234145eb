//! Per-user ledger snapshot cache using moka
//!
//! Gating queries read the full ledger of a user on every screen. The cache
//! keeps the last snapshot per user and drops it on every upsert for that
//! user, so a read after a submit always sees the submit's writes.
//!
//! A per-user generation is bumped by every upsert. A snapshot loaded while
//! an upsert was running is dropped again instead of outliving the write.

use crate::error::StoreError;
use crate::ledger::ProgressLedger;
use crate::record::{ProgressRecord, UserId};
use dashmap::DashMap;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Cached user snapshots
    pub entry_count: u64,
}

/// Ledger wrapper caching `records` per user
#[derive(Clone)]
pub struct CachedLedger {
    inner: Arc<dyn ProgressLedger>,
    snapshots: Cache<UserId, Arc<Vec<ProgressRecord>>>,
    generations: Arc<DashMap<UserId, u64>>,
}

impl std::fmt::Debug for CachedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedLedger")
            .field("entry_count", &self.snapshots.entry_count())
            .finish_non_exhaustive()
    }
}

impl CachedLedger {
    /// Wrap a ledger with a bounded cache
    #[inline]
    #[must_use]
    pub fn new(inner: Arc<dyn ProgressLedger>, max_capacity: u64) -> Self {
        Self {
            inner,
            snapshots: Cache::new(max_capacity),
            generations: Arc::default(),
        }
    }

    /// Wrap a ledger with a bounded, time-limited cache
    #[inline]
    #[must_use]
    pub fn with_ttl(inner: Arc<dyn ProgressLedger>, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            snapshots: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            generations: Arc::default(),
        }
    }

    /// Drop the snapshot of one user
    #[inline]
    pub async fn invalidate(&self, user: &UserId) {
        self.snapshots.invalidate(user).await;
    }

    /// Drop every snapshot
    #[inline]
    pub fn invalidate_all(&self) {
        self.snapshots.invalidate_all();
    }

    /// Whether a snapshot for `user` is cached
    #[inline]
    #[must_use]
    pub async fn contains(&self, user: &UserId) -> bool {
        self.snapshots.get(user).await.is_some()
    }

    fn generation(&self, user: &UserId) -> u64 {
        self.generations.get(user).map_or(0, |g| *g)
    }

    /// Cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.snapshots.entry_count(),
        }
    }
}

#[async_trait::async_trait]
impl ProgressLedger for CachedLedger {
    async fn records(&self, user: &UserId) -> Result<Vec<ProgressRecord>, StoreError> {
        if let Some(snapshot) = self.snapshots.get(user).await {
            return Ok(snapshot.as_ref().clone());
        }

        let before = self.generation(user);
        let records = self.inner.records(user).await?;
        self.snapshots
            .insert(user.clone(), Arc::new(records.clone()))
            .await;
        // An upsert bumped the generation meanwhile: the snapshot may predate it
        if self.generation(user) != before {
            self.snapshots.invalidate(user).await;
        }
        Ok(records)
    }

    async fn upsert(&self, record: ProgressRecord) -> Result<ProgressRecord, StoreError> {
        let user = record.user_id.clone();
        let result = self.inner.upsert(record).await;
        // Invalidate even on failure: the write may have landed remotely
        *self.generations.entry(user.clone()).or_default() += 1;
        self.snapshots.invalidate(&user).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use journey_registry::{StepDescriptor, StepId};

    fn descriptor(id: u32) -> StepDescriptor {
        StepDescriptor::new(StepId(id), format!("Step {id}"), format!("t{id}"))
    }

    #[tokio::test]
    async fn caches_snapshot_until_upsert() {
        let inner = Arc::new(InMemoryLedger::new());
        let cached = CachedLedger::new(inner.clone(), 100);
        let user = UserId::new("u1");

        assert!(cached.records(&user).await.unwrap().is_empty());
        assert!(cached.contains(&user).await);

        // Write behind the cache's back: snapshot is stale until invalidated
        inner.seed([ProgressRecord::unlocked(&user, &descriptor(1))]);
        assert!(cached.records(&user).await.unwrap().is_empty());

        cached.invalidate(&user).await;
        assert_eq!(cached.records(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_invalidates_user_snapshot() {
        let inner = Arc::new(InMemoryLedger::new());
        let cached = CachedLedger::new(inner, 100);
        let user = UserId::new("u1");

        assert!(cached.records(&user).await.unwrap().is_empty());
        cached.upsert(ProgressRecord::unlocked(&user, &descriptor(1))).await.unwrap();

        assert!(!cached.contains(&user).await);
        assert_eq!(cached.records(&user).await.unwrap().len(), 1);
    }

    /// Inner ledger whose reads return late
    struct SlowReads(Arc<InMemoryLedger>);

    #[async_trait::async_trait]
    impl ProgressLedger for SlowReads {
        async fn records(&self, user: &UserId) -> Result<Vec<ProgressRecord>, StoreError> {
            let records = self.0.records(user).await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            records
        }

        async fn upsert(&self, record: ProgressRecord) -> Result<ProgressRecord, StoreError> {
            self.0.upsert(record).await
        }
    }

    #[tokio::test]
    async fn read_racing_an_upsert_does_not_cache_stale_snapshot() {
        let inner = Arc::new(InMemoryLedger::new());
        let cached = CachedLedger::with_ttl(
            Arc::new(SlowReads(inner.clone())),
            100,
            Duration::from_secs(300),
        );
        let user = UserId::new("u1");

        let (stale, written) = tokio::join!(cached.records(&user), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cached.upsert(ProgressRecord::unlocked(&user, &descriptor(1))).await
        });

        // The racing read saw the ledger before the write
        assert!(stale.unwrap().is_empty());
        written.unwrap();
        assert_eq!(inner.stats().records, 1);
        assert_eq!(cached.records(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        struct Down;

        #[async_trait::async_trait]
        impl ProgressLedger for Down {
            async fn records(&self, _user: &UserId) -> Result<Vec<ProgressRecord>, StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }

            async fn upsert(&self, _record: ProgressRecord) -> Result<ProgressRecord, StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
        }

        let cached = CachedLedger::new(Arc::new(Down), 10);
        let user = UserId::new("u1");

        let err = cached.records(&user).await.unwrap_err();
        assert!(err.is_transient());
        assert!(!cached.contains(&user).await);
    }
}
