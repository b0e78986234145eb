//! Fault-injecting store wrappers

use journey_progress::{
    FormStore, InMemoryFormStore, InMemoryLedger, ProgressLedger, ProgressRecord, StoreError,
    StoredRow, UserId,
};
use journey_registry::StepId;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use ulid::Ulid;

/// Store operation a fault can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    LedgerRead,
    LedgerWrite,
    FormRead,
    FormWrite,
}

struct FaultState {
    rng: StdRng,
    failure_rate: f64,
    pending: HashMap<Op, u32>,
    lost_ack: bool,
}

/// Decides which store calls fail
///
/// Scripted failures (`fail_next`) are consumed first; otherwise each call
/// fails with probability `failure_rate`.
pub struct FaultInjector {
    state: Mutex<FaultState>,
    injected: AtomicU64,
}

impl std::fmt::Debug for FaultInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultInjector")
            .field("injected", &self.injected())
            .finish_non_exhaustive()
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::seeded(42, 0.0)
    }
}

impl FaultInjector {
    /// No random failures
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seeded(seed: u64, failure_rate: f64) -> Self {
        Self {
            state: Mutex::new(FaultState {
                rng: StdRng::seed_from_u64(seed),
                failure_rate: failure_rate.clamp(0.0, 1.0),
                pending: HashMap::new(),
                lost_ack: false,
            }),
            injected: AtomicU64::new(0),
        }
    }

    /// Fail the next `count` calls of `op`
    pub fn fail_next(&self, op: Op, count: u32) {
        *self.state.lock().pending.entry(op).or_default() += count;
    }

    pub fn set_failure_rate(&self, rate: f64) {
        self.state.lock().failure_rate = rate.clamp(0.0, 1.0);
    }

    /// Failed ledger upserts are applied before the error is returned
    pub fn set_lost_ack(&self, lost_ack: bool) {
        self.state.lock().lost_ack = lost_ack;
    }

    /// Faults injected so far
    pub fn injected(&self) -> u64 {
        self.injected.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.pending.clear();
        state.failure_rate = 0.0;
    }

    fn should_fail(&self, op: Op) -> bool {
        let mut state = self.state.lock();
        let scripted = match state.pending.get_mut(&op) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        };
        let rate = state.failure_rate;
        let fail = scripted || (rate > 0.0 && state.rng.gen_bool(rate));
        if fail {
            self.injected.fetch_add(1, Ordering::Relaxed);
        }
        fail
    }

    fn lost_ack(&self) -> bool {
        self.state.lock().lost_ack
    }

    fn check(&self, op: Op) -> Result<(), StoreError> {
        if self.should_fail(op) {
            Err(injected(op))
        } else {
            Ok(())
        }
    }
}

fn injected(op: Op) -> StoreError {
    StoreError::Unavailable(format!("injected fault on {op:?}"))
}

/// [`InMemoryLedger`] behind a [`FaultInjector`]
#[derive(Debug)]
pub struct FaultyLedger {
    inner: Arc<InMemoryLedger>,
    faults: Arc<FaultInjector>,
}

impl FaultyLedger {
    pub fn new(inner: Arc<InMemoryLedger>, faults: Arc<FaultInjector>) -> Self {
        Self { inner, faults }
    }
}

#[async_trait::async_trait]
impl ProgressLedger for FaultyLedger {
    async fn records(&self, user: &UserId) -> Result<Vec<ProgressRecord>, StoreError> {
        self.faults.check(Op::LedgerRead)?;
        self.inner.records(user).await
    }

    async fn upsert(&self, record: ProgressRecord) -> Result<ProgressRecord, StoreError> {
        if self.faults.should_fail(Op::LedgerWrite) {
            if self.faults.lost_ack() {
                self.inner.upsert(record).await?;
            }
            return Err(injected(Op::LedgerWrite));
        }
        self.inner.upsert(record).await
    }
}

/// [`InMemoryFormStore`] behind a [`FaultInjector`]
///
/// Failed writes never reach the inner store.
#[derive(Debug)]
pub struct FaultyFormStore {
    inner: Arc<InMemoryFormStore>,
    faults: Arc<FaultInjector>,
}

impl FaultyFormStore {
    pub fn new(inner: Arc<InMemoryFormStore>, faults: Arc<FaultInjector>) -> Self {
        Self { inner, faults }
    }
}

#[async_trait::async_trait]
impl FormStore for FaultyFormStore {
    async fn latest(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
    ) -> Result<Option<StoredRow>, StoreError> {
        self.faults.check(Op::FormRead)?;
        self.inner.latest(table, user, step).await
    }

    async fn history(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
    ) -> Result<Vec<StoredRow>, StoreError> {
        self.faults.check(Op::FormRead)?;
        self.inner.history(table, user, step).await
    }

    async fn insert(
        &self,
        table: &str,
        user: &UserId,
        step: Option<StepId>,
        payload: Value,
    ) -> Result<StoredRow, StoreError> {
        self.faults.check(Op::FormWrite)?;
        self.inner.insert(table, user, step, payload).await
    }

    async fn update(&self, table: &str, row_id: Ulid, payload: Value) -> Result<StoredRow, StoreError> {
        self.faults.check(Op::FormWrite)?;
        self.inner.update(table, row_id, payload).await
    }
}
