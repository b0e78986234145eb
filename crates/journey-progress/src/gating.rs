//! Gating resolver
//!
//! Classifies every registered step for one user from that user's ledger
//! records:
//! - `Completed` iff a record exists with `completed = true`
//! - `Current` for the pending record (available, not completed) earliest in
//!   registry order
//! - `Available` for every other pending record, e.g. the sibling branches
//!   opened by a gateway
//! - `Locked` otherwise
//!
//! The resolver never chooses a branch. Records for steps that are no longer
//! registered are skipped.

use crate::record::{ProgressRecord, UserId};
use journey_registry::{RegistryError, StepId, StepRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Gating classification of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not reachable yet
    Locked,
    /// Reachable, not the current step
    Available,
    /// Earliest reachable, unsubmitted step
    Current,
    /// Submitted
    Completed,
}

impl StepStatus {
    /// Whether a step screen may be entered
    ///
    /// Completed steps may be revisited and re-submitted.
    #[inline]
    #[must_use]
    pub fn is_enterable(self) -> bool {
        !matches!(self, Self::Locked)
    }

    /// Reachable but not submitted
    #[inline]
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Available | Self::Current)
    }
}

/// Gating view over one user's ledger
#[derive(Debug, Clone)]
pub struct GatingResolver {
    registry: Arc<StepRegistry>,
    records: HashMap<StepId, ProgressRecord>,
    current: Option<StepId>,
    skipped: usize,
}

impl GatingResolver {
    /// Build a resolver from the user's ledger records
    ///
    /// Duplicate records for the same step are merged; records for unknown
    /// steps are skipped.
    #[must_use]
    pub fn new(registry: Arc<StepRegistry>, records: impl IntoIterator<Item = ProgressRecord>) -> Self {
        let mut by_step: HashMap<StepId, ProgressRecord> = HashMap::new();
        let mut skipped = 0;

        for record in records {
            if !registry.contains(record.step_id) {
                tracing::debug!(
                    step = %record.step_id,
                    user = %record.user_id,
                    "skipping ledger record for unregistered step"
                );
                skipped += 1;
                continue;
            }
            let merged = match by_step.get(&record.step_id) {
                Some(existing) => existing.merge(&record),
                None => record,
            };
            by_step.insert(merged.step_id, merged);
        }

        let current = registry
            .ids()
            .find(|id| by_step.get(id).is_some_and(ProgressRecord::is_pending));

        Self {
            registry,
            records: by_step,
            current,
            skipped,
        }
    }

    /// Classify one step
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if the step is not registered
    pub fn classify(&self, step: StepId) -> Result<StepStatus, RegistryError> {
        self.registry.get(step)?;
        Ok(self.status_of(step))
    }

    fn status_of(&self, step: StepId) -> StepStatus {
        match self.records.get(&step) {
            Some(r) if r.completed => StepStatus::Completed,
            Some(r) if r.available && self.current == Some(step) => StepStatus::Current,
            Some(r) if r.available => StepStatus::Available,
            _ => StepStatus::Locked,
        }
    }

    /// Earliest pending step in registry order
    ///
    /// `None` before bootstrap and once nothing is pending.
    #[inline]
    #[must_use]
    pub fn current_step(&self) -> Option<StepId> {
        self.current
    }

    /// Whether the step screen may be entered
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if the step is not registered
    pub fn can_enter(&self, step: StepId) -> Result<bool, RegistryError> {
        Ok(self.classify(step)?.is_enterable())
    }

    /// Every registered step with its status, in registry order
    #[must_use]
    pub fn statuses(&self) -> Vec<(StepId, StepStatus)> {
        self.registry.ids().map(|id| (id, self.status_of(id))).collect()
    }

    /// Pending steps (current included) in registry order
    #[must_use]
    pub fn available_steps(&self) -> Vec<StepId> {
        self.registry
            .ids()
            .filter(|id| self.status_of(*id).is_pending())
            .collect()
    }

    /// Completed steps in registry order
    #[must_use]
    pub fn completed_steps(&self) -> Vec<StepId> {
        self.registry
            .ids()
            .filter(|id| self.status_of(*id) == StepStatus::Completed)
            .collect()
    }

    /// Whether any step of the branch group has been reached
    #[must_use]
    pub fn is_branch_open(&self, group: &str) -> bool {
        self.registry
            .steps_in_branch(group)
            .into_iter()
            .any(|id| self.status_of(id) != StepStatus::Locked)
    }

    /// Ledger record of a registered step, if any
    #[inline]
    #[must_use]
    pub fn record(&self, step: StepId) -> Option<&ProgressRecord> {
        self.records.get(&step)
    }

    /// Records for registered steps
    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }

    /// Records ignored because their step is no longer registered
    #[inline]
    #[must_use]
    pub fn skipped_records(&self) -> usize {
        self.skipped
    }

    /// Whether the user has no record for any registered step
    #[inline]
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.records.is_empty()
    }

    /// Record that starts the journey, if the user has none yet
    #[must_use]
    pub fn bootstrap_record(&self, user: &UserId) -> Option<ProgressRecord> {
        if !self.is_fresh() {
            return None;
        }
        let first = self.registry.get(self.registry.first()).ok()?;
        Some(ProgressRecord::unlocked(user, first))
    }

    /// Registry the resolver classifies against
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<StepRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use journey_registry::StepDescriptor;
    use pretty_assertions::assert_eq;

    fn registry() -> Arc<StepRegistry> {
        let step = |id: u32| StepDescriptor::new(StepId(id), format!("Step {id}"), format!("t{id}"));
        Arc::new(
            StepRegistry::builder()
                .step(step(1))
                .step(step(2))
                .step(step(3).after(StepId(2)).in_branch("quick"))
                .step(step(4).after(StepId(2)).in_branch("full"))
                .step(step(5))
                .build()
                .unwrap(),
        )
    }

    fn unlocked(reg: &StepRegistry, user: &UserId, id: u32) -> ProgressRecord {
        ProgressRecord::unlocked(user, reg.get(StepId(id)).unwrap())
    }

    fn done(reg: &StepRegistry, user: &UserId, id: u32) -> ProgressRecord {
        ProgressRecord::completed(user, reg.get(StepId(id)).unwrap(), Utc::now())
    }

    #[test]
    fn fresh_user_is_all_locked() {
        let resolver = GatingResolver::new(registry(), Vec::new());
        assert!(resolver.is_fresh());
        assert_eq!(resolver.current_step(), None);
        assert!(resolver.statuses().iter().all(|(_, s)| *s == StepStatus::Locked));
    }

    #[test]
    fn bootstrap_record_targets_first_step() {
        let user = UserId::new("u1");
        let resolver = GatingResolver::new(registry(), Vec::new());
        let record = resolver.bootstrap_record(&user).unwrap();
        assert_eq!(record.step_id, StepId(1));
        assert!(record.is_pending());

        let started = GatingResolver::new(registry(), [record]);
        assert!(started.bootstrap_record(&user).is_none());
        assert_eq!(started.current_step(), Some(StepId(1)));
        assert_eq!(started.available_steps(), vec![StepId(1)]);
    }

    #[test]
    fn gateway_siblings_are_available_not_current() {
        let reg = registry();
        let user = UserId::new("u1");
        let records = vec![
            done(&reg, &user, 1),
            done(&reg, &user, 2),
            unlocked(&reg, &user, 3),
            unlocked(&reg, &user, 4),
        ];
        let resolver = GatingResolver::new(reg, records);

        assert_eq!(resolver.classify(StepId(3)).unwrap(), StepStatus::Current);
        assert_eq!(resolver.classify(StepId(4)).unwrap(), StepStatus::Available);
        assert_eq!(resolver.classify(StepId(5)).unwrap(), StepStatus::Locked);
        assert!(resolver.is_branch_open("quick"));
        assert!(resolver.is_branch_open("full"));
        assert_eq!(resolver.completed_steps(), vec![StepId(1), StepId(2)]);
    }

    #[test]
    fn unknown_step_is_not_found() {
        let resolver = GatingResolver::new(registry(), Vec::new());
        assert_eq!(resolver.classify(StepId(99)), Err(RegistryError::NotFound(StepId(99))));
        assert!(resolver.can_enter(StepId(99)).is_err());
    }

    #[test]
    fn drifted_records_are_skipped() {
        let reg = registry();
        let user = UserId::new("u1");
        let mut ghost = unlocked(&reg, &user, 1);
        ghost.step_id = StepId(77);

        let resolver = GatingResolver::new(reg.clone(), [ghost, done(&reg, &user, 1)]);
        assert_eq!(resolver.skipped_records(), 1);
        assert_eq!(resolver.classify(StepId(1)).unwrap(), StepStatus::Completed);
        assert!(resolver.record(StepId(77)).is_none());
    }

    #[test]
    fn duplicate_records_merge() {
        let reg = registry();
        let user = UserId::new("u1");
        let resolver = GatingResolver::new(reg.clone(), [done(&reg, &user, 1), unlocked(&reg, &user, 1)]);
        assert_eq!(resolver.classify(StepId(1)).unwrap(), StepStatus::Completed);
        assert_eq!(resolver.records().count(), 1);
    }

    #[test]
    fn unavailable_record_stays_locked() {
        let reg = registry();
        let user = UserId::new("u1");
        let mut hidden = unlocked(&reg, &user, 2);
        hidden.available = false;

        let resolver = GatingResolver::new(reg, [hidden]);
        assert_eq!(resolver.classify(StepId(2)).unwrap(), StepStatus::Locked);
        assert!(!resolver.can_enter(StepId(2)).unwrap());
    }

    #[test]
    fn completed_steps_can_be_reentered() {
        let reg = registry();
        let user = UserId::new("u1");
        let resolver = GatingResolver::new(reg.clone(), [done(&reg, &user, 1), unlocked(&reg, &user, 2)]);
        assert!(resolver.can_enter(StepId(1)).unwrap());
        assert!(resolver.can_enter(StepId(2)).unwrap());
        assert!(!resolver.can_enter(StepId(5)).unwrap());
    }
}
