//! Gating over ledger contents written through the `ProgressLedger` seam.

use chrono::Utc;
use journey_progress::{
    GatingResolver, InMemoryLedger, JourneyProgress, ProgressLedger, ProgressRecord, StepStatus,
    UserId,
};
use journey_registry::{StepDescriptor, StepId, StepRegistry};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

const S1: StepId = StepId(1);
const S2: StepId = StepId(2);
const S3A: StepId = StepId(3);
const S3B: StepId = StepId(4);
const S4: StepId = StepId(5);

/// `[1 -> 2 -> {3a, 3b} -> 4]`
fn branch_registry() -> Arc<StepRegistry> {
    Arc::new(
        StepRegistry::builder()
            .step(StepDescriptor::new(S1, "Intentions", "intentions"))
            .step(StepDescriptor::new(S2, "Path choice", "path_choices"))
            .step(StepDescriptor::new(S3A, "Quick start", "quick_start").after(S2).in_branch("quick"))
            .step(StepDescriptor::new(S3B, "Full assessment", "assessments").after(S2).in_branch("full"))
            .step(StepDescriptor::new(S4, "Objectives", "objectives"))
            .build()
            .unwrap(),
    )
}

/// Mark `step` completed and unlock its successors, like a submit does
async fn complete(ledger: &InMemoryLedger, registry: &StepRegistry, user: &UserId, step: StepId) {
    ledger
        .upsert(ProgressRecord::completed(user, registry.get(step).unwrap(), Utc::now()))
        .await
        .unwrap();
    for next in registry.successors(step).unwrap() {
        ledger
            .upsert(ProgressRecord::unlocked(user, registry.get(*next).unwrap()))
            .await
            .unwrap();
    }
}

async fn resolve(ledger: &InMemoryLedger, registry: &Arc<StepRegistry>, user: &UserId) -> GatingResolver {
    GatingResolver::new(registry.clone(), ledger.records(user).await.unwrap())
}

#[tokio::test]
async fn branch_scenario_end_to_end() {
    let registry = branch_registry();
    let ledger = InMemoryLedger::new();
    let user = UserId::new("client-1");

    let fresh = resolve(&ledger, &registry, &user).await;
    ledger.upsert(fresh.bootstrap_record(&user).unwrap()).await.unwrap();

    let started = resolve(&ledger, &registry, &user).await;
    assert_eq!(started.current_step(), Some(S1));
    assert_eq!(started.available_steps(), vec![S1]);

    complete(&ledger, &registry, &user, S1).await;
    complete(&ledger, &registry, &user, S2).await;

    let gated = resolve(&ledger, &registry, &user).await;
    assert!(gated.classify(S3A).unwrap().is_pending());
    assert!(gated.classify(S3B).unwrap().is_pending());
    assert_eq!(gated.classify(S4).unwrap(), StepStatus::Locked);

    complete(&ledger, &registry, &user, S3A).await;
    let rejoined = resolve(&ledger, &registry, &user).await;
    assert!(rejoined.classify(S4).unwrap().is_pending());
    // The untaken branch stays open but never gates the continuation
    assert_eq!(rejoined.classify(S3B).unwrap(), StepStatus::Available);
    assert_eq!(rejoined.current_step(), Some(S3B));

    complete(&ledger, &registry, &user, S4).await;
    let finished = resolve(&ledger, &registry, &user).await;
    let progress = JourneyProgress::compute(&finished);
    assert!(progress.is_journey_complete());
    assert_eq!(progress.completed_count(), 4);
    assert_eq!(progress.total_steps(), 5);
}

#[tokio::test]
async fn every_step_has_exactly_one_status() {
    let registry = branch_registry();
    let ledger = InMemoryLedger::new();
    let user = UserId::new("client-1");
    complete(&ledger, &registry, &user, S1).await;

    let resolver = resolve(&ledger, &registry, &user).await;
    let statuses = resolver.statuses();
    assert_eq!(statuses.len(), registry.len());
    assert_eq!(
        statuses,
        vec![
            (S1, StepStatus::Completed),
            (S2, StepStatus::Current),
            (S3A, StepStatus::Locked),
            (S3B, StepStatus::Locked),
            (S4, StepStatus::Locked),
        ]
    );
}

#[tokio::test]
async fn removed_step_records_do_not_break_gating() {
    let registry = branch_registry();
    let ledger = InMemoryLedger::new();
    let user = UserId::new("client-1");

    let retired = StepDescriptor::new(StepId(15), "Retired", "retired_table");
    ledger.seed([ProgressRecord::completed(&user, &retired, Utc::now())]);
    complete(&ledger, &registry, &user, S1).await;

    let resolver = resolve(&ledger, &registry, &user).await;
    assert_eq!(resolver.skipped_records(), 1);
    assert_eq!(resolver.current_step(), Some(S2));
    assert_eq!(JourneyProgress::compute(&resolver).completed_count(), 1);
}

fn arb_record() -> impl Strategy<Value = ProgressRecord> {
    (any::<bool>(), any::<bool>(), prop::option::of(0i64..2_000_000_000), "[a-z ]{0,12}").prop_map(
        |(completed, available, secs, name)| {
            let mut record =
                ProgressRecord::unlocked(&UserId::new("u"), &StepDescriptor::new(S2, name, "t"));
            record.completed = completed;
            record.available = available;
            record.completed_at = if completed {
                secs.and_then(|s| chrono::DateTime::from_timestamp(s, 0))
            } else {
                None
            };
            record
        },
    )
}

proptest! {
    /// Re-applying an upsert leaves the record unchanged
    #[test]
    fn merge_is_idempotent(a in arb_record(), b in arb_record()) {
        let once = a.merge(&b);
        prop_assert_eq!(once.merge(&b), once);
    }

    /// Upserts never regress completion or move `completed_at`
    #[test]
    fn merge_is_monotone(a in arb_record(), b in arb_record()) {
        let merged = a.merge(&b);
        prop_assert!(merged.completed >= a.completed);
        prop_assert!(merged.available >= a.available);
        if a.completed && a.completed_at.is_some() {
            prop_assert_eq!(merged.completed_at, a.completed_at);
        }
    }
}
