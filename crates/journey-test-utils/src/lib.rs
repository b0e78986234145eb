//! Testing utilities for the journey workspace
//!
//! Shared fixtures, fault-injecting stores and setup helpers.

#![allow(missing_docs)]

mod faults;

pub use faults::{FaultInjector, FaultyFormStore, FaultyLedger, Op};

use journey_engine::{EngineConfig, Journey};
use journey_progress::{InMemoryFormStore, InMemoryLedger, UserId};
use journey_registry::{StepDescriptor, StepId, StepRegistry};
use std::sync::Arc;

/// Steps of the branch scenario `[1 -> 2 -> {3a, 3b} -> 4]`
pub mod branch {
    use journey_registry::StepId;

    pub const START: StepId = StepId(1);
    pub const GATEWAY: StepId = StepId(2);
    pub const BRANCH_A: StepId = StepId(3);
    pub const BRANCH_B: StepId = StepId(4);
    pub const JOIN: StepId = StepId(5);

    pub const GROUP_A: &str = "branch-a";
    pub const GROUP_B: &str = "branch-b";
}

/// Registry `[1 -> 2 -> {3a, 3b} -> 4]`; the join step is terminal
pub fn branch_registry() -> StepRegistry {
    use branch::{BRANCH_A, BRANCH_B, GATEWAY, GROUP_A, GROUP_B, JOIN, START};

    StepRegistry::builder()
        .step(StepDescriptor::new(START, "Start", "starts"))
        .step(StepDescriptor::new(GATEWAY, "Gateway", "gateways"))
        .step(StepDescriptor::new(BRANCH_A, "Branch A", "branch_a").after(GATEWAY).in_branch(GROUP_A))
        .step(StepDescriptor::new(BRANCH_B, "Branch B", "branch_b").after(GATEWAY).in_branch(GROUP_B))
        .step(StepDescriptor::new(JOIN, "Join", "joins"))
        .build()
        .unwrap()
}

/// Linear registry over `ids`, one table per step
pub fn linear_registry(ids: &[u32]) -> StepRegistry {
    StepRegistry::builder()
        .steps(
            ids.iter()
                .map(|id| StepDescriptor::new(StepId(*id), format!("Step {id}"), format!("table_{id}"))),
        )
        .build()
        .unwrap()
}

/// Journey with in-memory stores, plus handles to inspect them
pub struct TestJourney {
    pub journey: Journey,
    pub ledger: Arc<InMemoryLedger>,
    pub forms: Arc<InMemoryFormStore>,
}

impl TestJourney {
    pub fn user(&self) -> UserId {
        UserId::new("test-user")
    }
}

/// Journey over `registry` with in-memory stores
pub fn setup_journey(registry: StepRegistry, config: EngineConfig) -> TestJourney {
    let ledger = Arc::new(InMemoryLedger::new());
    let forms = Arc::new(InMemoryFormStore::new());
    let journey = Journey::with_config(Arc::new(registry), ledger.clone(), forms.clone(), config);
    TestJourney {
        journey,
        ledger,
        forms,
    }
}

/// Standard journey with in-memory stores
pub fn setup_standard_journey(config: EngineConfig) -> TestJourney {
    setup_journey(journey_registry::standard_journey().unwrap(), config)
}

/// Journey whose stores fail according to `faults`
pub fn setup_faulty_journey(
    registry: StepRegistry,
    config: EngineConfig,
    faults: &Arc<FaultInjector>,
) -> TestJourney {
    let ledger = Arc::new(InMemoryLedger::new());
    let forms = Arc::new(InMemoryFormStore::new());
    let journey = Journey::with_config(
        Arc::new(registry),
        Arc::new(FaultyLedger::new(ledger.clone(), faults.clone())),
        Arc::new(FaultyFormStore::new(forms.clone(), faults.clone())),
        config,
    );
    TestJourney {
        journey,
        ledger,
        forms,
    }
}
