//! Journey simulator
//!
//! Walks many users through the standard journey over stores that fail at a
//! seeded rate, retrying the way a step screen would, and checks after every
//! submit attempt that:
//! - no step is completed without a stored form row
//! - single-row steps never hold more than one row per user
//! - completed steps stay completed
//! - reported journey completion matches the ledger's terminal record

use crate::payload::random_payload;
use journey_engine::{EngineConfig, FormEngine, Journey, JourneyError, SubmitOutcome};
use journey_forms::{with_standard_contract, FormContract};
use journey_progress::{InMemoryFormStore, InMemoryLedger, ProgressLedger, UserId};
use journey_registry::catalog::{FULL_ASSESSMENT_BRANCH, QUICK_START_BRANCH};
use journey_registry::{standard_journey, StepId, StepRegistry};
use journey_test_utils::{setup_faulty_journey, FaultInjector};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Users walked through the journey, one after another
    pub users: u64,
    /// Probability that any store call fails
    pub failure_rate: f64,
    /// Failed ledger upserts still land in the store
    pub lost_ack: bool,
    /// Retries per store call or submit before a user gives up
    pub max_retries: u32,
    /// End the run at the first violation instead of reporting all
    pub stop_on_first_violation: bool,
    /// Engine under test
    pub engine: EngineConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            users: 100,
            failure_rate: 0.1,
            lost_ack: true,
            max_retries: 16,
            stop_on_first_violation: false,
            engine: EngineConfig::default(),
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Ledger says completed but the step's table holds no row
    CompletedWithoutForm { user: UserId, step: StepId },
    /// Single-row step holds several rows
    DuplicateLiveRows { user: UserId, step: StepId, rows: usize },
    /// A completed step is no longer completed
    CompletionRegressed { user: UserId, step: StepId },
    /// Reported completion disagrees with the terminal record
    CompletionMismatch {
        user: UserId,
        reported: bool,
        stored: bool,
    },
    /// Error that retrying cannot fix
    UnexpectedError {
        user: UserId,
        step: StepId,
        error: String,
    },
    /// Registered step without a form contract
    MissingContract { step: StepId },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorStats {
    pub users_started: u64,
    pub users_finished: u64,
    pub users_stalled: u64,
    pub submits_attempted: u64,
    pub submits_failed: u64,
    pub retries: u64,
    pub steps_completed: u64,
    pub faults_injected: u64,
    pub form_rows: usize,
    pub ledger_records: usize,
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human readable report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        let stats = &self.stats;

        let _ = writeln!(report, "=== Journey Simulator Report ===\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Failure Rate: {:.2}", self.config.failure_rate);
        let _ = writeln!(report, "Lost Acks: {}", self.config.lost_ack);
        let _ = writeln!(report, "Users Started: {}", stats.users_started);
        let _ = writeln!(report, "Users Finished: {}", stats.users_finished);
        let _ = writeln!(report, "Users Stalled: {}", stats.users_stalled);
        let _ = writeln!(report, "Submits Attempted: {}", stats.submits_attempted);
        let _ = writeln!(report, "Submits Failed: {}", stats.submits_failed);
        let _ = writeln!(report, "Retries: {}", stats.retries);
        let _ = writeln!(report, "Steps Completed: {}", stats.steps_completed);
        let _ = writeln!(report, "Faults Injected: {}", stats.faults_injected);
        let _ = writeln!(report, "Form Rows: {}", stats.form_rows);
        let _ = writeln!(report, "Ledger Records: {}", stats.ledger_records);
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v:?}", i + 1);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

/// Retry a journey call while it fails with a retryable error
macro_rules! retrying {
    ($sim:expr, $call:expr) => {{
        let mut attempt = 0;
        loop {
            let result = $call.await;
            match result {
                Err(err) if err.is_retryable() && attempt < $sim.config.max_retries => {
                    attempt += 1;
                    $sim.stats.retries += 1;
                }
                other => break other,
            }
        }
    }};
}

struct Simulation {
    config: SimulatorConfig,
    registry: Arc<StepRegistry>,
    journey: Journey,
    ledger: Arc<InMemoryLedger>,
    forms: Arc<InMemoryFormStore>,
    faults: Arc<FaultInjector>,
    rng: StdRng,
    stats: SimulatorStats,
    violations: Vec<Violation>,
    completed: HashMap<UserId, BTreeSet<StepId>>,
}

impl Simulation {
    fn should_stop(&self) -> bool {
        self.config.stop_on_first_violation && !self.violations.is_empty()
    }

    fn violation(&mut self, violation: Violation) {
        info!(?violation, "violation detected");
        self.violations.push(violation);
    }

    /// Steps of the branch this user did not pick are never entered
    fn on_route(&self, step: StepId, branch: &str) -> bool {
        self.registry
            .get(step)
            .map(|d| d.branch_group.as_deref().map_or(true, |group| group == branch))
            .unwrap_or(false)
    }

    async fn run_user(&mut self, index: u64) {
        let user = UserId::new(format!("sim-{index:05}"));
        let branch = if self.rng.gen_bool(0.5) {
            QUICK_START_BRANCH
        } else {
            FULL_ASSESSMENT_BRANCH
        };
        let journey = self.journey.clone();
        let terminal = self.registry.terminal();
        self.stats.users_started += 1;
        debug!(user = %user, branch, "user started");

        // Each pass completes one step; the bound guards against a stuck route
        for _ in 0..=self.registry.len() {
            let resolver = match retrying!(self, journey.resolver(&user)) {
                Ok(resolver) => resolver,
                Err(err) => {
                    self.give_up(&user, self.registry.first(), &err);
                    return;
                }
            };

            if resolver.record(terminal).is_some_and(|r| r.completed) {
                self.stats.users_finished += 1;
                self.check_reported_completion(&journey, &user).await;
                return;
            }

            let Some(step) = resolver
                .available_steps()
                .into_iter()
                .find(|id| self.on_route(*id, branch))
            else {
                break;
            };

            let submitted = with_standard_contract!(
                step,
                |C| self.submit_step::<C>(&journey, &user).await,
                else {
                    self.violation(Violation::MissingContract { step });
                    false
                }
            );
            if !submitted || self.should_stop() {
                break;
            }
        }
        self.stats.users_stalled += 1;
    }

    async fn submit_step<C: FormContract>(&mut self, journey: &Journey, user: &UserId) -> bool {
        let mut engine: FormEngine<C> = match retrying!(self, journey.open::<C>(user)) {
            Ok(engine) => engine,
            Err(err) => {
                self.give_up(user, C::STEP, &err);
                return false;
            }
        };
        if let Err(err) = retrying!(self, engine.load()) {
            self.give_up(user, C::STEP, &err);
            return false;
        }
        engine.replace(C::normalize(&random_payload(&mut self.rng)));

        let mut attempt = 0;
        loop {
            self.stats.submits_attempted += 1;
            match engine.submit().await {
                Ok(outcome) => {
                    self.stats.steps_completed += 1;
                    self.check_user(user).await;
                    self.check_outcome(user, &outcome);
                    return true;
                }
                Err(err) => {
                    self.stats.submits_failed += 1;
                    // Invariants hold between attempts too
                    self.check_user(user).await;
                    if !err.is_retryable() || attempt >= self.config.max_retries {
                        self.give_up(user, C::STEP, &err);
                        return false;
                    }
                    attempt += 1;
                    self.stats.retries += 1;
                }
            }
        }
    }

    fn give_up(&mut self, user: &UserId, step: StepId, err: &JourneyError) {
        if err.is_retryable() {
            debug!(user = %user, step = %step, error = %err, "retries exhausted");
        } else {
            self.violation(Violation::UnexpectedError {
                user: user.clone(),
                step,
                error: err.to_string(),
            });
        }
    }

    fn terminal_completed(&self, user: &UserId) -> bool {
        self.ledger
            .get(user, self.registry.terminal())
            .is_some_and(|r| r.completed)
    }

    /// Store-level checks, read past the fault injector
    async fn check_user(&mut self, user: &UserId) {
        let records = match self.ledger.records(user).await {
            Ok(records) => records,
            Err(_) => return,
        };

        let mut found = Vec::new();
        let mut now_completed = BTreeSet::new();
        for record in records.iter().filter(|r| r.completed) {
            now_completed.insert(record.step_id);
            let Ok(step) = self.registry.get(record.step_id) else {
                continue;
            };
            let key = step.persistence.row_key(step.id);
            if self.forms.row_count(&step.storage_table, user, key) == 0 {
                found.push(Violation::CompletedWithoutForm {
                    user: user.clone(),
                    step: step.id,
                });
            }
        }

        for step in self.registry.iter().filter(|s| !s.persistence.is_append_only()) {
            let rows = self
                .forms
                .row_count(&step.storage_table, user, step.persistence.row_key(step.id));
            if rows > 1 {
                found.push(Violation::DuplicateLiveRows {
                    user: user.clone(),
                    step: step.id,
                    rows,
                });
            }
        }

        let previous = self.completed.entry(user.clone()).or_default();
        for step in previous.difference(&now_completed) {
            found.push(Violation::CompletionRegressed {
                user: user.clone(),
                step: *step,
            });
        }
        *previous = now_completed;

        for violation in found {
            self.violation(violation);
        }
    }

    fn check_outcome(&mut self, user: &UserId, outcome: &SubmitOutcome) {
        let stored = self.terminal_completed(user);
        if outcome.journey_complete != stored {
            self.violation(Violation::CompletionMismatch {
                user: user.clone(),
                reported: outcome.journey_complete,
                stored,
            });
        }
    }

    async fn check_reported_completion(&mut self, journey: &Journey, user: &UserId) {
        let Ok(progress) = retrying!(self, journey.progress(user)) else {
            return;
        };
        let stored = self.terminal_completed(user);
        if progress.is_journey_complete() != stored {
            self.violation(Violation::CompletionMismatch {
                user: user.clone(),
                reported: progress.is_journey_complete(),
                stored,
            });
        }
    }

    fn finish(mut self) -> SimulatorReport {
        self.stats.faults_injected = self.faults.injected();
        self.stats.form_rows = self.forms.total_rows();
        self.stats.ledger_records = self.ledger.stats().records;
        SimulatorReport {
            config: self.config,
            stats: self.stats,
            violations: self.violations,
        }
    }
}

/// Run the journey simulator
///
/// # Errors
/// - `JourneyError::Config` if the engine configuration is invalid
/// - `JourneyError::Registry` if the standard journey cannot be built
pub async fn run_simulator(config: SimulatorConfig) -> Result<SimulatorReport, JourneyError> {
    config.engine.validate()?;

    let faults = Arc::new(FaultInjector::seeded(config.seed, config.failure_rate));
    faults.set_lost_ack(config.lost_ack);
    let harness = setup_faulty_journey(standard_journey()?, config.engine.clone(), &faults);

    let mut sim = Simulation {
        registry: harness.journey.registry().clone(),
        journey: harness.journey,
        ledger: harness.ledger,
        forms: harness.forms,
        faults,
        // Separate stream so route choices do not depend on fault draws
        rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
        stats: SimulatorStats::default(),
        violations: Vec::new(),
        completed: HashMap::new(),
        config,
    };

    info!(
        seed = sim.config.seed,
        users = sim.config.users,
        failure_rate = sim.config.failure_rate,
        "simulation started"
    );
    for index in 0..sim.config.users {
        sim.run_user(index).await;
        if sim.should_stop() {
            break;
        }
    }

    let report = sim.finish();
    info!(
        passed = report.passed(),
        violations = report.violations.len(),
        "simulation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(users: u64, failure_rate: f64) -> SimulatorConfig {
        SimulatorConfig {
            users,
            failure_rate,
            ..SimulatorConfig::default()
        }
    }

    #[tokio::test]
    async fn fault_free_users_all_finish() {
        let report = run_simulator(config(8, 0.0)).await.unwrap();

        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.users_finished, 8);
        assert_eq!(report.stats.users_stalled, 0);
        assert_eq!(report.stats.submits_failed, 0);
        assert_eq!(report.stats.faults_injected, 0);
    }

    #[tokio::test]
    async fn faulty_stores_keep_invariants() {
        let report = run_simulator(config(12, 0.2)).await.unwrap();

        assert!(report.passed(), "{}", report.generate_text());
        assert!(report.stats.faults_injected > 0);
        assert!(report.stats.retries > 0);
    }

    #[tokio::test]
    async fn same_seed_same_report() {
        let a = run_simulator(config(4, 0.15)).await.unwrap();
        let b = run_simulator(config(4, 0.15)).await.unwrap();
        assert_eq!(a.stats, b.stats);
    }

    #[tokio::test]
    async fn invalid_engine_config_is_rejected() {
        let mut config = config(1, 0.0);
        config.engine.log.filter = String::new();
        assert!(matches!(
            run_simulator(config).await,
            Err(JourneyError::Config(_))
        ));
    }

    #[test]
    fn text_report_shows_result() {
        let report = SimulatorReport {
            config: SimulatorConfig::default(),
            stats: SimulatorStats::default(),
            violations: vec![Violation::MissingContract { step: StepId(99) }],
        };
        let text = report.generate_text();
        assert!(text.contains("=== Violations ==="));
        assert!(text.contains("=== Result: FAIL ==="));
    }
}
