//! Journey progress aggregation for the dashboard

use crate::gating::GatingResolver;
use journey_registry::StepId;
use serde::{Deserialize, Serialize};

/// Read-only progress view derived from a [`GatingResolver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyProgress {
    completed: usize,
    total: usize,
    terminal: StepId,
    terminal_completed: bool,
    current: Option<StepId>,
}

impl JourneyProgress {
    /// Aggregate a user's gating view
    #[must_use]
    pub fn compute(resolver: &GatingResolver) -> Self {
        let registry = resolver.registry();
        let terminal = registry.terminal();
        Self {
            completed: resolver.completed_steps().len(),
            total: registry.len(),
            terminal,
            terminal_completed: resolver.record(terminal).is_some_and(|r| r.completed),
            current: resolver.current_step(),
        }
    }

    /// Completed steps
    #[inline]
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed
    }

    /// Registered steps
    #[inline]
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.total
    }

    /// Completed share of all registered steps, 0 to 100
    ///
    /// Branch paths not taken keep this below 100 even for finished journeys.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }

    /// Terminal step completed
    ///
    /// Independent of [`percent_complete`](Self::percent_complete).
    #[inline]
    #[must_use]
    pub fn is_journey_complete(&self) -> bool {
        self.terminal_completed
    }

    /// Serializable snapshot
    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            completed_steps: self.completed,
            total_steps: self.total,
            percent_complete: self.percent_complete(),
            journey_complete: self.terminal_completed,
            current_step: self.current,
            terminal_step: self.terminal,
        }
    }
}

/// Dashboard payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Completed steps
    pub completed_steps: usize,
    /// Registered steps
    pub total_steps: usize,
    /// 0 to 100
    pub percent_complete: f64,
    /// Terminal step completed
    pub journey_complete: bool,
    /// Earliest pending step
    pub current_step: Option<StepId>,
    /// Designated terminal step
    pub terminal_step: StepId,
}
