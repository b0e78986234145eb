//! Built-in journey catalog
//!
//! Ids 5, 15, 16, 25 and 29 belonged to retired steps and stay unused so that
//! existing ledger rows keep their meaning.

use crate::error::RegistryError;
use crate::registry::StepRegistry;
use crate::step::{PersistenceMode, StepDescriptor, StepId};

/// Well-known step ids of the standard journey
pub mod ids {
    use crate::step::StepId;

    /// Welcome & intentions
    pub const INTENTIONS: StepId = StepId(1);
    /// Life wheel self-assessment
    pub const LIFE_WHEEL: StepId = StepId(2);
    /// Core values
    pub const CORE_VALUES: StepId = StepId(3);
    /// Vision statement
    pub const VISION: StepId = StepId(4);
    /// Path choice gateway
    pub const PATH_CHOICE: StepId = StepId(6);
    /// Quick-start path: goals
    pub const QUICK_START_GOALS: StepId = StepId(7);
    /// Quick-start path: commitments
    pub const QUICK_START_COMMITMENTS: StepId = StepId(8);
    /// Full-assessment path: strengths inventory
    pub const STRENGTHS: StepId = StepId(9);
    /// Full-assessment path: limiting beliefs
    pub const LIMITING_BELIEFS: StepId = StepId(10);
    /// Full-assessment path: energy audit
    pub const ENERGY_AUDIT: StepId = StepId(11);
    /// Core objectives, shared continuation of both paths
    pub const CORE_OBJECTIVES: StepId = StepId(12);
    /// Daily reflection journal
    pub const DAILY_REFLECTION: StepId = StepId(19);
    /// Action plan
    pub const ACTION_PLAN: StepId = StepId(20);
    /// Midpoint review
    pub const MIDPOINT_REVIEW: StepId = StepId(22);
    /// Progress check-in
    pub const CHECK_IN: StepId = StepId(26);
    /// Final journey review (terminal)
    pub const JOURNEY_REVIEW: StepId = StepId(30);
}

/// Branch taken by users who want a short setup
pub const QUICK_START_BRANCH: &str = "quick-start";
/// Branch taken by users who want the full assessment
pub const FULL_ASSESSMENT_BRANCH: &str = "full-assessment";

/// Descriptors of the standard journey in registry order
#[must_use]
pub fn standard_descriptors() -> Vec<StepDescriptor> {
    use ids::*;

    let reviews = PersistenceMode::CurrentPerUserStep;

    vec![
        StepDescriptor::new(INTENTIONS, "Welcome & Intentions", "intentions"),
        StepDescriptor::new(LIFE_WHEEL, "Life Wheel Assessment", "life_wheel_assessments"),
        StepDescriptor::new(CORE_VALUES, "Core Values", "core_values"),
        StepDescriptor::new(VISION, "Vision Statement", "vision_statements"),
        StepDescriptor::new(PATH_CHOICE, "Choose Your Path", "path_choices"),
        StepDescriptor::new(QUICK_START_GOALS, "Quick Start Goals", "quick_start_goals")
            .after(PATH_CHOICE)
            .in_branch(QUICK_START_BRANCH),
        StepDescriptor::new(
            QUICK_START_COMMITMENTS,
            "Quick Start Commitments",
            "quick_start_commitments",
        )
        .in_branch(QUICK_START_BRANCH),
        StepDescriptor::new(STRENGTHS, "Strengths Inventory", "strengths_inventories")
            .after(PATH_CHOICE)
            .in_branch(FULL_ASSESSMENT_BRANCH),
        StepDescriptor::new(LIMITING_BELIEFS, "Limiting Beliefs", "limiting_beliefs")
            .in_branch(FULL_ASSESSMENT_BRANCH),
        StepDescriptor::new(ENERGY_AUDIT, "Energy Audit", "energy_audits")
            .in_branch(FULL_ASSESSMENT_BRANCH),
        StepDescriptor::new(CORE_OBJECTIVES, "Core Objectives", "core_objectives"),
        StepDescriptor::new(StepId(13), "Obstacle Mapping", "obstacle_maps"),
        StepDescriptor::new(StepId(14), "Support Network", "support_networks"),
        StepDescriptor::new(StepId(17), "Habit Design", "habit_designs"),
        StepDescriptor::new(StepId(18), "Weekly Rhythm", "weekly_rhythms"),
        StepDescriptor::new(DAILY_REFLECTION, "Daily Reflection", "reflection_entries")
            .append_only(),
        StepDescriptor::new(ACTION_PLAN, "Action Plan", "action_plans"),
        StepDescriptor::new(StepId(21), "Accountability Partner", "accountability_partners"),
        StepDescriptor::new(MIDPOINT_REVIEW, "Midpoint Review", "step_reviews")
            .with_persistence(reviews),
        StepDescriptor::new(StepId(23), "Resilience Planning", "resilience_plans"),
        StepDescriptor::new(StepId(24), "Celebration Milestones", "celebration_milestones"),
        StepDescriptor::new(CHECK_IN, "Progress Check-in", "check_ins").append_only(),
        StepDescriptor::new(StepId(27), "Letter to Future Self", "future_self_letters"),
        StepDescriptor::new(StepId(28), "Legacy Statement", "legacy_statements"),
        StepDescriptor::new(JOURNEY_REVIEW, "Journey Review", "step_reviews")
            .with_persistence(reviews),
    ]
}

/// Build the standard journey registry
///
/// # Errors
/// Only if the built-in catalog itself is inconsistent.
pub fn standard_journey() -> Result<StepRegistry, RegistryError> {
    StepRegistry::builder()
        .steps(standard_descriptors())
        .terminal(ids::JOURNEY_REVIEW)
        .build()
}

/// Retired ids that must never be reused
pub const RETIRED_IDS: [StepId; 5] = [StepId(5), StepId(15), StepId(16), StepId(25), StepId(29)];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn standard_journey_builds() {
        let registry = standard_journey().unwrap();
        assert_eq!(registry.first(), ids::INTENTIONS);
        assert_eq!(registry.terminal(), ids::JOURNEY_REVIEW);
        assert!(registry.unreachable().is_empty());
    }

    #[test]
    fn retired_ids_unused() {
        let registry = standard_journey().unwrap();
        for id in RETIRED_IDS {
            assert!(!registry.contains(id), "{id} must stay retired");
        }
    }

    #[test]
    fn path_choice_is_the_gateway() {
        let registry = standard_journey().unwrap();
        assert!(registry.is_gateway(ids::PATH_CHOICE));
        assert_eq!(
            registry.successors(ids::PATH_CHOICE).unwrap(),
            &[ids::QUICK_START_GOALS, ids::STRENGTHS]
        );

        let gateways: Vec<StepId> = registry.ids().filter(|id| registry.is_gateway(*id)).collect();
        assert_eq!(gateways, vec![ids::PATH_CHOICE]);
    }

    #[test]
    fn both_paths_rejoin_at_core_objectives() {
        let registry = standard_journey().unwrap();
        assert_eq!(registry.next(ids::QUICK_START_GOALS).unwrap(), Some(ids::QUICK_START_COMMITMENTS));
        assert_eq!(registry.next(ids::QUICK_START_COMMITMENTS).unwrap(), Some(ids::CORE_OBJECTIVES));
        assert_eq!(registry.next(ids::STRENGTHS).unwrap(), Some(ids::LIMITING_BELIEFS));
        assert_eq!(registry.next(ids::ENERGY_AUDIT).unwrap(), Some(ids::CORE_OBJECTIVES));
        assert_eq!(
            registry.predecessors(ids::CORE_OBJECTIVES).unwrap(),
            vec![ids::QUICK_START_COMMITMENTS, ids::ENERGY_AUDIT]
        );
    }

    #[test]
    fn terminal_has_no_successor() {
        let registry = standard_journey().unwrap();
        assert_eq!(registry.next(ids::JOURNEY_REVIEW).unwrap(), None);
    }

    #[test]
    fn persistence_modes() {
        let registry = standard_journey().unwrap();
        assert!(registry.get(ids::DAILY_REFLECTION).unwrap().persistence.is_append_only());
        assert!(registry.get(ids::CHECK_IN).unwrap().persistence.is_append_only());
        assert_eq!(
            registry.get(ids::MIDPOINT_REVIEW).unwrap().storage_table,
            registry.get(ids::JOURNEY_REVIEW).unwrap().storage_table
        );
        assert_eq!(
            registry.get(ids::VISION).unwrap().persistence,
            PersistenceMode::CurrentPerUser
        );
    }
}
