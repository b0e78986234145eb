//! Path choice gateway and the quick-start branch

use crate::coerce;
use crate::contract::FormContract;
use chrono::NaiveDate;
use journey_registry::catalog::{ids, FULL_ASSESSMENT_BRANCH, QUICK_START_BRANCH};
use journey_registry::StepId;
use serde_json::{json, Value};

/// Goal slots on the quick-start path
pub const GOAL_SLOTS: usize = 3;

/// Step 6 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChoiceForm {
    /// Chosen branch group, `None` until the user picks one
    pub path: Option<String>,
    /// Why the path was chosen
    pub reason: String,
}

/// Path choice gateway
///
/// Submitting opens both branches; `path` only records the user's stated
/// preference.
#[derive(Debug)]
pub struct PathChoice;

impl FormContract for PathChoice {
    type State = PathChoiceForm;
    const STEP: StepId = ids::PATH_CHOICE;
    const NAME: &'static str = "path_choice";

    fn initial() -> Self::State {
        PathChoiceForm {
            path: None,
            reason: String::new(),
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        PathChoiceForm {
            path: coerce::choice(
                coerce::any_field(&row, &["path", "selected_path"]),
                &[QUICK_START_BRANCH, FULL_ASSESSMENT_BRANCH],
            ),
            reason: coerce::text(coerce::field(&row, "reason")),
        }
    }

    fn serialize(state: &Self::State) -> Value {
        json!({ "path": state.path, "reason": state.reason })
    }
}

/// Step 7 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalsForm {
    /// Goals, fixed arity
    pub goals: Vec<String>,
    /// First concrete action
    pub first_action: String,
    /// Target date
    pub deadline: Option<NaiveDate>,
}

/// Quick-start goals
#[derive(Debug)]
pub struct QuickStartGoals;

impl FormContract for QuickStartGoals {
    type State = GoalsForm;
    const STEP: StepId = ids::QUICK_START_GOALS;
    const NAME: &'static str = "quick_start_goals";

    fn initial() -> Self::State {
        GoalsForm {
            goals: vec![String::new(); GOAL_SLOTS],
            first_action: String::new(),
            deadline: None,
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        GoalsForm {
            goals: coerce::fixed_list(coerce::field(&row, "goals"), GOAL_SLOTS),
            first_action: coerce::text(coerce::field(&row, "first_action")),
            deadline: coerce::date(coerce::field(&row, "deadline")),
        }
    }

    fn serialize(state: &Self::State) -> Value {
        json!({
            "goals": state.goals,
            "first_action": state.first_action,
            "deadline": coerce::date_value(state.deadline),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn path_choice_accepts_legacy_spelling() {
        let state = PathChoice::normalize(&json!({"selected_path": "Full Assessment"}));
        assert_eq!(state.path.as_deref(), Some(FULL_ASSESSMENT_BRANCH));
    }

    #[test]
    fn unknown_path_is_unset() {
        let state = PathChoice::normalize(&json!({"path": "scenic"}));
        assert_eq!(state, PathChoiceForm { path: None, reason: String::new() });
    }

    #[test]
    fn goals_keep_date_from_timestamp() {
        let state = QuickStartGoals::normalize(&json!({
            "goals": r#"["run 5k"]"#,
            "deadline": "2024-06-30T00:00:00.000Z",
        }));
        assert_eq!(state.goals, vec!["run 5k", "", ""]);
        assert_eq!(state.deadline, NaiveDate::from_ymd_opt(2024, 6, 30));

        let stored = QuickStartGoals::serialize(&state);
        assert_eq!(stored["deadline"], "2024-06-30");
    }
}
