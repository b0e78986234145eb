//! Core objectives and action plan

use crate::coerce;
use crate::contract::FormContract;
use chrono::NaiveDate;
use journey_registry::catalog::ids;
use journey_registry::StepId;
use serde_json::{json, Value};

/// Objective slots; the form always shows exactly this many
pub const OBJECTIVE_SLOTS: usize = 5;

const MAX_PRIORITY: i64 = 5;

/// Step 12 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectivesForm {
    /// Objectives, always [`OBJECTIVE_SLOTS`] entries
    pub objectives: Vec<String>,
    /// Index of the leading objective, 1-based
    pub priority: i64,
    /// Why these objectives matter
    pub why_it_matters: String,
}

impl ObjectivesForm {
    /// Objectives actually filled in
    pub fn filled(&self) -> impl Iterator<Item = &str> {
        self.objectives
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
    }
}

/// Core objectives
#[derive(Debug)]
pub struct CoreObjectives;

impl FormContract for CoreObjectives {
    type State = ObjectivesForm;
    const STEP: StepId = ids::CORE_OBJECTIVES;
    const NAME: &'static str = "core_objectives";

    fn initial() -> Self::State {
        ObjectivesForm {
            objectives: vec![String::new(); OBJECTIVE_SLOTS],
            priority: 1,
            why_it_matters: String::new(),
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        ObjectivesForm {
            objectives: coerce::fixed_list(coerce::field(&row, "objectives"), OBJECTIVE_SLOTS),
            priority: coerce::int_in(coerce::field(&row, "priority"), 1, MAX_PRIORITY, 1),
            why_it_matters: coerce::text(coerce::field(&row, "why_it_matters")),
        }
    }

    fn serialize(state: &Self::State) -> Value {
        json!({
            "objectives": state.objectives,
            "priority": state.priority,
            "why_it_matters": state.why_it_matters,
        })
    }
}

/// One action plan entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItem {
    /// What to do
    pub title: String,
    /// When it is due
    pub due: Option<NaiveDate>,
    /// Done already
    pub done: bool,
}

/// Step 20 answers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionPlanForm {
    /// Planned actions in user order
    pub actions: Vec<ActionItem>,
}

/// Action plan
#[derive(Debug)]
pub struct ActionPlan;

impl FormContract for ActionPlan {
    type State = ActionPlanForm;
    const STEP: StepId = ids::ACTION_PLAN;
    const NAME: &'static str = "action_plan";

    fn initial() -> Self::State {
        ActionPlanForm::default()
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        let entries = coerce::field(&row, "actions");
        let mut actions: Vec<ActionItem> = coerce::object_list(entries)
            .into_iter()
            .map(|item| {
                let item = Value::Object(item);
                ActionItem {
                    title: coerce::text(coerce::any_field(&item, &["title", "action"])),
                    due: coerce::date(coerce::any_field(&item, &["due", "due_date"])),
                    done: coerce::flag(coerce::any_field(&item, &["done", "completed"])),
                }
            })
            .collect();
        // Oldest rows stored bare titles
        if actions.is_empty() {
            actions = coerce::string_list(entries)
                .into_iter()
                .filter(|t| !t.trim().is_empty())
                .map(|title| ActionItem {
                    title,
                    due: None,
                    done: false,
                })
                .collect();
        }
        ActionPlanForm { actions }
    }

    fn serialize(state: &Self::State) -> Value {
        let actions: Vec<Value> = state
            .actions
            .iter()
            .map(|a| {
                json!({
                    "title": a.title,
                    "due": coerce::date_value(a.due),
                    "done": a.done,
                })
            })
            .collect();
        json!({ "actions": actions })
    }
}
