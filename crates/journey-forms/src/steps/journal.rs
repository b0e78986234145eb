//! Append-only journal steps: daily reflection and check-ins
//!
//! Every submit of these steps adds a history row; the latest row is the
//! one loaded back into the form.

use crate::coerce;
use crate::contract::FormContract;
use chrono::NaiveDate;
use journey_registry::catalog::ids;
use journey_registry::StepId;
use serde_json::{json, Value};

/// Gratitude slots per reflection
pub const GRATITUDE_SLOTS: usize = 3;

/// Step 19 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionEntry {
    /// Mood, 1 to 5
    pub mood: i64,
    /// Things the user is grateful for, fixed arity
    pub gratitude: Vec<String>,
    /// Journal text
    pub entry: String,
    /// Day the entry is about
    pub entry_date: Option<NaiveDate>,
}

/// Daily reflection journal
#[derive(Debug)]
pub struct DailyReflection;

impl FormContract for DailyReflection {
    type State = ReflectionEntry;
    const STEP: StepId = ids::DAILY_REFLECTION;
    const NAME: &'static str = "daily_reflection";

    fn initial() -> Self::State {
        ReflectionEntry {
            mood: 3,
            gratitude: vec![String::new(); GRATITUDE_SLOTS],
            entry: String::new(),
            entry_date: None,
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        ReflectionEntry {
            mood: coerce::int_in(coerce::field(&row, "mood"), 1, 5, 3),
            gratitude: coerce::fixed_list(coerce::field(&row, "gratitude"), GRATITUDE_SLOTS),
            entry: coerce::text(coerce::any_field(&row, &["entry", "reflection"])),
            entry_date: coerce::date(coerce::field(&row, "entry_date")),
        }
    }

    fn serialize(state: &Self::State) -> Value {
        json!({
            "mood": state.mood,
            "gratitude": state.gratitude,
            "entry": state.entry,
            "entry_date": coerce::date_value(state.entry_date),
        })
    }
}

/// Step 26 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInForm {
    /// Self-assessed progress, 0 to 100
    pub progress: i64,
    /// What is in the way
    pub blockers: Vec<String>,
    /// Whether the user feels on track
    pub on_track: bool,
}

/// Progress check-in
#[derive(Debug)]
pub struct CheckIn;

impl FormContract for CheckIn {
    type State = CheckInForm;
    const STEP: StepId = ids::CHECK_IN;
    const NAME: &'static str = "check_in";

    fn initial() -> Self::State {
        CheckInForm {
            progress: 0,
            blockers: Vec::new(),
            on_track: false,
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        CheckInForm {
            progress: coerce::int_in(coerce::field(&row, "progress"), 0, 100, 0),
            blockers: coerce::string_list(coerce::field(&row, "blockers")),
            on_track: coerce::flag(coerce::field(&row, "on_track")),
        }
    }

    fn serialize(state: &Self::State) -> Value {
        json!({
            "progress": state.progress,
            "blockers": state.blockers,
            "on_track": state.on_track,
        })
    }
}
