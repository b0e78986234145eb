//! Opening steps: intentions, life wheel, core values, vision

use crate::coerce;
use crate::contract::FormContract;
use indexmap::IndexMap;
use journey_registry::catalog::ids;
use journey_registry::StepId;
use serde_json::{json, Map, Value};

/// Intention slots on the welcome step
pub const INTENTION_SLOTS: usize = 3;
/// Core value slots
pub const VALUE_SLOTS: usize = 5;

/// Life areas rated on the life wheel, in display order
pub const LIFE_AREAS: [&str; 8] = [
    "health",
    "career",
    "finances",
    "relationships",
    "family",
    "growth",
    "recreation",
    "environment",
];

/// Step 1 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentionsForm {
    /// Intentions, fixed arity
    pub intentions: Vec<String>,
    /// Free text motivation
    pub motivation: String,
    /// Self-rated commitment, 1 to 10
    pub commitment_level: i64,
}

/// Welcome & intentions
#[derive(Debug)]
pub struct Intentions;

impl FormContract for Intentions {
    type State = IntentionsForm;
    const STEP: StepId = ids::INTENTIONS;
    const NAME: &'static str = "intentions";

    fn initial() -> Self::State {
        IntentionsForm {
            intentions: vec![String::new(); INTENTION_SLOTS],
            motivation: String::new(),
            commitment_level: 5,
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        IntentionsForm {
            // Early rows stored a single `intention` string
            intentions: coerce::fixed_list(
                coerce::any_field(&row, &["intentions", "intention"]),
                INTENTION_SLOTS,
            ),
            motivation: coerce::text(coerce::field(&row, "motivation")),
            commitment_level: coerce::int_in(coerce::field(&row, "commitment_level"), 1, 10, 5),
        }
    }

    fn serialize(state: &Self::State) -> Value {
        json!({
            "intentions": state.intentions,
            "motivation": state.motivation,
            "commitment_level": state.commitment_level,
        })
    }
}

/// Step 2 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifeWheelForm {
    /// Score per life area, 1 to 10, in [`LIFE_AREAS`] order
    pub scores: IndexMap<String, i64>,
    /// Free text notes
    pub notes: String,
}

impl LifeWheelForm {
    /// Mean score across all areas
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.values().sum::<i64>() as f64 / self.scores.len() as f64
    }
}

/// Life wheel self-assessment
#[derive(Debug)]
pub struct LifeWheel;

impl FormContract for LifeWheel {
    type State = LifeWheelForm;
    const STEP: StepId = ids::LIFE_WHEEL;
    const NAME: &'static str = "life_wheel";

    fn initial() -> Self::State {
        LifeWheelForm {
            scores: LIFE_AREAS.iter().map(|a| ((*a).to_string(), 5)).collect(),
            notes: String::new(),
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        let nested = coerce::object(coerce::field(&row, "scores"));
        // Legacy rows kept one column per area instead of a `scores` object
        let scores = LIFE_AREAS
            .iter()
            .map(|area| {
                let value = nested
                    .get(*area)
                    .filter(|v| !v.is_null())
                    .or_else(|| coerce::field(&row, area));
                ((*area).to_string(), coerce::int_in(value, 1, 10, 5))
            })
            .collect();
        LifeWheelForm {
            scores,
            notes: coerce::text(coerce::field(&row, "notes")),
        }
    }

    fn serialize(state: &Self::State) -> Value {
        let scores: Map<String, Value> = state
            .scores
            .iter()
            .map(|(area, score)| (area.clone(), json!(score)))
            .collect();
        json!({ "scores": scores, "notes": state.notes })
    }
}

/// Step 3 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreValuesForm {
    /// Values, fixed arity
    pub values: Vec<String>,
    /// The single most important value
    pub top_value: String,
}

/// Core values
#[derive(Debug)]
pub struct CoreValues;

impl FormContract for CoreValues {
    type State = CoreValuesForm;
    const STEP: StepId = ids::CORE_VALUES;
    const NAME: &'static str = "core_values";

    fn initial() -> Self::State {
        CoreValuesForm {
            values: vec![String::new(); VALUE_SLOTS],
            top_value: String::new(),
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        let values = coerce::fixed_list(coerce::any_field(&row, &["values", "core_values"]), VALUE_SLOTS);
        let top_value = match coerce::text(coerce::field(&row, "top_value")) {
            top if top.is_empty() => values.first().cloned().unwrap_or_default(),
            top => top,
        };
        CoreValuesForm { values, top_value }
    }

    fn serialize(state: &Self::State) -> Value {
        json!({ "values": state.values, "top_value": state.top_value })
    }
}

/// Step 4 answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionForm {
    /// Vision statement
    pub statement: String,
    /// Years ahead the vision looks, 1 to 30
    pub horizon_years: i64,
    /// Keywords or image captions supporting the statement
    pub images: Vec<String>,
}

/// Vision statement
#[derive(Debug)]
pub struct Vision;

impl FormContract for Vision {
    type State = VisionForm;
    const STEP: StepId = ids::VISION;
    const NAME: &'static str = "vision";

    fn initial() -> Self::State {
        VisionForm {
            statement: String::new(),
            horizon_years: 5,
            images: Vec::new(),
        }
    }

    fn normalize(raw: &Value) -> Self::State {
        let row = coerce::row(raw);
        VisionForm {
            statement: coerce::text(coerce::any_field(&row, &["statement", "vision_statement"])),
            horizon_years: coerce::int_in(coerce::field(&row, "horizon_years"), 1, 30, 5),
            images: coerce::string_list(coerce::field(&row, "images")),
        }
    }

    fn serialize(state: &Self::State) -> Value {
        json!({
            "statement": state.statement,
            "horizon_years": state.horizon_years,
            "images": state.images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn intentions_accept_single_legacy_string() {
        let state = Intentions::normalize(&json!({"intention": "sleep more", "commitment_level": "12"}));
        assert_eq!(state.intentions, vec!["sleep more", "", ""]);
        assert_eq!(state.commitment_level, 10);
    }

    #[test]
    fn life_wheel_reads_nested_and_flat_scores() {
        let nested = LifeWheel::normalize(&json!({"scores": r#"{"health": 8}"#}));
        assert_eq!(nested.scores["health"], 8);
        assert_eq!(nested.scores["career"], 5);

        let flat = LifeWheel::normalize(&json!({"health": "3", "finances": 11}));
        assert_eq!(flat.scores["health"], 3);
        assert_eq!(flat.scores["finances"], 10);
        assert_eq!(flat.scores.len(), LIFE_AREAS.len());
        assert_eq!(flat.scores.keys().next().map(String::as_str), Some("health"));
    }

    #[test]
    fn life_wheel_average() {
        let state = LifeWheel::initial();
        assert!((state.average() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn core_values_default_top_value() {
        let state = CoreValues::normalize(&json!({"core_values": ["honesty", "courage"]}));
        assert_eq!(state.values.len(), VALUE_SLOTS);
        assert_eq!(state.top_value, "honesty");
    }

    #[test]
    fn vision_round_trips_serialized_state() {
        let state = VisionForm {
            statement: "Calm and healthy".into(),
            horizon_years: 10,
            images: vec!["mountains".into()],
        };
        assert_eq!(Vision::normalize(&Vision::serialize(&state)), state);
    }
}
