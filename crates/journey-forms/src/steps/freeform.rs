//! Contract for steps whose answers are a flat set of named fields

use crate::coerce;
use crate::contract::FormContract;
use journey_registry::StepId;
use serde_json::{Map, Value};

/// Flat field map contract for step `ID`
///
/// Keeps every stored field, dropping `null`s so blank answers look the same
/// whether they were never written or written empty.
#[derive(Debug)]
pub struct Freeform<const ID: u32>;

impl<const ID: u32> FormContract for Freeform<ID> {
    type State = Map<String, Value>;
    const STEP: StepId = StepId(ID);
    const NAME: &'static str = "freeform";

    fn initial() -> Self::State {
        Map::new()
    }

    fn normalize(raw: &Value) -> Self::State {
        coerce::object(Some(raw))
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .collect()
    }

    fn serialize(state: &Self::State) -> Value {
        Value::Object(state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Habits = Freeform<17>;

    #[test]
    fn keeps_fields_and_drops_nulls() {
        let state = Habits::normalize(&json!({"habit": "walk", "cue": null}));
        assert_eq!(state.len(), 1);
        assert_eq!(Habits::STEP, StepId(17));
    }

    #[test]
    fn non_object_rows_are_blank() {
        assert_eq!(Habits::normalize(&json!(["a"])), Habits::initial());
        assert_eq!(Habits::normalize(&json!(r#"{"habit": "read"}"#))["habit"], "read");
    }
}
