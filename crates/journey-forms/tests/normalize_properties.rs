//! Every standard contract normalizes any stored payload without panicking.

use journey_forms::steps::{CoreObjectives, OBJECTIVE_SLOTS};
use journey_forms::{standard_contracts, with_standard_contract, FormContract};
use journey_registry::{standard_journey, StepId};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>().prop_map(|f| json!(f)),
        ".{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,12}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Payloads seen in legacy rows, plus a generated one
fn shapes(generated: Value) -> Vec<Value> {
    vec![
        Value::Null,
        json!({}),
        json!([]),
        json!(["a", 1, null]),
        json!(r#"["a","b"]"#),
        json!(r#"{"objectives": "[\"x\"]"}"#),
        json!("not json at all"),
        generated,
    ]
}

fn normalize_all(raw: &Value) {
    for id in standard_journey().unwrap().ids() {
        let ok = with_standard_contract!(id, |C| {
            let state = C::normalize(raw);
            // Normalizing the serialized state must be total as well
            let _ = C::normalize(&C::serialize(&state));
            true
        }, else false);
        assert!(ok, "no contract for {id}");
    }
}

proptest! {
    #[test]
    fn normalize_never_panics(generated in arb_json()) {
        for raw in shapes(generated) {
            normalize_all(&raw);
        }
    }

    #[test]
    fn objectives_always_have_fixed_arity(generated in arb_json()) {
        let state = CoreObjectives::normalize(&json!({ "objectives": generated }));
        prop_assert_eq!(state.objectives.len(), OBJECTIVE_SLOTS);
    }
}

#[test]
fn initial_payloads_normalize_back_to_initial_shape() {
    let contracts = standard_contracts().unwrap();
    for id in contracts.steps() {
        let contract = contracts.get(id).unwrap();
        let payload = contract.initial_payload();
        assert_eq!(contract.canonicalize(&payload), payload, "{}", contract.label());
    }
}

#[test]
fn legacy_objectives_scenario() {
    let state = CoreObjectives::normalize(&json!({ "objectives": "[\"a\",\"b\"]" }));
    assert_eq!(state.objectives, vec!["a", "b", "", "", ""]);
    assert_eq!(CoreObjectives::STEP, StepId(12));
}
