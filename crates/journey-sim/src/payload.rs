//! Random answer payloads
//!
//! Payloads mix current field names with legacy aliases and junk shapes, so
//! every contract's normalizer sees rows like the ones real tables hold.

use rand::Rng;
use serde_json::{json, Map, Value};

const FIELDS: &[&str] = &[
    "intentions",
    "intention",
    "motivation",
    "commitment_level",
    "scores",
    "values",
    "core_values",
    "statement",
    "vision_statement",
    "path",
    "selected_path",
    "goals",
    "objectives",
    "priority",
    "actions",
    "mood",
    "gratitude",
    "entry",
    "reflection",
    "progress",
    "rating",
    "score",
    "notes",
];

const WORDS: &[&str] = &["rest", "focus", "family", "health", "craft", "quick-start", "full_assessment"];

fn word(rng: &mut impl Rng) -> String {
    WORDS[rng.gen_range(0..WORDS.len())].to_string()
}

fn value(rng: &mut impl Rng) -> Value {
    match rng.gen_range(0..7) {
        0 => Value::Null,
        1 => json!(rng.gen_range(-5..40)),
        2 => json!(rng.gen_bool(0.5)),
        3 => json!(word(rng)),
        4 => json!((0..rng.gen_range(0..6)).map(|_| word(rng)).collect::<Vec<_>>()),
        // Arrays stored as JSON text by older clients
        5 => {
            let list: Vec<String> = (0..rng.gen_range(1..4)).map(|_| word(rng)).collect();
            json!(serde_json::to_string(&list).unwrap_or_default())
        }
        _ => json!({ "title": word(rng), "done": rng.gen_bool(0.3) }),
    }
}

/// A stored-row-like payload with a handful of random fields
pub fn random_payload(rng: &mut impl Rng) -> Value {
    let mut row = Map::new();
    for _ in 0..rng.gen_range(0..6) {
        let field = FIELDS[rng.gen_range(0..FIELDS.len())];
        row.insert(field.to_string(), value(rng));
    }
    Value::Object(row)
}
