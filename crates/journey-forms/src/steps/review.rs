//! Review steps sharing the `step_reviews` table
//!
//! Rows of this table are keyed by (user, step), so both reviews read and
//! write the same columns.

use crate::coerce;
use crate::contract::FormContract;
use journey_registry::catalog::ids;
use journey_registry::StepId;
use serde_json::{json, Value};

/// Review answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewForm {
    /// Overall rating, 1 to 10
    pub rating: i64,
    /// Wins since the journey started
    pub wins: Vec<String>,
    /// Lessons learned
    pub lessons: String,
    /// Focus for the next stretch
    pub next_focus: String,
}

fn initial_review() -> ReviewForm {
    ReviewForm {
        rating: 5,
        wins: Vec::new(),
        lessons: String::new(),
        next_focus: String::new(),
    }
}

fn normalize_review(raw: &Value) -> ReviewForm {
    let row = coerce::row(raw);
    ReviewForm {
        rating: coerce::int_in(coerce::any_field(&row, &["rating", "score"]), 1, 10, 5),
        wins: coerce::string_list(coerce::field(&row, "wins")),
        lessons: coerce::text(coerce::field(&row, "lessons")),
        next_focus: coerce::text(coerce::field(&row, "next_focus")),
    }
}

fn serialize_review(state: &ReviewForm) -> Value {
    json!({
        "rating": state.rating,
        "wins": state.wins,
        "lessons": state.lessons,
        "next_focus": state.next_focus,
    })
}

/// Midpoint review
#[derive(Debug)]
pub struct MidpointReview;

impl FormContract for MidpointReview {
    type State = ReviewForm;
    const STEP: StepId = ids::MIDPOINT_REVIEW;
    const NAME: &'static str = "midpoint_review";

    fn initial() -> Self::State {
        initial_review()
    }

    fn normalize(raw: &Value) -> Self::State {
        normalize_review(raw)
    }

    fn serialize(state: &Self::State) -> Value {
        serialize_review(state)
    }
}

/// Final journey review, the terminal step
#[derive(Debug)]
pub struct JourneyReview;

impl FormContract for JourneyReview {
    type State = ReviewForm;
    const STEP: StepId = ids::JOURNEY_REVIEW;
    const NAME: &'static str = "journey_review";

    fn initial() -> Self::State {
        initial_review()
    }

    fn normalize(raw: &Value) -> Self::State {
        normalize_review(raw)
    }

    fn serialize(state: &Self::State) -> Value {
        serialize_review(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_accepts_score_alias() {
        let state = JourneyReview::normalize(&json!({"score": 9, "wins": "ran a marathon"}));
        assert_eq!(state.rating, 9);
        assert_eq!(state.wins, vec!["ran a marathon"]);
    }

    #[test]
    fn both_reviews_share_shape() {
        let raw = json!({"rating": 7, "lessons": "pace myself"});
        assert_eq!(MidpointReview::normalize(&raw), JourneyReview::normalize(&raw));
    }
}
