//! Contracts of the standard journey

mod foundation;
mod freeform;
mod journal;
mod paths;
mod planning;
mod review;

pub use foundation::{
    CoreValues, CoreValuesForm, Intentions, IntentionsForm, LifeWheel, LifeWheelForm, Vision,
    VisionForm, INTENTION_SLOTS, LIFE_AREAS, VALUE_SLOTS,
};
pub use freeform::Freeform;
pub use journal::{CheckIn, CheckInForm, DailyReflection, ReflectionEntry, GRATITUDE_SLOTS};
pub use paths::{GoalsForm, PathChoice, PathChoiceForm, QuickStartGoals, GOAL_SLOTS};
pub use planning::{ActionItem, ActionPlan, ActionPlanForm, CoreObjectives, ObjectivesForm, OBJECTIVE_SLOTS};
pub use review::{JourneyReview, MidpointReview, ReviewForm};

use crate::contract::{ContractError, ContractRegistry};

/// Run `$body` with `$c` bound to the contract type of a standard-journey step
///
/// Expands to a `match` on the step id; `$fallback` runs for ids without a
/// standard contract. Every arm must produce the same type.
///
/// ```rust
/// use journey_forms::{with_standard_contract, FormContract};
/// use journey_registry::StepId;
///
/// fn contract_name(step: StepId) -> &'static str {
///     with_standard_contract!(step, |C| C::NAME, else "none")
/// }
///
/// assert_eq!(contract_name(StepId(12)), "core_objectives");
/// assert_eq!(contract_name(StepId(13)), "freeform");
/// assert_eq!(contract_name(StepId(5)), "none");
/// ```
#[macro_export]
macro_rules! with_standard_contract {
    ($step:expr, |$c:ident| $body:expr, else $fallback:expr) => {{
        #[allow(unused_imports)]
        use $crate::steps::*;
        match ($step).get() {
            1 => { type $c = Intentions; $body }
            2 => { type $c = LifeWheel; $body }
            3 => { type $c = CoreValues; $body }
            4 => { type $c = Vision; $body }
            6 => { type $c = PathChoice; $body }
            7 => { type $c = QuickStartGoals; $body }
            8 => { type $c = Freeform<8>; $body }
            9 => { type $c = Freeform<9>; $body }
            10 => { type $c = Freeform<10>; $body }
            11 => { type $c = Freeform<11>; $body }
            12 => { type $c = CoreObjectives; $body }
            13 => { type $c = Freeform<13>; $body }
            14 => { type $c = Freeform<14>; $body }
            17 => { type $c = Freeform<17>; $body }
            18 => { type $c = Freeform<18>; $body }
            19 => { type $c = DailyReflection; $body }
            20 => { type $c = ActionPlan; $body }
            21 => { type $c = Freeform<21>; $body }
            22 => { type $c = MidpointReview; $body }
            23 => { type $c = Freeform<23>; $body }
            24 => { type $c = Freeform<24>; $body }
            26 => { type $c = CheckIn; $body }
            27 => { type $c = Freeform<27>; $body }
            28 => { type $c = Freeform<28>; $body }
            30 => { type $c = JourneyReview; $body }
            _ => $fallback,
        }
    }};
}

/// Contract registry covering every step of the standard journey
///
/// # Errors
/// Only if two built-in contracts claim the same step.
pub fn standard_contracts() -> Result<ContractRegistry, ContractError> {
    let mut registry = ContractRegistry::new();

    registry.register::<Intentions>()?;
    registry.register::<LifeWheel>()?;
    registry.register::<CoreValues>()?;
    registry.register::<Vision>()?;
    registry.register::<PathChoice>()?;

    // Quick-start path
    registry.register::<QuickStartGoals>()?;
    registry.register::<Freeform<8>>()?;

    // Full-assessment path
    registry.register::<Freeform<9>>()?;
    registry.register::<Freeform<10>>()?;
    registry.register::<Freeform<11>>()?;

    registry.register::<CoreObjectives>()?;
    registry.register::<Freeform<13>>()?;
    registry.register::<Freeform<14>>()?;
    registry.register::<Freeform<17>>()?;
    registry.register::<Freeform<18>>()?;
    registry.register::<DailyReflection>()?;
    registry.register::<ActionPlan>()?;
    registry.register::<Freeform<21>>()?;
    registry.register::<MidpointReview>()?;
    registry.register::<Freeform<23>>()?;
    registry.register::<Freeform<24>>()?;
    registry.register::<CheckIn>()?;
    registry.register::<Freeform<27>>()?;
    registry.register::<Freeform<28>>()?;
    registry.register::<JourneyReview>()?;

    Ok(registry)
}
