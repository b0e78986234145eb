//! Form field contracts
//!
//! A [`FormContract`] binds one step to its canonical in-memory state and the
//! pure functions converting between that state and the stored payload.

use journey_registry::{StepId, StepRegistry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::marker::PhantomData;

/// Per-step form contract
///
/// # Contract
/// - `normalize` is total: any stored payload, including `null`, empty
///   objects, legacy string-encoded fields and arrays of the wrong arity,
///   yields a fully populated `State`
/// - `serialize` output is what gets stored; `normalize(serialize(x)) == x`
///   is not required
///
/// # Example
/// ```rust
/// use journey_forms::{coerce, FormContract};
/// use journey_registry::StepId;
/// use serde_json::{json, Value};
///
/// #[derive(Debug)]
/// struct Gratitude;
///
/// impl FormContract for Gratitude {
///     type State = Vec<String>;
///     const STEP: StepId = StepId(40);
///     const NAME: &'static str = "gratitude";
///
///     fn initial() -> Self::State {
///         vec![String::new(); 3]
///     }
///
///     fn normalize(raw: &Value) -> Self::State {
///         coerce::fixed_list(coerce::field(&coerce::row(raw), "items"), 3)
///     }
///
///     fn serialize(state: &Self::State) -> Value {
///         json!({ "items": state })
///     }
/// }
///
/// assert_eq!(Gratitude::normalize(&Value::Null), Gratitude::initial());
/// ```
pub trait FormContract: Send + Sync + 'static + Debug {
    /// Canonical in-memory form state
    type State: Clone + PartialEq + Debug + Send + Sync + 'static;

    /// Step this contract belongs to
    const STEP: StepId;

    /// Stable contract name for diagnostics
    const NAME: &'static str;

    /// Blank state for a step without stored answers
    fn initial() -> Self::State;

    /// Stored payload to canonical state
    fn normalize(raw: &Value) -> Self::State;

    /// Canonical state to stored payload
    fn serialize(state: &Self::State) -> Value;
}

/// Type-erased contract view for registry-wide diagnostics
pub trait DynFormContract: Send + Sync {
    /// Step the contract belongs to
    fn step(&self) -> StepId;
    /// Contract name
    fn name(&self) -> &'static str;
    /// Serialized initial state
    fn initial_payload(&self) -> Value;
    /// Normalize then serialize a stored payload
    fn canonicalize(&self, raw: &Value) -> Value;

    /// Name qualified by step, e.g. `freeform@step-13`
    ///
    /// Shared contracts such as `Freeform` carry one name for many steps.
    fn label(&self) -> String {
        format!("{}@{}", self.name(), self.step())
    }
}

struct Erased<C>(PhantomData<fn() -> C>);

impl<C: FormContract> DynFormContract for Erased<C> {
    fn step(&self) -> StepId {
        C::STEP
    }

    fn name(&self) -> &'static str {
        C::NAME
    }

    fn initial_payload(&self) -> Value {
        C::serialize(&C::initial())
    }

    fn canonicalize(&self, raw: &Value) -> Value {
        C::serialize(&C::normalize(raw))
    }
}

/// Contract registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// Two contracts claim the same step
    #[error("{step} already has contract '{existing}'")]
    Duplicate {
        /// Contested step
        step: StepId,
        /// Contract registered first
        existing: &'static str,
    },
}

/// Contracts by step
#[derive(Default)]
pub struct ContractRegistry {
    contracts: BTreeMap<StepId, Box<dyn DynFormContract>>,
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<String> = self.contracts.values().map(|c| c.label()).collect();
        f.debug_struct("ContractRegistry")
            .field("contract_count", &self.contracts.len())
            .field("contracts", &labels)
            .finish()
    }
}

impl ContractRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the contract of `C::STEP`
    ///
    /// # Errors
    /// - `ContractError::Duplicate` if the step already has a contract
    pub fn register<C: FormContract>(&mut self) -> Result<(), ContractError> {
        if let Some(existing) = self.contracts.get(&C::STEP) {
            return Err(ContractError::Duplicate {
                step: C::STEP,
                existing: existing.name(),
            });
        }
        self.contracts.insert(C::STEP, Box::new(Erased::<C>(PhantomData)));
        Ok(())
    }

    /// Contract of a step
    #[must_use]
    pub fn get(&self, step: StepId) -> Option<&dyn DynFormContract> {
        self.contracts.get(&step).map(|c| &**c)
    }

    /// Steps with a contract, ascending
    #[must_use]
    pub fn steps(&self) -> Vec<StepId> {
        self.contracts.keys().copied().collect()
    }

    /// Number of contracts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether no contract is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Registered steps that have no contract
    #[must_use]
    pub fn uncovered(&self, registry: &StepRegistry) -> Vec<StepId> {
        registry
            .ids()
            .filter(|id| !self.contracts.contains_key(id))
            .collect()
    }

    /// Contracts whose step is not registered
    #[must_use]
    pub fn orphaned(&self, registry: &StepRegistry) -> Vec<StepId> {
        self.contracts
            .keys()
            .copied()
            .filter(|id| !registry.contains(*id))
            .collect()
    }
}
