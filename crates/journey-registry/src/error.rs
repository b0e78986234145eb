//! Registry errors

use crate::step::StepId;

/// Errors raised while building or querying a [`crate::StepRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Step id not present in the registry
    #[error("step not found: {0}")]
    NotFound(StepId),

    /// Registry built with no steps
    #[error("registry has no steps")]
    Empty,

    /// Same id declared twice
    #[error("duplicate step id: {0}")]
    DuplicateStep(StepId),

    /// Predecessor points outside the registry
    #[error("{step} declares unknown predecessor {predecessor}")]
    MissingPredecessor {
        /// Declaring step
        step: StepId,
        /// Unknown predecessor
        predecessor: StepId,
    },

    /// Step declares itself as predecessor
    #[error("{0} declares itself as predecessor")]
    SelfPredecessor(StepId),

    /// First step of a branch group has no explicit predecessor
    #[error("branch group '{0}' has no entry step with an explicit predecessor")]
    BranchWithoutEntry(String),

    /// Two steps claim a single-row table
    #[error("table '{table}' is shared by {first} and {second} but not keyed by step")]
    TableConflict {
        /// Storage table
        table: String,
        /// First claimant
        first: StepId,
        /// Second claimant
        second: StepId,
    },

    /// Successor graph contains a cycle
    #[error("successor graph contains a cycle through {0}")]
    Cycle(StepId),

    /// Designated terminal step is not in the registry
    #[error("terminal step {0} is not registered")]
    UnknownTerminal(StepId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(RegistryError::NotFound(StepId(9)).to_string(), "step not found: step-9");

        let err = RegistryError::MissingPredecessor {
            step: StepId(3),
            predecessor: StepId(99),
        };
        assert!(err.to_string().contains("unknown predecessor step-99"));
    }
}
