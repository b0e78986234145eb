//! Error types for the journey engine
//!
//! - `NotFound`, `Registry` and `Config` are fatal: the caller is misconfigured
//! - `Load`, `LedgerRead` and `Save` are retryable; a failed submit keeps its
//!   draft and converges when retried
//! - `StepLocked` is a gating refusal, not a failure of the store

use journey_progress::StoreError;
use journey_registry::{RegistryError, StepId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Write of a submit that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStage {
    /// Writing the step's form row; nothing was advanced
    FormRecord,
    /// Marking the step completed in the ledger
    MarkCompleted,
    /// Making successor steps available
    UnlockSuccessors,
    /// Making the first step available to a new user; no submit involved
    Bootstrap,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FormRecord => "form record",
            Self::MarkCompleted => "mark completed",
            Self::UnlockSuccessors => "unlock successors",
            Self::Bootstrap => "bootstrap",
        })
    }
}

/// Main journey error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JourneyError {
    /// Unknown step id
    #[error("unknown step: {0}")]
    NotFound(StepId),

    /// Loading a step's stored answers failed
    #[error("failed to load {step}: {source}")]
    Load {
        /// Step being loaded
        step: StepId,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// Reading the user's progress ledger failed
    #[error("failed to read progress ledger: {0}")]
    LedgerRead(#[source] StoreError),

    /// A submit stopped at `stage`
    #[error("failed to save {step} at {stage}: {source}")]
    Save {
        /// Step being submitted
        step: StepId,
        /// Write that failed
        stage: SaveStage,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// Step not reachable for this user
    #[error("{0} is locked")]
    StepLocked(StepId),

    /// Registry construction failed
    #[error("registry error: {0}")]
    Registry(RegistryError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl JourneyError {
    /// Whether retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Load { .. } | Self::LedgerRead(_) | Self::Save { .. })
    }

    /// Whether the error is a misconfiguration no retry can fix
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Registry(_) | Self::Config(_))
    }

    /// Stage of a failed submit
    #[inline]
    #[must_use]
    pub fn save_stage(&self) -> Option<SaveStage> {
        match self {
            Self::Save { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Underlying store failure, if any
    #[must_use]
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Load { source, .. } | Self::Save { source, .. } | Self::LedgerRead(source) => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl From<RegistryError> for JourneyError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(step) => Self::NotFound(step),
            other => Self::Registry(other),
        }
    }
}

/// Result alias for journey operations
pub type JourneyResult<T> = Result<T, JourneyError>;
