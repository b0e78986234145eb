//! Journey Progress
//!
//! Per-user progress ledger, per-step form storage, gating and aggregation.
//!
//! # Core Concepts
//!
//! - [`ProgressRecord`]: one ledger row per (user, step), merged monotonically
//! - [`ProgressLedger`] / [`FormStore`]: async seams to the remote tables
//! - [`CachedLedger`]: moka-backed per-user snapshot cache
//! - [`GatingResolver`]: `locked | available | current | completed` per step
//! - [`JourneyProgress`]: percent complete and terminal-step completion

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod aggregate;
mod cache;
mod error;
mod forms;
mod gating;
mod ledger;
mod record;

pub use aggregate::{JourneyProgress, ProgressSummary};
pub use cache::{CacheStats, CachedLedger};
pub use error::StoreError;
pub use forms::{FormStore, InMemoryFormStore, StoredRow};
pub use gating::{GatingResolver, StepStatus};
pub use ledger::{InMemoryLedger, LedgerStats, ProgressLedger};
pub use record::{ProgressRecord, UserId};

/// Common imports
pub mod prelude {
    pub use crate::{
        FormStore, GatingResolver, JourneyProgress, ProgressLedger, ProgressRecord, StepStatus,
        StoreError, UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
