//! Journey Engine
//!
//! Form persistence and gating for guided journeys.
//!
//! # Core Concepts
//!
//! - [`Journey`]: facade bundling registry, stores and configuration
//! - [`FormEngine`]: per-step load / update / submit controller
//! - [`JourneyError`]: fatal, retryable and gating errors
//! - [`EngineConfig`]: gating, bootstrap, ledger cache and logging settings
//!
//! # Example
//!
//! ```rust
//! use journey_engine::prelude::*;
//! use journey_forms::steps::Intentions;
//! use journey_progress::{InMemoryFormStore, InMemoryLedger};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let journey = Journey::standard(
//!     Arc::new(InMemoryLedger::new()),
//!     Arc::new(InMemoryFormStore::new()),
//!     EngineConfig::default(),
//! )?;
//! let user = UserId::new("client-42");
//!
//! let mut engine = journey.open::<Intentions>(&user).await?;
//! engine.load().await?;
//! engine.update(|form| form.motivation = "more energy".into());
//! let outcome = engine.submit().await?;
//!
//! assert!(!outcome.unlocked.is_empty());
//! # Ok::<(), JourneyError>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod engine;
mod error;
mod journey;
pub mod telemetry;

pub use config::{EngineConfig, LedgerCacheConfig, LogConfig};
pub use engine::{FormEngine, SubmitOutcome};
pub use error::{JourneyError, JourneyResult, SaveStage};
pub use journey::Journey;

/// Common imports
pub mod prelude {
    pub use crate::{EngineConfig, FormEngine, Journey, JourneyError, SaveStage, SubmitOutcome};
    pub use journey_forms::FormContract;
    pub use journey_progress::{StepStatus, UserId};
    pub use journey_registry::StepId;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
