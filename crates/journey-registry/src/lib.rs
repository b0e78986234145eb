//! Journey Step Registry
//!
//! Static, ordered and branching catalog of journey steps.
//!
//! # Core Concepts
//!
//! - [`StepDescriptor`]: immutable description of a step and its storage table
//! - [`PersistenceMode`]: single live row vs append-only history, per step
//! - [`StepRegistry`]: validated catalog answering `next`, `successors` and
//!   `steps_in_branch`
//! - [`catalog::standard_journey`]: the built-in journey
//!
//! # Example
//!
//! ```rust
//! use journey_registry::{StepDescriptor, StepId, StepRegistry};
//!
//! let registry = StepRegistry::builder()
//!     .step(StepDescriptor::new(StepId(1), "Intentions", "intentions"))
//!     .step(StepDescriptor::new(StepId(2), "Path", "paths"))
//!     .step(StepDescriptor::new(StepId(3), "Quick", "quick").after(StepId(2)).in_branch("quick"))
//!     .step(StepDescriptor::new(StepId(4), "Full", "full").after(StepId(2)).in_branch("full"))
//!     .step(StepDescriptor::new(StepId(5), "Objectives", "objectives"))
//!     .build()
//!     .unwrap();
//!
//! assert!(registry.is_gateway(StepId(2)));
//! assert_eq!(registry.next(StepId(3)).unwrap(), Some(StepId(5)));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
mod error;
mod registry;
mod step;

pub use catalog::{standard_descriptors, standard_journey};
pub use error::RegistryError;
pub use registry::{StepRegistry, StepRegistryBuilder, Successors};
pub use step::{PersistenceMode, StepDescriptor, StepId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
