//! Journey Form Contracts
//!
//! Typed per-step contracts converting between stored answer payloads and
//! the canonical state a step screen edits.
//!
//! # Core Concepts
//!
//! - [`FormContract`]: `initial`, `normalize` and `serialize` for one step,
//!   with the step id as an associated constant
//! - [`coerce`]: lenient field readers for legacy stored shapes
//! - [`ContractRegistry`]: type-erased view of all contracts for diagnostics
//! - [`steps`]: the contracts of the standard journey
//!
//! # Example
//!
//! ```rust
//! use journey_forms::steps::CoreObjectives;
//! use journey_forms::FormContract;
//! use serde_json::json;
//!
//! let state = CoreObjectives::normalize(&json!({ "objectives": "[\"a\",\"b\"]" }));
//! assert_eq!(state.objectives, vec!["a", "b", "", "", ""]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod coerce;
mod contract;
pub mod steps;

pub use contract::{ContractError, ContractRegistry, DynFormContract, FormContract};
pub use steps::standard_contracts;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
