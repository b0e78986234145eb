//! Journey Simulator
//!
//! Seeded end-to-end runs of the standard journey over fault-injecting
//! stores. Used by the `journey-sim` binary and by CI to check that retries
//! converge and that completion, row and gating invariants hold under
//! failures.
//!
//! # Example
//!
//! ```rust,no_run
//! use journey_sim::{run_simulator, SimulatorConfig};
//!
//! # async fn demo() -> Result<(), journey_engine::JourneyError> {
//! let report = run_simulator(SimulatorConfig {
//!     users: 10,
//!     failure_rate: 0.2,
//!     ..SimulatorConfig::default()
//! })
//! .await?;
//! println!("{}", report.generate_text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod payload;
mod simulator;

pub use payload::random_payload;
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport, SimulatorStats, Violation};
