//! Deterministic simulation harness for tpmkey sessions.
//!
//! This crate provides a seeded `Environment`, a turmoil `Transport`, and a
//! scenario runner that puts two parties (and optionally an intercepting
//! relay) on a simulated network.
//!
//! # Why Deterministic Simulation?
//!
//! A session is hundreds of lockstep rounds driven by random inputs and
//! random initial weights. With every random choice drawn from a seeded
//! stream and the network simulated:
//!
//! - **Perfect reproducibility**: Given the same seeds, get the same session,
//!   round for round
//! - **Fault injection**: Tamper with, drop, or inject records in transit
//! - **Fast execution**: Virtual time advances instantly
//!
//! # Example
//!
//! ```rust,ignore
//! use tpmkey_harness::Scenario;
//!
//! let outcome = Scenario::new().with_env_seeds(7, 8).run()?;
//! assert!(outcome.initiator?.ok);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod scenario;
mod sim_env;
mod sim_transport;

pub use scenario::{Direction, Interceptor, Scenario, ScenarioOutcome};
pub use sim_env::SimEnv;
pub use sim_transport::SimTransport;
