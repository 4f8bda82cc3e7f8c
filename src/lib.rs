//! Feedback-control governor for runtime performance/power trade-offs.
//!
//! `perfgov` steers an application's runtime configuration so a measured
//! rate — iterations per second, or watts — meets a user-chosen goal at
//! minimum cost in the other dimension. Each control period it:
//!
//! - **Estimates** the intrinsic per-iteration workload from the noisy
//!   measurement with a scalar Kalman filter ([`WorkloadFilter`]);
//! - **Controls**: a fixed-form second-order controller turns the tracking
//!   error into the multiplier the system must deliver next
//!   ([`XupController`]);
//! - **Translates** that multiplier into a pair of discrete system
//!   configurations and a time split between them, picking the pair with
//!   the lowest secondary cost (idle configurations hybridize with a
//!   non-idle partner inside a single iteration).
//!
//! The governor only consumes measurements and a borrowed table of
//! [`ControlState`] entries, and requests transitions through an opaque
//! [`Actuator`]. Measurement, hardware actuation and configuration-file
//! handling belong to the host.
//!
//! # Example
//!
//! ```
//! use perfgov::prelude::*;
//!
//! struct Logger;
//!
//! impl Actuator for Logger {
//!     fn apply(&mut self, request: &ApplyRequest) {
//!         println!("switch to configuration {}", request.new_id);
//!     }
//! }
//!
//! # fn main() -> Result<(), GovernorError> {
//! let states = [
//!     ControlState::new(1.0, 1.0),
//!     ControlState::new(2.0, 2.1),
//! ];
//! let config = GovernorConfig::new(Constraint::Performance, 1.5, 20);
//! let mut governor = Governor::new(config, &states, Box::new(Logger))?;
//!
//! // Host loop: one call per application iteration.
//! for iteration in 0..100u64 {
//!     let (rate, watts) = (1.4, 8.0); // measured by the host
//!     governor.apply_control(iteration, rate, watts);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod controller;
pub mod engine;
pub mod error;
pub mod filter;
pub mod num;
pub mod plan;
pub mod prelude;
pub mod search;
pub mod state;
pub mod telemetry;
pub mod toggles;

pub use controller::{ControllerSnapshot, XupController};
pub use engine::{Actuator, ApplyRequest, Governor, GovernorConfig, Schedule};
pub use error::{GovernorError, GovernorResult};
pub use filter::{FilterSnapshot, WorkloadFilter};
pub use num::Real;
pub use plan::{divide_period, Plan};
pub use search::{find_best_pair, Selection};
pub use state::{Constraint, ControlState, StateTable, XupRange};
pub use telemetry::TelemetryConfig;
pub use toggles::{Toggles, ENV_DISABLE_APPLY, ENV_DISABLE_CONTROL, ENV_DISABLE_IDLE};
