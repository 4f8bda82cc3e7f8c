//! Prelude module for common governor types.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the crate.

pub use crate::engine::{Actuator, ApplyRequest, Governor, GovernorConfig, Schedule};
pub use crate::error::{GovernorError, GovernorResult};
pub use crate::num::Real;
pub use crate::state::{Constraint, ControlState, StateTable, XupRange};
pub use crate::telemetry::TelemetryConfig;
pub use crate::toggles::Toggles;
