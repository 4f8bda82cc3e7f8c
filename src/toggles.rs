//! Runtime kill switches.
//!
//! Three environment variables let an operator neuter parts of the control
//! loop without rebuilding the host. They are captured once into a
//! [`Toggles`] value at governor construction (hosts and tests can inject
//! any combination directly); the per-iteration path only reads the cached
//! copy.

use std::env;

/// Presence disables the control loop entirely: `apply_control` returns
/// immediately and no state changes.
pub const ENV_DISABLE_CONTROL: &str = "POET_DISABLE_CONTROL";

/// Presence suppresses the actuation callback while planning still runs.
pub const ENV_DISABLE_APPLY: &str = "POET_DISABLE_APPLY";

/// Presence excludes idle configurations from the pair search.
pub const ENV_DISABLE_IDLE: &str = "POET_DISABLE_IDLE";

/// Cached kill-switch states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggles {
    /// Skip the whole control step.
    pub disable_control: bool,
    /// Plan, but never invoke the actuator.
    pub disable_apply: bool,
    /// Never schedule an idle lower configuration.
    pub disable_idle: bool,
}

impl Toggles {
    /// Capture the current environment. Presence of a variable counts,
    /// regardless of its value.
    pub fn from_env() -> Self {
        Self {
            disable_control: env::var_os(ENV_DISABLE_CONTROL).is_some(),
            disable_apply: env::var_os(ENV_DISABLE_APPLY).is_some(),
            disable_idle: env::var_os(ENV_DISABLE_IDLE).is_some(),
        }
    }
}
