//! Fixed-form controller producing the target multiplier.
//!
//! A second-order discrete controller turns the tracking error between the
//! measured rate and the goal into the multiplier ("xup") the system must
//! deliver next period: a speedup when holding a performance goal, a
//! powerup when holding a power goal. Pole and zero locations are fixed at
//! compile time; with the shipped deadbeat placement the closed form
//! reduces to `u = uo + workload · e`.

use crate::num::Real;
use crate::state::XupRange;

/// First pole location.
const P1: f64 = 0.0;

/// Second pole location.
const P2: f64 = 0.0;

/// Zero location.
const Z1: f64 = 0.0;

/// Robustness weight. One keeps the nominal response; lowering it trades
/// responsiveness for tolerance to model mismatch.
const MU: f64 = 1.0;

/// Point-in-time copy of the controller scalars, recorded in telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSnapshot<R> {
    /// Most recent multiplier output.
    pub u: R,
    /// Tracking error at the most recent update.
    pub e: R,
}

/// Second-order controller state for one dimension.
#[derive(Debug, Clone)]
pub struct XupController<R: Real = f64> {
    u: R,
    uo: R,
    uoo: R,
    e: R,
    eo: R,
    umin: R,
    umax: R,
}

impl<R: Real> XupController<R> {
    /// Create a controller whose history is warm-started at `initial_u`
    /// (the multiplier of the configuration in force at startup) and whose
    /// output is clamped to the achievable `range`.
    pub fn new(initial_u: R, range: XupRange<R>) -> Self {
        Self {
            u: initial_u,
            uo: initial_u,
            uoo: initial_u,
            e: R::ZERO,
            eo: R::ZERO,
            umin: range.min,
            umax: range.max,
        }
    }

    /// Compute the next target multiplier from the current measurement.
    ///
    /// `current_rate` and `desired_rate` are in the controlled dimension's
    /// units; `workload` is the matching base-workload estimate. The result
    /// is clamped to the achievable range before the history shifts.
    pub fn update(&mut self, current_rate: R, desired_rate: R, workload: R) -> R {
        let p1 = R::from_f64(P1);
        let p2 = R::from_f64(P2);
        let z1 = R::from_f64(Z1);
        let mu = R::from_f64(MU);
        let w = workload;

        let a = -(-(p1 * z1) - p2 * z1 + mu * p1 * p2 - mu * p2 + p2 - mu * p1 + p1 + mu);
        let b = -(-(mu * p1 * p2 * z1) + p1 * p2 * z1 + mu * p2 * z1 + mu * p1 * z1
            - mu * z1
            - p1 * p2);
        let c = ((mu - mu * p1) * p2 + mu * p1 - mu) * w;
        let d = ((mu * p1 - mu) * p2 - mu * p1 + mu) * w * z1;
        let f = R::ONE / (z1 - R::ONE);

        self.e = desired_rate - current_rate;
        self.u = f * (a * self.uo + b * self.uoo + c * self.e + d * self.eo);

        // Multipliers below the minimum have no effect; above the maximum
        // they are not achievable.
        if self.u < self.umin {
            self.u = self.umin;
        }
        if self.u > self.umax {
            self.u = self.umax;
        }

        self.uoo = self.uo;
        self.uo = self.u;
        self.eo = self.e;

        self.u
    }

    /// Overwrite the output history with an externally planned multiplier.
    ///
    /// Used at every planning boundary to keep the inactive dimension's
    /// controller warm with the multiplier the chosen schedule realizes in
    /// that dimension, so a constraint switch starts from continuous state
    /// rather than from cold history.
    pub fn seed(&mut self, planned_xup: R) {
        self.uoo = self.uo;
        self.u = planned_xup;
        self.uo = planned_xup;
        self.e = R::ZERO;
        self.eo = R::ZERO;
    }

    /// Most recent multiplier output.
    #[inline]
    pub fn target(&self) -> R {
        self.u
    }

    /// Lower clamp bound.
    #[inline]
    pub fn umin(&self) -> R {
        self.umin
    }

    /// Upper clamp bound.
    #[inline]
    pub fn umax(&self) -> R {
        self.umax
    }

    /// Copy of the reportable scalars for telemetry.
    pub fn snapshot(&self) -> ControllerSnapshot<R> {
        ControllerSnapshot {
            u: self.u,
            e: self.e,
        }
    }
}
