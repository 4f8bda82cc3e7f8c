//! Kalman estimator for the application's base workload.
//!
//! The governor cannot observe the intrinsic cost of one iteration
//! directly; it only sees the measured rate under whatever multiplier was
//! last applied. A scalar Kalman filter tracks the base quantity (time per
//! iteration, or energy per iteration, under a unit multiplier) through
//! that noise. Two independent instances run at every period boundary so a
//! time workload and an energy workload are both available no matter which
//! constraint is active.

use crate::num::Real;

/// Process noise variance.
const PROCESS_NOISE: f64 = 1e-5;

/// Measurement noise variance. Must stay positive for numeric stability.
const MEASUREMENT_NOISE: f64 = 1e-2;

/// Initial posterior estimate of the base quantity.
const X_HAT_START: f64 = 0.2;

/// Initial posterior error covariance.
const P_START: f64 = 1.0;

/// Point-in-time copy of the filter scalars, recorded in telemetry rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSnapshot<R> {
    /// Prior estimate carried into the last update.
    pub x_hat_minus: R,
    /// Posterior estimate after the last update.
    pub x_hat: R,
    /// Prior error covariance.
    pub p_minus: R,
    /// Measurement gain (the multiplier applied when the sample was taken).
    pub h: R,
    /// Kalman gain.
    pub k: R,
    /// Posterior error covariance.
    pub p: R,
}

/// Scalar Kalman filter over one measurement stream.
#[derive(Debug, Clone)]
pub struct WorkloadFilter<R: Real = f64> {
    x_hat_minus: R,
    x_hat: R,
    p_minus: R,
    h: R,
    k: R,
    p: R,
}

impl<R: Real> Default for WorkloadFilter<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Real> WorkloadFilter<R> {
    /// Create a filter in its documented initial state.
    pub fn new() -> Self {
        Self {
            x_hat_minus: R::ZERO,
            x_hat: R::from_f64(X_HAT_START),
            p_minus: R::ZERO,
            h: R::ZERO,
            k: R::ZERO,
            p: R::from_f64(P_START),
        }
    }

    /// Fold one observation into the estimate and return the workload.
    ///
    /// `observed` is the measured rate for the elapsed period and
    /// `last_xup` the multiplier that was in force while it was measured.
    /// The measurement model is `observed ≈ last_xup · x_hat`; the returned
    /// workload is `1 / x_hat`, the per-iteration cost under a unit
    /// multiplier.
    pub fn estimate(&mut self, observed: R, last_xup: R) -> R {
        let q = R::from_f64(PROCESS_NOISE);
        let r = R::from_f64(MEASUREMENT_NOISE);

        self.x_hat_minus = self.x_hat;
        self.p_minus = self.p + q;

        self.h = last_xup;
        self.k = (self.p_minus * self.h) / (self.h * self.p_minus * self.h + r);
        self.x_hat = self.x_hat_minus + self.k * (observed - self.h * self.x_hat_minus);
        self.p = (R::ONE - self.k * self.h) * self.p_minus;

        R::ONE / self.x_hat
    }

    /// Current posterior estimate of the base quantity.
    #[inline]
    pub fn x_hat(&self) -> R {
        self.x_hat
    }

    /// Copy of all six scalars for telemetry.
    pub fn snapshot(&self) -> FilterSnapshot<R> {
        FilterSnapshot {
            x_hat_minus: self.x_hat_minus,
            x_hat: self.x_hat,
            p_minus: self.p_minus,
            h: self.h,
            k: self.k,
            p: self.p,
        }
    }
}
