//! Time-division planner.
//!
//! Given a candidate pair of configurations and a target multiplier, the
//! planner splits the upcoming period between them so the combined
//! effective multiplier meets the target, and prices the split in the
//! unconstrained dimension. Two regimes exist:
//!
//! - **Non-idle lower** (`lower_xup >= 1`): the period is divided by
//!   iteration count. Solving `1/target = x/lower + (1-x)/upper` for the
//!   fraction `x` of iterations spent in the lower configuration gives the
//!   split; the iteration count truncates.
//! - **Idle lower** (`lower_xup < 1`): the lower configuration is a
//!   throttled mode the host realizes by sleeping. The first iteration of
//!   the period runs as a hybrid of the idle entry and its non-idle
//!   partner; the remaining `period - 1` iterations run in the upper
//!   configuration. The hybrid's sleep share converts to an integer
//!   nanosecond count through the workload estimate.
//!
//! The planner is a pure function; the pair search calls it once per
//! candidate pair.

use crate::num::Real;
use crate::state::{Constraint, StateTable};

/// Nanoseconds per second, for converting the hybrid iteration's idle
/// share into the sleep duration handed to the host.
const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Outcome of planning one candidate pair over one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan<R = f64> {
    /// Iterations to spend in the lower configuration (at most the period;
    /// exactly one when the lower configuration is idle).
    pub low_state_iters: u32,
    /// Nanoseconds the host must sleep during the first iteration. Nonzero
    /// only when the lower configuration is idle.
    pub idle_ns: u64,
    /// Realized total in the unconstrained dimension: the quantity the
    /// pair search minimizes (or maximizes under a power constraint).
    pub cost_estimate: R,
    /// Average multiplier the schedule realizes in the unconstrained
    /// dimension, used to warm the inactive controller.
    pub cost_xup_estimate: R,
}

/// Split `period` iterations between `lower_id` and `upper_id` so the
/// combined multiplier in the constrained dimension meets `target_xup`.
///
/// `workload` is the base-workload estimate in the constrained dimension's
/// units; it scales the hybrid iteration's idle share into wall-clock
/// sleep time.
pub fn divide_period<R: Real>(
    table: &StateTable<'_, R>,
    constraint: Constraint,
    lower_id: usize,
    upper_id: usize,
    target_xup: R,
    workload: R,
    period: u32,
) -> Plan<R> {
    let partner_id = table.get(lower_id).idle_partner_id;
    let lower_xup = table.xup(lower_id, constraint);
    let partner_xup = table.xup(partner_id, constraint);
    let upper_xup = table.xup(upper_id, constraint);
    let lower_cost = table.xup_cost(lower_id, constraint);
    let partner_cost = table.xup_cost(partner_id, constraint);
    let upper_cost = table.xup_cost(upper_id, constraint);

    let r_period = R::from_u32(period);

    if lower_xup < R::ONE {
        // Idle lower: one hybrid iteration plus (period - 1) upper
        // iterations must meet the target.
        //   period / target = 1 / hybrid + (period - 1) / upper
        let hybrid_xup = (target_xup * upper_xup)
            / (r_period * (upper_xup - target_xup) + target_xup);

        if hybrid_xup >= partner_xup {
            // One full iteration at partner speed already overshoots the
            // hybrid requirement; idling cannot help.
            Plan {
                low_state_iters: 0,
                idle_ns: 0,
                cost_estimate: (r_period / upper_xup) * upper_cost,
                cost_xup_estimate: upper_cost,
            }
        } else {
            // Share of the hybrid iteration spent in the idle entry.
            let (x, hybrid_cost) = if lower_xup <= R::ZERO {
                // Pure sleep: hybrid = (1 - x) * partner.
                let x = R::ONE - hybrid_xup / partner_xup;
                let hybrid_cost = x * lower_cost + (R::ONE - x) * partner_cost;
                (x, hybrid_cost)
            } else {
                // 1 / hybrid = x / lower + (1 - x) / partner.
                let x = (lower_xup * (hybrid_xup - partner_xup))
                    / (hybrid_xup * (lower_xup - partner_xup));
                let hybrid_cost =
                    (x / lower_xup) * lower_cost + ((R::ONE - x) / partner_xup) * partner_cost;
                (x, hybrid_cost)
            };

            let idle_sec = workload * (R::ONE / hybrid_xup - x / partner_xup);
            let idle_ns = (idle_sec * R::from_f64(NANOS_PER_SECOND)).trunc_u64();
            Plan {
                low_state_iters: 1,
                idle_ns,
                cost_estimate: (R::ONE / hybrid_xup) * hybrid_cost
                    + ((r_period - R::ONE) / upper_xup) * upper_cost,
                cost_xup_estimate: (hybrid_cost + (r_period - R::ONE) * upper_cost) / r_period,
            }
        }
    } else {
        // Non-idle lower: divide the period by iteration count. Equal
        // multipliers need no division at all.
        let low_state_iters = if upper_xup == lower_xup {
            0
        } else {
            // x is the fraction of iterations in the lower configuration,
            // from 1 / target = x / lower + (1 - x) / upper.
            let x = (upper_xup * lower_xup - target_xup * lower_xup)
                / (upper_xup * target_xup - target_xup * lower_xup);
            (r_period * x).trunc_u64() as u32
        };

        // Price the schedule with the truncated count actually run.
        let r_low = R::from_u32(low_state_iters);
        Plan {
            low_state_iters,
            idle_ns: 0,
            cost_estimate: (r_low / lower_xup) * lower_cost
                + ((r_period - r_low) / upper_xup) * upper_cost,
            cost_xup_estimate: (r_low * lower_cost + (r_period - r_low) * upper_cost) / r_period,
        }
    }
}
