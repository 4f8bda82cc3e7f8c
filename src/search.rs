//! Pair search over the configuration table.
//!
//! Enumerates every admissible (upper, lower) pair, plans each one, and
//! keeps the cheapest schedule that realizes the target multiplier — or
//! the highest-performing one when the constraint is power. The search is
//! O(n²) over the table; tables are small and the per-pair planner is
//! constant-time, so no pruning is attempted.

use tracing::trace;

use crate::num::Real;
use crate::plan::{divide_period, Plan};
use crate::state::{Constraint, StateTable};

/// Sentinel seeding the cost minimization.
const COST_SENTINEL: f64 = 1e9;

/// Best admissible pair and its schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<R = f64> {
    /// Configuration run for the first `low_state_iters` iterations.
    pub lower_id: usize,
    /// Configuration run for the rest of the period.
    pub upper_id: usize,
    /// The planned split.
    pub plan: Plan<R>,
}

/// Search all pairs for the lowest-cost schedule meeting `target_xup`.
///
/// An upper candidate must reach the target and must not be idle; a lower
/// candidate must not exceed the target, and must additionally be non-idle
/// when `allow_idle` is false. Ties keep the first pair found in
/// enumeration order. Returns `None` when no pair qualifies: the caller
/// must leave the system untouched for the period.
pub fn find_best_pair<R: Real>(
    table: &StateTable<'_, R>,
    constraint: Constraint,
    target_xup: R,
    workload: R,
    period: u32,
    allow_idle: bool,
) -> Option<Selection<R>> {
    let mut best: Option<Selection<R>> = None;
    let mut best_cost = match constraint {
        Constraint::Performance => R::from_f64(COST_SENTINEL),
        Constraint::Power => R::ZERO,
    };

    for upper_id in 0..table.len() {
        let upper_xup = table.xup(upper_id, constraint);
        if upper_xup < target_xup || upper_xup < R::ONE {
            continue;
        }
        for lower_id in 0..table.len() {
            let lower_xup = table.xup(lower_id, constraint);
            if lower_xup > target_xup || (lower_xup < R::ONE && !allow_idle) {
                continue;
            }

            let plan = divide_period(
                table, constraint, lower_id, upper_id, target_xup, workload, period,
            );
            let is_best = match constraint {
                // Minimize the power cost of meeting the rate.
                Constraint::Performance => plan.cost_estimate < best_cost,
                // Maximize the performance delivered within the power cap.
                Constraint::Power => plan.cost_estimate > best_cost,
            };
            if is_best {
                trace!(
                    lower_id,
                    upper_id,
                    cost = plan.cost_estimate.to_f64(),
                    "new best pair"
                );
                best_cost = plan.cost_estimate;
                best = Some(Selection {
                    lower_id,
                    upper_id,
                    plan,
                });
            }
        }
    }

    best
}
