//! System configuration table.
//!
//! The host owns an immutable array of configurations it can switch the
//! system into; each entry carries the performance multiplier and the
//! secondary-cost multiplier it delivers relative to a baseline. The
//! governor borrows the table read-only for its lifetime and never changes
//! or frees it.

use serde::{Deserialize, Serialize};

use crate::error::GovernorError;
use crate::num::Real;

/// Dimension the governor holds to its goal.
///
/// The other dimension becomes the cost that the pair search minimizes
/// (or, under a power constraint, the performance it maximizes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    /// Track an iteration-rate goal; minimize the power cost.
    Performance,
    /// Track a power goal; maximize the delivered performance.
    Power,
}

impl Constraint {
    /// Name used in telemetry rows.
    pub fn name(self) -> &'static str {
        match self {
            Constraint::Performance => "PERFORMANCE",
            Constraint::Power => "POWER",
        }
    }
}

/// One system configuration the host can apply.
///
/// A `speedup` below one marks an idle configuration: the host realizes it
/// by sleeping, and the planner only ever schedules it as a hybrid with its
/// non-idle `idle_partner_id` on the first iteration of a period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlState<R = f64> {
    /// Performance multiplier relative to the baseline configuration.
    pub speedup: R,
    /// Secondary-dimension multiplier (power or energy).
    pub cost: R,
    /// Companion non-idle configuration used to hybridize an idle entry
    /// within a single iteration. Ignored for non-idle entries.
    #[serde(default)]
    pub idle_partner_id: usize,
}

impl<R: Real> ControlState<R> {
    /// Create a non-idle entry.
    pub fn new(speedup: R, cost: R) -> Self {
        Self {
            speedup,
            cost,
            idle_partner_id: 0,
        }
    }

    /// Create an idle entry with its hybridization partner.
    pub fn idle(speedup: R, cost: R, idle_partner_id: usize) -> Self {
        Self {
            speedup,
            cost,
            idle_partner_id,
        }
    }

    /// Whether the host realizes this entry by sleeping.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.speedup < R::ONE
    }
}

/// Achievable multiplier range in one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XupRange<R> {
    /// Smallest useful multiplier (floored at a small positive constant).
    pub min: R,
    /// Largest achievable multiplier.
    pub max: R,
}

/// Floor applied to the minimum achievable multiplier in either dimension.
const XUP_FLOOR: f64 = 0.01;

/// Validated, borrowed view of the host's configuration table.
///
/// Construction checks the idle-partner invariant (every idle entry must
/// name an in-range, non-idle partner) and derives the achievable
/// multiplier ranges for both dimensions.
#[derive(Debug, Clone, Copy)]
pub struct StateTable<'a, R: Real = f64> {
    entries: &'a [ControlState<R>],
    speedup_range: XupRange<R>,
    cost_range: XupRange<R>,
}

impl<'a, R: Real> StateTable<'a, R> {
    /// Validate the host's table and derive the multiplier ranges.
    ///
    /// # Errors
    ///
    /// - [`GovernorError::EmptyStateTable`] if the slice is empty.
    /// - [`GovernorError::PartnerOutOfRange`] if any entry names a partner
    ///   index outside the table.
    /// - [`GovernorError::InvalidIdlePartner`] if an idle entry's partner
    ///   is itself idle.
    pub fn new(entries: &'a [ControlState<R>]) -> Result<Self, GovernorError> {
        if entries.is_empty() {
            return Err(GovernorError::EmptyStateTable);
        }
        for (state_id, entry) in entries.iter().enumerate() {
            let partner_id = entry.idle_partner_id;
            if partner_id >= entries.len() {
                return Err(GovernorError::PartnerOutOfRange {
                    state_id,
                    partner_id,
                    num_states: entries.len(),
                });
            }
            if entry.is_idle() && entries[partner_id].is_idle() {
                return Err(GovernorError::InvalidIdlePartner {
                    state_id,
                    partner_id,
                });
            }
        }

        let floor = R::from_f64(XUP_FLOOR);
        let mut speedup_range = XupRange {
            min: R::ONE,
            max: R::ONE,
        };
        let mut cost_range = XupRange {
            min: R::ONE,
            max: R::ONE,
        };
        for entry in entries {
            if entry.speedup < speedup_range.min {
                speedup_range.min = if entry.speedup < floor {
                    floor
                } else {
                    entry.speedup
                };
            }
            if entry.speedup >= speedup_range.max {
                speedup_range.max = entry.speedup;
            }
            if entry.cost <= cost_range.min {
                cost_range.min = if entry.cost < floor { floor } else { entry.cost };
            }
            if entry.cost >= cost_range.max {
                cost_range.max = entry.cost;
            }
        }

        Ok(Self {
            entries,
            speedup_range,
            cost_range,
        })
    }

    /// Number of configurations.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty (never true after validation).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by configuration id.
    #[inline]
    pub fn get(&self, id: usize) -> &ControlState<R> {
        &self.entries[id]
    }

    /// Multiplier in the constrained dimension for `id`.
    #[inline]
    pub fn xup(&self, id: usize, constraint: Constraint) -> R {
        match constraint {
            Constraint::Performance => self.entries[id].speedup,
            Constraint::Power => self.entries[id].cost,
        }
    }

    /// Multiplier in the unconstrained (cost) dimension for `id`.
    #[inline]
    pub fn xup_cost(&self, id: usize, constraint: Constraint) -> R {
        match constraint {
            Constraint::Performance => self.entries[id].cost,
            Constraint::Power => self.entries[id].speedup,
        }
    }

    /// Achievable multiplier range in the constrained dimension.
    #[inline]
    pub fn range(&self, constraint: Constraint) -> XupRange<R> {
        match constraint {
            Constraint::Performance => self.speedup_range,
            Constraint::Power => self.cost_range,
        }
    }

    /// Achievable speedup range.
    #[inline]
    pub fn speedup_range(&self) -> XupRange<R> {
        self.speedup_range
    }

    /// Achievable cost-multiplier range.
    #[inline]
    pub fn cost_range(&self) -> XupRange<R> {
        self.cost_range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_rejected() {
        let entries: [ControlState<f64>; 0] = [];
        assert!(matches!(
            StateTable::new(&entries),
            Err(GovernorError::EmptyStateTable)
        ));
    }

    #[test]
    fn test_partner_out_of_range_rejected() {
        let entries = [ControlState::<f64>::idle(0.0, 0.1, 7)];
        assert!(matches!(
            StateTable::new(&entries),
            Err(GovernorError::PartnerOutOfRange {
                state_id: 0,
                partner_id: 7,
                num_states: 1
            })
        ));
    }

    #[test]
    fn test_idle_partner_must_not_idle() {
        let entries = [
            ControlState::<f64>::idle(0.0, 0.1, 1),
            ControlState::idle(0.5, 0.5, 0),
        ];
        assert!(matches!(
            StateTable::new(&entries),
            Err(GovernorError::InvalidIdlePartner {
                state_id: 0,
                partner_id: 1
            })
        ));
    }

    #[test]
    fn test_range_derivation() {
        let entries = [
            ControlState::<f64>::idle(0.0, 0.1, 1),
            ControlState::new(1.0, 1.0),
            ControlState::new(2.0, 2.5),
        ];
        let table = StateTable::new(&entries).unwrap();

        // An idle speedup of zero floors at the small positive constant.
        let s = table.speedup_range();
        assert!((s.min - 0.01).abs() < 1e-12);
        assert!((s.max - 2.0).abs() < 1e-12);

        let c = table.cost_range();
        assert!((c.min - 0.1).abs() < 1e-12);
        assert!((c.max - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_state_range_collapses_to_one() {
        let entries = [ControlState::<f64>::new(1.0, 1.0)];
        let table = StateTable::new(&entries).unwrap();
        assert_eq!(table.speedup_range().min, 1.0);
        assert_eq!(table.speedup_range().max, 1.0);
    }

    #[test]
    fn test_dimension_selection() {
        let entries = [ControlState::<f64>::new(2.0, 3.0)];
        let table = StateTable::new(&entries).unwrap();
        assert_eq!(table.xup(0, Constraint::Performance), 2.0);
        assert_eq!(table.xup(0, Constraint::Power), 3.0);
        assert_eq!(table.xup_cost(0, Constraint::Performance), 3.0);
        assert_eq!(table.xup_cost(0, Constraint::Power), 2.0);
    }
}
