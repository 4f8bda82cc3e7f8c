//! Property-based tests for the planning and control invariants.
//!
//! Uses proptest with 500 cases to verify the schedule bounds, the
//! idle-scheduling contract, and the controller clamp across randomized
//! configuration tables and measurement streams.

use std::cell::RefCell;
use std::rc::Rc;

use perfgov::prelude::*;
use perfgov::{find_best_pair, StateTable};
use proptest::collection::vec;
use proptest::prelude::*;

/// A valid configuration table: entry 0 is always non-idle so every idle
/// entry can name it as partner.
fn arb_entries() -> impl Strategy<Value = Vec<ControlState<f64>>> {
    let anchor = (1.0..4.0f64, 0.05..4.0f64);
    let rest = vec((0.0..4.0f64, 0.05..4.0f64), 0..7);
    (anchor, rest).prop_map(|((anchor_speedup, anchor_cost), rest)| {
        let mut entries = vec![ControlState::new(anchor_speedup, anchor_cost)];
        for (speedup, cost) in rest {
            if speedup < 1.0 {
                entries.push(ControlState::idle(speedup, cost, 0));
            } else {
                entries.push(ControlState::new(speedup, cost));
            }
        }
        entries
    })
}

#[derive(Default)]
struct Recorder {
    requests: Rc<RefCell<Vec<ApplyRequest>>>,
}

impl Actuator for Recorder {
    fn apply(&mut self, request: &ApplyRequest) {
        self.requests.borrow_mut().push(*request);
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(500))]

    /// Whatever pair the search selects, the schedule stays within the
    /// period and idle time only appears on an idle lower with exactly
    /// one scheduled iteration.
    #[test]
    fn prop_selected_schedule_respects_bounds(
        entries in arb_entries(),
        target in 0.011..5.0f64,
        workload in 0.01..10.0f64,
        period in 1..50u32,
        allow_idle: bool,
    ) {
        let table = StateTable::new(&entries).unwrap();
        if let Some(selection) =
            find_best_pair(&table, Constraint::Performance, target, workload, period, allow_idle)
        {
            let plan = selection.plan;
            prop_assert!(plan.low_state_iters <= period,
                "low_state_iters {} exceeds period {}", plan.low_state_iters, period);
            if plan.idle_ns > 0 {
                prop_assert!(entries[selection.lower_id].speedup < 1.0,
                    "idle time scheduled on non-idle lower {}", selection.lower_id);
                prop_assert_eq!(plan.low_state_iters, 1);
            }
            if !allow_idle {
                prop_assert!(entries[selection.lower_id].speedup >= 1.0);
            }
            // Admissibility of the chosen pair.
            prop_assert!(entries[selection.upper_id].speedup >= 1.0);
            prop_assert!(entries[selection.upper_id].speedup >= target);
            prop_assert!(entries[selection.lower_id].speedup <= target);
        }
    }

    /// The active controller's output stays inside the achievable range
    /// no matter what the measurement stream does.
    #[test]
    fn prop_speedup_stays_clamped(
        entries in arb_entries(),
        measurements in vec((0.01..20.0f64, 0.01..20.0f64), 1..80),
        goal in 0.1..5.0f64,
        period in 1..8u32,
    ) {
        let table = StateTable::new(&entries).unwrap();
        let range = table.speedup_range();

        let config = GovernorConfig::new(Constraint::Performance, goal, period)
            .with_toggles(Toggles::default());
        let mut governor =
            Governor::new(config, &entries, Box::<Recorder>::default()).unwrap();

        for (tag, (perf, power)) in measurements.into_iter().enumerate() {
            governor.apply_control(tag as u64, perf, power);
            let speedup = governor.current_speedup();
            prop_assert!(
                speedup >= range.min && speedup <= range.max,
                "speedup {} escaped [{}, {}]", speedup, range.min, range.max
            );
        }
    }

    /// With idling disabled, no dispatched configuration is ever idle.
    #[test]
    fn prop_disable_idle_never_dispatches_sleep_states(
        entries in arb_entries(),
        measurements in vec((0.01..20.0f64, 0.01..20.0f64), 1..60),
        goal in 0.1..5.0f64,
        period in 1..8u32,
    ) {
        let requests = Rc::new(RefCell::new(Vec::new()));
        let recorder = Recorder { requests: Rc::clone(&requests) };
        let toggles = Toggles { disable_idle: true, ..Default::default() };
        let config = GovernorConfig::new(Constraint::Performance, goal, period)
            .with_toggles(toggles);
        let mut governor = Governor::new(config, &entries, Box::new(recorder)).unwrap();

        for (tag, (perf, power)) in measurements.into_iter().enumerate() {
            governor.apply_control(tag as u64, perf, power);
            if let Some(lower_id) = governor.schedule().lower_id {
                prop_assert!(entries[lower_id].speedup >= 1.0);
            }
        }
        for request in requests.borrow().iter() {
            prop_assert!(entries[request.new_id].speedup >= 1.0,
                "dispatched idle configuration {}", request.new_id);
            prop_assert_eq!(request.idle_ns, 0);
        }
    }

    /// Dispatches never outnumber iterations, and a single period sees at
    /// most one low-to-high hand-off after its boundary dispatch.
    #[test]
    fn prop_dispatches_bounded_by_period(
        entries in arb_entries(),
        perfs in vec(0.01..20.0f64, 1..10),
        goal in 0.1..5.0f64,
        period in 1..8u32,
    ) {
        let requests = Rc::new(RefCell::new(Vec::new()));
        let recorder = Recorder { requests: Rc::clone(&requests) };
        let config = GovernorConfig::new(Constraint::Performance, goal, period)
            .with_toggles(Toggles::default());
        let mut governor = Governor::new(config, &entries, Box::new(recorder)).unwrap();

        let mut tag = 0u64;
        for perf in perfs {
            let before = requests.borrow().len();
            for _ in 0..period {
                governor.apply_control(tag, perf, 1.0);
                tag += 1;
            }
            let dispatched = requests.borrow().len() - before;
            prop_assert!(dispatched as u32 <= period);
            prop_assert!(dispatched <= 2,
                "one period dispatched {} times", dispatched);
        }
    }

    /// The planned iteration split prices the schedule consistently: the
    /// realized average multiplier in the unconstrained dimension lies
    /// within the table's cost span.
    #[test]
    fn prop_cost_multiplier_within_table_span(
        entries in arb_entries(),
        target in 0.011..5.0f64,
        workload in 0.01..10.0f64,
        period in 1..50u32,
    ) {
        // A partially idle lower (speedup strictly between 0 and 1) can
        // price its hybrid iteration outside the convex hull of the two
        // entries, so this span property is stated for pure-sleep idles.
        let entries: Vec<ControlState<f64>> = entries
            .into_iter()
            .map(|mut entry| {
                if entry.speedup < 1.0 {
                    entry.speedup = 0.0;
                }
                entry
            })
            .collect();
        let table = StateTable::new(&entries).unwrap();
        if let Some(selection) =
            find_best_pair(&table, Constraint::Performance, target, workload, period, true)
        {
            let lowest = entries
                .iter()
                .map(|entry| entry.cost)
                .fold(f64::INFINITY, f64::min);
            let highest = entries
                .iter()
                .map(|entry| entry.cost)
                .fold(f64::NEG_INFINITY, f64::max);
            let realized = selection.plan.cost_xup_estimate;
            prop_assert!(
                realized >= lowest - 1e-9 && realized <= highest + 1e-9,
                "realized cost multiplier {} outside [{}, {}]", realized, lowest, highest
            );
        }
    }
}
