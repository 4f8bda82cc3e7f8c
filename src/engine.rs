//! Control orchestrator.
//!
//! [`Governor`] ties the pipeline together. The host calls
//! [`Governor::apply_control`] once per application iteration with the
//! measured rate and power; on period boundaries the governor refreshes
//! both workload estimates, runs the active dimension's controller,
//! searches the configuration table for the cheapest schedule realizing
//! the new target, and warms the inactive controller with the schedule's
//! realized multiplier. Between boundaries it only re-evaluates which
//! scheduled configuration to dispatch through the host's [`Actuator`].

use tracing::{debug, trace};

use crate::controller::XupController;
use crate::error::{GovernorError, GovernorResult};
use crate::filter::WorkloadFilter;
use crate::num::Real;
use crate::search::find_best_pair;
use crate::state::{Constraint, ControlState, StateTable};
use crate::telemetry::{Record, TelemetryConfig, TelemetrySink};
use crate::toggles::Toggles;

/// One requested reconfiguration, handed to the host's actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyRequest {
    /// Number of entries in the configuration table.
    pub num_states: usize,
    /// Configuration to switch into.
    pub new_id: usize,
    /// Configuration the governor believes is currently in force.
    pub last_id: usize,
    /// Nanoseconds to sleep during the upcoming iteration. Nonzero only
    /// when an idle configuration is scheduled.
    pub idle_ns: u64,
    /// Set on the very first dispatch, when `last_id` is only an
    /// assumption about the host's state.
    pub is_first_apply: bool,
}

/// Host-side reconfiguration hooks.
///
/// The governor treats the actuator as opaque: `apply` is fire-and-forget
/// (its success is not checked) and must not block beyond the
/// reconfiguration itself.
pub trait Actuator {
    /// Reconfigure the system. If `request.idle_ns` is nonzero the host
    /// sleeps for that long before or during the next iteration.
    fn apply(&mut self, request: &ApplyRequest);

    /// Report the configuration currently in force, if known. Consulted
    /// once at construction; `None` (the default) falls back to the
    /// highest configuration id.
    fn current_state(&mut self, num_states: usize) -> Option<usize> {
        let _ = num_states;
        None
    }
}

/// Construction-time parameters.
#[derive(Debug, Clone)]
pub struct GovernorConfig<R = f64> {
    /// Dimension held to the goal.
    pub constraint: Constraint,
    /// Target rate (iterations/second) or power (watts). Must be positive.
    pub goal: R,
    /// Host iterations per planning cycle. Must be at least one.
    pub period: u32,
    /// Kill switches; defaults to a capture of the process environment.
    pub toggles: Toggles,
    /// Optional buffered telemetry log.
    pub telemetry: Option<TelemetryConfig>,
}

impl<R: Real> GovernorConfig<R> {
    /// Configuration with environment-captured toggles and no telemetry.
    pub fn new(constraint: Constraint, goal: R, period: u32) -> Self {
        Self {
            constraint,
            goal,
            period,
            toggles: Toggles::from_env(),
            telemetry: None,
        }
    }

    /// Replace the kill switches (tests inject these directly).
    pub fn with_toggles(mut self, toggles: Toggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Enable buffered telemetry.
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

/// Snapshot of the schedule most recently planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Configuration for the first `low_state_iters` iterations; `None`
    /// when no pair qualified.
    pub lower_id: Option<usize>,
    /// Configuration for the remainder of the period; `None` when no pair
    /// qualified, in which case nothing is dispatched.
    pub upper_id: Option<usize>,
    /// Iterations remaining in the lower configuration.
    pub low_state_iters: u32,
    /// Pending sleep for the hybrid iteration.
    pub idle_ns: u64,
}

/// Feedback-control engine steering the host toward its goal.
///
/// The configuration table is borrowed read-only for the governor's
/// lifetime; the host must not mutate it concurrently with calls. All
/// entry points run on the host's thread and perform no I/O outside
/// telemetry batch writes.
pub struct Governor<'t, R: Real = f64> {
    constraint: Constraint,
    goal: R,
    period: u32,
    toggles: Toggles,
    table: StateTable<'t, R>,
    actuator: Box<dyn Actuator>,

    perf_filter: WorkloadFilter<R>,
    cost_filter: WorkloadFilter<R>,
    speedup: XupController<R>,
    powerup: XupController<R>,

    current_action: u32,
    lower_id: Option<usize>,
    upper_id: Option<usize>,
    low_state_iters: u32,
    idle_ns: u64,
    cost_estimate: R,
    cost_xup_estimate: R,

    last_id: usize,
    is_first_apply: bool,

    telemetry: Option<TelemetrySink<R>>,
}

impl<'t, R: Real> Governor<'t, R> {
    /// Validate the configuration and build a governor over the host's
    /// table.
    ///
    /// The initial configuration id comes from the actuator's
    /// [`current_state`](Actuator::current_state) probe when it reports an
    /// in-range id, and defaults to the highest id otherwise. Both
    /// controllers warm-start at that configuration's multipliers.
    ///
    /// # Errors
    ///
    /// Any of the [`GovernorError`] configuration variants, or
    /// [`GovernorError::Io`] if the telemetry log cannot be created.
    pub fn new(
        config: GovernorConfig<R>,
        entries: &'t [ControlState<R>],
        mut actuator: Box<dyn Actuator>,
    ) -> GovernorResult<Self> {
        if config.goal <= R::ZERO {
            return Err(GovernorError::NonPositiveGoal);
        }
        if config.period == 0 {
            return Err(GovernorError::ZeroPeriod);
        }
        let table = StateTable::new(entries)?;

        let telemetry = match &config.telemetry {
            Some(telemetry_config) => {
                if telemetry_config.buffer_depth == 0 {
                    return Err(GovernorError::ZeroBufferDepth);
                }
                Some(TelemetrySink::create(telemetry_config)?)
            }
            None => None,
        };

        let last_id = actuator
            .current_state(table.len())
            .filter(|&id| id < table.len())
            .unwrap_or(table.len() - 1);

        let speedup = XupController::new(table.get(last_id).speedup, table.speedup_range());
        let powerup = XupController::new(table.get(last_id).cost, table.cost_range());

        Ok(Self {
            constraint: config.constraint,
            goal: config.goal,
            period: config.period,
            toggles: config.toggles,
            table,
            actuator,
            perf_filter: WorkloadFilter::new(),
            cost_filter: WorkloadFilter::new(),
            speedup,
            powerup,
            current_action: 0,
            lower_id: None,
            upper_id: None,
            low_state_iters: 0,
            idle_ns: 0,
            cost_estimate: R::ZERO,
            cost_xup_estimate: R::ZERO,
            last_id,
            is_first_apply: true,
            telemetry,
        })
    }

    /// Run one iteration of the control loop.
    ///
    /// `tag` identifies the host iteration (it becomes the telemetry row
    /// tag); `perf` is the measured iteration rate and `power` the
    /// measured power for the elapsed window. Never fails: pathological
    /// measurements produce a clamped multiplier, and a period with no
    /// admissible schedule dispatches nothing.
    pub fn apply_control(&mut self, tag: u64, perf: R, power: R) {
        if self.toggles.disable_control {
            return;
        }

        if self.current_action == 0 {
            self.plan_period(tag, perf, power);
        }

        let config_id = if self.low_state_iters > 0 {
            self.low_state_iters -= 1;
            self.lower_id
        } else {
            self.upper_id
        };

        if let Some(new_id) = config_id {
            if new_id != self.last_id || self.is_first_apply {
                if !self.toggles.disable_apply {
                    let request = ApplyRequest {
                        num_states: self.table.len(),
                        new_id,
                        last_id: self.last_id,
                        idle_ns: self.idle_ns,
                        is_first_apply: self.is_first_apply,
                    };
                    trace!(
                        new_id,
                        last_id = self.last_id,
                        idle_ns = self.idle_ns,
                        "dispatching configuration"
                    );
                    self.actuator.apply(&request);
                    self.is_first_apply = false;
                }
                self.last_id = new_id;
                // Idling happens at most once per period.
                self.idle_ns = 0;
            }
        }

        self.current_action = (self.current_action + 1) % self.period;
    }

    /// Full planning pass, run on period boundaries only.
    fn plan_period(&mut self, tag: u64, perf: R, power: R) {
        // Both estimates refresh every boundary so either constraint can
        // take over mid-run with current state.
        let time_workload = self.perf_filter.estimate(perf, self.speedup.target());
        let energy_workload = self.cost_filter.estimate(power, self.powerup.target());

        let (target_xup, workload) = match self.constraint {
            Constraint::Performance => (
                self.speedup.update(perf, self.goal, time_workload),
                time_workload,
            ),
            Constraint::Power => (
                self.powerup.update(power, self.goal, energy_workload),
                energy_workload,
            ),
        };

        match find_best_pair(
            &self.table,
            self.constraint,
            target_xup,
            workload,
            self.period,
            !self.toggles.disable_idle,
        ) {
            Some(selection) => {
                self.lower_id = Some(selection.lower_id);
                self.upper_id = Some(selection.upper_id);
                self.low_state_iters = selection.plan.low_state_iters;
                self.idle_ns = selection.plan.idle_ns;
                self.cost_estimate = selection.plan.cost_estimate;
                self.cost_xup_estimate = selection.plan.cost_xup_estimate;

                // Warm the inactive dimension's controller with the
                // multiplier this schedule realizes in that dimension, so
                // a constraint switch starts from continuous state.
                match self.constraint {
                    Constraint::Performance => self.powerup.seed(self.cost_xup_estimate),
                    Constraint::Power => self.speedup.seed(self.cost_xup_estimate),
                }

                debug!(
                    target_xup = target_xup.to_f64(),
                    lower_id = selection.lower_id,
                    upper_id = selection.upper_id,
                    low_state_iters = self.low_state_iters,
                    idle_ns = self.idle_ns,
                    "planned period"
                );
            }
            None => {
                // Contract: no qualifying pair means no dispatch this
                // period, not a fallback to the previous schedule. The
                // inactive controller keeps its last seeded value.
                self.lower_id = None;
                self.upper_id = None;
                self.low_state_iters = 0;
                self.idle_ns = 0;
                debug!(
                    target_xup = target_xup.to_f64(),
                    "no admissible configuration pair"
                );
            }
        }

        if self.telemetry.is_some() {
            let record = Record {
                tag,
                constraint: self.constraint,
                act_rate: perf,
                act_power: power,
                perf_filter: self.perf_filter.snapshot(),
                speedup: self.speedup.snapshot(),
                cost_filter: self.cost_filter.snapshot(),
                powerup: self.powerup.snapshot(),
                time_workload,
                energy_workload,
                lower_id: self.lower_id.map_or(-1, |id| id as i64),
                upper_id: self.upper_id.map_or(-1, |id| id as i64),
                low_state_iters: self.low_state_iters,
                idle_ns: self.idle_ns,
            };
            if let Some(sink) = self.telemetry.as_mut() {
                sink.record(record);
            }
        }
    }

    /// Retarget the governor at runtime.
    ///
    /// The newly active dimension's controller is already warm from the
    /// cross-seeding performed at every planning boundary.
    ///
    /// # Errors
    ///
    /// [`GovernorError::NonPositiveGoal`] if `goal` is not positive; the
    /// previous constraint and goal stay in force.
    pub fn set_constraint(&mut self, constraint: Constraint, goal: R) -> GovernorResult<()> {
        if goal <= R::ZERO {
            return Err(GovernorError::NonPositiveGoal);
        }
        self.constraint = constraint;
        self.goal = goal;
        Ok(())
    }

    /// Active constraint.
    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    /// Active goal.
    pub fn goal(&self) -> R {
        self.goal
    }

    /// Iterations per planning cycle.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Number of configurations in the borrowed table.
    pub fn num_states(&self) -> usize {
        self.table.len()
    }

    /// Current speedup multiplier (the performance controller's output).
    pub fn current_speedup(&self) -> R {
        self.speedup.target()
    }

    /// Current powerup multiplier (the power controller's output).
    pub fn current_powerup(&self) -> R {
        self.powerup.target()
    }

    /// Schedule from the most recent planning boundary.
    pub fn schedule(&self) -> Schedule {
        Schedule {
            lower_id: self.lower_id,
            upper_id: self.upper_id,
            low_state_iters: self.low_state_iters,
            idle_ns: self.idle_ns,
        }
    }

    /// Realized total in the unconstrained dimension for the current
    /// schedule.
    pub fn planned_cost(&self) -> R {
        self.cost_estimate
    }

    /// Average multiplier the current schedule realizes in the
    /// unconstrained dimension.
    pub fn planned_cost_xup(&self) -> R {
        self.cost_xup_estimate
    }

    /// Configuration id the governor last dispatched (or assumed at
    /// startup).
    pub fn last_applied(&self) -> usize {
        self.last_id
    }
}

impl<R: Real> std::fmt::Debug for Governor<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Governor")
            .field("constraint", &self.constraint)
            .field("goal", &self.goal)
            .field("period", &self.period)
            .field("num_states", &self.table.len())
            .field("schedule", &self.schedule())
            .field("last_id", &self.last_id)
            .finish_non_exhaustive()
    }
}
