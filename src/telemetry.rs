//! Ring-buffered telemetry log.
//!
//! At every period boundary the engine records one row snapshotting the
//! whole pipeline: both filters, both controllers, both workload estimates
//! and the chosen schedule. Rows accumulate in a fixed-depth buffer and
//! are written to the log file in one batch when the buffer fills, keeping
//! file I/O out of the steady-state control path. A partially filled
//! buffer is flushed when the sink is dropped.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::controller::ControllerSnapshot;
use crate::filter::FilterSnapshot;
use crate::num::Real;
use crate::state::Constraint;

/// Where and how deeply to buffer telemetry.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log file, created (truncated) at governor construction.
    pub path: PathBuf,
    /// Rows buffered between batch writes. Must be at least one.
    pub buffer_depth: usize,
}

impl TelemetryConfig {
    /// Convenience constructor.
    pub fn new(path: impl Into<PathBuf>, buffer_depth: usize) -> Self {
        Self {
            path: path.into(),
            buffer_depth,
        }
    }
}

/// One period boundary's snapshot of the pipeline.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Record<R> {
    pub tag: u64,
    pub constraint: Constraint,
    pub act_rate: R,
    pub act_power: R,
    pub perf_filter: FilterSnapshot<R>,
    pub speedup: ControllerSnapshot<R>,
    pub cost_filter: FilterSnapshot<R>,
    pub powerup: ControllerSnapshot<R>,
    pub time_workload: R,
    pub energy_workload: R,
    /// Scheduled ids; -1 when no pair qualified.
    pub lower_id: i64,
    pub upper_id: i64,
    pub low_state_iters: u32,
    pub idle_ns: u64,
}

/// Buffered writer for telemetry rows.
pub(crate) struct TelemetrySink<R: Real> {
    writer: BufWriter<File>,
    ring: Vec<Record<R>>,
    depth: usize,
}

impl<R: Real> TelemetrySink<R> {
    /// Create the log file and write the header row.
    pub fn create(config: &TelemetryConfig) -> io::Result<Self> {
        let file = File::create(&config.path)?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer)?;
        writer.flush()?;
        Ok(Self {
            writer,
            ring: Vec::with_capacity(config.buffer_depth),
            depth: config.buffer_depth,
        })
    }

    /// Buffer one row; batch-write when the buffer reaches its depth.
    ///
    /// Write failures are reported through `tracing` and otherwise
    /// swallowed: telemetry must never fail the control path.
    pub fn record(&mut self, record: Record<R>) {
        self.ring.push(record);
        if self.ring.len() >= self.depth {
            if let Err(error) = self.flush_batch() {
                warn!(%error, "telemetry batch write failed");
            }
        }
    }

    fn flush_batch(&mut self) -> io::Result<()> {
        for record in &self.ring {
            write_row(&mut self.writer, record)?;
        }
        self.ring.clear();
        self.writer.flush()
    }
}

impl<R: Real> Drop for TelemetrySink<R> {
    fn drop(&mut self) {
        // Rows recorded since the last batch write have not hit the file.
        let pending = std::mem::take(&mut self.ring);
        for record in &pending {
            if write_row(&mut self.writer, record).is_err() {
                return;
            }
        }
        let _ = self.writer.flush();
    }
}

const HEADER: [&str; 26] = [
    "TAG",
    "CONSTRAINT",
    "ACTUAL_RATE",
    "P_X_HAT_MINUS",
    "P_X_HAT",
    "P_P_MINUS",
    "P_H",
    "P_K",
    "P_P",
    "P_SPEEDUP",
    "P_ERROR",
    "ACTUAL_POWER",
    "C_X_HAT_MINUS",
    "C_X_HAT",
    "C_P_MINUS",
    "C_H",
    "C_K",
    "C_P",
    "C_POWERUP",
    "C_ERROR",
    "TIME_WORKLOAD",
    "ENERGY_WORKLOAD",
    "LOWER_ID",
    "UPPER_ID",
    "LOW_STATE_ITERS",
    "IDLE_NS",
];

fn write_header(writer: &mut impl Write) -> io::Result<()> {
    for (i, column) in HEADER.iter().enumerate() {
        if i > 0 {
            write!(writer, " ")?;
        }
        write!(writer, "{column:>16}")?;
    }
    writeln!(writer)
}

fn write_row<R: Real>(writer: &mut impl Write, record: &Record<R>) -> io::Result<()> {
    write!(
        writer,
        "{:>16} {:>16}",
        record.tag,
        record.constraint.name()
    )?;
    let reals = [
        record.act_rate,
        record.perf_filter.x_hat_minus,
        record.perf_filter.x_hat,
        record.perf_filter.p_minus,
        record.perf_filter.h,
        record.perf_filter.k,
        record.perf_filter.p,
        record.speedup.u,
        record.speedup.e,
        record.act_power,
        record.cost_filter.x_hat_minus,
        record.cost_filter.x_hat,
        record.cost_filter.p_minus,
        record.cost_filter.h,
        record.cost_filter.k,
        record.cost_filter.p,
        record.powerup.u,
        record.powerup.e,
        record.time_workload,
        record.energy_workload,
    ];
    for value in reals {
        write!(writer, " {:>16.6}", value.to_f64())?;
    }
    writeln!(
        writer,
        " {:>16} {:>16} {:>16} {:>16}",
        record.lower_id, record.upper_id, record.low_state_iters, record.idle_ns
    )
}
