//! Error types for governor construction.
//!
//! All validation happens when a [`Governor`](crate::Governor) is built;
//! the per-iteration control path is infallible by design and tolerates
//! measurement noise through filtering and clamping.

use thiserror::Error;

/// Errors reported while constructing a governor.
#[derive(Error, Debug)]
pub enum GovernorError {
    /// The performance or power goal was zero or negative.
    #[error("goal must be positive")]
    NonPositiveGoal,

    /// The control-state table was empty.
    #[error("state table must contain at least one entry")]
    EmptyStateTable,

    /// The control period was zero.
    #[error("period must be at least one iteration")]
    ZeroPeriod,

    /// An idle entry named a partner that is out of range or itself idle.
    #[error("state {state_id} idles but partner {partner_id} is not a valid non-idle state")]
    InvalidIdlePartner {
        /// Index of the offending idle entry.
        state_id: usize,
        /// The partner index it named.
        partner_id: usize,
    },

    /// A partner index pointed outside the table.
    #[error("state {state_id} names partner {partner_id}, but the table has {num_states} entries")]
    PartnerOutOfRange {
        /// Index of the offending entry.
        state_id: usize,
        /// The partner index it named.
        partner_id: usize,
        /// Number of entries in the table.
        num_states: usize,
    },

    /// Buffered telemetry was requested with a zero-slot buffer.
    #[error("telemetry buffer depth must be at least 1")]
    ZeroBufferDepth,

    /// The telemetry log file could not be created.
    #[error("failed to open telemetry log")]
    Io(#[from] std::io::Error),
}

/// Result alias for governor construction.
pub type GovernorResult<T> = Result<T, GovernorError>;
