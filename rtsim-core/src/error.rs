use thiserror::Error;

/// Errors raised when a [`TaskSpec`](crate::TaskSpec) violates its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskSpecError {
    /// Task ids must be strictly positive.
    #[error("task id must be positive")]
    ZeroId,

    /// A timing parameter is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite {
        /// Name of the offending parameter.
        field: &'static str,
    },

    /// A timing parameter is below zero.
    #[error("{field} must not be negative (got {value})")]
    Negative {
        /// Name of the offending parameter.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The lower bound of an interval exceeds its upper bound.
    #[error("{field}: min {min} exceeds max {max}")]
    InvertedBounds {
        /// Name of the offending interval.
        field: &'static str,
        /// Declared lower bound.
        min: f64,
        /// Declared upper bound.
        max: f64,
    },

    /// The inter-arrival interval would release jobs back to back forever.
    #[error("max inter-arrival time must be positive")]
    ZeroPeriod,

    /// The deadline is zero or negative.
    #[error("deadline must be positive (got {0})")]
    NonPositiveDeadline(f64),
}

/// Error returned by [`uniform`](crate::uniform) for an unusable interval.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// The interval is inverted, negative or not finite.
    #[error("cannot sample from [{min}, {max}]")]
    InvalidInterval {
        /// Requested lower bound.
        min: f64,
        /// Requested upper bound.
        max: f64,
    },
}

/// Errors raised while delivering a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// The receiving side is gone.
    #[error("notification receiver disconnected")]
    Disconnected,
}
