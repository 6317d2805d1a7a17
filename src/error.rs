//! Error types for dispatch sessions

use thiserror::Error;

/// Errors reported synchronously when a dispatch session is constructed.
///
/// Once construction succeeds the ramp is total: pulling snapshots cannot
/// fail, and abandoning the sequence is not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// No worker nodes were supplied
    #[error("no worker nodes to dispatch users to")]
    EmptyWorkerSet,

    /// The target mix contains a negative count
    #[error("target count for user class {class} is negative ({count})")]
    InvalidTarget {
        /// Offending user class
        class: String,
        /// Count as supplied by the caller
        count: i64,
    },

    /// The spawn rate is not a positive finite number
    #[error("spawn rate must be positive and finite, got {0}")]
    InvalidSpawnRate(f64),
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;
