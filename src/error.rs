//! Error types for the sequencer.

/// Top-level error type for sequencer operations.
///
/// Every variant is non-fatal and recoverable: the operation that detects
/// it leaves the queue and timer untouched, so fluent call chains keep
/// working. The fluent surface reports these through `tracing` instead of
/// returning them; the `try_*` variants surface them directly.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// A registration or configuration argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `start` was called with nothing registered.
    #[error("cannot start an empty queue; register a task first")]
    EmptyQueue,
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SequencerError>;
