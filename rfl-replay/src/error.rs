//! Errors in the library.
use crate::arena::Uid;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayError {
    /// Sampling from a buffer without any record.
    #[error("Replay buffer is empty")]
    EmptyBuffer,

    /// Lookup of an arena uid which is not live.
    #[error("Episode uid not found: {0}")]
    NotFound(Uid),

    /// Unknown sampling method.
    #[error("Unsupported sampling method: {0}")]
    UnsupportedMethod(String),

    /// Priority which cannot be ordered.
    #[error("Invalid priority: {0}")]
    InvalidPriority(f32),

    /// Access beyond the end of the priority index.
    #[error("Index {index} out of range for priority index of length {len}")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,

        /// Length of the index.
        len: usize,
    },

    /// Number of losses differs from the size of the last sampled batch.
    #[error("Expected {expected} losses, got {actual}")]
    LengthMismatch {
        /// Size of the last sampled batch.
        expected: usize,

        /// Number of given losses.
        actual: usize,
    },
}
