//! Core types and interfaces.
mod replay_buffer;
mod transition;
pub use replay_buffer::{PriorityFeedback, ReplayBufferBase};
pub use transition::{Episode, Sample, Transition};
