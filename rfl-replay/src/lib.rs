#![warn(missing_docs)]
//! Experience replay for reinforcement learning.
//!
//! Episodes produced by an environment are stored into a replay buffer, which
//! splits them into per-transition records sharing the episode through an
//! [`arena::EpisodeArena`]. Sampled transitions come with the transitions following
//! them in their episode, from which [`NStepReturn`] assembles n-step targets.
//! A [`PrioritizedReplayBuffer`] ranks records in a [`priority_index::PriorityIndex`]
//! and takes the losses of the last batch back as new priorities.
//!
//! ```rust
//! use rfl_replay::{
//!     NStepReturn, ReplayBufferBase, ReplayBufferConfig, Transition, UniformReplayBuffer,
//! };
//!
//! let mut buffer = UniformReplayBuffer::<u8>::build(&ReplayBufferConfig::default());
//! buffer
//!     .store(vec![vec![
//!         Transition::new(0, 0, 1.0),
//!         Transition::new(1, 1, 1.0),
//!         Transition::new(2, 0, 1.0),
//!     ]])
//!     .unwrap();
//!
//! let returns = NStepReturn::new(0.99, 2);
//! let batch = buffer.sample(8, returns.nsteps()).unwrap();
//! let targets = returns.targets(&batch, &mut |_state: &u8| 0f32);
//! assert_eq!(targets.len(), 8);
//! ```
pub mod arena;
pub mod error;
pub mod priority_index;
pub mod replay_buffer;

mod base;
pub use base::{Episode, PriorityFeedback, ReplayBufferBase, Sample, Transition};
pub use error::ReplayError;

mod returns;
pub use replay_buffer::{
    BetaScheduler, PrioritizedConfig, PrioritizedReplayBuffer, ReplayBuffer, ReplayBufferConfig,
    ReplayKind, SamplingMethod, UniformReplayBuffer,
};
pub use returns::{ActionValue, NStepReturn, StateValue};
