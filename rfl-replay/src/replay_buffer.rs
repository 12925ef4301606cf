//! Replay buffers storing episodes and sampling transitions.
//!
//! # Key Components
//!
//! - [`UniformReplayBuffer`]: uniform sampling, oldest transitions evicted first
//! - [`PrioritizedReplayBuffer`]: sampling by priority with importance weights
//! - [`ReplayBuffer`]: either of the above, selected by [`ReplayBufferConfig`]
//! - [`BetaScheduler`]: linear schedule of the importance weight exponent
//!
//! # Examples
//!
//! ```rust
//! use rfl_replay::{
//!     PrioritizedConfig, PriorityFeedback, ReplayBuffer, ReplayBufferBase,
//!     ReplayBufferConfig, ReplayKind, Transition,
//! };
//!
//! let config = ReplayBufferConfig::default()
//!     .capacity(1000)
//!     .seed(42)
//!     .kind(ReplayKind::Prioritized(PrioritizedConfig::default()));
//! let mut buffer = ReplayBuffer::<Vec<f32>>::build(&config);
//!
//! let episode = (0..5)
//!     .map(|t| Transition::new(vec![t as f32], 0, 1.0))
//!     .collect::<Vec<_>>();
//! buffer.store(vec![episode]).unwrap();
//!
//! let batch = buffer.sample(4, 3).unwrap();
//! let losses = vec![0.5; batch.len()];
//! buffer.step(&losses, 0.5).unwrap();
//! ```
mod beta_scheduler;
mod config;
mod prioritized;
mod record;
mod uniform;
use crate::base::{Episode, PriorityFeedback, ReplayBufferBase, Sample};
use anyhow::Result;
pub use beta_scheduler::BetaScheduler;
pub use config::{PrioritizedConfig, ReplayBufferConfig, ReplayKind, SamplingMethod};
use log::warn;
pub use prioritized::PrioritizedReplayBuffer;
pub use uniform::UniformReplayBuffer;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Replay buffer with the selection policy chosen at runtime.
///
/// Data flows through the buffer as shown below:
///
/// ```mermaid
/// graph LR
///     A[Environment]-->|"Vec&lt;Episode&gt;"|B[ReplayBuffer::store]
///     B -->|episode, refs|C[EpisodeArena]
///     B -->|records|D[PriorityIndex / FIFO]
///     D -->|"Vec&lt;Sample&gt;"|E[Learner]
///     C -->|afterwards|E
///     E -->|losses|F[ReplayBuffer::step]
///     F -->|priorities|D
/// ```
///
/// [`PriorityFeedback::step`] logs a warning and ignores the losses for the
/// uniform variant.
pub enum ReplayBuffer<S> {
    /// Uniform sampling.
    Uniform(UniformReplayBuffer<S>),

    /// Prioritized sampling.
    Prioritized(PrioritizedReplayBuffer<S>),
}

impl<S: Clone> ReplayBufferBase<S> for ReplayBuffer<S> {
    type Config = ReplayBufferConfig;

    fn build(config: &Self::Config) -> Self {
        match &config.kind {
            ReplayKind::Uniform => Self::Uniform(UniformReplayBuffer::build(config)),
            ReplayKind::Prioritized(_) => {
                Self::Prioritized(PrioritizedReplayBuffer::build(config))
            }
        }
    }

    fn store(&mut self, episodes: Vec<Episode<S>>) -> Result<()> {
        match self {
            Self::Uniform(b) => b.store(episodes),
            Self::Prioritized(b) => b.store(episodes),
        }
    }

    fn sample(&mut self, size: usize, nsteps: usize) -> Result<Vec<Sample<S>>> {
        match self {
            Self::Uniform(b) => b.sample(size, nsteps),
            Self::Prioritized(b) => b.sample(size, nsteps),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Uniform(b) => b.len(),
            Self::Prioritized(b) => b.len(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Self::Uniform(b) => b.capacity(),
            Self::Prioritized(b) => b.capacity(),
        }
    }
}

impl<S> PriorityFeedback for ReplayBuffer<S> {
    fn step(&mut self, losses: &[f32], beta: f32) -> Result<()> {
        match self {
            Self::Uniform(_) => {
                warn!("Ignored {} losses in a uniform replay buffer", losses.len());
                Ok(())
            }
            Self::Prioritized(b) => b.step(losses, beta),
        }
    }
}

impl<S> ReplayBuffer<S> {
    /// The number of episodes referenced by the stored transitions.
    pub fn num_episodes(&self) -> usize {
        match self {
            Self::Uniform(b) => b.num_episodes(),
            Self::Prioritized(b) => b.num_episodes(),
        }
    }
}
