//! Replay buffer interface.
//!
//! Episodes produced by an environment are stored into a replay buffer, which
//! later draws batches of transitions for training. Prioritized buffers also
//! take the losses of the last batch back to re-rank the drawn transitions.
use super::{Episode, Sample};
use anyhow::Result;

/// Interface of replay buffers storing episodes and sampling transitions.
///
/// # Type Parameters
///
/// * `S` - The type of states in stored transitions
pub trait ReplayBufferBase<S> {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Stores episodes, evicting old transitions beyond the capacity.
    ///
    /// # Arguments
    ///
    /// * `episodes` - Episodes to store, each one consumed as a whole
    fn store(&mut self, episodes: Vec<Episode<S>>) -> Result<()>;

    /// Samples `size` transitions, each with up to `nsteps` following transitions.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::EmptyBuffer`](crate::ReplayError::EmptyBuffer)
    /// if nothing has been stored.
    fn sample(&mut self, size: usize, nsteps: usize) -> Result<Vec<Sample<S>>>;

    /// The number of transitions in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no transition.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The maximum number of transitions kept in the buffer.
    fn capacity(&self) -> usize;
}

/// Replay buffers taking training losses back as priorities.
pub trait PriorityFeedback {
    /// Updates priorities of the transitions returned by the last `sample` call.
    ///
    /// # Arguments
    ///
    /// * `losses` - One loss per sampled transition, in batch order
    /// * `beta` - Exponent of importance sampling weights for subsequent batches
    fn step(&mut self, losses: &[f32], beta: f32) -> Result<()>;
}
