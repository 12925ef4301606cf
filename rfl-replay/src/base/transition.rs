//! Transitions, episodes and samples.

/// One `(state, action, reward)` step of an environment.
///
/// The state is opaque to this crate; it is only cloned into samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<S> {
    /// State from which the action was taken.
    pub state: S,

    /// Action.
    pub action: i64,

    /// Reward received for the action.
    pub reward: f32,
}

impl<S> Transition<S> {
    /// Constructs a [`Transition`].
    pub fn new(state: S, action: i64, reward: f32) -> Self {
        Self {
            state,
            action,
            reward,
        }
    }
}

/// Transitions of one environment run, in the order they occurred.
pub type Episode<S> = Vec<Transition<S>>;

/// A transition drawn from a replay buffer with the transitions following it.
///
/// Samples are copies and hold no reference into the buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample<S> {
    /// State.
    pub state: S,

    /// Action.
    pub action: i64,

    /// Reward.
    pub reward: f32,

    /// Up to `nsteps` transitions following this one in the same episode.
    pub afterwards: Vec<Transition<S>>,

    /// Normalized importance sampling weight, only for prioritized sampling.
    pub weight: Option<f32>,
}
