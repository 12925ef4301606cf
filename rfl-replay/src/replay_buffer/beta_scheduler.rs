//! Scheduling the exponent of importance weight for prioritized replay.
use serde::{Deserialize, Serialize};

/// Linear schedule of the exponent of importance weight.
///
/// The value returned by [`beta`](Self::beta) is meant to be passed to
/// [`PriorityFeedback::step`](crate::PriorityFeedback::step) after each
/// optimization step.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct BetaScheduler {
    /// Initial value of $\beta$.
    pub beta_0: f32,

    /// Final value of $\beta$.
    pub beta_final: f32,

    /// Optimization steps when beta reaches its final value.
    pub n_steps_final: usize,
}

impl BetaScheduler {
    /// Creates a scheduler.
    pub fn new(beta_0: f32, beta_final: f32, n_steps_final: usize) -> Self {
        Self {
            beta_0,
            beta_final,
            n_steps_final,
        }
    }

    /// Gets the exponent of importance sampling weight at optimization step `n_steps`.
    pub fn beta(&self, n_steps: usize) -> f32 {
        if n_steps >= self.n_steps_final {
            self.beta_final
        } else {
            let d = self.beta_final - self.beta_0;
            self.beta_0 + d * (n_steps as f32 / self.n_steps_final as f32)
        }
    }
}
