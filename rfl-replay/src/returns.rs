//! n-step bootstrapped returns of sampled transitions.
//!
//! Given a [`Sample`] with `T` transitions in `afterwards` and a lookahead of
//! `n` steps, the target is
//!
//! $$
//! G = r + \sum_{i=0}^{m-1} \gamma^{i+1} r_i + [T = n]\ \gamma^n V(s_{n-1}),
//! $$
//!
//! where $r_i$ and $s_i$ are the reward and the state of `afterwards[i]`,
//! and $m = \min(T, n - 1)$. When the episode ends within the window (`T < n`)
//! the sum is the exact Monte Carlo tail and no value is bootstrapped.
//! Every remaining reward is included, the last one too: with `T = n - 1` the
//! target is `r` plus all of `afterwards`, not `afterwards` minus its last step.
use crate::base::Sample;

/// State-value function used for bootstrapping.
pub trait StateValue<S> {
    /// Value of `state`.
    fn value(&mut self, state: &S) -> f32;
}

impl<S, F> StateValue<S> for F
where
    F: FnMut(&S) -> f32,
{
    fn value(&mut self, state: &S) -> f32 {
        self(state)
    }
}

/// Action-value function used for bootstrapping.
pub trait ActionValue<S> {
    /// Actions which can be taken in `state`.
    fn legal_actions(&mut self, state: &S) -> Vec<i64>;

    /// Value of taking `action` in `state`.
    fn action_value(&mut self, state: &S, action: i64) -> f32;

    /// Maximum value over legal actions, `None` if no action can be taken.
    fn max_value(&mut self, state: &S) -> Option<f32> {
        self.legal_actions(state)
            .into_iter()
            .map(|a| self.action_value(state, a))
            .fold(None, |m: Option<f32>, v| Some(m.map_or(v, |m| m.max(v))))
    }
}

/// Assembles n-step returns.
#[derive(Clone, Debug, PartialEq)]
pub struct NStepReturn {
    gamma: f32,
    nsteps: usize,
}

impl NStepReturn {
    /// Creates an assembler with discount factor `gamma` and lookahead `nsteps`.
    ///
    /// `nsteps` should match the one given to
    /// [`ReplayBufferBase::sample`](crate::ReplayBufferBase::sample).
    pub fn new(gamma: f32, nsteps: usize) -> Self {
        Self { gamma, nsteps }
    }

    /// Discount factor.
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Lookahead.
    pub fn nsteps(&self) -> usize {
        self.nsteps
    }

    /// Discounted rewards and the state to bootstrap from, if any.
    fn partial<'a, S>(&self, sample: &'a Sample<S>) -> (f32, Option<&'a S>) {
        let t = sample.afterwards.len();
        let m = t.min(self.nsteps.saturating_sub(1));
        let g = sample.afterwards[..m]
            .iter()
            .zip(1..)
            .fold(sample.reward, |g, (tr, i)| {
                g + self.gamma.powi(i) * tr.reward
            });
        let last = match t == self.nsteps && t > 0 {
            true => sample.afterwards.last().map(|tr| &tr.state),
            false => None,
        };
        (g, last)
    }

    fn discount_n(&self) -> f32 {
        self.gamma.powi(self.nsteps as i32)
    }

    /// Target of a state-value learner.
    pub fn target<S, V>(&self, sample: &Sample<S>, value: &mut V) -> f32
    where
        V: StateValue<S>,
    {
        match self.partial(sample) {
            (g, Some(state)) => g + self.discount_n() * value.value(state),
            (g, None) => g,
        }
    }

    /// Target of an action-value learner, bootstrapping from the best legal action.
    pub fn action_target<S, Q>(&self, sample: &Sample<S>, q: &mut Q) -> f32
    where
        Q: ActionValue<S>,
    {
        match self.partial(sample) {
            (g, Some(state)) => match q.max_value(state) {
                Some(v) => g + self.discount_n() * v,
                None => g,
            },
            (g, None) => g,
        }
    }

    /// Targets of a batch for a state-value learner.
    pub fn targets<S, V>(&self, samples: &[Sample<S>], value: &mut V) -> Vec<f32>
    where
        V: StateValue<S>,
    {
        samples.iter().map(|s| self.target(s, value)).collect()
    }

    /// Targets of a batch for an action-value learner.
    pub fn action_targets<S, Q>(&self, samples: &[Sample<S>], q: &mut Q) -> Vec<f32>
    where
        Q: ActionValue<S>,
    {
        samples.iter().map(|s| self.action_target(s, q)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Transition;

    fn sample(reward: f32, afterwards: &[(&'static str, f32)]) -> Sample<&'static str> {
        Sample {
            state: "s",
            action: 0,
            reward,
            afterwards: afterwards
                .iter()
                .map(|&(s, r)| Transition::new(s, 0, r))
                .collect(),
            weight: None,
        }
    }

    fn value(state: &&'static str) -> f32 {
        match *state {
            "s2" => 5.0,
            _ => 100.0,
        }
    }

    #[test]
    fn test_bootstraps_full_window() {
        // Episode [(s0, 1), (s1, 1), (s2, 1)] at offset 0 with n = 2.
        let returns = NStepReturn::new(1.0, 2);
        let s = sample(1.0, &[("s1", 1.0), ("s2", 1.0)]);
        assert_eq!(returns.target(&s, &mut value), 7.0);
    }

    #[test]
    fn test_monte_carlo_tail() {
        let returns = NStepReturn::new(1.0, 2);
        assert_eq!(returns.target(&sample(1.0, &[]), &mut value), 1.0);
        assert_eq!(returns.target(&sample(1.0, &[("s2", 2.0)]), &mut value), 3.0);
    }

    #[test]
    fn test_discounting() {
        let returns = NStepReturn::new(0.5, 3);
        let s = sample(1.0, &[("a", 2.0), ("b", 4.0), ("s2", 8.0)]);
        // 1 + 0.5 * 2 + 0.25 * 4 + 0.125 * 5
        assert_eq!(returns.target(&s, &mut value), 3.625);

        let s = sample(1.0, &[("a", 2.0), ("b", 4.0)]);
        // 1 + 0.5 * 2 + 0.25 * 4
        assert_eq!(returns.target(&s, &mut value), 3.0);
    }

    #[test]
    fn test_zero_steps() {
        let returns = NStepReturn::new(0.9, 0);
        assert_eq!(returns.target(&sample(2.0, &[]), &mut value), 2.0);
    }

    struct Table;

    impl ActionValue<&'static str> for Table {
        fn legal_actions(&mut self, state: &&'static str) -> Vec<i64> {
            match *state {
                "terminal" => vec![],
                _ => vec![0, 1, 2],
            }
        }

        fn action_value(&mut self, _state: &&'static str, action: i64) -> f32 {
            [1.0, 4.0, -2.0][action as usize]
        }
    }

    #[test]
    fn test_action_target_uses_best_legal_action() {
        let returns = NStepReturn::new(1.0, 1);
        let s = sample(1.0, &[("s1", 10.0)]);
        assert_eq!(returns.action_target(&s, &mut Table), 5.0);

        let s = sample(1.0, &[("terminal", 10.0)]);
        assert_eq!(returns.action_target(&s, &mut Table), 1.0);
    }

    #[test]
    fn test_batch_targets() {
        let returns = NStepReturn::new(1.0, 2);
        let samples = vec![sample(1.0, &[("s1", 1.0), ("s2", 1.0)]), sample(1.0, &[])];
        let mut calls = 0;
        let mut counting = |s: &&'static str| {
            calls += 1;
            value(s)
        };
        assert_eq!(returns.targets(&samples, &mut counting), vec![7.0, 1.0]);
        assert_eq!(calls, 1);
    }
}
