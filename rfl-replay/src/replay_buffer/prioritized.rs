//! Replay buffer with prioritized sampling.
use super::{
    record::{EpisodeStore, ReplayRecord, MAX_PREALLOCATION},
    PrioritizedConfig, ReplayBufferConfig, ReplayKind, SamplingMethod,
};
use crate::{
    arena::{EpisodeArena, Uid},
    base::{Episode, PriorityFeedback, ReplayBufferBase, Sample},
    error::ReplayError,
    priority_index::PriorityIndex,
};
use anyhow::Result;
use log::{debug, trace, warn};
use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    SeedableRng,
};
use std::collections::HashMap;

/// Floor added to priorities so that no stored transition has zero probability.
const EPSILON: f64 = 1e-3;

/// Priority of transitions stored into an empty buffer.
const INITIAL_PRIORITY: f32 = 1.0;

/// Replay buffer drawing transitions according to their priorities.
///
/// Transitions are kept in a [`PriorityIndex`] in ascending order of priority.
/// New transitions get the highest priority present in the buffer, so that
/// they are drawn at least as often as any transition already trained on.
/// Over capacity, the lowest-priority transitions are evicted.
///
/// The probability of drawing transition $i$ is $P(i) = q_i / \sum_j q_j$ with
///
/// * $q_i = (p_i + \epsilon)^\alpha$ for [`SamplingMethod::Proportional`],
/// * $q_i = (1 / r_i)^\alpha$ for [`SamplingMethod::Rank`], where $r_i$ is the
///   1-based position of $p_i$ in ascending order.
///
/// Each sample carries the importance weight $w_i = (N^{-1} P(i)^{-1})^\beta$,
/// with $N$ the batch size, normalized by the maximum weight in the batch.
pub struct PrioritizedReplayBuffer<S> {
    /// Maximum number of transitions that can be stored.
    capacity: usize,

    /// Records sorted by priority.
    index: PriorityIndex<ReplayRecord>,

    /// Episodes referenced by the records.
    episodes: EpisodeStore<S>,

    /// Random number generator for sampling.
    rng: StdRng,

    method: SamplingMethod,

    alpha: f32,

    beta: f32,

    /// Ids of the records in the last batch, with their priorities at that time.
    pending: Vec<(u64, f32)>,
}

impl<S> PrioritizedReplayBuffer<S> {
    /// Creates a buffer with the given capacity, seed and sampling parameters.
    pub fn new(capacity: usize, seed: u64, config: &PrioritizedConfig) -> Self {
        Self {
            capacity,
            index: PriorityIndex::with_capacity(capacity.min(MAX_PREALLOCATION)),
            episodes: EpisodeStore::new(),
            rng: StdRng::seed_from_u64(seed),
            method: config.method,
            alpha: config.alpha_or_default(),
            beta: config.beta_or_default(),
            pending: vec![],
        }
    }

    fn trim(&mut self) -> Result<(), ReplayError> {
        let excess = self.index.len().saturating_sub(self.capacity);
        if excess == 0 {
            return Ok(());
        }
        for (_, record) in self.index.drain_lowest(excess) {
            self.episodes.release(&record)?;
        }
        debug!("Evicted {} lowest-priority transitions", excess);
        Ok(())
    }

    fn record_at(&self, ix: usize) -> Result<(f32, &ReplayRecord), ReplayError> {
        self.index.get(ix).ok_or(ReplayError::IndexOutOfRange {
            index: ix,
            len: self.index.len(),
        })
    }

    /// Sampling probabilities of the stored transitions, in ascending order of priority.
    pub fn probabilities(&self) -> Vec<f64> {
        let alpha = self.alpha as f64;
        let qs = match self.method {
            SamplingMethod::Proportional => self
                .index
                .priorities()
                .map(|p| (p as f64 + EPSILON).powf(alpha))
                .collect::<Vec<_>>(),
            SamplingMethod::Rank => (1..=self.index.len())
                .map(|r| (1.0 / r as f64).powf(alpha))
                .collect::<Vec<_>>(),
        };
        let total: f64 = qs.iter().sum();
        qs.iter().map(|q| q / total).collect()
    }

    /// Sampling method.
    pub fn method(&self) -> SamplingMethod {
        self.method
    }

    /// Exponent for prioritization.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Current exponent of importance sampling weights.
    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// The highest priority in the buffer.
    pub fn max_priority(&self) -> Option<f32> {
        self.index.max_priority()
    }

    /// The number of episodes referenced by the stored transitions.
    pub fn num_episodes(&self) -> usize {
        self.episodes.arena().len()
    }

    /// Episodes referenced by the stored transitions.
    pub fn arena(&self) -> &EpisodeArena<Episode<S>> {
        self.episodes.arena()
    }

    /// Iterates over `(priority, episode uid, offset)` of stored transitions,
    /// in ascending order of priority.
    pub fn records(&self) -> impl Iterator<Item = (f32, Uid, usize)> + '_ {
        self.index.iter().map(|(p, r)| (p, r.uid, r.offset))
    }
}

impl<S: Clone> ReplayBufferBase<S> for PrioritizedReplayBuffer<S> {
    type Config = ReplayBufferConfig;

    fn build(config: &Self::Config) -> Self {
        match &config.kind {
            ReplayKind::Prioritized(per_config) => {
                Self::new(config.capacity, config.seed, per_config)
            }
            ReplayKind::Uniform => {
                warn!("Prioritized replay buffer built from a uniform config, using defaults");
                Self::new(config.capacity, config.seed, &PrioritizedConfig::default())
            }
        }
    }

    fn store(&mut self, episodes: Vec<Episode<S>>) -> Result<()> {
        let priority = self.index.max_priority().unwrap_or(INITIAL_PRIORITY);
        for episode in episodes {
            for record in self.episodes.add(episode) {
                self.index.insert(priority, record)?;
            }
        }
        self.trim()?;
        debug!(
            "Stored episodes with priority {}, {} transitions in {} episodes",
            priority,
            self.index.len(),
            self.num_episodes()
        );
        Ok(())
    }

    fn sample(&mut self, size: usize, nsteps: usize) -> Result<Vec<Sample<S>>> {
        if self.index.is_empty() {
            return Err(ReplayError::EmptyBuffer.into());
        }

        let probs = self.probabilities();
        let dist = WeightedIndex::new(&probs)?;
        let ixs = (0..size)
            .map(|_| dist.sample(&mut self.rng))
            .collect::<Vec<_>>();

        let beta = self.beta as f64;
        let ws = ixs
            .iter()
            .map(|&ix| (1.0 / (size as f64 * probs[ix])).powf(beta))
            .collect::<Vec<_>>();
        let w_max = ws.iter().cloned().fold(f64::MIN_POSITIVE, f64::max);

        let mut pending = Vec::with_capacity(size);
        let mut samples = Vec::with_capacity(size);
        for (&ix, w) in ixs.iter().zip(ws.iter()) {
            let (priority, record) = self.record_at(ix)?;
            let weight = (w / w_max) as f32;
            samples.push(self.episodes.sample(record, nsteps, Some(weight))?);
            pending.push((record.id, priority));
        }
        self.pending = pending;
        trace!("Sampled {} transitions with beta {}", size, self.beta);

        Ok(samples)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<S> PriorityFeedback for PrioritizedReplayBuffer<S> {
    fn step(&mut self, losses: &[f32], beta: f32) -> Result<()> {
        if losses.len() != self.pending.len() {
            return Err(ReplayError::LengthMismatch {
                expected: self.pending.len(),
                actual: losses.len(),
            }
            .into());
        }
        if let Some(&loss) = losses.iter().find(|l| !l.is_finite()) {
            return Err(ReplayError::InvalidPriority(loss).into());
        }

        let pending = std::mem::take(&mut self.pending);
        let mut current = pending.iter().cloned().collect::<HashMap<_, _>>();
        for (&(id, _), &loss) in pending.iter().zip(losses.iter()) {
            let priority = loss.abs();
            let old = match current.get(&id) {
                Some(&p) => p,
                None => continue,
            };
            match self.index.position_of(old, |r| r.id == id) {
                Some(ix) => {
                    let (_, &record) = self.record_at(ix)?;
                    self.index.update_at(ix, priority, record)?;
                    current.insert(id, priority);
                }
                None => trace!("Record {} was evicted before its priority update", id),
            }
        }
        self.beta = beta;
        Ok(())
    }
}
