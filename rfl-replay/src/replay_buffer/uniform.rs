//! Replay buffer with uniform sampling.
use super::{
    record::{EpisodeStore, ReplayRecord, MAX_PREALLOCATION},
    ReplayBufferConfig,
};
use crate::{
    arena::{EpisodeArena, Uid},
    base::{Episode, ReplayBufferBase, Sample},
    error::ReplayError,
};
use anyhow::Result;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;

/// Replay buffer drawing transitions uniformly at random, with replacement.
///
/// Transitions are kept in the order they were stored; once the buffer is over
/// its capacity the oldest ones are evicted first.
pub struct UniformReplayBuffer<S> {
    /// Maximum number of transitions that can be stored.
    capacity: usize,

    /// Records in insertion order, oldest at the front.
    memory: VecDeque<ReplayRecord>,

    /// Episodes referenced by the records.
    episodes: EpisodeStore<S>,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<S> UniformReplayBuffer<S> {
    fn trim(&mut self) -> Result<(), ReplayError> {
        let mut n_evicted = 0;
        while self.memory.len() > self.capacity {
            if let Some(record) = self.memory.pop_front() {
                self.episodes.release(&record)?;
                n_evicted += 1;
            }
        }
        if n_evicted > 0 {
            debug!("Evicted {} transitions", n_evicted);
        }
        Ok(())
    }

    /// The number of episodes referenced by the stored transitions.
    pub fn num_episodes(&self) -> usize {
        self.episodes.arena().len()
    }

    /// Episodes referenced by the stored transitions.
    pub fn arena(&self) -> &EpisodeArena<Episode<S>> {
        self.episodes.arena()
    }

    /// Iterates over `(episode uid, offset)` of stored transitions, oldest first.
    pub fn records(&self) -> impl Iterator<Item = (Uid, usize)> + '_ {
        self.memory.iter().map(|r| (r.uid, r.offset))
    }
}

impl<S: Clone> ReplayBufferBase<S> for UniformReplayBuffer<S> {
    type Config = ReplayBufferConfig;

    fn build(config: &Self::Config) -> Self {
        Self {
            capacity: config.capacity,
            memory: VecDeque::with_capacity(config.capacity.min(MAX_PREALLOCATION)),
            episodes: EpisodeStore::new(),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn store(&mut self, episodes: Vec<Episode<S>>) -> Result<()> {
        for episode in episodes {
            let records = self.episodes.add(episode);
            self.memory.extend(records);
        }
        self.trim()?;
        debug!(
            "Stored episodes, {} transitions in {} episodes",
            self.memory.len(),
            self.num_episodes()
        );
        Ok(())
    }

    fn sample(&mut self, size: usize, nsteps: usize) -> Result<Vec<Sample<S>>> {
        if self.memory.is_empty() {
            return Err(ReplayError::EmptyBuffer.into());
        }

        let len = self.memory.len();
        let ixs = (0..size)
            .map(|_| self.rng.gen_range(0..len))
            .collect::<Vec<_>>();
        let samples = ixs
            .iter()
            .map(|&ix| self.episodes.sample(&self.memory[ix], nsteps, None))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(samples)
    }

    fn len(&self) -> usize {
        self.memory.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Transition;

    /// Episode `e` of length `len`, with `(e, t)` as the state of step `t`.
    fn episode(e: usize, len: usize) -> Episode<(usize, usize)> {
        (0..len)
            .map(|t| Transition::new((e, t), t as i64, (e * 10 + t) as f32))
            .collect()
    }

    fn buffer(capacity: usize) -> UniformReplayBuffer<(usize, usize)> {
        UniformReplayBuffer::build(&ReplayBufferConfig::default().capacity(capacity))
    }

    #[test]
    fn test_sample_empty_buffer() {
        let mut buffer = buffer(4);
        let err = buffer.sample(1, 1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ReplayError>(),
            Some(&ReplayError::EmptyBuffer)
        );
    }

    #[test]
    fn test_evicts_oldest_first() -> Result<()> {
        let mut buffer = buffer(4);
        buffer.store(vec![episode(0, 3)])?;
        buffer.store(vec![episode(1, 2)])?;
        assert_eq!(buffer.len(), 4);

        // Records of an episode are stored last transition first.
        let records = buffer.records().collect::<Vec<_>>();
        let uid0 = records[0].0;
        let uid1 = records[3].0;
        assert_eq!(records, vec![(uid0, 1), (uid0, 0), (uid1, 1), (uid1, 0)]);
        assert_eq!(buffer.arena().refs(uid0)?, 2);
        assert_eq!(buffer.arena().refs(uid1)?, 2);
        Ok(())
    }

    #[test]
    fn test_frees_fully_evicted_episodes() -> Result<()> {
        let mut buffer = buffer(3);
        buffer.store(vec![episode(0, 2), episode(1, 3)])?;
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.num_episodes(), 1);
        for _ in 0..20 {
            for s in buffer.sample(4, 1)? {
                assert_eq!(s.state.0, 1);
            }
        }
        Ok(())
    }

    #[test]
    fn test_sample_with_replacement_and_afterwards() -> Result<()> {
        let mut buffer = buffer(100);
        buffer.store(vec![episode(0, 4)])?;
        let samples = buffer.sample(50, 2)?;
        assert_eq!(samples.len(), 50);
        for s in samples.iter() {
            let (e, t) = s.state;
            assert_eq!(s.reward, (e * 10 + t) as f32);
            assert_eq!(s.weight, None);
            assert_eq!(s.afterwards.len(), 2.min(3 - t));
            for (i, tr) in s.afterwards.iter().enumerate() {
                assert_eq!(tr.state, (e, t + i + 1));
            }
        }
        Ok(())
    }

    #[test]
    fn test_same_seed_same_samples() -> Result<()> {
        let mut b1 = buffer(10);
        let mut b2 = buffer(10);
        b1.store(vec![episode(0, 5), episode(1, 5)])?;
        b2.store(vec![episode(0, 5), episode(1, 5)])?;
        assert_eq!(b1.sample(16, 1)?, b2.sample(16, 1)?);
        Ok(())
    }
    #[test]
    fn test_unbounded_capacity_and_lookahead() -> Result<()> {
        let mut b = buffer(usize::MAX);
        b.store(vec![episode(0, 2)])?;
        for s in b.sample(4, usize::MAX)? {
            let (e, t) = s.state;
            let states = s.afterwards.iter().map(|tr| tr.state).collect::<Vec<_>>();
            assert_eq!(states, (t + 1..2).map(|t| (e, t)).collect::<Vec<_>>());
        }
        Ok(())
    }
}
