//! Replay records and the episodes they point into.
use crate::{
    arena::{EpisodeArena, Uid},
    base::{Episode, Sample},
    error::ReplayError,
};
use log::trace;

/// Upper bound on the records preallocated when a buffer is built.
pub(crate) const MAX_PREALLOCATION: usize = 1 << 16;

/// Position of one transition within a stored episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReplayRecord {
    /// Unique within a buffer, never reused.
    pub id: u64,

    /// Uid of the episode in the arena.
    pub uid: Uid,

    /// Zero-based index of the transition in the episode.
    pub offset: usize,
}

/// Episodes shared by the records of a replay buffer.
pub(crate) struct EpisodeStore<S> {
    arena: EpisodeArena<Episode<S>>,
    next_id: u64,
}

impl<S> EpisodeStore<S> {
    pub fn new() -> Self {
        Self {
            arena: EpisodeArena::new(),
            next_id: 0,
        }
    }

    pub fn arena(&self) -> &EpisodeArena<Episode<S>> {
        &self.arena
    }

    /// Moves `episode` into the arena and returns one record per transition,
    /// last transition first.
    ///
    /// The episode is referenced once per returned record.
    pub fn add(&mut self, episode: Episode<S>) -> Vec<ReplayRecord> {
        let len = episode.len();
        if len == 0 {
            trace!("Skipped an empty episode");
            return vec![];
        }

        let uid = self.arena.insert(episode, len);
        let first_id = self.next_id;
        self.next_id += len as u64;
        (0..len)
            .rev()
            .enumerate()
            .map(|(j, offset)| ReplayRecord {
                id: first_id + j as u64,
                uid,
                offset,
            })
            .collect()
    }

    /// Drops the reference of an evicted record.
    pub fn release(&mut self, record: &ReplayRecord) -> Result<(), ReplayError> {
        self.arena.decrease_refs(record.uid, 1)?;
        Ok(())
    }
}

impl<S: Clone> EpisodeStore<S> {
    /// Copies the transition of `record` and up to `nsteps` transitions following it.
    pub fn sample(
        &self,
        record: &ReplayRecord,
        nsteps: usize,
        weight: Option<f32>,
    ) -> Result<Sample<S>, ReplayError> {
        let episode = self.arena.get(record.uid)?;
        let tr = episode
            .get(record.offset)
            .ok_or(ReplayError::NotFound(record.uid))?;
        let start = record.offset + 1;
        let end = start + nsteps.min(episode.len() - start);

        Ok(Sample {
            state: tr.state.clone(),
            action: tr.action,
            reward: tr.reward,
            afterwards: episode[start..end].to_vec(),
            weight,
        })
    }
}
