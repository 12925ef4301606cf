//! Container of payloads kept in ascending order of priority.
use crate::error::ReplayError;

/// Sorted array of `(priority, payload)` pairs.
///
/// Positions are found by bisection; insertion and relocation shift the tail
/// of the array. For any two adjacent entries `priority[i] <= priority[i + 1]`.
/// Entries of equal priority keep insertion order on [`insert`](Self::insert),
/// which is not guaranteed across [`update_at`](Self::update_at).
#[derive(Debug, Clone)]
pub struct PriorityIndex<T> {
    entries: Vec<(f32, T)>,
}

impl<T> Default for PriorityIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityIndex<T> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an empty index with space for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn check_priority(priority: f32) -> Result<(), ReplayError> {
        match priority.is_nan() {
            true => Err(ReplayError::InvalidPriority(priority)),
            false => Ok(()),
        }
    }

    /// Rightmost position in `entries[lo..hi]` with all entries on its left
    /// not greater than `priority`.
    fn bisect(&self, priority: f32, lo: usize, hi: usize) -> usize {
        lo + self.entries[lo..hi].partition_point(|(p, _)| *p <= priority)
    }

    /// Inserts `payload` and returns its position.
    pub fn insert(&mut self, priority: f32, payload: T) -> Result<usize, ReplayError> {
        Self::check_priority(priority)?;
        let ix = self.bisect(priority, 0, self.entries.len());
        self.entries.insert(ix, (priority, payload));
        Ok(ix)
    }

    /// Replaces the entry at `index` and returns its new position.
    ///
    /// The entry is overwritten in place when its neighbours still bracket
    /// `priority`. Otherwise it is removed and re-inserted on the side it moved to.
    pub fn update_at(
        &mut self,
        index: usize,
        priority: f32,
        payload: T,
    ) -> Result<usize, ReplayError> {
        Self::check_priority(priority)?;
        let len = self.entries.len();
        if index >= len {
            return Err(ReplayError::IndexOutOfRange { index, len });
        }

        let fits_left = index == 0 || self.entries[index - 1].0 <= priority;
        let fits_right = index + 1 == len || priority <= self.entries[index + 1].0;
        if fits_left && fits_right {
            self.entries[index] = (priority, payload);
            return Ok(index);
        }

        self.entries.remove(index);
        let ix = if !fits_left {
            self.bisect(priority, 0, index)
        } else {
            self.bisect(priority, index, len - 1)
        };
        self.entries.insert(ix, (priority, payload));
        Ok(ix)
    }

    /// Finds the position of an entry with exactly `priority` whose payload
    /// satisfies `pred`.
    pub fn position_of<F>(&self, priority: f32, mut pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let lo = self.entries.partition_point(|(p, _)| *p < priority);
        let hi = self.entries.partition_point(|(p, _)| *p <= priority);
        (lo..hi).find(|&ix| pred(&self.entries[ix].1))
    }

    /// Removes and returns the `n` lowest-priority entries.
    pub fn drain_lowest(&mut self, n: usize) -> Vec<(f32, T)> {
        let n = n.min(self.entries.len());
        self.entries.drain(..n).collect()
    }

    /// Returns the entry at `index`.
    pub fn get(&self, index: usize) -> Option<(f32, &T)> {
        self.entries.get(index).map(|(p, t)| (*p, t))
    }

    /// Returns the priority at `index`.
    pub fn priority(&self, index: usize) -> Option<f32> {
        self.entries.get(index).map(|(p, _)| *p)
    }

    /// The highest priority in the index.
    pub fn max_priority(&self) -> Option<f32> {
        self.entries.last().map(|(p, _)| *p)
    }

    /// The lowest priority in the index.
    pub fn min_priority(&self) -> Option<f32> {
        self.entries.first().map(|(p, _)| *p)
    }

    /// Iterates over entries in ascending order of priority.
    pub fn iter(&self) -> impl Iterator<Item = (f32, &T)> + '_ {
        self.entries.iter().map(|(p, t)| (*p, t))
    }

    /// Iterates over priorities in ascending order.
    pub fn priorities(&self) -> impl Iterator<Item = f32> + '_ {
        self.entries.iter().map(|(p, _)| *p)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
