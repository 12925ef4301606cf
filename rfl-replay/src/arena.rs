//! Reference-counted arena of episodes.
//!
//! Every record of a replay buffer points into the episode it was cut from.
//! The arena keeps one copy of each episode together with the number of records
//! still pointing at it, and frees the slot when the last of them is gone.
//! Freed uids are recycled, the most recently freed one first, so the keyspace
//! stays as small as the number of live episodes.
use crate::error::ReplayError;
use log::trace;

/// Identifier of an element in [`EpisodeArena`].
pub type Uid = usize;

#[derive(Debug)]
struct ArenaEntry<T> {
    element: T,
    refs: usize,
}

/// Identity-stable, reference-counted store with uid recycling.
#[derive(Debug)]
pub struct EpisodeArena<T> {
    slots: Vec<Option<ArenaEntry<T>>>,
    free_uids: Vec<Uid>,
    n_live: usize,
}

impl<T> Default for EpisodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EpisodeArena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_uids: Vec::new(),
            n_live: 0,
        }
    }

    fn entry(&self, uid: Uid) -> Result<&ArenaEntry<T>, ReplayError> {
        self.slots
            .get(uid)
            .and_then(|slot| slot.as_ref())
            .ok_or(ReplayError::NotFound(uid))
    }

    fn entry_mut(&mut self, uid: Uid) -> Result<&mut ArenaEntry<T>, ReplayError> {
        self.slots
            .get_mut(uid)
            .and_then(|slot| slot.as_mut())
            .ok_or(ReplayError::NotFound(uid))
    }

    /// Stores `element` with `refs` initial references and returns its uid.
    pub fn insert(&mut self, element: T, refs: usize) -> Uid {
        let entry = Some(ArenaEntry { element, refs });
        self.n_live += 1;
        match self.free_uids.pop() {
            Some(uid) => {
                self.slots[uid] = entry;
                uid
            }
            None => {
                self.slots.push(entry);
                self.slots.len() - 1
            }
        }
    }

    /// Adds `n` references to the element at `uid`.
    pub fn increase_refs(&mut self, uid: Uid, n: usize) -> Result<(), ReplayError> {
        self.entry_mut(uid)?.refs += n;
        Ok(())
    }

    /// Removes `n` references from the element at `uid`.
    ///
    /// Returns `true` if no reference is left, in which case the element is dropped
    /// and `uid` becomes available to a later [`insert`](Self::insert).
    pub fn decrease_refs(&mut self, uid: Uid, n: usize) -> Result<bool, ReplayError> {
        let entry = self.entry_mut(uid)?;
        entry.refs = entry.refs.saturating_sub(n);
        if entry.refs > 0 {
            return Ok(false);
        }

        self.slots[uid] = None;
        self.free_uids.push(uid);
        self.n_live -= 1;
        trace!("Freed episode uid {}", uid);
        Ok(true)
    }

    /// Returns the element at `uid`.
    pub fn get(&self, uid: Uid) -> Result<&T, ReplayError> {
        Ok(&self.entry(uid)?.element)
    }

    /// Returns the reference count of the element at `uid`.
    pub fn refs(&self, uid: Uid) -> Result<usize, ReplayError> {
        Ok(self.entry(uid)?.refs)
    }

    /// Returns `true` if `uid` refers to a live element.
    pub fn contains(&self, uid: Uid) -> bool {
        self.entry(uid).is_ok()
    }

    /// The number of live elements.
    pub fn len(&self) -> usize {
        self.n_live
    }

    /// Returns `true` if the arena holds no element.
    pub fn is_empty(&self) -> bool {
        self.n_live == 0
    }

    /// Iterates over live elements with their uids.
    pub fn iter(&self) -> impl Iterator<Item = (Uid, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(uid, slot)| slot.as_ref().map(|e| (uid, &e.element)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_insert_assigns_fresh_uids() {
        let mut arena = EpisodeArena::new();
        assert_eq!(arena.insert("a", 1), 0);
        assert_eq!(arena.insert("b", 1), 1);
        assert_eq!(arena.insert("c", 1), 2);
        assert_eq!(arena.len(), 3);
        assert_eq!(*arena.get(1).unwrap(), "b");
    }

    #[test]
    fn test_refcount_frees_and_recycles() {
        let mut arena = EpisodeArena::new();
        let a = arena.insert("a", 2);
        let b = arena.insert("b", 1);

        assert!(!arena.decrease_refs(a, 1).unwrap());
        assert_eq!(arena.refs(a).unwrap(), 1);
        assert!(arena.decrease_refs(a, 1).unwrap());
        assert_eq!(arena.get(a), Err(ReplayError::NotFound(a)));
        assert_eq!(arena.len(), 1);

        // The freed uid is handed out again, the live one is not.
        let c = arena.insert("c", 1);
        assert_eq!(c, a);
        assert_ne!(c, b);
        assert_eq!(*arena.get(c).unwrap(), "c");
    }

    #[test]
    fn test_recycles_most_recently_freed_first() {
        let mut arena = EpisodeArena::new();
        let uids = (0..4).map(|i| arena.insert(i, 1)).collect::<Vec<_>>();
        arena.decrease_refs(uids[1], 1).unwrap();
        arena.decrease_refs(uids[3], 1).unwrap();

        assert_eq!(arena.insert(10, 1), uids[3]);
        assert_eq!(arena.insert(11, 1), uids[1]);
        assert_eq!(arena.insert(12, 1), 4);
    }

    #[test]
    fn test_increase_refs_and_over_decrease() {
        let mut arena = EpisodeArena::new();
        let a = arena.insert(vec![1, 2, 3], 1);
        arena.increase_refs(a, 2).unwrap();
        assert_eq!(arena.refs(a).unwrap(), 3);
        assert!(arena.decrease_refs(a, 5).unwrap());
        assert!(!arena.contains(a));
        assert!(arena.is_empty());
    }

    #[test]
    fn test_dangling_uid_is_not_found() {
        let mut arena = EpisodeArena::<u8>::new();
        assert_eq!(arena.get(7), Err(ReplayError::NotFound(7)));
        assert_eq!(arena.increase_refs(0, 1), Err(ReplayError::NotFound(0)));
        assert_eq!(arena.decrease_refs(0, 1), Err(ReplayError::NotFound(0)));
        assert_eq!(arena.iter().count(), 0);
    }
}
