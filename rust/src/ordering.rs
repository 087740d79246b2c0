//! Positional task references.
//!
//! The boundary notation addresses tasks by their 1-based row in the
//! caller's displayed ordering; everything past the codec works on task ids.
//! `TaskOrdering` maps between the two, and the engine reuses its 0-based
//! slots as dense array indices.

use rustc_hash::FxHashMap;

/// Maps a 1-based positional reference to a task id.
pub trait ReferenceResolver {
    fn resolve(&self, position: usize) -> Option<&str>;

    /// Number of addressable positions.
    fn position_count(&self) -> usize;
}

/// Maps a task id back to its current 1-based positional reference.
pub trait ReferenceIndexer {
    fn position_of(&self, task_id: &str) -> Option<usize>;
}

/// Ordered table of task ids.
#[derive(Debug, Clone, Default)]
pub struct TaskOrdering {
    slots: FxHashMap<String, usize>,
    ids: Vec<String>,
}

impl TaskOrdering {
    /// Create an empty ordering with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Build an ordering from ids in display order.
    ///
    /// A repeated id keeps its first slot.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let iter = ids.into_iter();
        let mut ordering = Self::with_capacity(iter.size_hint().0);
        for id in iter {
            ordering.push(id.as_ref());
        }
        ordering
    }

    /// Append an id, returning its 0-based slot.
    /// If already present, returns the existing slot.
    pub fn push(&mut self, id: &str) -> usize {
        if let Some(&slot) = self.slots.get(id) {
            return slot;
        }
        let slot = self.ids.len();
        self.ids.push(id.to_string());
        self.slots.insert(id.to_string(), slot);
        slot
    }

    /// 0-based slot of an id.
    #[inline]
    pub fn slot(&self, id: &str) -> Option<usize> {
        self.slots.get(id).copied()
    }

    /// Id stored in a 0-based slot.
    #[inline]
    pub fn id(&self, slot: usize) -> Option<&str> {
        self.ids.get(slot).map(|s| s.as_str())
    }
}

impl ReferenceResolver for TaskOrdering {
    fn resolve(&self, position: usize) -> Option<&str> {
        position.checked_sub(1).and_then(|slot| self.id(slot))
    }

    fn position_count(&self) -> usize {
        self.ids.len()
    }
}

impl ReferenceIndexer for TaskOrdering {
    fn position_of(&self, task_id: &str) -> Option<usize> {
        self.slot(task_id).map(|slot| slot + 1)
    }
}
