use std::vec;

use crate::id::GeneratedId;

/// Holds a batch of prefetched identifiers.
///
/// Values are handed out strictly front to back. The pool is not
/// synchronized; [`BatchSequenceGenerator`] only touches it while holding its
/// lock.
///
/// [`BatchSequenceGenerator`]: crate::BatchSequenceGenerator
#[derive(Debug)]
pub struct IdentifierPool {
    ids: vec::IntoIter<GeneratedId>,
}

impl IdentifierPool {
    /// An exhausted pool. Does not allocate.
    pub fn empty() -> Self {
        Self {
            ids: Vec::new().into_iter(),
        }
    }

    /// A pool serving `ids` in order.
    pub fn for_list(ids: Vec<GeneratedId>) -> Self {
        Self {
            ids: ids.into_iter(),
        }
    }

    /// Whether every identifier has been handed out.
    pub fn is_empty(&self) -> bool {
        self.ids.len() == 0
    }

    /// Number of identifiers not handed out yet.
    pub fn remaining(&self) -> usize {
        self.ids.len()
    }

    /// Removes and returns the next identifier.
    ///
    /// # Panics
    ///
    /// Panics if the pool is empty. Callers check [`Self::is_empty`] first.
    pub fn next(&mut self) -> GeneratedId {
        match self.ids.next() {
            Some(id) => id,
            None => panic!("next() called on an exhausted identifier pool"),
        }
    }

    /// Removes and returns the next identifier, or `None` if exhausted.
    pub fn try_next(&mut self) -> Option<GeneratedId> {
        self.ids.next()
    }
}

impl Default for IdentifierPool {
    fn default() -> Self {
        Self::empty()
    }
}
