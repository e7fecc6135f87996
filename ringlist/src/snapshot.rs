//! Read-only view of a list's slot tables.
//!
//! The diagnostic collaborator consumes this instead of reaching into the
//! list: it can see every slot's links and payload, the free root, the
//! sticky error mask, and the creation provenance, but cannot mutate
//! anything. Chain walks are bounded by the slot count so a snapshot of a
//! corrupted list can still be rendered.

use crate::errors::ListErrors;
use crate::list::RingList;
use crate::site::CallSite;
use crate::slot::Slot;

/// Borrowed, read-only view of one [`RingList`].
#[derive(Clone, Copy)]
pub struct Snapshot<'a, T> {
    values: &'a [T],
    next: &'a [Slot],
    prev: &'a [Slot],
    free_head: Slot,
    errors: ListErrors,
    creation: CallSite,
}

impl<'a, T> Snapshot<'a, T> {
    pub(crate) fn new(list: &'a RingList<T>) -> Self {
        Self {
            values: &list.values,
            next: &list.next,
            prev: &list.prev,
            free_head: list.free_head,
            errors: list.errors,
            creation: list.creation,
        }
    }

    /// Total slot count, anchor included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.next.len()
    }

    /// Sticky error mask at snapshot time.
    #[inline]
    pub fn errors(&self) -> ListErrors {
        self.errors
    }

    /// Provenance captured when the list was created.
    #[inline]
    pub fn creation(&self) -> CallSite {
        self.creation
    }

    /// Raw head link: `next` of the anchor.
    #[inline]
    pub fn head(&self) -> Slot {
        self.next[0]
    }

    /// Raw tail link: `prev` of the anchor.
    #[inline]
    pub fn tail(&self) -> Slot {
        self.prev[0]
    }

    /// Root of the free chain, or `None` when the allocator is exhausted.
    #[inline]
    pub fn free_head(&self) -> Option<Slot> {
        if self.free_head.is_anchor() {
            None
        } else {
            Some(self.free_head)
        }
    }

    /// Payload stored at `slot`. Free slots expose their stale payload, the
    /// anchor an unused default; diagnostics render both deliberately.
    #[inline]
    pub fn value(&self, slot: Slot) -> &'a T {
        &self.values[slot.index()]
    }

    /// Forward link of `slot`.
    #[inline]
    pub fn next_of(&self, slot: Slot) -> Slot {
        self.next[slot.index()]
    }

    /// Backward link of `slot`, or `None` when the slot carries the free
    /// marker.
    #[inline]
    pub fn prev_of(&self, slot: Slot) -> Option<Slot> {
        let prev = self.prev[slot.index()];
        if prev.is_free_marker() { None } else { Some(prev) }
    }

    /// Returns `true` if `slot` currently sits on the free chain.
    #[inline]
    pub fn is_free(&self, slot: Slot) -> bool {
        self.prev[slot.index()].is_free_marker()
    }

    /// Every slot index in table order, anchor first.
    pub fn slots(&self) -> impl Iterator<Item = Slot> {
        (0..self.capacity()).map(Slot::from_usize)
    }

    /// Live slots in ring order.
    #[inline]
    pub fn ring(&self) -> ChainIter<'a> {
        ChainIter {
            next: self.next,
            cursor: self.next[0],
            remaining: self.capacity(),
        }
    }

    /// Free slots in chain order.
    #[inline]
    pub fn free_chain(&self) -> ChainIter<'a> {
        ChainIter {
            next: self.next,
            cursor: self.free_head,
            remaining: self.capacity(),
        }
    }
}

/// Walks a `next`-threaded chain until it returns to the anchor.
///
/// Bounded by the slot count: terminates on cyclic or out-of-range chains.
pub struct ChainIter<'a> {
    next: &'a [Slot],
    cursor: Slot,
    remaining: usize,
}

impl Iterator for ChainIter<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        if self.cursor.is_anchor() || self.remaining == 0 {
            return None;
        }
        let index = self.cursor.index();
        if index >= self.next.len() {
            return None;
        }

        let slot = self.cursor;
        self.cursor = self.next[index];
        self.remaining -= 1;
        Some(slot)
    }
}
