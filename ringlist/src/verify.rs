//! Structural invariant checker.
//!
//! One read-only pass over the slot tables producing a [`ListErrors`] mask.
//! The pass never mutates the list; sticky accumulation happens in
//! [`RingList::verify`](crate::RingList::verify).
//!
//! Checks, in order:
//! 1. capacity and backing-slice lengths agree (structural; any failure here
//!    stops the pass before the slices are touched),
//! 2. the anchor's head/tail links and the free-chain root are in range,
//! 3. the ring closes at the anchor and every `next` hop has a matching
//!    `prev` back-link,
//! 4. every free-chain member carries the free marker and the chain
//!    terminates at the anchor.
//!
//! All walks are bounded by the slot count, so a cyclic chain is reported
//! instead of looping.

use crate::errors::ListErrors;
use crate::list::RingList;
use crate::slot::Slot;

pub(crate) fn check<T>(list: &RingList<T>) -> ListErrors {
    let mut errors = ListErrors::empty();
    let capacity = list.capacity;

    if capacity < 2 {
        errors |= ListErrors::INVALID_CAPACITY;
    }
    if list.values.len() != capacity {
        errors |= ListErrors::VALUE_STORAGE;
    }
    if list.next.len() != capacity {
        errors |= ListErrors::NEXT_STORAGE;
    }
    if list.prev.len() != capacity {
        errors |= ListErrors::PREV_STORAGE;
    }
    if errors.intersects(ListErrors::STRUCTURAL) {
        return errors;
    }

    let in_range = |slot: Slot| slot.index() < capacity;

    if !in_range(list.next[0]) {
        errors |= ListErrors::INVALID_HEAD;
    }
    if !in_range(list.prev[0]) {
        errors |= ListErrors::INVALID_TAIL;
    }
    if !in_range(list.free_head) {
        errors |= ListErrors::FREE_CHAIN;
    }

    if !errors.contains(ListErrors::INVALID_HEAD) {
        errors |= check_ring(list);
    }
    if !errors.contains(ListErrors::FREE_CHAIN) {
        errors |= check_free_chain(list);
    }

    errors
}

/// Walks `next` from the anchor. The walk must return to the anchor within
/// `capacity` hops, every hop must stay in range, and each hop's `prev` must
/// point back at its predecessor.
fn check_ring<T>(list: &RingList<T>) -> ListErrors {
    let mut errors = ListErrors::empty();
    let mut cursor = Slot::ANCHOR;

    for _ in 0..list.capacity {
        let next = list.next[cursor.index()];
        if next.index() >= list.capacity {
            return errors | ListErrors::INVALID_HEAD;
        }
        if list.prev[next.index()] != cursor {
            errors |= ListErrors::INVALID_TAIL;
        }
        if next.is_anchor() {
            return errors;
        }
        cursor = next;
    }

    // Walked a full slot count without closing: the ring leaks into itself.
    errors | ListErrors::INVALID_HEAD
}

/// Walks `next` from the free root. Every member must carry the free marker
/// in `prev`, every hop must stay in range, and the chain must terminate at
/// the anchor within `capacity` hops (anything longer is a cycle).
fn check_free_chain<T>(list: &RingList<T>) -> ListErrors {
    let mut cursor = list.free_head;

    for _ in 0..list.capacity {
        if cursor.is_anchor() {
            return ListErrors::empty();
        }
        if cursor.index() >= list.capacity {
            return ListErrors::FREE_CHAIN;
        }
        if !list.prev[cursor.index()].is_free_marker() {
            return ListErrors::FREE_CHAIN;
        }
        cursor = list.next[cursor.index()];
    }

    ListErrors::FREE_CHAIN
}
