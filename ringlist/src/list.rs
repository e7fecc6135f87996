//! Ring list over a fixed-capacity slot arena.
//!
//! Three parallel backing slices (`values`, `next`, `prev`) share one index
//! space. Slot 0 is the anchor: its `next`/`prev` links are the ring's head
//! and tail. Unused slots are threaded into a singly-linked free chain
//! through the same `next` slice, each marked by the free sentinel in `prev`.
//!
//! Every mutating operation runs through one verification guard: verify,
//! perform the index surgery, verify again. In debug builds a verification
//! failure hands a read-only [`Snapshot`] to an optional observer (the
//! diagnostic dump collaborator) before the operation aborts.
//!
//! # Example
//!
//! ```
//! use ringlist::{CallSite, RingList, Slot};
//!
//! let mut list: RingList<f64> = RingList::init(10, CallSite::here("example")).unwrap();
//!
//! let a = list.insert_after(Slot::ANCHOR, 5.0, CallSite::here("example")).unwrap();
//! let b = list.insert_after(a, 6.0, CallSite::here("example")).unwrap();
//!
//! assert_eq!(list.len(), 2);
//! assert_eq!(list.get(b), Some(&6.0));
//!
//! list.delete(a, CallSite::here("example")).unwrap();
//! assert_eq!(list.len(), 1);
//! ```

use crate::errors::ListErrors;
use crate::site::CallSite;
use crate::slot::Slot;
use crate::snapshot::Snapshot;
use crate::verify;

use core::fmt;

/// Absolute tolerance used by [`RingList::find_value_slow`].
pub const VALUE_EPS: f64 = 1e-6;

/// Observer invoked when verification fails inside a mutating operation.
///
/// Receives a read-only snapshot of the corrupted list and the provenance of
/// the failing call. Returns any additional error bits to accumulate (the
/// dump collaborator reports export trouble this way); return
/// [`ListErrors::empty`] otherwise.
pub type FailureHook<T> = Box<dyn FnMut(&Snapshot<'_, T>, CallSite) -> ListErrors>;

/// A doubly-linked ring of live slots plus a free chain of unused slots,
/// both stored in three parallel fixed-length slices.
///
/// Created by [`RingList::init`]; capacity is fixed for the list's lifetime.
/// See the [module docs](self) for the layout.
pub struct RingList<T> {
    pub(crate) values: Box<[T]>,
    pub(crate) next: Box<[Slot]>,
    pub(crate) prev: Box<[Slot]>,
    /// Total slot count, anchor included.
    pub(crate) capacity: usize,
    /// Head of the free chain; the anchor when exhausted.
    pub(crate) free_head: Slot,
    /// Live element count (anchor excluded).
    pub(crate) live: usize,
    pub(crate) errors: ListErrors,
    pub(crate) creation: CallSite,
    on_failure: Option<FailureHook<T>>,
}

fn alloc_slice<U: Default>(len: usize, failure: ListErrors) -> Result<Box<[U]>, ListErrors> {
    let mut buffer: Vec<U> = Vec::new();
    if buffer.try_reserve_exact(len).is_err() {
        return Err(failure);
    }
    buffer.extend(core::iter::repeat_with(U::default).take(len));
    Ok(buffer.into_boxed_slice())
}

impl<T: Default> RingList<T> {
    /// Creates a list with `capacity` usable slots (one extra is reserved for
    /// the anchor).
    ///
    /// The anchor starts as a self-loop (empty ring) and slots
    /// `1..=capacity` are threaded into the free chain in index order,
    /// terminating at the anchor. Verifies once before returning.
    ///
    /// # Errors
    ///
    /// `INVALID_CAPACITY` if `capacity` is zero or does not fit the index
    /// type; a storage bit if a backing slice cannot be allocated.
    pub fn init(capacity: usize, site: CallSite) -> Result<Self, ListErrors> {
        if capacity == 0 || capacity >= u32::MAX as usize {
            return Err(ListErrors::INVALID_CAPACITY);
        }
        let slots = capacity + 1;

        let values = alloc_slice::<T>(slots, ListErrors::VALUE_STORAGE)?;
        let next = alloc_slice::<Slot>(slots, ListErrors::NEXT_STORAGE)?;
        let prev = alloc_slice::<Slot>(slots, ListErrors::PREV_STORAGE)?;

        let mut list = Self {
            values,
            next,
            prev,
            capacity: slots,
            free_head: Slot::ANCHOR,
            live: 0,
            errors: ListErrors::empty(),
            creation: site,
            on_failure: None,
        };
        list.reset_links();

        let errors = list.verify();
        if !errors.is_clear() {
            return Err(errors);
        }
        Ok(list)
    }
}

impl<T> RingList<T> {
    /// Wires the anchor self-loop and threads every other slot into the free
    /// chain in index order.
    fn reset_links(&mut self) {
        self.next[0] = Slot::ANCHOR;
        self.prev[0] = Slot::ANCHOR;

        for index in 1..self.capacity {
            self.next[index] = if index + 1 == self.capacity {
                Slot::ANCHOR
            } else {
                Slot::from_usize(index + 1)
            };
            self.prev[index] = Slot::FREE;
        }

        self.free_head = Slot::from_usize(1);
        self.live = 0;
    }

    // ========================================================================
    // Mutating operations
    // ========================================================================

    /// Inserts `value` immediately after the live slot `after`, which may be
    /// [`Slot::ANCHOR`] to insert at the front of the ring.
    ///
    /// Pops the head of the free chain and splices it in with four link
    /// writes. O(1); no other element moves.
    ///
    /// # Errors
    ///
    /// `BAD_INDEX` if `after` is out of range or not live; `EXHAUSTED` if the
    /// free chain is empty; the accumulated mask if verification fails.
    pub fn insert_after(
        &mut self,
        after: Slot,
        value: T,
        site: CallSite,
    ) -> Result<Slot, ListErrors> {
        self.guarded(site, |list| {
            let at = after.index();
            if at >= list.capacity || list.prev[at].is_free_marker() {
                return Err(ListErrors::BAD_INDEX);
            }
            if list.free_head.is_anchor() {
                return Err(ListErrors::EXHAUSTED);
            }

            let new = list.free_head;
            list.free_head = list.next[new.index()];

            let succ = list.next[at];
            list.prev[succ.index()] = new;
            list.next[new.index()] = succ;
            list.next[at] = new;
            list.prev[new.index()] = after;
            list.values[new.index()] = value;
            list.live += 1;

            Ok(new)
        })
    }

    /// Unlinks the live slot `at` from the ring and pushes it onto the free
    /// chain. The payload stays in place until the slot is reused.
    ///
    /// # Errors
    ///
    /// `BAD_INDEX` if `at` is the anchor, out of range, or not live; the
    /// accumulated mask if verification fails.
    pub fn delete(&mut self, at: Slot, site: CallSite) -> Result<(), ListErrors> {
        self.guarded(site, |list| {
            let index = at.index();
            if index == 0 || index >= list.capacity || list.prev[index].is_free_marker() {
                return Err(ListErrors::BAD_INDEX);
            }

            let succ = list.next[index];
            let pred = list.prev[index];
            list.prev[succ.index()] = pred;
            list.next[pred.index()] = succ;

            list.next[index] = list.free_head;
            list.prev[index] = Slot::FREE;
            list.free_head = at;
            list.live -= 1;

            Ok(())
        })
    }

    /// Empties the ring and rebuilds the free chain without releasing
    /// storage. Payloads stay in place until their slots are reused.
    /// Accumulated errors are sticky and survive a clear.
    pub fn clear(&mut self) {
        self.reset_links();
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if the ring holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of usable slots (anchor excluded). Fixed for the lifetime of
    /// the list.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity - 1
    }

    /// Number of slots currently on the free chain.
    #[inline]
    pub fn free_len(&self) -> usize {
        self.capacity - 1 - self.live
    }

    /// Returns the value stored at `slot`, if that slot is live.
    #[inline]
    pub fn get(&self, slot: Slot) -> Option<&T> {
        let index = slot.index();
        if index == 0 || index >= self.capacity || self.prev[index].is_free_marker() {
            return None;
        }
        Some(&self.values[index])
    }

    /// First live slot of the ring, or `None` if empty.
    #[inline]
    pub fn front(&self) -> Option<Slot> {
        let head = self.next[0];
        if head.is_anchor() { None } else { Some(head) }
    }

    /// Last live slot of the ring, or `None` if empty.
    #[inline]
    pub fn back(&self) -> Option<Slot> {
        let tail = self.prev[0];
        if tail.is_anchor() { None } else { Some(tail) }
    }

    /// Iterates the ring in order, yielding `(slot, &value)`.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: &self.next,
            values: &self.values,
            cursor: self.next[0],
            remaining: self.capacity,
        }
    }

    /// Returns the first live slot whose value matches `pred`, scanning the
    /// ring in order. O(n).
    pub fn position(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Slot> {
        self.iter().find(|(_, value)| pred(value)).map(|(slot, _)| slot)
    }

    /// Sticky error mask accumulated by the verifier.
    #[inline]
    pub fn errors(&self) -> ListErrors {
        self.errors
    }

    /// Provenance captured at `init`.
    #[inline]
    pub fn creation_site(&self) -> CallSite {
        self.creation
    }

    /// Read-only view of the slot tables for diagnostic consumers.
    #[inline]
    pub fn snapshot(&self) -> Snapshot<'_, T> {
        Snapshot::new(self)
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Runs the invariant checker and ORs the result into the sticky error
    /// mask. Returns the accumulated mask.
    pub fn verify(&mut self) -> ListErrors {
        self.errors |= verify::check(self);
        self.errors
    }

    /// Installs the observer invoked (in debug builds) when verification
    /// fails inside a mutating operation. Replaces any previous observer.
    pub fn on_verify_failure(&mut self, hook: FailureHook<T>) {
        self.on_failure = Some(hook);
    }

    /// Verify-or-abort wrapper around every mutating operation's body.
    /// Verification runs before and after the body; either failure aborts
    /// the call. Disabled outside debug builds.
    fn guarded<R>(
        &mut self,
        site: CallSite,
        body: impl FnOnce(&mut Self) -> Result<R, ListErrors>,
    ) -> Result<R, ListErrors> {
        self.verify_or_report(site)?;
        let out = body(self)?;
        self.verify_or_report(site)?;
        Ok(out)
    }

    fn verify_or_report(&mut self, site: CallSite) -> Result<(), ListErrors> {
        if !cfg!(debug_assertions) {
            return Ok(());
        }
        let errors = self.verify();
        if errors.is_clear() {
            return Ok(());
        }
        if let Some(mut hook) = self.on_failure.take() {
            let reported = hook(&self.snapshot(), site);
            self.on_failure = Some(hook);
            // Export trouble accumulates but never masks the structural error.
            self.errors |= reported;
        }
        Err(errors)
    }
}

impl RingList<f64> {
    /// Scans the ring for the first value within [`VALUE_EPS`] of `target`.
    ///
    /// Linear reference implementation; O(n) in the live count.
    pub fn find_value_slow(&self, target: f64) -> Option<Slot> {
        self.position(|value| (value - target).abs() < VALUE_EPS)
    }
}

impl<T: fmt::Debug> fmt::Debug for RingList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingList")
            .field("capacity", &self.capacity)
            .field("live", &self.live)
            .field("free_head", &self.free_head)
            .field("errors", &self.errors)
            .field("creation", &self.creation)
            .finish_non_exhaustive()
    }
}

/// Ring-order iterator over a list's live elements.
///
/// The walk is bounded by the slot count, so iteration terminates even on a
/// corrupted ring.
pub struct Iter<'a, T> {
    next: &'a [Slot],
    values: &'a [T],
    cursor: Slot,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Slot, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_anchor() || self.remaining == 0 {
            return None;
        }
        let index = self.cursor.index();
        if index >= self.values.len() {
            return None;
        }

        let slot = self.cursor;
        self.cursor = self.next[index];
        self.remaining -= 1;
        Some((slot, &self.values[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> CallSite {
        CallSite::here("test")
    }

    fn ring_values(list: &RingList<f64>) -> Vec<f64> {
        list.iter().map(|(_, value)| *value).collect()
    }

    fn free_slots(list: &RingList<f64>) -> Vec<usize> {
        list.snapshot().free_chain().map(|slot| slot.index()).collect()
    }

    #[test]
    fn init_wires_empty_ring_and_ordered_free_chain() {
        let list: RingList<f64> = RingList::init(4, site()).unwrap();

        assert!(list.is_empty());
        assert_eq!(list.capacity(), 4);
        assert_eq!(list.free_len(), 4);
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert_eq!(free_slots(&list), vec![1, 2, 3, 4]);
        assert!(list.errors().is_clear());
    }

    #[test]
    fn init_rejects_zero_capacity() {
        let result = RingList::<f64>::init(0, site());
        assert_eq!(result.unwrap_err(), ListErrors::INVALID_CAPACITY);
    }

    #[test]
    fn init_rejects_oversized_capacity() {
        let result = RingList::<f64>::init(u32::MAX as usize, site());
        assert_eq!(result.unwrap_err(), ListErrors::INVALID_CAPACITY);
    }

    #[test]
    fn insert_delete_scenario() {
        // Mirrors the reference sequence: [5,6,7], delete the first,
        // append 4 -> [6,7,4] with the freed slot reused.
        let mut list: RingList<f64> = RingList::init(10, site()).unwrap();

        let i1 = list.insert_after(Slot::ANCHOR, 5.0, site()).unwrap();
        let i2 = list.insert_after(i1, 6.0, site()).unwrap();
        let i3 = list.insert_after(i2, 7.0, site()).unwrap();
        assert_eq!(ring_values(&list), vec![5.0, 6.0, 7.0]);

        list.delete(i1, site()).unwrap();
        assert_eq!(ring_values(&list), vec![6.0, 7.0]);
        assert_eq!(free_slots(&list)[0], i1.index());

        let i4 = list.insert_after(i3, 4.0, site()).unwrap();
        assert_eq!(ring_values(&list), vec![6.0, 7.0, 4.0]);
        assert_eq!(i4, i1);
    }

    #[test]
    fn insert_splices_into_the_middle() {
        let mut list: RingList<f64> = RingList::init(8, site()).unwrap();

        let a = list.insert_after(Slot::ANCHOR, 1.0, site()).unwrap();
        let _c = list.insert_after(a, 3.0, site()).unwrap();
        let _b = list.insert_after(a, 2.0, site()).unwrap();

        assert_eq!(ring_values(&list), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ring_closes_in_both_directions() {
        let mut list: RingList<f64> = RingList::init(6, site()).unwrap();
        let mut last = Slot::ANCHOR;
        for value in [1.0, 2.0, 3.0, 4.0] {
            last = list.insert_after(last, value, site()).unwrap();
        }

        let mut cursor = Slot::ANCHOR;
        for _ in 0..=list.len() {
            cursor = list.next[cursor.index()];
        }
        assert_eq!(cursor, Slot::ANCHOR);

        let mut cursor = Slot::ANCHOR;
        for _ in 0..=list.len() {
            cursor = list.prev[cursor.index()];
        }
        assert_eq!(cursor, Slot::ANCHOR);
    }

    #[test]
    fn capacity_is_conserved_through_churn() {
        let mut list: RingList<f64> = RingList::init(5, site()).unwrap();
        let mut slots = Vec::new();

        for value in [1.0, 2.0, 3.0] {
            slots.push(list.insert_after(Slot::ANCHOR, value, site()).unwrap());
            assert_eq!(list.len() + list.free_len(), list.capacity());
        }
        for slot in slots {
            list.delete(slot, site()).unwrap();
            assert_eq!(list.len() + list.free_len(), list.capacity());
        }
    }

    #[test]
    fn insert_then_delete_restores_ring_and_free_length() {
        let mut list: RingList<f64> = RingList::init(6, site()).unwrap();
        let a = list.insert_after(Slot::ANCHOR, 1.0, site()).unwrap();
        let _b = list.insert_after(a, 2.0, site()).unwrap();

        let ring_before = ring_values(&list);
        let free_before = list.free_len();

        let temp = list.insert_after(a, 9.0, site()).unwrap();
        list.delete(temp, site()).unwrap();

        assert_eq!(ring_values(&list), ring_before);
        assert_eq!(list.free_len(), free_before);
    }

    #[test]
    fn exhaustion_is_an_error_and_mutates_nothing() {
        let mut list: RingList<f64> = RingList::init(2, site()).unwrap();
        let a = list.insert_after(Slot::ANCHOR, 1.0, site()).unwrap();
        let _b = list.insert_after(a, 2.0, site()).unwrap();

        let ring_before = ring_values(&list);
        let err = list.insert_after(a, 3.0, site()).unwrap_err();

        assert_eq!(err, ListErrors::EXHAUSTED);
        assert_eq!(ring_values(&list), ring_before);
        assert_eq!(list.free_len(), 0);
        // Precondition failures are not invariant violations: nothing sticks.
        assert!(list.errors().is_clear());
    }

    #[test]
    fn stale_and_invalid_indices_are_rejected() {
        let mut list: RingList<f64> = RingList::init(4, site()).unwrap();
        let a = list.insert_after(Slot::ANCHOR, 1.0, site()).unwrap();
        list.delete(a, site()).unwrap();

        // `a` now sits on the free chain: stale for both operations.
        assert_eq!(
            list.insert_after(a, 2.0, site()).unwrap_err(),
            ListErrors::BAD_INDEX
        );
        assert_eq!(list.delete(a, site()).unwrap_err(), ListErrors::BAD_INDEX);

        // The anchor is never deletable; out-of-range never insertable-after.
        assert_eq!(
            list.delete(Slot::ANCHOR, site()).unwrap_err(),
            ListErrors::BAD_INDEX
        );
        assert_eq!(
            list.insert_after(Slot::from_usize(99), 2.0, site()).unwrap_err(),
            ListErrors::BAD_INDEX
        );

        assert!(list.is_empty());
        assert_eq!(list.free_len(), 4);
    }

    #[test]
    fn deleted_payload_stays_until_reuse() {
        let mut list: RingList<f64> = RingList::init(3, site()).unwrap();
        let a = list.insert_after(Slot::ANCHOR, 42.0, site()).unwrap();
        list.delete(a, site()).unwrap();

        // Not observable through `get`, but the slot still holds the payload.
        assert_eq!(list.get(a), None);
        assert_eq!(list.values[a.index()], 42.0);

        let b = list.insert_after(Slot::ANCHOR, 7.0, site()).unwrap();
        assert_eq!(b, a);
        assert_eq!(list.get(b), Some(&7.0));
    }

    #[test]
    fn find_value_slow_hit_and_miss() {
        let mut list: RingList<f64> = RingList::init(10, site()).unwrap();
        let i1 = list.insert_after(Slot::ANCHOR, 5.0, site()).unwrap();
        let i2 = list.insert_after(i1, 6.0, site()).unwrap();
        let i3 = list.insert_after(i2, 7.0, site()).unwrap();

        assert_eq!(list.find_value_slow(7.0), Some(i3));
        assert_eq!(list.find_value_slow(7.0 + VALUE_EPS / 2.0), Some(i3));
        assert_eq!(list.find_value_slow(99.0), None);
    }

    #[test]
    fn get_front_back() {
        let mut list: RingList<f64> = RingList::init(4, site()).unwrap();
        let a = list.insert_after(Slot::ANCHOR, 1.0, site()).unwrap();
        let b = list.insert_after(a, 2.0, site()).unwrap();

        assert_eq!(list.get(a), Some(&1.0));
        assert_eq!(list.get(Slot::ANCHOR), None);
        assert_eq!(list.front(), Some(a));
        assert_eq!(list.back(), Some(b));
    }

    #[test]
    fn clear_rebuilds_the_free_chain() {
        let mut list: RingList<f64> = RingList::init(4, site()).unwrap();
        let a = list.insert_after(Slot::ANCHOR, 1.0, site()).unwrap();
        list.insert_after(a, 2.0, site()).unwrap();

        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.free_len(), 4);
        assert_eq!(free_slots(&list), vec![1, 2, 3, 4]);
        assert_eq!(ring_values(&list), Vec::<f64>::new());

        let c = list.insert_after(Slot::ANCHOR, 3.0, site()).unwrap();
        assert_eq!(c.index(), 1);
    }

    #[test]
    fn corruption_aborts_the_operation_and_sticks() {
        let mut list: RingList<f64> = RingList::init(4, site()).unwrap();
        let a = list.insert_after(Slot::ANCHOR, 1.0, site()).unwrap();

        // Break the head link.
        list.next[0] = Slot::from_usize(77);

        if cfg!(debug_assertions) {
            let err = list.insert_after(a, 2.0, site()).unwrap_err();
            assert!(err.contains(ListErrors::INVALID_HEAD));
            assert!(list.errors().contains(ListErrors::INVALID_HEAD));

            // Sticky: repairing the link does not clear the mask.
            list.next[0] = a;
            list.verify();
            assert!(list.errors().contains(ListErrors::INVALID_HEAD));
        }
    }

    #[test]
    fn failure_hook_sees_the_snapshot_and_accumulates_dump_bits() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut list: RingList<f64> = RingList::init(4, site()).unwrap();
        let a = list.insert_after(Slot::ANCHOR, 1.0, site()).unwrap();

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        list.on_verify_failure(Box::new(move |snapshot, failing| {
            assert_eq!(failing.function, "test");
            assert!(snapshot.errors().contains(ListErrors::INVALID_HEAD));
            seen.set(seen.get() + 1);
            ListErrors::DUMP_EXPORT
        }));

        list.next[0] = Slot::from_usize(77);

        if cfg!(debug_assertions) {
            let err = list.delete(a, site()).unwrap_err();
            assert_eq!(calls.get(), 1);
            // The returned error is the structural one...
            assert!(err.contains(ListErrors::INVALID_HEAD));
            // ...while the export failure lands in the sticky mask.
            assert!(list.errors().contains(ListErrors::DUMP_EXPORT));
        }
    }
}
