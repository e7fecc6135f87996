//! Doubly-linked ring list in a flat, fixed-capacity slot arena.
//!
//! Node pointers are replaced throughout by integer slot indices into three
//! parallel backing slices. Two structures share the same index space:
//!
//! ```text
//! ring       - live slots, doubly linked through slot 0 (the anchor)
//! free chain - unused slots, singly linked through `next`, rooted at the
//!              free head, each marked by the free sentinel in `prev`
//! ```
//!
//! The anchor's `next`/`prev` double as the ring's head and tail, so insert
//! and delete are uniform four-write splices with no special cases at the
//! ends. Allocation is a free-chain pop, deallocation a push; both O(1).
//!
//! # Self-verification
//!
//! In debug builds every mutating call verifies the structure before and
//! after its body. Violations accumulate in a sticky [`ListErrors`] bitmask
//! on the list and abort the in-progress call. An optional observer (see
//! [`RingList::on_verify_failure`]) receives a read-only [`Snapshot`] plus
//! the failing call's [`CallSite`]; the `ringlist-dump` crate uses this to
//! export a Graphviz picture of the corrupted tables.
//!
//! # Quick start
//!
//! ```
//! use ringlist::{CallSite, RingList, Slot};
//!
//! let mut list: RingList<f64> = RingList::init(10, CallSite::here("main")).unwrap();
//!
//! let a = list.insert_after(Slot::ANCHOR, 5.0, CallSite::here("main")).unwrap();
//! let b = list.insert_after(a, 6.0, CallSite::here("main")).unwrap();
//! let c = list.insert_after(b, 7.0, CallSite::here("main")).unwrap();
//!
//! assert_eq!(list.find_value_slow(7.0), Some(c));
//!
//! list.delete(a, CallSite::here("main")).unwrap();
//! let values: Vec<f64> = list.iter().map(|(_, v)| *v).collect();
//! assert_eq!(values, vec![6.0, 7.0]);
//! ```
//!
//! # Non-goals
//!
//! Capacity is fixed at `init`: when the free chain runs dry, insertion
//! fails with `EXHAUSTED` and no growth is attempted. The list is owned by
//! one caller; there is no internal locking.

#![warn(missing_docs)]

pub mod errors;
pub mod list;
pub mod site;
pub mod slot;
pub mod snapshot;
mod verify;

pub use errors::ListErrors;
pub use list::{FailureHook, Iter, RingList, VALUE_EPS};
pub use site::CallSite;
pub use slot::Slot;
pub use snapshot::{ChainIter, Snapshot};
