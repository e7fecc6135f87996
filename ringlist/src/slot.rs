//! Slot index newtype.
//!
//! A [`Slot`] identifies one position shared by the three parallel backing
//! slices of a [`RingList`](crate::RingList). It is deliberately opaque:
//! callers obtain slots from list operations and hand them back, they never
//! construct arbitrary ones. This prevents cross-use with unrelated indices.

use core::fmt;

/// Index of one slot in a list's backing storage.
///
/// Slot 0 is the anchor (sentinel) of the ring: it never holds user data and
/// its `next`/`prev` links double as the ring's head and tail pointers.
///
/// # Example
///
/// ```
/// use ringlist::{CallSite, RingList, Slot};
///
/// let mut list: RingList<f64> = RingList::init(10, CallSite::here("example")).unwrap();
/// let slot = list.insert_after(Slot::ANCHOR, 5.0, CallSite::here("example")).unwrap();
/// assert!(!slot.is_anchor());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(u32);

impl Slot {
    /// The anchor slot: head/tail sentinel of every ring.
    pub const ANCHOR: Slot = Slot(0);

    /// Marker stored in `prev` of slots threaded on the free chain.
    /// Never a valid index.
    pub(crate) const FREE: Slot = Slot(u32::MAX);

    #[inline]
    pub(crate) fn from_usize(index: usize) -> Slot {
        debug_assert!(index < u32::MAX as usize);
        Slot(index as u32)
    }

    /// Returns the raw index into the backing slices.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if this is the anchor slot.
    #[inline]
    pub fn is_anchor(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub(crate) fn is_free_marker(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Zeroed storage reads as anchor links.
impl Default for Slot {
    #[inline]
    fn default() -> Self {
        Slot::ANCHOR
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free_marker() {
            f.write_str("Slot(free)")
        } else {
            write!(f, "Slot({})", self.0)
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
