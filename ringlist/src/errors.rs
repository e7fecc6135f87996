//! Sticky error bitmask.
//!
//! Every invariant violation the verifier observes is OR-ed into the list's
//! `errors` field and never cleared. Callers inspect individual bits with
//! [`contains`](ListErrors::contains) / [`intersects`](ListErrors::intersects);
//! the only meaningful equality test is against [`ListErrors::empty`].

use core::fmt;

bitflags::bitflags! {
    /// Additive error mask for list operations and verification.
    ///
    /// Bits accumulate: a list that has ever failed verification keeps the
    /// corresponding bits for the rest of its life.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ListErrors: u32 {
        /// Value slice length disagrees with the recorded capacity.
        const VALUE_STORAGE = 1 << 0;
        /// Next-link slice length disagrees with the recorded capacity.
        const NEXT_STORAGE = 1 << 1;
        /// Prev-link slice length disagrees with the recorded capacity.
        const PREV_STORAGE = 1 << 2;
        /// Capacity is zero, too large for the index type, or inconsistent.
        const INVALID_CAPACITY = 1 << 3;
        /// The ring is malformed in the `next` direction (bad head link,
        /// out-of-range hop, or a walk that does not close at the anchor).
        const INVALID_HEAD = 1 << 4;
        /// The ring is malformed in the `prev` direction (bad tail link or a
        /// back-link that does not point at its predecessor).
        const INVALID_TAIL = 1 << 5;
        /// The free chain is malformed: out-of-range root or hop, a member
        /// not carrying the free marker, or a cyclic chain.
        const FREE_CHAIN = 1 << 6;
        /// An index argument was out of range, the anchor, or not live.
        const BAD_INDEX = 1 << 7;
        /// The free chain is empty; no slot can be handed out.
        const EXHAUSTED = 1 << 8;
        /// The diagnostic collaborator failed to produce or write a snapshot.
        const DUMP_EXPORT = 1 << 9;
        /// The diagnostic collaborator failed to render or append its report.
        const DUMP_FILE = 1 << 10;
    }
}

impl ListErrors {
    /// Mask of the violations that make further slot access unsafe.
    /// Operations must abort without touching the backing slices when any of
    /// these is present.
    pub const STRUCTURAL: ListErrors = ListErrors::VALUE_STORAGE
        .union(ListErrors::NEXT_STORAGE)
        .union(ListErrors::PREV_STORAGE)
        .union(ListErrors::INVALID_CAPACITY);

    /// Returns `true` if no error bit is set.
    #[inline]
    pub fn is_clear(self) -> bool {
        self.is_empty()
    }
}

impl fmt::Display for ListErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no errors");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ListErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_accumulate() {
        let mut errors = ListErrors::empty();
        errors |= ListErrors::INVALID_HEAD;
        errors |= ListErrors::FREE_CHAIN;

        assert!(errors.contains(ListErrors::INVALID_HEAD));
        assert!(errors.contains(ListErrors::FREE_CHAIN));
        assert!(!errors.contains(ListErrors::BAD_INDEX));
        assert!(!errors.is_clear());
    }

    #[test]
    fn structural_mask_covers_storage_bits() {
        assert!(ListErrors::STRUCTURAL.contains(ListErrors::VALUE_STORAGE));
        assert!(ListErrors::STRUCTURAL.contains(ListErrors::NEXT_STORAGE));
        assert!(ListErrors::STRUCTURAL.contains(ListErrors::PREV_STORAGE));
        assert!(ListErrors::STRUCTURAL.contains(ListErrors::INVALID_CAPACITY));
        assert!(!ListErrors::STRUCTURAL.contains(ListErrors::BAD_INDEX));
    }

    #[test]
    fn display_lists_set_bits() {
        assert_eq!(format!("{}", ListErrors::empty()), "no errors");
        let errors = ListErrors::INVALID_HEAD | ListErrors::EXHAUSTED;
        let text = format!("{errors}");
        assert!(text.contains("INVALID_HEAD"));
        assert!(text.contains("EXHAUSTED"));
    }
}
