//! Call-site provenance.
//!
//! Mutating operations take an explicit [`CallSite`] argument instead of
//! relying on any global capture machinery. The creation site is recorded
//! once at `init`; the failing site travels with the diagnostic snapshot.

use core::fmt;
use std::panic::Location;

/// Source location of a list creation or of a failing call.
///
/// Rendered as `function (file:line)` in diagnostics.
///
/// # Example
///
/// ```
/// use ringlist::CallSite;
///
/// fn rebalance() -> CallSite {
///     CallSite::here("rebalance")
/// }
///
/// let site = rebalance();
/// assert_eq!(site.function, "rebalance");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallSite {
    /// Name of the calling function. Not derivable from the location, so the
    /// caller states it.
    pub function: &'static str,
    /// Source file of the call.
    pub file: &'static str,
    /// Line of the call.
    pub line: u32,
}

impl CallSite {
    /// Captures the file and line of the caller.
    #[track_caller]
    pub fn here(function: &'static str) -> Self {
        let location = Location::caller();
        Self {
            function,
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn here_captures_this_file() {
        let site = CallSite::here("here_captures_this_file");
        assert!(site.file.ends_with("site.rs"));
        assert!(site.line > 0);
        assert_eq!(site.function, "here_captures_this_file");
    }

    #[test]
    fn display_format() {
        let site = CallSite {
            function: "main",
            file: "src/main.rs",
            line: 12,
        };
        assert_eq!(format!("{site}"), "main (src/main.rs:12)");
    }
}
