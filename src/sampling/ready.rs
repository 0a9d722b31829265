//! Conversion-ready flag
//!
//! The interrupt side only ever calls [`ReadySignal::raise`]. The control
//! loop consumes the flag with [`ReadySignal::take`], which reads and clears
//! in one atomic swap. The flag is a boolean, not a counter: two raises
//! before one take yield exactly one pending event.

use core::sync::atomic::{AtomicBool, Ordering};

/// Single-writer / single-reader ready flag
pub struct ReadySignal {
    flag: AtomicBool,
}

impl ReadySignal {
    /// Create a lowered flag (usable in a `static`)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Mark a conversion as ready (interrupt context)
    #[inline]
    pub fn raise(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Consume a pending ready event
    ///
    /// Returns true at most once per raise observed.
    #[inline]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Check for a pending event without consuming it
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}
