//! Single-slot hand-off for a deferred recalculation.
//!
//! A sample that arrives while the servo is moving is not evaluated on the
//! spot.  Instead the slot is armed, and the `MotionComplete` handler takes
//! it exactly once.  Any number of arrivals during one move collapse into
//! a single re-run against the newest reading.

/// One pending recalculation, or none.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingRecalc {
    armed: bool,
}

impl PendingRecalc {
    pub const fn new() -> Self {
        Self { armed: false }
    }

    /// Request a recalculation.  Returns `false` if one was already pending.
    pub fn arm(&mut self) -> bool {
        !core::mem::replace(&mut self.armed, true)
    }

    /// Consume the pending request, if any.
    pub fn take(&mut self) -> bool {
        core::mem::take(&mut self.armed)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
