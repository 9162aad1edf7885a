//! Shared hand-off cell between the outside collaborators and the core.
//!
//! The temperature driver publishes each validated reading here; the
//! display publishes the manual-override switch.  The control loop reads
//! both through [`SensorPort`].  All fields are atomics so producers on
//! other tasks never block the loop.

use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::app::ports::SensorPort;

/// Reading the temperature driver reports before its first conversion.
pub const INITIAL_READING_C: i32 = 24;

#[derive(Debug)]
pub struct SensorFeed {
    temperature_c: AtomicI32,
    changed: AtomicBool,
    manual: AtomicBool,
}

impl Default for SensorFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorFeed {
    pub const fn new() -> Self {
        Self {
            temperature_c: AtomicI32::new(INITIAL_READING_C),
            changed: AtomicBool::new(false),
            manual: AtomicBool::new(false),
        }
    }

    /// Publish a validated reading.  Raises the change edge only when the
    /// value actually differs from the previous one.
    pub fn publish_temperature(&self, temperature_c: i32) {
        let prev = self.temperature_c.swap(temperature_c, Ordering::AcqRel);
        if prev != temperature_c {
            self.changed.store(true, Ordering::Release);
        }
    }

    /// Set the operator's manual-override switch.
    pub fn set_manual_override(&self, on: bool) {
        self.manual.store(on, Ordering::Release);
    }

    pub fn temperature_c(&self) -> i32 {
        self.temperature_c.load(Ordering::Acquire)
    }

    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    pub fn manual_override(&self) -> bool {
        self.manual.load(Ordering::Acquire)
    }
}

impl SensorPort for SensorFeed {
    fn temperature_c(&self) -> i32 {
        SensorFeed::temperature_c(self)
    }

    fn take_temperature_changed(&mut self) -> bool {
        self.take_changed()
    }

    fn manual_override(&self) -> bool {
        SensorFeed::manual_override(self)
    }
}
