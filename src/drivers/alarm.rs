//! Audible alarm coordinator.
//!
//! A binary siren flag plus a square-wave generator.  The main loop calls
//! [`AlarmCoordinator::tick`] every [`ALARM_TICK_MS`]; while the flag is
//! set the output alternates 100 ms on / 100 ms off, otherwise it is held
//! low.

use log::info;

/// Alarm toggle cadence: one half-period of the beep pattern.
pub const ALARM_TICK_MS: u32 = 100;

/// Siren state and output phase.
#[derive(Debug, Default)]
pub struct AlarmCoordinator {
    enabled: bool,
    output: bool,
}

impl AlarmCoordinator {
    pub const fn new() -> Self {
        Self {
            enabled: false,
            output: false,
        }
    }

    pub fn start(&mut self) {
        if !self.enabled {
            info!("ALARM | on");
        }
        self.enabled = true;
    }

    pub fn stop(&mut self) {
        if self.enabled {
            info!("ALARM | off");
        }
        self.enabled = false;
    }

    /// Advance one half-period and return the level the output should have.
    pub fn tick(&mut self) -> bool {
        self.output = self.enabled && !self.output;
        self.output
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Level last produced by [`tick`](Self::tick).
    pub fn output(&self) -> bool {
        self.output
    }
}
