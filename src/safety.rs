//! Low-temperature safety watchdog.
//!
//! Guards against a dying fire: once the flue drops to the minimum
//! temperature with the damper wide open, the fire gets a bounded window
//! to climb back.  If it does not, the controller closes up and sleeps.
//!
//! ## Lifecycle
//!
//! ```text
//!            arm(T ≤ min)            T ≥ baseline + 3
//!  INACTIVE ─────────────▶ ACTIVE ────────────────────▶ INACTIVE
//!                             │
//!                             │ now - start > timeout
//!                             ▼
//!                          EXPIRED  (terminal)
//! ```
//!
//! Only one watchdog window exists at a time.  Arming an already active
//! watchdog is a no-op: the start time and baseline are never refreshed.

use log::{error, info};
use serde::Serialize;

/// Degrees above the baseline that count as a recovered fire.
pub const RECOVERY_MARGIN_C: i32 = 3;

/// Interval of the periodic sweep that re-evaluates an active watchdog
/// when no new sample arrives.
pub const SWEEP_INTERVAL_MS: u64 = 30_000;

/// User-visible pause between showing `END!` and going to sleep.
pub const HIBERNATE_SETTLE_MS: u32 = 1500;

/// Watchdog state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WatchdogState {
    Inactive,
    Active { started_ms: u64, baseline_c: i32 },
    Expired,
}

/// Result of evaluating an active watchdog against a new reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    /// Not active; nothing to do.
    Idle,
    /// Still waiting for the fire to recover.
    Holding,
    /// Temperature climbed past the recovery margin; watchdog cleared.
    Recovered,
    /// Timed out without recovery.  Terminal.
    Expired,
}

/// Low-temperature watchdog.
pub struct LowTempWatchdog {
    state: WatchdogState,
    timeout_ms: u32,
    /// Timeout captured when the running window was armed.
    window_ms: u32,
}

impl LowTempWatchdog {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            state: WatchdogState::Inactive,
            timeout_ms,
            window_ms: timeout_ms,
        }
    }

    /// Start the recovery window.  Returns `true` if this call armed it;
    /// an active or expired watchdog is left untouched.
    pub fn arm(&mut self, now_ms: u64, temperature_c: i32) -> bool {
        if self.state != WatchdogState::Inactive {
            return false;
        }
        self.state = WatchdogState::Active {
            started_ms: now_ms,
            baseline_c: temperature_c,
        };
        self.window_ms = self.timeout_ms;
        info!(
            "WATCHDOG armed: baseline={}\u{00b0}C, timeout={}s",
            temperature_c,
            self.timeout_ms / 1000
        );
        true
    }

    /// Evaluate the active window against the latest reading.
    pub fn evaluate(&mut self, now_ms: u64, temperature_c: i32) -> WatchdogVerdict {
        let WatchdogState::Active {
            started_ms,
            baseline_c,
        } = self.state
        else {
            return WatchdogVerdict::Idle;
        };

        if temperature_c >= baseline_c + RECOVERY_MARGIN_C {
            info!(
                "WATCHDOG recovered: {}\u{00b0}C -> {}\u{00b0}C",
                baseline_c, temperature_c
            );
            self.state = WatchdogState::Inactive;
            return WatchdogVerdict::Recovered;
        }

        if now_ms.saturating_sub(started_ms) > u64::from(self.window_ms) {
            error!(
                "WATCHDOG expired: no {}\u{00b0}C rise in {}s (baseline {}\u{00b0}C, now {}\u{00b0}C)",
                RECOVERY_MARGIN_C,
                self.window_ms / 1000,
                baseline_c,
                temperature_c
            );
            self.state = WatchdogState::Expired;
            return WatchdogVerdict::Expired;
        }

        WatchdogVerdict::Holding
    }

    /// Takes effect from the next arming; a running window keeps its deadline.
    pub fn set_timeout_ms(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, WatchdogState::Active { .. })
    }

    pub fn is_expired(&self) -> bool {
        self.state == WatchdogState::Expired
    }
}
