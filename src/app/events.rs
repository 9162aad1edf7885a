//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, redraw the damper
//! gauge, push a remote notification.

use core::fmt;

use serde::Serialize;

/// Operating status shown next to the damper gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// The operator is driving the damper.
    #[serde(rename = "MANUAL")]
    Manual,
    /// Closed-loop regulation.
    #[serde(rename = "AUTO")]
    Auto,
    /// Integral error says the fuel load is running out.
    #[serde(rename = "FILL!")]
    Fill,
    /// Terminal: the fire is out and the device is going to sleep.
    #[serde(rename = "END!")]
    End,
}

impl Status {
    /// Label shown on the display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Auto => "AUTO",
            Self::Fill => "FILL!",
            Self::End => "END!",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which terminal path requested hibernation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminalReason {
    /// The low-temperature watchdog timed out without recovery.
    WatchdogExpired,
    /// Integral error reached the end trigger with the fire below minimum.
    FuelExhausted,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial damper percentage).
    Started(u8),

    /// The commanded damper percentage changed; re-read it from the snapshot.
    PositionChanged(u8),

    /// The status label changed.
    StatusChanged(Status),

    /// The servo reached its target and was powered down.
    MotionComplete(u8),

    /// Rising temperature trend: fresh fuel was loaded.
    RefillDetected,

    /// The low-temperature watchdog armed with this baseline (°C).
    WatchdogArmed { baseline: i32 },

    /// The fire recovered before the watchdog timed out.
    WatchdogRecovered,

    /// The watchdog timed out; terminal path entered.
    WatchdogExpired,

    /// Over-temperature warning raised (`true`) or cleared (`false`).
    WarningChanged(bool),

    /// Hibernation was requested from the platform.
    HibernateRequested(TerminalReason),

    /// New configuration applied at runtime.
    ConfigUpdated,
}
