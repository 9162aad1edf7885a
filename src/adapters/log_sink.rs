//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every outbound [`AppEvent`] as one
//! line through the `log` facade (UART / USB-CDC on the device, the
//! tracing fmt subscriber on the host).  A display or remote notifier
//! would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events rendered so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started(percent) => {
                info!("START | damper={}%", percent);
            }
            AppEvent::PositionChanged(percent) => {
                info!("DAMPER | target={}%", percent);
            }
            AppEvent::StatusChanged(status) => {
                info!("STATUS | {}", status);
            }
            AppEvent::MotionComplete(position) => {
                info!("SERVO | settled at {}%", position);
            }
            AppEvent::RefillDetected => {
                info!("FUEL | refill detected, integral reset");
            }
            AppEvent::WatchdogArmed { baseline } => {
                info!("WATCHDOG | armed, baseline={}\u{00b0}C", baseline);
            }
            AppEvent::WatchdogRecovered => {
                info!("WATCHDOG | fire recovered");
            }
            AppEvent::WatchdogExpired => {
                warn!("WATCHDOG | expired, fire is out");
            }
            AppEvent::WarningChanged(true) => {
                warn!("ALARM | over-temperature");
            }
            AppEvent::WarningChanged(false) => {
                info!("ALARM | temperature normal");
            }
            AppEvent::HibernateRequested(reason) => {
                warn!("POWER | hibernate ({:?})", reason);
            }
            AppEvent::ConfigUpdated => {
                info!("CONFIG | updated");
            }
        }
    }
}
