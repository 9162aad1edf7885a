//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (settings
//! screen, remote control surface) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::DamperConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Move the damper to an operator-chosen percentage.
    /// Only honoured while manual override is active.
    ManualPosition(u8),

    /// Change the regulation setpoint (°C).
    SetTargetTemperature(i32),

    /// Hot-reload configuration.  Re-validated before it is applied.
    UpdateConfig(DamperConfig),

    /// Silence the over-temperature alarm until the next rising edge.
    SilenceAlarm,
}
