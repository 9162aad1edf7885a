//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (temperature feed, servo, buzzer, platform, event sinks,
//! config storage) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.
//!
//! ## Contract notes
//!
//! - **SensorPort** only ever yields validated readings; range and jump
//!   filtering happen in the temperature driver, upstream of this boundary.
//! - **ConfigPort** implementations MUST validate before accepting.
//! - **PlatformPort::hibernate** is terminal on real hardware.  The core
//!   calls it at most once.

use crate::config::DamperConfig;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: collaborators → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the latest accepted temperature and the operator's
/// manual-override switch.
pub trait SensorPort {
    /// Most recent validated flue temperature in whole °C.
    fn temperature_c(&self) -> i32;

    /// Edge-triggered change flag: returns `true` once per new reading
    /// and clears it.
    fn take_temperature_changed(&mut self) -> bool;

    /// Whether the operator has taken manual control of the damper.
    fn manual_override(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Power (attach) or unpower (detach) the damper servo.
    fn set_servo_power(&mut self, on: bool);

    /// Drive the servo to the given pulse width in microseconds.
    fn write_servo_pulse(&mut self, pulse_us: u16);

    /// Drive the audible alarm output.
    fn set_alarm_output(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Platform port (driven adapter: domain → SoC power management)
// ───────────────────────────────────────────────────────────────

/// Blocking platform services used on the terminal path.
pub trait PlatformPort {
    /// Block the caller for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Enter deep sleep.  Does not return on hardware; simulations and
    /// tests record the request and return.
    fn hibernate(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → presentation / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits [`AppEvent`](super::events::AppEvent)s through this
/// port.  Adapters decide where they go (serial log, display, remote
/// notifier).  Receivers never mutate control state.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ settings store)
// ───────────────────────────────────────────────────────────────

/// Loads and stores controller configuration.
///
/// Implementations MUST validate values before accepting them.  Invalid
/// ranges are rejected with [`ConfigError::ValidationFailed`], not
/// silently clamped.
pub trait ConfigPort {
    /// Current configuration.  Returns [`DamperConfig::default()`] if
    /// nothing was stored yet.
    fn load(&self) -> Result<DamperConfig, ConfigError>;

    /// Validate and store configuration.
    fn save(&mut self, config: &DamperConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}
