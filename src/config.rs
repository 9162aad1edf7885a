//! Damper controller configuration
//!
//! All tunable parameters for the combustion-air damper.
//! Values are written at runtime by the settings surface and must pass
//! [`DamperConfig::validate`] before they reach the control core.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Hard ceiling for any target temperature (°C).
pub const MAX_TARGET_TEMP_C: i32 = 85;

/// Longest pulse that fits in one 50 Hz frame.
const MAX_PULSE_US: i32 = 20_000;

/// Servo calibration: percentage → angle → pulse width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoCalibration {
    /// Mechanical travel of the damper linkage (degrees of horn rotation).
    pub angle_deg: i32,
    /// Linkage ratio divisor applied to `angle_deg`.
    pub calibration: f32,
    /// Horn angle at 0 % (fully closed).
    pub offset_deg: i32,
    pub pulse_min_us: i32,
    pub pulse_max_us: i32,
    pub angle_min_deg: i32,
    pub angle_max_deg: i32,
}

impl ServoCalibration {
    /// Angle swept between 0 % and 100 %.
    ///
    /// Whole degrees: the fractional part of `angle / calibration` is
    /// truncated, matching the integer servo mapping used on the device.
    pub fn angle_span_deg(&self) -> i32 {
        (self.angle_deg as f32 / self.calibration) as i32
    }

    /// Horn angle at 100 % (fully open).
    pub fn full_open_deg(&self) -> i32 {
        self.offset_deg.saturating_add(self.angle_span_deg())
    }
}

impl Default for ServoCalibration {
    fn default() -> Self {
        Self {
            angle_deg: 35,
            calibration: 1.5,
            offset_deg: 29,
            pulse_min_us: 500,
            pulse_max_us: 2500,
            angle_min_deg: 0,
            angle_max_deg: 180,
        }
    }
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamperConfig {
    // --- Temperatures (°C) ---
    /// Flue temperature the PID regulates towards.
    pub target_temp_c: i32,
    /// At or below this the fire is considered dying; damper fully open.
    pub min_temp_c: i32,
    /// Above this the over-temperature alarm sounds.
    pub warning_temp_c: i32,

    // --- PID ---
    pub kp: f32,
    /// Integral time constant; kI = kP / tauI.
    pub tau_i: f32,
    /// Derivative time constant; kD = kP * tauD.
    pub tau_d: f32,

    // --- Integral triggers ---
    /// Accumulated error above which the operator is asked to add fuel.
    pub refill_trigger: f32,
    /// Accumulated error at which, with the fire below minimum, the
    /// controller gives up and hibernates.
    pub end_trigger: f32,

    // --- Watchdog ---
    /// How long the fire may sit at minimum without recovering.
    pub low_temp_timeout_ms: u32,

    // --- Servo ---
    /// Time between single-percent servo steps.
    pub step_interval_ms: u32,
    pub servo: ServoCalibration,

    // --- Sensor ---
    /// Temperature sensor read interval.
    pub sample_interval_ms: u32,
}

impl Default for DamperConfig {
    fn default() -> Self {
        Self {
            target_temp_c: 68,
            min_temp_c: 40,
            warning_temp_c: 81,

            kp: 5.0,
            tau_i: 1000.0,
            tau_d: 5.0,

            refill_trigger: 5000.0,
            end_trigger: 10_000.0,

            low_temp_timeout_ms: 240_000, // 4 min

            step_interval_ms: 50,
            servo: ServoCalibration::default(),

            sample_interval_ms: 5000,
        }
    }
}

impl DamperConfig {
    /// Range-check every field. Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(40..=55).contains(&self.min_temp_c) {
            return Err(ConfigError::ValidationFailed("min_temp_c must be 40-55"));
        }
        if !(40..=MAX_TARGET_TEMP_C).contains(&self.target_temp_c) {
            return Err(ConfigError::ValidationFailed("target_temp_c must be 40-85"));
        }
        if self.target_temp_c <= self.min_temp_c {
            return Err(ConfigError::ValidationFailed(
                "target_temp_c must be above min_temp_c",
            ));
        }
        if !(80..=95).contains(&self.warning_temp_c) {
            return Err(ConfigError::ValidationFailed("warning_temp_c must be 80-95"));
        }
        if self.warning_temp_c < self.target_temp_c {
            return Err(ConfigError::ValidationFailed(
                "warning_temp_c must not be below target_temp_c",
            ));
        }
        if !(1.0..=100.0).contains(&self.kp) {
            return Err(ConfigError::ValidationFailed("kp must be 1-100"));
        }
        if !(1.0..=10_000.0).contains(&self.tau_i) {
            return Err(ConfigError::ValidationFailed("tau_i must be 1-10000"));
        }
        if !(1.0..=100.0).contains(&self.tau_d) {
            return Err(ConfigError::ValidationFailed("tau_d must be 1-100"));
        }
        if !(5000.0..=30_000.0).contains(&self.end_trigger) {
            return Err(ConfigError::ValidationFailed("end_trigger must be 5000-30000"));
        }
        if !(self.refill_trigger > 0.0 && self.refill_trigger < self.end_trigger) {
            return Err(ConfigError::ValidationFailed(
                "refill_trigger must be positive and below end_trigger",
            ));
        }
        if !(60_000..=600_000).contains(&self.low_temp_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "low_temp_timeout_ms must be 1-10 minutes",
            ));
        }
        if self.low_temp_timeout_ms % 60_000 != 0 {
            return Err(ConfigError::ValidationFailed(
                "low_temp_timeout_ms must be whole minutes",
            ));
        }
        if !(10..=200).contains(&self.step_interval_ms) {
            return Err(ConfigError::ValidationFailed("step_interval_ms must be 10-200"));
        }
        if !(100..=60_000).contains(&self.sample_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "sample_interval_ms must be 100-60000",
            ));
        }
        self.validate_servo()
    }

    fn validate_servo(&self) -> Result<(), ConfigError> {
        let s = &self.servo;
        if !(10..=100).contains(&s.angle_deg) {
            return Err(ConfigError::ValidationFailed("servo angle must be 10-100"));
        }
        if !(0..=90).contains(&s.offset_deg) {
            return Err(ConfigError::ValidationFailed("servo offset must be 0-90"));
        }
        if !(s.calibration > 0.0) {
            return Err(ConfigError::ValidationFailed("servo calibration must be positive"));
        }
        let pulses = 0..=MAX_PULSE_US;
        if !pulses.contains(&s.pulse_min_us) || !pulses.contains(&s.pulse_max_us) {
            return Err(ConfigError::ValidationFailed("servo pulses must be 0-20000us"));
        }
        let angles = 0..=360;
        if !angles.contains(&s.angle_min_deg) || !angles.contains(&s.angle_max_deg) {
            return Err(ConfigError::ValidationFailed("servo angle limits must be 0-360"));
        }
        if s.pulse_min_us >= s.pulse_max_us {
            return Err(ConfigError::ValidationFailed("servo pulse range is empty"));
        }
        if s.angle_min_deg >= s.angle_max_deg {
            return Err(ConfigError::ValidationFailed("servo angle range is empty"));
        }
        if s.offset_deg < s.angle_min_deg || s.full_open_deg() > s.angle_max_deg {
            return Err(ConfigError::ValidationFailed(
                "servo travel exceeds the angle range",
            ));
        }
        Ok(())
    }

    /// Integral gain, kI = kP / tauI.
    pub fn ki(&self) -> f32 {
        self.kp / self.tau_i
    }

    /// Derivative gain, kD = kP * tauD.
    pub fn kd(&self) -> f32 {
        self.kp * self.tau_d
    }
}
