//! PID regulator for the combustion-air damper
//!
//! Discrete, sample-driven: one step per accepted temperature reading,
//! no time base.  The error terms are kept in `f32`; the output is
//! converted to a whole damper percentage with an explicit rounding rule.
//!
//! ```text
//! errP = target - T
//! errI = errI + errP            (floored at 0 after each tick)
//! errD = errP - errPrev
//! out  = kP·errP + kI·errI + kD·errD
//! ```

use serde::Serialize;

use crate::config::DamperConfig;

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    /// kI = kP / tauI, kD = kP * tauD.
    pub fn from_config(config: &DamperConfig) -> Self {
        Self {
            kp: config.kp,
            ki: config.ki(),
            kd: config.kd(),
        }
    }
}

/// PID state: accumulated error terms plus the gains they are weighted by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PidState {
    gains: PidGains,
    err_p: f32,
    err_i: f32,
    err_d: f32,
    err_prev: f32,
}

impl PidState {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            err_p: 0.0,
            err_i: 0.0,
            err_d: 0.0,
            err_prev: 0.0,
        }
    }

    /// Replace the gains; accumulated error is kept.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Run one PID step and return the raw (unclamped) controller output.
    pub fn step(&mut self, setpoint: i32, measurement: i32) -> f32 {
        self.err_p = (setpoint - measurement) as f32;
        self.err_i += self.err_p;
        self.err_d = self.err_p - self.err_prev;
        self.err_prev = self.err_p;

        self.gains.kp * self.err_p + self.gains.ki * self.err_i + self.gains.kd * self.err_d
    }

    /// Anti-windup reset after a fuel reload.
    pub fn reset_integral(&mut self) {
        self.err_i = 0.0;
    }

    /// Floor the integral at zero.
    pub fn clamp_integral(&mut self) {
        if self.err_i < 0.0 {
            self.err_i = 0.0;
        }
    }

    /// Accumulated error.
    pub fn integral(&self) -> f32 {
        self.err_i
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }
}

/// Convert a raw PID output to a damper percentage.
///
/// Rounds half away from zero, then clamps to [0, 100].  NaN maps to 0.
pub fn output_to_percent(raw: f32) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}
