//! Damper servo motion controller.
//!
//! Moves the damper linkage one percent at a time so the control loop
//! never blocks on mechanics, and keeps the servo unpowered whenever it
//! is not moving.
//!
//! ```text
//!            set_target(p ≠ target)        current == target
//!   IDLE ────────────────────────▶ MOVING ───────────────────▶ IDLE
//!    ▲   (power up if detached)      │ ▲   (power down,         │
//!    │                               │ │    MotionComplete)     │
//!    │                               └─┘ step(): current ± 1    │
//!    └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Position mapping
//!
//! Two integer linear stages, matching the servo library on the device:
//! percent → horn angle over `[offset, offset + angle / calibration]`,
//! then horn angle → pulse width over `[angle_min, angle_max]` →
//! `[pulse_min, pulse_max]`.

use log::{debug, info};

use crate::app::ports::ActuatorPort;
use crate::config::ServoCalibration;

/// Fastest cadence the stepping activity is polled at.
pub const STEP_POLL_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    Moving,
}

/// What a single [`ServoMotion::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to do.
    Idle,
    /// Advanced one unit and wrote a new pulse.
    Stepped { position: u8, pulse_us: u16 },
    /// Reached the target; servo powered down.
    Completed { position: u8 },
}

/// Percentage → pulse width mapping derived from [`ServoCalibration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseMapping {
    offset_deg: i32,
    span_deg: i32,
    angle_min_deg: i32,
    angle_max_deg: i32,
    pulse_min_us: i32,
    pulse_max_us: i32,
}

impl PulseMapping {
    pub fn from_calibration(cal: &ServoCalibration) -> Self {
        Self {
            offset_deg: cal.offset_deg,
            span_deg: cal.angle_span_deg(),
            angle_min_deg: cal.angle_min_deg,
            angle_max_deg: cal.angle_max_deg,
            pulse_min_us: cal.pulse_min_us,
            pulse_max_us: cal.pulse_max_us,
        }
    }

    /// Horn angle for a damper percentage.
    pub fn angle_for(&self, percent: u8) -> i32 {
        self.offset_deg + i32::from(percent.min(100)) * self.span_deg / 100
    }

    /// Pulse width for a damper percentage.
    pub fn pulse_for(&self, percent: u8) -> u16 {
        let angle = self.angle_for(percent);
        let us = (angle - self.angle_min_deg) * (self.pulse_max_us - self.pulse_min_us)
            / (self.angle_max_deg - self.angle_min_deg)
            + self.pulse_min_us;
        us.clamp(0, i32::from(u16::MAX)) as u16
    }
}

/// Non-blocking servo stepper.
pub struct ServoMotion {
    current: u8,
    target: u8,
    state: MotionState,
    powered: bool,
    last_step_ms: Option<u64>,
    step_interval_ms: u32,
    mapping: PulseMapping,
}

impl ServoMotion {
    /// Create an idle, unpowered stepper that believes it sits at `position`.
    pub fn new(position: u8, step_interval_ms: u32, cal: &ServoCalibration) -> Self {
        let position = position.min(100);
        Self {
            current: position,
            target: position,
            state: MotionState::Idle,
            powered: false,
            last_step_ms: None,
            step_interval_ms,
            mapping: PulseMapping::from_calibration(cal),
        }
    }

    /// Aim at a new position.  Redirects an in-flight move from wherever
    /// the servo currently is.  Returns `true` if the target changed.
    pub fn set_target(&mut self, percent: u8, hw: &mut impl ActuatorPort) -> bool {
        let percent = percent.min(100);
        if percent == self.target {
            return false;
        }
        if self.state == MotionState::Idle {
            info!("SERVO | moving {}% -> {}%", self.current, percent);
        } else {
            debug!("SERVO | redirect at {}%: {}% -> {}%", self.current, self.target, percent);
        }
        self.target = percent;
        self.state = MotionState::Moving;
        if !self.powered {
            hw.set_servo_power(true);
            self.powered = true;
        }
        true
    }

    /// Advance one unit towards the target.
    pub fn step(&mut self, hw: &mut impl ActuatorPort) -> StepOutcome {
        if self.state == MotionState::Idle {
            return StepOutcome::Idle;
        }

        if self.current == self.target {
            return self.finish(hw);
        }

        if self.current < self.target {
            self.current += 1;
        } else {
            self.current -= 1;
        }
        let pulse_us = self.mapping.pulse_for(self.current);
        hw.write_servo_pulse(pulse_us);

        if self.current == self.target {
            return self.finish(hw);
        }
        StepOutcome::Stepped {
            position: self.current,
            pulse_us,
        }
    }

    /// Rate-limited [`step`](Self::step): steps only when at least
    /// `step_interval_ms` has passed since the previous step.
    pub fn poll(&mut self, now_ms: u64, hw: &mut impl ActuatorPort) -> StepOutcome {
        if self.state == MotionState::Idle {
            return StepOutcome::Idle;
        }
        if let Some(last) = self.last_step_ms {
            if now_ms.saturating_sub(last) < u64::from(self.step_interval_ms) {
                return StepOutcome::Idle;
            }
        }
        self.last_step_ms = Some(now_ms);
        self.step(hw)
    }

    pub fn set_step_interval_ms(&mut self, interval_ms: u32) {
        self.step_interval_ms = interval_ms;
    }

    /// New calibration applies from the next step.
    pub fn set_calibration(&mut self, cal: &ServoCalibration) {
        self.mapping = PulseMapping::from_calibration(cal);
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == MotionState::Moving
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn mapping(&self) -> &PulseMapping {
        &self.mapping
    }

    fn finish(&mut self, hw: &mut impl ActuatorPort) -> StepOutcome {
        self.state = MotionState::Idle;
        if self.powered {
            hw.set_servo_power(false);
            self.powered = false;
        }
        info!("SERVO | motion complete at {}%", self.current);
        StepOutcome::Completed {
            position: self.current,
        }
    }
}
