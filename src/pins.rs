//! GPIO / peripheral pin assignments for the stove controller board.
//!
//! Single source of truth.  `main` picks the matching `peripherals.pins`
//! fields and logs these numbers at boot so the wiring can be checked
//! against the serial console.

// ---------------------------------------------------------------------------
// Damper servo
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the damper servo signal line.
pub const SERVO_PWM_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Alarm
// ---------------------------------------------------------------------------

/// Active-high piezo buzzer.
pub const BUZZER_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution (bits).  14-bit gives 16383 duty steps per frame.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// One PWM frame at 50 Hz, in microseconds.
pub const SERVO_PERIOD_US: u16 = 20_000;
