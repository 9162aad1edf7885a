//! Actuator drivers: damper servo stepping and the audible alarm.

pub mod alarm;
pub mod servo;
