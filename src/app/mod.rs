//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the damper controller:
//! mode selection, PID regulation, watchdog escalation and motion
//! orchestration.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod pending;
pub mod ports;
pub mod service;
