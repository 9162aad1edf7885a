//! Control algorithms: PID regulation and fuel-reload detection.

pub mod pid;
pub mod refill;
