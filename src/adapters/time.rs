//! Monotonic millisecond clock.
//!
//! - **`target_os = "espidf"`** wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** uses `std::time::Instant`, scaled by
//!   a speed-up factor so the host simulation can compress a burn cycle
//!   into minutes.

/// Uptime source handed to the main loop.
#[derive(Debug)]
pub struct UptimeClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    speedup: u32,
}

impl Default for UptimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl UptimeClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            speedup: 1,
        }
    }

    /// Host clock running `speedup` times faster than wall time.
    #[cfg(not(target_os = "espidf"))]
    pub fn accelerated(speedup: u32) -> Self {
        Self {
            start: std::time::Instant::now(),
            speedup: speedup.max(1),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        // SAFETY: read-only query of the always-running system timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since start, scaled by the speed-up factor.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        let elapsed = self.start.elapsed().as_millis() as u64;
        elapsed.saturating_mul(u64::from(self.speedup))
    }
}
