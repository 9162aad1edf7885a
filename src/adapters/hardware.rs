//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the servo PWM channel and the buzzer pin, plus a handle to the
//! shared [`SensorFeed`], exposing them through [`SensorPort`],
//! [`ActuatorPort`] and [`PlatformPort`].  This is the only module in the
//! system that touches actual hardware.  It is written against the
//! `embedded-hal` 1.0 traits, so the ESP-IDF LEDC driver and GPIO pin
//! drivers plug straight in.
//!
//! Actuator writes never fail loudly: a rejected PWM or GPIO write is
//! logged and the loop carries on.

use std::sync::Arc;

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::adapters::sensor_feed::SensorFeed;
use crate::app::ports::{ActuatorPort, PlatformPort, SensorPort};
use crate::error::ActuatorError;
use crate::pins::SERVO_PERIOD_US;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P, B> {
    feed: Arc<SensorFeed>,
    servo_pwm: P,
    buzzer: B,
    /// Servo signal attached (PWM running).
    attached: bool,
    #[cfg(not(target_os = "espidf"))]
    hibernate_requested: bool,
}

impl<P, B> HardwareAdapter<P, B>
where
    P: SetDutyCycle,
    B: OutputPin,
{
    pub fn new(feed: Arc<SensorFeed>, servo_pwm: P, buzzer: B) -> Self {
        Self {
            feed,
            servo_pwm,
            buzzer,
            attached: false,
            #[cfg(not(target_os = "espidf"))]
            hibernate_requested: false,
        }
    }

    pub fn is_servo_attached(&self) -> bool {
        self.attached
    }

    /// Host builds only: whether deep sleep was requested.
    #[cfg(not(target_os = "espidf"))]
    pub fn hibernate_requested(&self) -> bool {
        self.hibernate_requested
    }

    fn report(err: ActuatorError, detail: &impl core::fmt::Debug) {
        warn!("{} ({:?})", err, detail);
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P, B> SensorPort for HardwareAdapter<P, B> {
    fn temperature_c(&self) -> i32 {
        self.feed.temperature_c()
    }

    fn take_temperature_changed(&mut self) -> bool {
        self.feed.take_changed()
    }

    fn manual_override(&self) -> bool {
        self.feed.manual_override()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P, B> ActuatorPort for HardwareAdapter<P, B>
where
    P: SetDutyCycle,
    B: OutputPin,
{
    fn set_servo_power(&mut self, on: bool) {
        self.attached = on;
        if !on {
            // Detach: stop the pulse train so the servo goes limp.
            if let Err(e) = self.servo_pwm.set_duty_cycle_fully_off() {
                Self::report(ActuatorError::PwmWriteFailed, &e);
            }
        }
    }

    fn write_servo_pulse(&mut self, pulse_us: u16) {
        if !self.attached {
            return;
        }
        let pulse_us = pulse_us.min(SERVO_PERIOD_US);
        if let Err(e) = self
            .servo_pwm
            .set_duty_cycle_fraction(pulse_us, SERVO_PERIOD_US)
        {
            Self::report(ActuatorError::PwmWriteFailed, &e);
        }
    }

    fn set_alarm_output(&mut self, on: bool) {
        let result = if on {
            self.buzzer.set_high()
        } else {
            self.buzzer.set_low()
        };
        if let Err(e) = result {
            Self::report(ActuatorError::GpioWriteFailed, &e);
        }
    }
}

// ── PlatformPort implementation ───────────────────────────────

impl<P, B> PlatformPort for HardwareAdapter<P, B> {
    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }

    #[cfg(target_os = "espidf")]
    fn hibernate(&mut self) {
        log::warn!("Entering deep sleep");
        // SAFETY: called from the main task with all actuators parked; the
        // chip resets on wake, so nothing after this call runs.
        unsafe {
            esp_idf_svc::sys::esp_deep_sleep_start();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn hibernate(&mut self) {
        warn!("Deep sleep requested (host build: recorded only)");
        self.hibernate_requested = true;
    }
}
