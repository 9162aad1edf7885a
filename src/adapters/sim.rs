//! Host simulation adapter.
//!
//! [`SimHardware`] stands in for the servo, buzzer and SoC power
//! management when the firmware runs on a development machine.  It
//! records what the core commands and reads temperatures from the same
//! [`SensorFeed`] the real driver publishes into.
//!
//! [`StoveModel`] is a first-order thermal model of a wood stove: fuel
//! burns faster with more combustion air, the flue heats with the burn
//! rate and cools towards ambient.  Crude, but enough to watch a whole
//! burn cycle (heat-up, regulation, refill prompt, watchdog, hibernate)
//! on the console.

use std::sync::Arc;

use log::{debug, info};

use crate::adapters::sensor_feed::SensorFeed;
use crate::app::ports::{ActuatorPort, PlatformPort, SensorPort};

// ───────────────────────────────────────────────────────────────
// Simulated hardware
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SimHardware {
    feed: Arc<SensorFeed>,
    servo_powered: bool,
    last_pulse_us: Option<u16>,
    pulses: u32,
    alarm_on: bool,
    delayed_ms: u64,
    hibernate_requested: bool,
}

impl SimHardware {
    pub fn new(feed: Arc<SensorFeed>) -> Self {
        Self {
            feed,
            servo_powered: false,
            last_pulse_us: None,
            pulses: 0,
            alarm_on: false,
            delayed_ms: 0,
            hibernate_requested: false,
        }
    }

    pub fn feed(&self) -> &Arc<SensorFeed> {
        &self.feed
    }

    pub fn servo_powered(&self) -> bool {
        self.servo_powered
    }

    pub fn last_pulse_us(&self) -> Option<u16> {
        self.last_pulse_us
    }

    pub fn pulse_count(&self) -> u32 {
        self.pulses
    }

    pub fn alarm_on(&self) -> bool {
        self.alarm_on
    }

    /// Total time the core asked to block for.
    pub fn delayed_ms(&self) -> u64 {
        self.delayed_ms
    }

    pub fn hibernate_requested(&self) -> bool {
        self.hibernate_requested
    }
}

impl SensorPort for SimHardware {
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

impl ActuatorPort for SimHardware {
    fn set_servo_power(&mut self, on: bool) {
        if on != self.servo_powered {
            debug!("SIM servo {}", if on { "attached" } else { "detached" });
        }
        self.servo_powered = on;
    }

    fn write_servo_pulse(&mut self, pulse_us: u16) {
        self.pulses = self.pulses.wrapping_add(1);
        self.last_pulse_us = Some(pulse_us);
        debug!("SIM servo pulse {}us", pulse_us);
    }

    fn set_alarm_output(&mut self, on: bool) {
        self.alarm_on = on;
    }
}

impl PlatformPort for SimHardware {
    fn delay_ms(&mut self, ms: u32) {
        self.delayed_ms += u64::from(ms);
    }

    fn hibernate(&mut self) {
        info!("SIM deep sleep requested");
        self.hibernate_requested = true;
    }
}

// ───────────────────────────────────────────────────────────────
// Stove thermal model
// ───────────────────────────────────────────────────────────────

const AMBIENT_C: f32 = 20.0;
/// Fuel mass burned per second with the damper fully open (kg/s).
const BURN_RATE_KG_S: f32 = 0.0005;
/// Share of the full burn rate that leaks past a closed damper.
const CLOSED_DRAFT: f32 = 0.15;
/// Below this mass the fire starts starving.
const FULL_BED_KG: f32 = 2.0;
/// Flue heating per kg/s burned (°C/s per kg/s).
const HEAT_GAIN: f32 = 640.0;
/// Newtonian cooling coefficient (1/s).
const COOLING: f32 = 0.004;
/// Integration step upper bound (s).
const MAX_STEP_S: f32 = 1.0;

/// First-order stove and flue model.
#[derive(Debug, Clone, PartialEq)]
pub struct StoveModel {
    temperature_c: f32,
    fuel_kg: f32,
}

impl StoveModel {
    pub fn new(fuel_kg: f32) -> Self {
        Self {
            temperature_c: AMBIENT_C,
            fuel_kg: fuel_kg.max(0.0),
        }
    }

    /// Advance the model by `dt_ms` with the damper at `opening_pct`.
    pub fn advance(&mut self, dt_ms: u64, opening_pct: u8) {
        let open = f32::from(opening_pct.min(100)) / 100.0;
        let mut remaining = dt_ms as f32 / 1000.0;
        while remaining > 0.0 {
            let dt = remaining.min(MAX_STEP_S);
            remaining -= dt;

            let bed = (self.fuel_kg / FULL_BED_KG).min(1.0);
            let burn = BURN_RATE_KG_S * bed * (CLOSED_DRAFT + (1.0 - CLOSED_DRAFT) * open);
            self.fuel_kg = (self.fuel_kg - burn * dt).max(0.0);

            let d_temp = burn * HEAT_GAIN - COOLING * (self.temperature_c - AMBIENT_C);
            self.temperature_c += d_temp * dt;
        }
    }

    pub fn add_fuel(&mut self, kg: f32) {
        self.fuel_kg += kg.max(0.0);
        info!("SIM added {:.1} kg of wood ({:.2} kg in firebox)", kg, self.fuel_kg);
    }

    /// Flue temperature as the driver would report it (whole °C).
    pub fn temperature_c(&self) -> i32 {
        self.temperature_c.round() as i32
    }

    pub fn fuel_kg(&self) -> f32 {
        self.fuel_kg
    }
}
