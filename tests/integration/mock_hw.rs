//! Mock hardware adapter for integration tests.
//!
//! Records every actuator and platform call so tests can assert on the
//! full command history without touching real GPIO/PWM registers, and
//! serves scripted temperatures and override state to the core.

use damperctl::app::events::AppEvent;
use damperctl::app::ports::{ActuatorPort, EventSink, PlatformPort, SensorPort};
use damperctl::app::service::AppService;
use damperctl::config::DamperConfig;
use damperctl::events::Event;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    ServoPower(bool),
    ServoPulse(u16),
    Alarm(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub temperature: i32,
    pub manual: bool,
    pub changed: bool,
    pub calls: Vec<ActuatorCall>,
    pub delays: Vec<u32>,
    pub hibernate_count: u32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            temperature: 24,
            manual: false,
            changed: false,
            calls: Vec::new(),
            delays: Vec::new(),
            hibernate_count: 0,
        }
    }

    pub fn last_call(&self) -> Option<&ActuatorCall> {
        self.calls.last()
    }

    pub fn pulses(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::ServoPulse(us) => Some(*us),
                _ => None,
            })
            .collect()
    }

    pub fn power_calls(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::ServoPower(on) => Some(*on),
                _ => None,
            })
            .collect()
    }

    pub fn alarm_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Alarm(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn temperature_c(&self) -> i32 {
        self.temperature
    }

    fn take_temperature_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }

    fn manual_override(&self) -> bool {
        self.manual
    }
}

impl ActuatorPort for MockHardware {
    fn set_servo_power(&mut self, on: bool) {
        self.calls.push(ActuatorCall::ServoPower(on));
    }

    fn write_servo_pulse(&mut self, pulse_us: u16) {
        self.calls.push(ActuatorCall::ServoPulse(pulse_us));
    }

    fn set_alarm_output(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Alarm(on));
    }
}

impl PlatformPort for MockHardware {
    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    fn hibernate(&mut self) {
        self.hibernate_count += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, event: &AppEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.count(event) > 0
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Scripted bench ────────────────────────────────────────────

/// Service plus mocks plus a scripted clock.
pub struct Bench {
    pub app: AppService,
    pub hw: MockHardware,
    pub sink: RecordingSink,
    pub now_ms: u64,
}

#[allow(dead_code)]
impl Bench {
    pub fn new() -> Self {
        Self::with_config(DamperConfig::default())
    }

    pub fn with_config(config: DamperConfig) -> Self {
        let mut app = AppService::new(config);
        let hw = MockHardware::new();
        let mut sink = RecordingSink::new();
        app.start(&hw, &mut sink);
        Self {
            app,
            hw,
            sink,
            now_ms: 0,
        }
    }

    pub fn dispatch(&mut self, event: Event) {
        self.app
            .dispatch(event, self.now_ms, &mut self.hw, &mut self.sink);
    }

    /// Deliver a sample at an absolute time.  The clock never runs
    /// backwards past time already spent settling the servo.
    pub fn sample_at(&mut self, temperature: i32, at_ms: u64) {
        self.now_ms = self.now_ms.max(at_ms);
        self.hw.temperature = temperature;
        self.dispatch(Event::SampleArrived);
    }

    pub fn sweep_at(&mut self, at_ms: u64) {
        self.now_ms = self.now_ms.max(at_ms);
        self.dispatch(Event::PeriodicSweep);
    }

    pub fn set_manual(&mut self, on: bool) {
        self.hw.manual = on;
        self.dispatch(Event::OverrideChanged);
    }

    /// Step the servo at 50 ms intervals until it stops, including any
    /// follow-up motion a deferred recalculation starts.
    pub fn settle(&mut self) {
        for _ in 0..1_000 {
            if !self.app.servo().is_moving() {
                return;
            }
            self.now_ms += 50;
            self.dispatch(Event::ServoStep);
        }
        panic!("servo did not settle");
    }

    /// Deliver a sample and let the servo finish whatever it starts.
    pub fn sample_settled(&mut self, temperature: i32, at_ms: u64) {
        self.sample_at(temperature, at_ms);
        self.settle();
    }
}
