//! Damper controller firmware: main entry point.
//!
//! Hexagonal architecture with a single-threaded, event-driven loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter / SimHardware   LogEventSink   ConfigStore    │
//! │  (Sensor+Actuator+Platform)      (EventSink)    (ConfigPort)   │
//! │  SensorFeed ◀── temperature driver, override switch            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Mode selector · PID · Refill · Watchdog · Servo       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Loop timers: servo step · alarm tick · watchdog sweep         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use damperctl::adapters::config_store::ConfigStore;
use damperctl::adapters::log_sink::LogEventSink;
use damperctl::adapters::sensor_feed::SensorFeed;
use damperctl::adapters::time::UptimeClock;
use damperctl::app::ports::{ActuatorPort, ConfigPort, PlatformPort, SensorPort};
use damperctl::app::service::AppService;
use damperctl::config::DamperConfig;
use damperctl::error::Error;
use damperctl::drivers::alarm::ALARM_TICK_MS;
use damperctl::drivers::servo::STEP_POLL_MS;
use damperctl::events::{self, Event, push_event};
use damperctl::pins;
use damperctl::safety::SWEEP_INTERVAL_MS;

/// Idle time between loop iterations.
const LOOP_IDLE_MS: u32 = 1;
/// Period of the JSON status snapshot in the log.
const SNAPSHOT_INTERVAL_MS: u64 = 60_000;

// ── Loop timers ───────────────────────────────────────────────

/// Fixed-period software timer driven by the uptime clock.
struct Cadence {
    period_ms: u64,
    next_ms: u64,
}

impl Cadence {
    fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            next_ms: now_ms + period_ms,
        }
    }

    fn due(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_ms {
            return false;
        }
        self.next_ms = now_ms + self.period_ms;
        true
    }
}

fn push_or_warn(event: Event) {
    if !push_event(event) {
        warn!("Event queue full, dropped {:?}", event);
    }
}

/// Idle the main task between loop iterations.
#[cfg(target_os = "espidf")]
fn idle() {
    esp_idf_svc::hal::delay::FreeRtos::delay_ms(LOOP_IDLE_MS);
}

/// Idle the main task between loop iterations.
#[cfg(not(target_os = "espidf"))]
fn idle() {
    std::thread::sleep(std::time::Duration::from_millis(u64::from(LOOP_IDLE_MS)));
}

fn load_config(store: &ConfigStore) -> DamperConfig {
    match store.load() {
        Ok(cfg) => {
            info!("Config loaded");
            cfg
        }
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            DamperConfig::default()
        }
    }
}

fn log_snapshot(app: &AppService) {
    match serde_json::to_string(&app.snapshot()) {
        Ok(json) => info!("SNAPSHOT | {}", json),
        Err(e) => warn!("Snapshot serialisation failed: {}", e),
    }
}

/// Run the controller until it hibernates.
///
/// `side` runs once per iteration before inputs are polled; the host
/// simulation uses it to advance the stove model.
fn run_event_loop<H>(
    app: &mut AppService,
    hw: &mut H,
    sink: &mut LogEventSink,
    clock: &UptimeClock,
    mut side: impl FnMut(u64, &AppService, &mut H),
) where
    H: SensorPort + ActuatorPort + PlatformPort,
{
    let start_ms = clock.uptime_ms();
    let mut servo_timer = Cadence::new(u64::from(STEP_POLL_MS), start_ms);
    let mut alarm_timer = Cadence::new(u64::from(ALARM_TICK_MS), start_ms);
    let mut sweep_timer = Cadence::new(SWEEP_INTERVAL_MS, start_ms);
    let mut snapshot_timer = Cadence::new(SNAPSHOT_INTERVAL_MS, start_ms);
    let mut manual_seen = hw.manual_override();

    info!("System ready. Entering event loop.");

    while !app.is_hibernated() {
        let now_ms = clock.uptime_ms();
        side(now_ms, &*app, &mut *hw);

        // ── Inputs (sensor change edge, override switch) ──────
        if hw.take_temperature_changed() {
            push_or_warn(Event::SampleArrived);
        }
        let manual = hw.manual_override();
        if manual != manual_seen {
            manual_seen = manual;
            push_or_warn(Event::OverrideChanged);
        }

        // ── Timers ────────────────────────────────────────────
        if servo_timer.due(now_ms) {
            push_or_warn(Event::ServoStep);
        }
        if alarm_timer.due(now_ms) {
            push_or_warn(Event::AlarmTick);
        }
        if sweep_timer.due(now_ms) {
            push_or_warn(Event::PeriodicSweep);
        }

        events::drain_events(|event| app.dispatch(event, now_ms, hw, sink));

        if snapshot_timer.due(now_ms) {
            log_snapshot(app);
        }

        idle();
    }

    log_snapshot(app);
    info!("Controller hibernated, leaving event loop");
}

fn banner() {
    info!("╔══════════════════════════════════════╗");
    info!("║  damperctl v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!(
        "Pins: servo PWM GPIO{} @ {} Hz ({}-bit), buzzer GPIO{}",
        pins::SERVO_PWM_GPIO,
        pins::SERVO_PWM_FREQ_HZ,
        pins::SERVO_PWM_RESOLUTION_BITS,
        pins::BUZZER_GPIO
    );
}

// ── Device entry point ────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use esp_idf_svc::hal::gpio::PinDriver;
    use esp_idf_svc::hal::ledc::config::TimerConfig;
    use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::prelude::*;

    use damperctl::adapters::hardware::HardwareAdapter;

    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    banner();

    // ── 2. Configuration ──────────────────────────────────────
    let store = ConfigStore::new();
    let config = load_config(&store);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take().map_err(|_| Error::Init("peripherals already taken"))?;
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(pins::SERVO_PWM_FREQ_HZ.Hz())
            .resolution(Resolution::Bits14),
    )?;
    let servo_pwm = LedcDriver::new(peripherals.ledc.channel0, &timer, peripherals.pins.gpio5)?;
    let buzzer = PinDriver::output(peripherals.pins.gpio14)?;

    // The temperature driver task and the display publish into `feed`.
    let feed = Arc::new(SensorFeed::new());
    let mut hw = HardwareAdapter::new(feed, servo_pwm, buzzer);
    let mut sink = LogEventSink::new();
    let clock = UptimeClock::new();

    // ── 4. Application core ───────────────────────────────────
    let mut app = AppService::new(config);
    app.start(&hw, &mut sink);

    // ── 5. Event loop (hibernate does not return on hardware) ─
    run_event_loop(&mut app, &mut hw, &mut sink, &clock, |_, _, _| {});
    Ok(())
}

// ── Host simulation entry point ───────────────────────────────

/// Simulated time runs this many times faster than wall time.
#[cfg(not(target_os = "espidf"))]
const SIM_SPEEDUP: u32 = 50;
/// Wood in the firebox at start and per refill (kg).
#[cfg(not(target_os = "espidf"))]
const SIM_FUEL_LOAD_KG: f32 = 3.0;

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use damperctl::adapters::sim::{SimHardware, StoveModel};
    use damperctl::app::events::Status;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(filter)
        .init();
    banner();
    info!("Host simulation, {}x speed-up", SIM_SPEEDUP);

    let store = ConfigStore::with_config(&DamperConfig::default()).map_err(Error::from)?;
    let config = load_config(&store);
    let sample_interval_ms = u64::from(config.sample_interval_ms);

    let feed = Arc::new(SensorFeed::new());
    let mut hw = SimHardware::new(feed);
    let mut sink = LogEventSink::new();
    let clock = UptimeClock::accelerated(SIM_SPEEDUP);

    let mut app = AppService::new(config);
    app.start(&hw, &mut sink);

    let mut stove = StoveModel::new(SIM_FUEL_LOAD_KG);
    // First reading right away, then every sample interval.
    let mut sampler = Cadence {
        period_ms: sample_interval_ms,
        next_ms: 0,
    };
    let mut last_ms = 0;
    let mut refilled = false;

    run_event_loop(&mut app, &mut hw, &mut sink, &clock, |now_ms, app, hw| {
        if !sampler.due(now_ms) {
            return;
        }
        stove.advance(now_ms.saturating_sub(last_ms), app.servo().current());
        last_ms = now_ms;
        hw.feed().publish_temperature(stove.temperature_c());

        // The operator answers the first refill prompt, then walks away.
        if app.status() == Status::Fill && !refilled {
            stove.add_fuel(SIM_FUEL_LOAD_KG);
            refilled = true;
        }
    });

    info!(
        "Simulation finished: {} servo pulses, {} events, {:.2} kg wood left, deep sleep={}",
        hw.pulse_count(),
        sink.emitted(),
        stove.fuel_kg(),
        hw.hibernate_requested()
    );
    Ok(())
}
