//! Application service: the hexagonal core.
//!
//! [`AppService`] owns every piece of controller state: the PID
//! accumulators, the refill history, the low-temperature watchdog, the
//! servo stepper and the alarm.  It exposes a hardware-agnostic,
//! event-driven API.  All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService          │
//! ActuatorPort ◀──│ Mode selector · PID · Refill │
//! PlatformPort ◀──│ Watchdog · Servo · Alarm     │
//!                 └──────────────────────────────┘
//! ```
//!
//! ## Event handling
//!
//! Everything runs on one thread.  [`AppService::dispatch`] takes one
//! loop [`Event`], handles it, and then drains any follow-up events the
//! handler queued (a completing servo step queues `MotionComplete`), in
//! arrival order, before returning.
//!
//! A sample that arrives while the servo is moving arms the single-slot
//! [`PendingRecalc`]; the `MotionComplete` handler takes it exactly once
//! and re-runs the mode selector against the newest reading.

use heapless::Deque;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::{DamperConfig, MAX_TARGET_TEMP_C};
use crate::control::pid::{PidGains, PidState, output_to_percent};
use crate::control::refill::RefillDetector;
use crate::drivers::alarm::AlarmCoordinator;
use crate::drivers::servo::{ServoMotion, StepOutcome};
use crate::events::Event;
use crate::safety::{HIBERNATE_SETTLE_MS, LowTempWatchdog, WatchdogState, WatchdogVerdict};

use super::commands::AppCommand;
use super::events::{AppEvent, Status, TerminalReason};
use super::pending::PendingRecalc;
use super::ports::{ActuatorPort, ConfigError, EventSink, PlatformPort, SensorPort};

/// Damper opening the controller boots with (fully open).
pub const INITIAL_PERCENT: u8 = 100;

/// Follow-up events a single dispatch can queue.
const MAILBOX_CAP: usize = 4;

// ───────────────────────────────────────────────────────────────
// Control state
// ───────────────────────────────────────────────────────────────

/// Commanded damper opening and the status label shown with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub percent: u8,
    pub status: Status,
}

/// Point-in-time view of the controller for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSnapshot {
    pub percent: u8,
    pub status: Status,
    pub servo_position: u8,
    pub servo_target: u8,
    pub servo_moving: bool,
    pub integral: f32,
    pub watchdog: WatchdogState,
    pub temperature_c: Option<i32>,
    pub manual: bool,
    pub warning: bool,
    pub recalc_pending: bool,
    pub terminal: Option<TerminalReason>,
    pub hibernated: bool,
}

/// Why the mode selector is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// A new accepted sample (immediate or deferred).  Feeds the refill history.
    Sample,
    /// The periodic sweep.  Re-evaluates without touching the history.
    Sweep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverrideEdge {
    None,
    Engaged,
    Released,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: DamperConfig,
    control: ControlState,
    pid: PidState,
    refill: RefillDetector,
    watchdog: LowTempWatchdog,
    servo: ServoMotion,
    alarm: AlarmCoordinator,
    /// Level last written to the alarm output.
    alarm_line: bool,
    pending: PendingRecalc,
    mailbox: Deque<Event, MAILBOX_CAP>,
    last_temp_c: Option<i32>,
    /// Last observed state of the manual-override switch.
    manual: bool,
    /// Percentage preserved while manual override is engaged.
    saved_percent: u8,
    /// Over-temperature warning currently raised.
    warning: bool,
    terminal: Option<TerminalReason>,
    hibernated: bool,
}

impl AppService {
    /// Construct the service from an already validated configuration.
    pub fn new(config: DamperConfig) -> Self {
        let pid = PidState::new(PidGains::from_config(&config));
        let watchdog = LowTempWatchdog::new(config.low_temp_timeout_ms);
        let servo = ServoMotion::new(INITIAL_PERCENT, config.step_interval_ms, &config.servo);

        Self {
            config,
            control: ControlState {
                percent: INITIAL_PERCENT,
                status: Status::Auto,
            },
            pid,
            refill: RefillDetector::new(),
            watchdog,
            servo,
            alarm: AlarmCoordinator::new(),
            alarm_line: false,
            pending: PendingRecalc::new(),
            mailbox: Deque::new(),
            last_temp_c: None,
            manual: false,
            saved_percent: INITIAL_PERCENT,
            warning: false,
            terminal: None,
            hibernated: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Pick up the override switch and announce the initial state.
    pub fn start(&mut self, hw: &impl SensorPort, sink: &mut impl EventSink) {
        self.manual = hw.manual_override();
        if self.manual {
            self.saved_percent = self.control.percent;
            self.control.status = Status::Manual;
        }
        sink.emit(&AppEvent::Started(self.control.percent));
        sink.emit(&AppEvent::StatusChanged(self.control.status));
        info!(
            "AppService started: damper={}% status={} target={}\u{00b0}C",
            self.control.percent, self.control.status, self.config.target_temp_c
        );
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Handle one loop event plus every follow-up event it produces.
    pub fn dispatch(
        &mut self,
        event: Event,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) {
        self.enqueue(event);
        while let Some(next) = self.mailbox.pop_front() {
            self.handle_event(next, now_ms, hw, sink);
        }
    }

    fn handle_event(
        &mut self,
        event: Event,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) {
        match event {
            Event::SampleArrived => self.on_sample(now_ms, hw, sink),
            Event::MotionComplete => self.on_motion_complete(now_ms, hw, sink),
            Event::PeriodicSweep => self.on_sweep(now_ms, hw, sink),
            Event::ServoStep => {
                if let StepOutcome::Completed { .. } = self.servo.poll(now_ms, hw) {
                    self.enqueue(Event::MotionComplete);
                }
            }
            Event::AlarmTick => {
                let level = self.alarm.tick();
                if level != self.alarm_line {
                    hw.set_alarm_output(level);
                    self.alarm_line = level;
                }
            }
            Event::OverrideChanged => {
                if self.terminal.is_some() {
                    return;
                }
                let prev = self.control;
                self.sync_override(&*hw);
                self.publish(prev, hw, sink);
            }
        }
    }

    fn on_sample(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) {
        if self.terminal.is_some() {
            return;
        }
        let t = hw.temperature_c();
        self.last_temp_c = Some(t);
        self.update_warning(t, sink);

        if self.servo.is_moving() {
            if self.pending.arm() {
                debug!("Sample {}\u{00b0}C deferred until servo stops", t);
            }
            return;
        }
        self.evaluate(now_ms, Trigger::Sample, hw, sink);
    }

    fn on_motion_complete(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) {
        sink.emit(&AppEvent::MotionComplete(self.servo.current()));

        if self.terminal.is_some() {
            self.pending.take();
            self.try_hibernate(hw, sink);
            return;
        }
        if self.pending.take() {
            debug!("Running deferred recalculation");
            self.evaluate(now_ms, Trigger::Sample, hw, sink);
        }
    }

    fn on_sweep(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) {
        if self.terminal.is_some() || !self.watchdog.is_active() {
            return;
        }
        debug!(
            "Watchdog sweep: T={:?}\u{00b0}C min={}\u{00b0}C",
            self.last_temp_c, self.config.min_temp_c
        );
        self.evaluate(now_ms, Trigger::Sweep, hw, sink);
    }

    // ── Mode selector ─────────────────────────────────────────

    /// One pass of the mode selector against the latest temperature.
    fn evaluate(
        &mut self,
        now_ms: u64,
        trigger: Trigger,
        hw: &mut (impl SensorPort + ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) {
        let Some(t) = self.last_temp_c else {
            return;
        };
        let prev = self.control;

        match self.sync_override(&*hw) {
            OverrideEdge::Released => {
                // The preserved value is redisplayed; the next sample recomputes.
                self.publish(prev, hw, sink);
                return;
            }
            OverrideEdge::Engaged | OverrideEdge::None if self.manual => {
                self.control.status = Status::Manual;
                self.publish(prev, hw, sink);
                return;
            }
            _ => {}
        }

        let cfg = &self.config;
        if self.pid.integral() >= cfg.end_trigger && t < cfg.min_temp_c {
            error!(
                "Fuel exhausted: errI={:.0} \u{2265} {:.0} and T={}\u{00b0}C below minimum",
                self.pid.integral(),
                cfg.end_trigger,
                t
            );
            self.enter_terminal(TerminalReason::FuelExhausted);
        } else {
            self.regulate(now_ms, t, trigger, sink);
        }

        self.pid.clamp_integral();
        self.publish(prev, hw, sink);
    }

    /// Normal branch of the mode selector.
    fn regulate(&mut self, now_ms: u64, t: i32, trigger: Trigger, sink: &mut impl EventSink) {
        if trigger == Trigger::Sample && self.refill.observe(t) {
            info!(
                "Refill detected: errI {:.0} -> 0 (T={}\u{00b0}C)",
                self.pid.integral(),
                t
            );
            self.pid.reset_integral();
            sink.emit(&AppEvent::RefillDetected);
        }

        let (target, min) = (self.config.target_temp_c, self.config.min_temp_c);
        if t >= target {
            self.control.percent = 0;
            self.control.status = Status::Auto;
        } else if t <= min {
            self.control.percent = 100;
            self.control.status = Status::Auto;
            if self.watchdog.arm(now_ms, t) {
                sink.emit(&AppEvent::WatchdogArmed { baseline: t });
            } else {
                self.check_watchdog(now_ms, t, sink);
            }
        } else if self.watchdog.is_active() {
            // Fire is between minimum and target: hold position while the
            // watchdog decides whether it is recovering.
            self.check_watchdog(now_ms, t, sink);
        } else {
            let raw = self.pid.step(target, t);
            self.control.percent = output_to_percent(raw);
            self.control.status = Status::Auto;
            debug!(
                "PID: T={}\u{00b0}C raw={:.2} -> {}% errI={:.0}",
                t,
                raw,
                self.control.percent,
                self.pid.integral()
            );
        }

        if self.terminal.is_none() && self.pid.integral() > self.config.refill_trigger {
            self.control.status = Status::Fill;
        }
    }

    fn check_watchdog(&mut self, now_ms: u64, t: i32, sink: &mut impl EventSink) {
        match self.watchdog.evaluate(now_ms, t) {
            WatchdogVerdict::Recovered => sink.emit(&AppEvent::WatchdogRecovered),
            WatchdogVerdict::Expired => {
                sink.emit(&AppEvent::WatchdogExpired);
                self.enter_terminal(TerminalReason::WatchdogExpired);
            }
            WatchdogVerdict::Holding | WatchdogVerdict::Idle => {}
        }
    }

    fn sync_override(&mut self, hw: &impl SensorPort) -> OverrideEdge {
        let manual = hw.manual_override();
        if manual == self.manual {
            return OverrideEdge::None;
        }
        self.manual = manual;
        if manual {
            self.saved_percent = self.control.percent;
            self.control.status = Status::Manual;
            info!("Manual override engaged at {}%", self.saved_percent);
            OverrideEdge::Engaged
        } else {
            self.control.percent = self.saved_percent;
            self.control.status = Status::Auto;
            info!("Manual override released, restoring {}%", self.saved_percent);
            OverrideEdge::Released
        }
    }

    fn update_warning(&mut self, t: i32, sink: &mut impl EventSink) {
        let over = t > self.config.warning_temp_c;
        if over == self.warning {
            return;
        }
        self.warning = over;
        if over {
            warn!(
                "Over-temperature: {}\u{00b0}C > {}\u{00b0}C",
                t, self.config.warning_temp_c
            );
            self.alarm.start();
        } else {
            info!("Temperature back below warning level");
            self.alarm.stop();
        }
        sink.emit(&AppEvent::WarningChanged(over));
    }

    // ── Terminal path ─────────────────────────────────────────

    fn enter_terminal(&mut self, reason: TerminalReason) {
        self.control.percent = 0;
        self.control.status = Status::End;
        self.terminal = Some(reason);
        warn!("Terminal state entered ({:?}); closing damper", reason);
    }

    /// Hibernate once the damper has stopped moving.  At most once.
    fn try_hibernate(
        &mut self,
        hw: &mut (impl ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) {
        let Some(reason) = self.terminal else {
            return;
        };
        if self.hibernated || self.servo.is_moving() {
            return;
        }
        self.alarm.stop();
        if self.alarm_line {
            hw.set_alarm_output(false);
            self.alarm_line = false;
        }
        hw.delay_ms(HIBERNATE_SETTLE_MS);
        self.hibernated = true;
        sink.emit(&AppEvent::HibernateRequested(reason));
        warn!("Hibernating ({:?})", reason);
        hw.hibernate();
    }

    // ── Outbound ──────────────────────────────────────────────

    /// Notify changes since `prev`, retarget the servo, and finish the
    /// terminal path if one is latched.
    fn publish(
        &mut self,
        prev: ControlState,
        hw: &mut (impl ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) {
        if self.control.percent != prev.percent {
            sink.emit(&AppEvent::PositionChanged(self.control.percent));
        }
        if self.control.status != prev.status {
            info!("Status {} -> {}", prev.status, self.control.status);
            sink.emit(&AppEvent::StatusChanged(self.control.status));
        }
        if self.servo.target() != self.control.percent {
            self.servo.set_target(self.control.percent, hw);
        }
        if self.terminal.is_some() {
            self.try_hibernate(hw, sink);
        }
    }

    fn enqueue(&mut self, event: Event) {
        if self.mailbox.push_back(event).is_err() {
            warn!("Mailbox full, dropping {:?}", event);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (settings screen, remote surface).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut (impl ActuatorPort + PlatformPort),
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        if self.terminal.is_some() {
            warn!("Ignoring {:?}: controller is shutting down", cmd);
            return Ok(());
        }
        match cmd {
            AppCommand::ManualPosition(percent) => {
                if !self.manual {
                    warn!("ManualPosition({}) ignored outside manual mode", percent);
                    return Ok(());
                }
                let prev = self.control;
                self.control.percent = percent.min(100);
                self.publish(prev, hw, sink);
            }
            AppCommand::SetTargetTemperature(target_c) => {
                if !(self.config.min_temp_c..=MAX_TARGET_TEMP_C).contains(&target_c) {
                    return Err(ConfigError::ValidationFailed(
                        "target temperature outside min..85",
                    ));
                }
                let mut next = self.config.clone();
                next.target_temp_c = target_c;
                self.apply_config(next, sink)?;
            }
            AppCommand::UpdateConfig(next) => self.apply_config(next, sink)?,
            AppCommand::SilenceAlarm => {
                self.alarm.stop();
            }
        }
        Ok(())
    }

    fn apply_config(
        &mut self,
        next: DamperConfig,
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        next.validate()?;
        self.pid.set_gains(PidGains::from_config(&next));
        self.watchdog.set_timeout_ms(next.low_temp_timeout_ms);
        self.servo.set_step_interval_ms(next.step_interval_ms);
        self.servo.set_calibration(&next.servo);
        if next.target_temp_c != self.config.target_temp_c {
            info!(
                "Target temperature {}\u{00b0}C -> {}\u{00b0}C",
                self.config.target_temp_c, next.target_temp_c
            );
        }
        self.config = next;
        sink.emit(&AppEvent::ConfigUpdated);
        info!("Configuration updated at runtime");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            percent: self.control.percent,
            status: self.control.status,
            servo_position: self.servo.current(),
            servo_target: self.servo.target(),
            servo_moving: self.servo.is_moving(),
            integral: self.pid.integral(),
            watchdog: self.watchdog.state(),
            temperature_c: self.last_temp_c,
            manual: self.manual,
            warning: self.warning,
            recalc_pending: self.pending.is_armed(),
            terminal: self.terminal,
            hibernated: self.hibernated,
        }
    }

    pub fn control(&self) -> ControlState {
        self.control
    }

    pub fn percent(&self) -> u8 {
        self.control.percent
    }

    pub fn status(&self) -> Status {
        self.control.status
    }

    pub fn pid(&self) -> &PidState {
        &self.pid
    }

    pub fn servo(&self) -> &ServoMotion {
        &self.servo
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        self.watchdog.state()
    }

    pub fn alarm_enabled(&self) -> bool {
        self.alarm.is_enabled()
    }

    pub fn is_hibernated(&self) -> bool {
        self.hibernated
    }

    pub fn terminal_reason(&self) -> Option<TerminalReason> {
        self.terminal
    }

    /// Clone of the live configuration (for read-back or delta updates).
    pub fn current_config(&self) -> DamperConfig {
        self.config.clone()
    }
}
