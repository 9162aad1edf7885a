//! Integration tests for the sample → mode selector → servo pipeline.
//!
//! These run on the host (x86_64) and drive `AppService` through scripted
//! samples, servo steps and override toggles, asserting on the commanded
//! damper position, the status label and the outbound notifications.

use crate::mock_hw::{ActuatorCall, Bench};

use damperctl::app::commands::AppCommand;
use damperctl::app::events::{AppEvent, Status, TerminalReason};
use damperctl::config::DamperConfig;
use damperctl::events::Event;
use damperctl::safety::WatchdogState;

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_announces_fully_open_auto() {
    let b = Bench::new();
    assert_eq!(
        b.sink.events,
        vec![
            AppEvent::Started(100),
            AppEvent::StatusChanged(Status::Auto)
        ]
    );
    assert_eq!(b.app.percent(), 100);
    assert!(!b.app.servo().is_powered(), "servo starts unpowered");
    assert!(b.hw.calls.is_empty());
}

#[test]
fn start_with_override_engaged_reports_manual() {
    let mut app = damperctl::app::service::AppService::new(DamperConfig::default());
    let mut hw = crate::mock_hw::MockHardware::new();
    hw.manual = true;
    let mut sink = crate::mock_hw::RecordingSink::new();
    app.start(&hw, &mut sink);
    assert_eq!(app.status(), Status::Manual);
    assert!(sink.contains(&AppEvent::StatusChanged(Status::Manual)));
}

// ── Normal branch ─────────────────────────────────────────────

#[test]
fn at_or_above_target_closes_damper_and_leaves_watchdog_alone() {
    let mut b = Bench::new();
    b.sample_at(70, 1_000);

    assert_eq!(b.app.percent(), 0);
    assert_eq!(b.app.status(), Status::Auto);
    assert_eq!(b.app.watchdog_state(), WatchdogState::Inactive);
    assert!(b.sink.contains(&AppEvent::PositionChanged(0)));
    assert_eq!(b.app.servo().target(), 0);
    assert_eq!(b.hw.power_calls(), vec![true], "lazy power-up on first move");

    b.settle();
    assert_eq!(b.app.servo().current(), 0);
    assert_eq!(b.hw.power_calls(), vec![true, false]);
    assert_eq!(b.sink.count(&AppEvent::MotionComplete(0)), 1);
}

#[test]
fn at_or_below_minimum_opens_fully_and_arms_watchdog() {
    let mut b = Bench::new();
    b.sample_settled(70, 0); // close first so the open is observable
    b.sink.clear();

    b.sample_at(38, 10_000);
    assert_eq!(b.app.percent(), 100);
    assert_eq!(b.app.status(), Status::Auto);
    assert_eq!(
        b.app.watchdog_state(),
        WatchdogState::Active {
            started_ms: 10_000,
            baseline_c: 38
        }
    );
    assert!(b.sink.contains(&AppEvent::PositionChanged(100)));
    assert!(b.sink.contains(&AppEvent::WatchdogArmed { baseline: 38 }));

    // Re-entering the minimum branch keeps the original start and baseline.
    b.settle();
    b.sample_at(37, 20_000);
    assert_eq!(
        b.app.watchdog_state(),
        WatchdogState::Active {
            started_ms: 10_000,
            baseline_c: 38
        }
    );
    assert_eq!(b.sink.count(&AppEvent::WatchdogArmed { baseline: 38 }), 1);
}

#[test]
fn middle_band_runs_pid_with_rounded_output() {
    let mut b = Bench::new();
    // errP = 13, errI = 13, errD = 13 → 5·13 + 0.005·13 + 25·13 → clamped 100.
    b.sample_settled(55, 0);
    assert_eq!(b.app.percent(), 100);
    // errI = 26, errD = 0 → 65 + 0.13 = 65.13 → 65.
    b.sample_settled(55, 5_000);
    assert_eq!(b.app.percent(), 65);
    assert_eq!(b.app.pid().integral(), 26.0);
    assert_eq!(b.app.servo().current(), 65);
}

// ── Refill detection ──────────────────────────────────────────

#[test]
fn rising_history_signals_refill_on_tenth_sample() {
    let mut b = Bench::new();
    let mut t = 0;
    for _ in 0..5 {
        b.sample_settled(20, t);
        t += 5_000;
    }
    for _ in 0..4 {
        b.sample_settled(30, t);
        t += 5_000;
    }
    assert!(!b.sink.contains(&AppEvent::RefillDetected));

    b.sample_settled(30, t);
    assert_eq!(b.sink.count(&AppEvent::RefillDetected), 1);
    assert_eq!(b.app.pid().integral(), 0.0);
}

#[test]
fn refill_resets_integral_before_the_pid_step() {
    let mut b = Bench::new();
    let mut t = 0;
    for _ in 0..5 {
        b.sample_settled(45, t);
        t += 5_000;
    }
    for _ in 0..4 {
        b.sample_settled(55, t);
        t += 5_000;
    }
    // 5 × 23 + 4 × 13
    assert_eq!(b.app.pid().integral(), 167.0);

    b.sample_settled(55, t);
    assert_eq!(b.sink.count(&AppEvent::RefillDetected), 1);
    // Reset to zero, then this tick's error is accumulated.
    assert_eq!(b.app.pid().integral(), 13.0);
    assert_eq!(b.app.percent(), 65);
}

#[test]
fn integral_above_refill_trigger_shows_fill() {
    let cfg = DamperConfig {
        refill_trigger: 100.0,
        ..DamperConfig::default()
    };
    let mut b = Bench::with_config(cfg);
    let mut t = 0;
    // errP = 27 per sample: 27 · 4 = 108 > 100.
    for _ in 0..4 {
        b.sample_settled(41, t);
        t += 5_000;
    }
    assert_eq!(b.app.status(), Status::Fill);
    assert_eq!(b.app.status().label(), "FILL!");
    assert_eq!(b.sink.count(&AppEvent::StatusChanged(Status::Fill)), 1);
}

#[test]
fn snapshot_json_carries_display_labels() {
    let cfg = DamperConfig {
        refill_trigger: 100.0,
        ..DamperConfig::default()
    };
    let mut b = Bench::with_config(cfg);
    let json = serde_json::to_string(&b.app.snapshot()).unwrap();
    assert!(json.contains("\"status\":\"AUTO\""), "{json}");

    let mut t = 0;
    for _ in 0..4 {
        b.sample_settled(41, t);
        t += 5_000;
    }
    let json = serde_json::to_string(&b.app.snapshot()).unwrap();
    assert!(json.contains("\"status\":\"FILL!\""), "{json}");

    b.set_manual(true);
    let json = serde_json::to_string(&b.app.snapshot()).unwrap();
    assert!(json.contains("\"status\":\"MANUAL\""), "{json}");
}

// ── Pending recalculation ─────────────────────────────────────

#[test]
fn samples_during_motion_collapse_into_one_recalculation() {
    let mut b = Bench::new();
    b.sample_at(70, 0);
    assert!(b.app.servo().is_moving());

    b.sample_at(50, 1_000);
    b.sample_at(35, 2_000);
    let snap = b.app.snapshot();
    assert!(snap.recalc_pending);
    assert_eq!(snap.percent, 0, "no recomputation while moving");

    b.settle();
    // The deferred run saw only the newest reading.
    assert!(!b.app.snapshot().recalc_pending);
    assert_eq!(b.app.percent(), 100);
    assert_eq!(b.app.servo().current(), 100);
    assert_eq!(b.sink.count(&AppEvent::WatchdogArmed { baseline: 35 }), 1);
    assert_eq!(b.app.pid().integral(), 0.0, "the 50 °C sample never ran the PID");
}

#[test]
fn motion_complete_without_pending_sample_only_reports_position() {
    let mut b = Bench::new();
    b.sample_settled(70, 0);
    let before = b.app.snapshot();
    let calls_before = b.hw.calls.len();
    b.sink.clear();

    b.dispatch(Event::MotionComplete);
    assert_eq!(b.app.snapshot(), before);
    assert_eq!(b.sink.events, vec![AppEvent::MotionComplete(0)]);
    assert_eq!(b.hw.calls.len(), calls_before, "no actuator traffic");
}

// ── Manual override ───────────────────────────────────────────

#[test]
fn manual_override_isolates_control_state() {
    let mut b = Bench::new();
    b.sample_settled(55, 0);
    b.sample_settled(55, 5_000);
    assert_eq!(b.app.percent(), 65);
    let pid_before = *b.app.pid();

    b.set_manual(true);
    assert_eq!(b.app.status(), Status::Manual);
    assert!(b.sink.contains(&AppEvent::StatusChanged(Status::Manual)));

    let mut t = 10_000;
    for temp in [20, 90, 60, 41, 68, 39, 75] {
        b.sample_settled(temp, t);
        t += 5_000;
        assert_eq!(b.app.percent(), 65);
        assert_eq!(b.app.status(), Status::Manual);
    }
    assert_eq!(*b.app.pid(), pid_before);
    assert_eq!(b.app.watchdog_state(), WatchdogState::Inactive);

    b.set_manual(false);
    assert_eq!(b.app.status(), Status::Auto);
    assert_eq!(b.app.percent(), 65, "preserved value is redisplayed");
    assert_eq!(*b.app.pid(), pid_before, "release does not recompute");
}

#[test]
fn operator_slider_moves_damper_and_release_restores_saved_percent() {
    let mut b = Bench::new();
    b.sample_settled(55, 0);
    b.sample_settled(55, 5_000);

    b.set_manual(true);
    b.app
        .handle_command(AppCommand::ManualPosition(30), &mut b.hw, &mut b.sink)
        .unwrap();
    assert_eq!(b.app.percent(), 30);
    b.settle();
    assert_eq!(b.app.servo().current(), 30);

    b.set_manual(false);
    assert_eq!(b.app.percent(), 65);
    assert!(b.app.servo().is_moving());
    b.settle();
    assert_eq!(b.app.servo().current(), 65);
}

// ── Over-temperature warning ──────────────────────────────────

#[test]
fn over_temperature_sounds_alarm_until_silenced() {
    let mut b = Bench::new();
    b.sample_at(85, 0);
    assert!(b.sink.contains(&AppEvent::WarningChanged(true)));
    assert!(b.app.alarm_enabled());

    for _ in 0..3 {
        b.now_ms += 100;
        b.dispatch(Event::AlarmTick);
    }
    let alarm: Vec<_> = b
        .hw
        .calls
        .iter()
        .filter(|c| matches!(c, ActuatorCall::Alarm(_)))
        .cloned()
        .collect();
    assert_eq!(
        alarm,
        vec![
            ActuatorCall::Alarm(true),
            ActuatorCall::Alarm(false),
            ActuatorCall::Alarm(true)
        ]
    );

    b.app
        .handle_command(AppCommand::SilenceAlarm, &mut b.hw, &mut b.sink)
        .unwrap();
    assert!(!b.app.alarm_enabled());
    b.dispatch(Event::AlarmTick);
    assert!(!b.hw.alarm_on());

    // Evaluated even while the servo is still closing.
    assert!(b.app.servo().is_moving());
    b.sample_at(70, 5_000);
    assert!(b.sink.contains(&AppEvent::WarningChanged(false)));
}

// ── Fuel exhaustion (integral end trigger) ────────────────────

#[test]
fn integral_end_trigger_below_minimum_hibernates_once() {
    let cfg = DamperConfig {
        refill_trigger: 1_000.0,
        end_trigger: 5_000.0,
        ..DamperConfig::default()
    };
    let mut b = Bench::with_config(cfg);
    let mut t = 0;
    // 27 · 186 = 5022 ≥ 5000.
    for _ in 0..186 {
        b.sample_settled(41, t);
        t += 5_000;
    }
    assert_eq!(b.app.status(), Status::Fill);
    assert!(b.app.pid().integral() >= 5_000.0);

    b.sample_at(39, t);
    assert_eq!(b.app.percent(), 0);
    assert_eq!(b.app.status(), Status::End);
    assert_eq!(b.app.terminal_reason(), Some(TerminalReason::FuelExhausted));
    assert_eq!(b.hw.hibernate_count, 0, "waits for the servo to close");

    b.settle();
    assert_eq!(b.app.servo().current(), 0);
    assert_eq!(b.hw.hibernate_count, 1);
    assert_eq!(b.hw.delays, vec![1_500]);
    assert_eq!(
        b.sink
            .count(&AppEvent::HibernateRequested(TerminalReason::FuelExhausted)),
        1
    );

    // Latched: nothing moves the controller any more.
    b.sample_at(60, t + 5_000);
    b.sweep_at(t + 30_000);
    b.set_manual(true);
    b.app
        .handle_command(AppCommand::SetTargetTemperature(70), &mut b.hw, &mut b.sink)
        .unwrap();
    assert_eq!(b.app.percent(), 0);
    assert_eq!(b.app.status(), Status::End);
    assert_eq!(b.hw.hibernate_count, 1);
    assert!(b.app.is_hibernated());
}

// ── Snapshot ──────────────────────────────────────────────────

#[test]
fn snapshot_tracks_live_state() {
    let mut b = Bench::new();
    b.sample_at(38, 1_000);
    let snap = b.app.snapshot();
    assert_eq!(snap.temperature_c, Some(38));
    assert_eq!(snap.status, Status::Auto);
    assert!(matches!(snap.watchdog, WatchdogState::Active { baseline_c: 38, .. }));
    assert!(snap.terminal.is_none());

    let json = serde_json::to_string(&snap).unwrap();
    assert!(json.contains("\"temperature_c\":38"));
}
