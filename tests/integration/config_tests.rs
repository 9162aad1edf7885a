//! Integration tests for runtime configuration: the `UpdateConfig` and
//! `SetTargetTemperature` commands and the validating config store.

use crate::mock_hw::Bench;

use damperctl::adapters::config_store::ConfigStore;
use damperctl::app::commands::AppCommand;
use damperctl::app::events::AppEvent;
use damperctl::app::ports::{ConfigError, ConfigPort};
use damperctl::config::DamperConfig;
use damperctl::safety::WatchdogState;

#[test]
fn invalid_update_is_rejected_and_nothing_changes() {
    let mut b = Bench::new();
    let bad = DamperConfig {
        min_temp_c: 30,
        ..DamperConfig::default()
    };
    let result = b
        .app
        .handle_command(AppCommand::UpdateConfig(bad), &mut b.hw, &mut b.sink);
    assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    assert_eq!(b.app.current_config(), DamperConfig::default());
    assert!(!b.sink.contains(&AppEvent::ConfigUpdated));
}

#[test]
fn gain_update_keeps_accumulated_error() {
    let mut b = Bench::new();
    b.sample_settled(55, 0);
    b.sample_settled(55, 5_000);
    let integral = b.app.pid().integral();

    let cfg = DamperConfig {
        kp: 10.0,
        ..DamperConfig::default()
    };
    b.app
        .handle_command(AppCommand::UpdateConfig(cfg), &mut b.hw, &mut b.sink)
        .unwrap();

    let gains = b.app.pid().gains();
    assert_eq!(gains.kp, 10.0);
    assert!((gains.ki - 0.01).abs() < 1e-6);
    assert_eq!(gains.kd, 50.0);
    assert_eq!(b.app.pid().integral(), integral);
    assert!(b.sink.contains(&AppEvent::ConfigUpdated));
}

#[test]
fn target_temperature_is_range_checked() {
    let mut b = Bench::new();

    for bad in [39, 40, 86] {
        let r = b.app.handle_command(
            AppCommand::SetTargetTemperature(bad),
            &mut b.hw,
            &mut b.sink,
        );
        assert!(r.is_err(), "{bad} must be rejected");
    }
    // Above the default 81 °C warning level.
    assert!(
        b.app
            .handle_command(AppCommand::SetTargetTemperature(83), &mut b.hw, &mut b.sink)
            .is_err()
    );
    assert_eq!(b.app.current_config().target_temp_c, 68);

    b.app
        .handle_command(AppCommand::SetTargetTemperature(60), &mut b.hw, &mut b.sink)
        .unwrap();
    assert_eq!(b.app.current_config().target_temp_c, 60);

    // The new setpoint drives the next evaluation.
    b.sample_at(62, 0);
    assert_eq!(b.app.percent(), 0);
}

#[test]
fn new_timeout_applies_from_next_arming() {
    let mut b = Bench::new();
    b.sample_at(40, 0);

    let cfg = DamperConfig {
        low_temp_timeout_ms: 60_000,
        ..DamperConfig::default()
    };
    b.app
        .handle_command(AppCommand::UpdateConfig(cfg), &mut b.hw, &mut b.sink)
        .unwrap();

    // The running window keeps its original four-minute deadline.
    b.sweep_at(120_000);
    assert!(matches!(b.app.watchdog_state(), WatchdogState::Active { .. }));

    // Recover, then re-arm under the shorter timeout.
    b.sample_at(45, 130_000);
    assert_eq!(b.app.watchdog_state(), WatchdogState::Inactive);
    b.sample_settled(40, 140_000);
    b.sweep_at(200_001);
    assert_eq!(b.app.watchdog_state(), WatchdogState::Expired);
}

#[test]
fn store_validates_at_the_write_boundary() {
    let mut store = ConfigStore::new();
    assert_eq!(store.load(), Ok(DamperConfig::default()));

    let tuned = DamperConfig {
        target_temp_c: 72,
        step_interval_ms: 80,
        ..DamperConfig::default()
    };
    store.save(&tuned).unwrap();
    assert_eq!(store.load(), Ok(tuned.clone()));

    let bad = DamperConfig {
        low_temp_timeout_ms: 90_000, // not whole minutes
        ..DamperConfig::default()
    };
    assert_eq!(
        store.save(&bad),
        Err(ConfigError::ValidationFailed(
            "low_temp_timeout_ms must be whole minutes"
        ))
    );
    assert_eq!(store.load(), Ok(tuned));
}
