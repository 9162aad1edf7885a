//! Fuzz target: configuration boundary
//!
//! Parses arbitrary bytes as a JSON `DamperConfig`.  Anything that passes
//! `validate()` must be accepted by the config store, survive a load, and
//! run a burst of samples and servo steps through `AppService` without
//! panicking (no division by zero in the pulse mapping, no overflow in
//! the PID).
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;

use damperctl::adapters::config_store::ConfigStore;
use damperctl::app::commands::AppCommand;
use damperctl::app::events::AppEvent;
use damperctl::app::ports::{ActuatorPort, ConfigPort, EventSink, PlatformPort, SensorPort};
use damperctl::app::service::AppService;
use damperctl::config::DamperConfig;
use damperctl::events::Event;

struct Rig {
    temperature: i32,
}

impl SensorPort for Rig {
    fn temperature_c(&self) -> i32 {
        self.temperature
    }
    fn take_temperature_changed(&mut self) -> bool {
        false
    }
    fn manual_override(&self) -> bool {
        false
    }
}

impl ActuatorPort for Rig {
    fn set_servo_power(&mut self, _on: bool) {}
    fn write_servo_pulse(&mut self, _pulse_us: u16) {}
    fn set_alarm_output(&mut self, _on: bool) {}
}

impl PlatformPort for Rig {
    fn delay_ms(&mut self, _ms: u32) {}
    fn hibernate(&mut self) {}
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = serde_json::from_slice::<DamperConfig>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        let mut store = ConfigStore::new();
        assert!(store.save(&cfg).is_err(), "store accepted an invalid config");
        return;
    }

    let mut store = ConfigStore::new();
    store.save(&cfg).expect("valid config rejected by store");
    assert_eq!(store.load().expect("stored config failed to load"), cfg);

    let mut app = AppService::new(DamperConfig::default());
    let mut rig = Rig { temperature: 20 };
    let mut sink = NullSink;
    app.handle_command(AppCommand::UpdateConfig(cfg), &mut rig, &mut sink)
        .expect("valid config rejected by service");

    let mut now_ms = 0;
    for t in [20, 90, 55, 30, 70, 45] {
        rig.temperature = t;
        now_ms += 5_000;
        app.dispatch(Event::SampleArrived, now_ms, &mut rig, &mut sink);
        for _ in 0..120 {
            now_ms += 200;
            app.dispatch(Event::ServoStep, now_ms, &mut rig, &mut sink);
        }
    }
});
