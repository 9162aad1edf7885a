//! Fuzz target: `AppService` event loop
//!
//! Decodes the input as a stream of (opcode, argument) byte pairs and
//! drives samples, servo steps, sweeps, alarm ticks, override toggles and
//! slider commands through the service, verifying after every event:
//! - No panics
//! - Damper percentage and servo position stay within 0..=100
//! - The PID integral never goes negative
//! - Hibernation is requested at most once
//!
//! cargo fuzz run fuzz_control_loop

#![no_main]

use libfuzzer_sys::fuzz_target;

use damperctl::app::commands::AppCommand;
use damperctl::app::events::AppEvent;
use damperctl::app::ports::{ActuatorPort, EventSink, PlatformPort, SensorPort};
use damperctl::app::service::AppService;
use damperctl::config::DamperConfig;
use damperctl::events::Event;

#[derive(Default)]
struct FuzzHw {
    temperature: i32,
    manual: bool,
    hibernations: u32,
}

impl SensorPort for FuzzHw {
    fn temperature_c(&self) -> i32 {
        self.temperature
    }
    fn take_temperature_changed(&mut self) -> bool {
        false
    }
    fn manual_override(&self) -> bool {
        self.manual
    }
}

impl ActuatorPort for FuzzHw {
    fn set_servo_power(&mut self, _on: bool) {}
    fn write_servo_pulse(&mut self, _pulse_us: u16) {}
    fn set_alarm_output(&mut self, _on: bool) {}
}

impl PlatformPort for FuzzHw {
    fn delay_ms(&mut self, _ms: u32) {}
    fn hibernate(&mut self) {
        self.hibernations += 1;
    }
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut app = AppService::new(DamperConfig::default());
    let mut hw = FuzzHw::default();
    let mut sink = NullSink;
    let mut now_ms: u64 = 0;
    app.start(&hw, &mut sink);

    for pair in data.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1]);
        match op % 7 {
            0 => {
                hw.temperature = i32::from(arg) - 40;
                now_ms += 1_000;
                app.dispatch(Event::SampleArrived, now_ms, &mut hw, &mut sink);
            }
            1 => {
                now_ms += 50;
                app.dispatch(Event::ServoStep, now_ms, &mut hw, &mut sink);
            }
            2 => app.dispatch(Event::PeriodicSweep, now_ms, &mut hw, &mut sink),
            3 => app.dispatch(Event::AlarmTick, now_ms, &mut hw, &mut sink),
            4 => {
                hw.manual = !hw.manual;
                app.dispatch(Event::OverrideChanged, now_ms, &mut hw, &mut sink);
            }
            5 => {
                let _ = app.handle_command(AppCommand::ManualPosition(arg), &mut hw, &mut sink);
            }
            _ => now_ms += u64::from(arg) * 1_000,
        }

        assert!(app.percent() <= 100);
        assert!(app.servo().current() <= 100);
        assert!(app.pid().integral() >= 0.0);
        assert!(hw.hibernations <= 1);
    }
});
