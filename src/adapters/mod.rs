//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `hardware`     | SensorPort         | Shared `SensorFeed`          |
//! |                | ActuatorPort       | Servo PWM (LEDC), buzzer GPIO|
//! |                | PlatformPort       | FreeRTOS delay, deep sleep   |
//! | `sim`          | Sensor/Actuator/   | Host simulation + stove model|
//! |                | PlatformPort       |                              |
//! | `sensor_feed`  | SensorPort         | Temperature driver, display  |
//! | `log_sink`     | EventSink          | Serial log output            |
//! | `config_store` | ConfigPort         | In-memory JSON blob          |
//! | `time`         | (uptime clock)     | ESP32 system timer / Instant |

pub mod config_store;
pub mod hardware;
pub mod log_sink;
pub mod sensor_feed;
#[cfg(not(target_os = "espidf"))]
pub mod sim;
pub mod time;
