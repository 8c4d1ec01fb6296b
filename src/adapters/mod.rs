//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `config_file`  | ConfigPort         | JSON file on disk            |
//! | `hardware`     | HeaterActuator     | relay `OutputPin`s           |
//! |                | LightActuator      | LED `SetDutyCycle`           |
//! | `host`         | HostProbe          | vcgencmd / sysfs thermal     |
//! | `json_sink`    | LogSink            | JSON lines on any `Write`    |
//! | `log_sink`     | EventSink          | `log` facade                 |
//! | `signal`       | StopFlag           | SIGINT / SIGTERM             |
//! | `sim`          | RawSensorSource    | in-memory board              |
//! |                | HeaterActuator     |                              |
//! |                | LightActuator      |                              |
//! | `time`         | Clock              | host local time              |
//! |                | DelayNs            | `thread::sleep`              |

pub mod config_file;
pub mod hardware;
pub mod host;
pub mod json_sink;
pub mod log_sink;
pub mod signal;
pub mod sim;
pub mod time;
