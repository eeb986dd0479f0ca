//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `hardware` | SensorPort         | embedded-hal input pins     |
//! |            | ActuatorPort       | embedded-hal output pins    |
//! | `log_sink` | EventSink          | `log` facade                |
//! | `storage`  | StoragePort        | in-memory key-value store   |
//! |            | ConfigPort         | versioned config blob       |
//! | `time`     | TimePort           | std clock / simulated clock |
//! | `sim_pins` | InputPin/OutputPin | shared simulated lines      |

pub mod hardware;
pub mod log_sink;
pub mod sim_pins;
pub mod storage;
pub mod time;
