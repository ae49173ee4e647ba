//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements    | Connects to                      |
//! |---------------|---------------|----------------------------------|
//! | `config_file` | ConfigPort    | JSON file on disk                |
//! | `log_sink`    | EventSink     | `log` facade + text transcript   |
//! | `sim_network` | TransportPort | Simulated stack on an I/O thread |
//! | `time`        | TimePort      | `std::time::Instant`             |

pub mod config_file;
pub mod log_sink;
pub mod sim_network;
pub mod time;
