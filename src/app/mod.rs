//! Application core: pure domain logic with no I/O.
//!
//! The sequencer talks to the outside world only through the port traits
//! in [`ports`]; adapters feed it [`inbound::Delivery`] values and receive
//! [`events::AppEvent`] lines.

pub mod events;
pub mod inbound;
pub mod ports;
pub mod service;
