//! ocfswitch library.
//!
//! Binary-switch interaction sequencer over two independent transports.
//! Exposes the pure-logic core (`app`, `fsm`, `slots`, `timers`,
//! `registry`) for integration testing, plus the host adapters used by
//! the demo binary.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod registry;
pub mod resource;
pub mod slots;
pub mod timers;

pub mod adapters;
pub mod channels;
