//! Perimeter alarm firmware library.
//!
//! Exposes the controller, FSM and drivers for integration testing and
//! the host simulation.  All ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;
pub mod signals;
