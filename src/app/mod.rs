//! Application core — domain logic, no direct I/O.
//!
//! The [`service::Controller`] orchestrates the FSM, the tick rate and the
//! event-line gating.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
