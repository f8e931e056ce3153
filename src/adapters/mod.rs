//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                    |
//! |------------|--------------|--------------------------------|
//! | `hardware` | OutputPort   | Stage + siren GPIO lines       |
//! |            | ArmedInput   | Day/night GPIO line            |
//! | `log_sink` | EventSink    | Serial log output              |
//!
//! The tick source implements `TickControl` directly
//! ([`TickTimer`](crate::drivers::hw_timer::TickTimer)).

pub mod hardware;
pub mod log_sink;
