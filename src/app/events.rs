//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.

use crate::drivers::hw_timer::TickRate;
use crate::fsm::Mode;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started (carries initial mode).
    Started(Mode),

    /// The mode changed, by tick, breach or disarm.
    StateChanged { from: Mode, to: Mode },

    /// Armed breach: alarm hyperstate entered, tick rate switched.
    AlarmRaised { from: Mode, rate: TickRate },

    /// Disarm received inside the hyperstate.
    AlarmSilenced { flashes: u32 },

    /// Breach that did not raise the alarm: either not armed (the chase
    /// is reset to `Idle`) or the alarm was already active.
    BreachIgnored { mode: Mode },

    /// The mode cell held an undefined value and was reset to `Idle`.
    Recovered { raw: u8 },

    /// Edges or ticks lost to a full event queue since the last drain.
    /// A lost breach edge is never raised.
    EventsDropped { lost: u32, total: u32 },
}
