//! State shared between interrupt context and the main loop.
//!
//! Everything here is lock-free or critical-section guarded and
//! `const`-constructible, so the firmware keeps one instance in a
//! `static`.  Tests build their own instances.

use crate::drivers::event_lines::EventLine;
use crate::events::{Event, EventQueue};
use crate::fsm::{Mode, ModeCell};
use crate::pins;

/// The shared signal block.
pub struct Signals {
    /// Current mode, written only by the controller.
    pub mode: ModeCell,
    /// Tick and edge events awaiting dispatch.
    pub events: EventQueue,
    pub breach: EventLine,
    pub disarm: EventLine,
}

impl Signals {
    /// Boot state: `Idle`, breach armed, disarm masked.
    pub const fn new() -> Self {
        Self {
            mode: ModeCell::new(Mode::Idle),
            events: EventQueue::new(),
            breach: EventLine::new(Event::Breach, pins::BREACH_GPIO, true),
            disarm: EventLine::new(Event::Disarm, pins::DISARM_GPIO, false),
        }
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

/// The firmware's signal block, shared with the ISRs and timer callback.
pub static SIGNALS: Signals = Signals::new();
