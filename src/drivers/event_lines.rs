//! Edge-triggered event lines (breach, disarm).
//!
//! ## Hardware
//!
//! Both lines are rising-edge GPIO interrupts.  The ISR does nothing but
//! latch the line's [`Event`] into the shared queue; the controller reacts
//! later, from the main loop.
//!
//! ## Gating
//!
//! Each line carries an enable flag, mirrored onto the GPIO interrupt
//! mask.  An edge on a disabled line is counted and dropped.
//!
//! | Line   | Enabled at boot | Disabled by       | Re-enabled by |
//! |--------|-----------------|-------------------|---------------|
//! | Breach | yes             | armed breach      | disarm        |
//! | Disarm | no              | disarm            | armed breach  |

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::drivers::hw_init;
use crate::events::{Event, EventQueue};
use crate::signals::SIGNALS;

/// One gated edge input.
pub struct EventLine {
    event: Event,
    gpio: i32,
    enabled: AtomicBool,
    /// Edges delivered to the queue.
    edges: AtomicU32,
    /// Edges that arrived while the line was disabled.
    suppressed: AtomicU32,
}

impl EventLine {
    pub const fn new(event: Event, gpio: i32, enabled: bool) -> Self {
        Self {
            event,
            gpio,
            enabled: AtomicBool::new(enabled),
            edges: AtomicU32::new(0),
            suppressed: AtomicU32::new(0),
        }
    }

    /// ISR body: latch this line's event if the line is enabled.
    /// Returns `true` if the event reached the queue.
    pub fn on_edge(&self, queue: &EventQueue) -> bool {
        if !self.enabled.load(Ordering::Acquire) {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.edges.fetch_add(1, Ordering::Relaxed);
        queue.push(self.event)
    }

    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::AcqRel) {
            hw_init::set_edge_interrupt(self.gpio, true);
        }
    }

    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::AcqRel) {
            hw_init::set_edge_interrupt(self.gpio, false);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn edges(&self) -> u32 {
        self.edges.load(Ordering::Relaxed)
    }

    pub fn suppressed(&self) -> u32 {
        self.suppressed.load(Ordering::Relaxed)
    }
}

/// Called from the breach GPIO ISR.
pub fn breach_isr_handler() {
    SIGNALS.breach.on_edge(&SIGNALS.events);
}

/// Called from the disarm GPIO ISR.
pub fn disarm_isr_handler() {
    SIGNALS.disarm.on_edge(&SIGNALS.events);
}
