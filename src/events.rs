//! Interrupt-driven event system.
//!
//! Events are produced by:
//! - the tick timer callback (periodic, rate switched by the controller)
//! - GPIO ISRs on the breach and disarm edge lines
//!
//! Events are consumed by the main loop, which hands them to the
//! controller one at a time.  Handlers therefore never preempt each
//! other: an ISR only latches an event, it never touches the mode.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Tick timer  │────▶│              │     │              │
//! │ Breach ISR  │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ Disarm ISR  │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use heapless::Deque;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;

/// Signals delivered to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Periodic tick from the timer.
    Tick,
    /// Rising edge on the perimeter line.
    Breach,
    /// Rising edge on the disarm key switch.
    Disarm,
}

/// Multi-producer, single-consumer event queue.
///
/// Every access runs inside a critical section, so any number of ISRs
/// may push while the main loop pops.  `const`-constructible so it can
/// live in a `static`.
pub struct EventQueue {
    inner: Mutex<RefCell<Deque<Event, EVENT_QUEUE_CAP>>>,
    dropped: AtomicU32,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an event.  Safe to call from ISR context.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        let pushed = critical_section::with(|cs| {
            self.inner.borrow_ref_mut(cs).push_back(event).is_ok()
        });
        if !pushed {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        pushed
    }

    /// Pop the oldest pending event.
    pub fn pop(&self) -> Option<Event> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    /// Drain all pending events into a callback, in FIFO order.
    ///
    /// The critical section is released between events, so ISRs can
    /// keep latching while the handler runs.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events lost to a full queue since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
