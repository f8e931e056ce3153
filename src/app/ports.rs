//! Port traits — the hexagonal boundary between the controller and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (output lines, the day/night input, the tick timer,
//! event sinks) implement these traits.  The
//! [`Controller`](super::service::Controller) consumes them via generics,
//! so the domain core never touches hardware directly.

use crate::drivers::hw_timer::TickRate;
use crate::drivers::output::Pattern;

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the five output lines.
pub trait OutputPort {
    /// Drive all lines to `pattern` in one call.
    fn write_pattern(&mut self, pattern: Pattern);
}

// ───────────────────────────────────────────────────────────────
// Armed input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the day/night line.
///
/// Implementations must read the line on every call; the controller relies
/// on getting a fresh value at each decision point.
pub trait ArmedInput {
    /// `true` when the system is armed (night).
    fn is_armed(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Tick control port (domain → tick source)
// ───────────────────────────────────────────────────────────────

/// Rate control over the periodic tick source.
pub trait TickControl {
    /// Switch the tick rate.  The new period applies from the next tick;
    /// the partially elapsed period is discarded.
    fn set_rate(&mut self, rate: TickRate);

    /// Rate currently in effect.
    fn rate(&self) -> TickRate;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
