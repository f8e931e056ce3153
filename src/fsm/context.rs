//! Shared mutable context threaded through every FSM handler.
//!
//! The controller refreshes `armed` from the day/night line immediately
//! before each tick, so handlers always see a reading taken at the
//! decision point.  Handlers write nothing back except bookkeeping.

/// The shared context passed to every state handler function.
#[derive(Debug, Clone, Default)]
pub struct FsmContext {
    // -- Inputs --
    /// Armed reading sampled for this tick (night = armed).
    pub armed: bool,

    // -- Bookkeeping --
    /// Completed laps of the Stage1..Stage4 chase.
    pub chase_laps: u32,
    /// Siren-on flashes since the last disarm.
    pub alarm_flashes: u32,
}

impl FsmContext {
    pub fn new() -> Self {
        Self::default()
    }
}
