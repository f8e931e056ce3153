//! Mock adapters for integration tests.
//!
//! Records every output write, armed read and emitted event so tests can
//! assert on the full history without touching GPIO registers.

use perimeter::app::events::AppEvent;
use perimeter::app::ports::{ArmedInput, EventSink, OutputPort, TickControl};
use perimeter::drivers::hw_timer::TickRate;
use perimeter::drivers::output::Pattern;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub armed: bool,
    pub armed_reads: u32,
    pub writes: Vec<Pattern>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(armed: bool) -> Self {
        Self {
            armed,
            armed_reads: 0,
            writes: Vec::new(),
        }
    }

    /// Pattern currently on the lines.
    pub fn shown(&self) -> Option<Pattern> {
        self.writes.last().copied()
    }
}

impl ArmedInput for MockHardware {
    fn is_armed(&mut self) -> bool {
        self.armed_reads += 1;
        self.armed
    }
}

impl OutputPort for MockHardware {
    fn write_pattern(&mut self, pattern: Pattern) {
        self.writes.push(pattern);
    }
}

// ── MockTick ──────────────────────────────────────────────────

/// Tick source that records every rate request.
pub struct MockTick {
    pub rate: TickRate,
    pub requests: Vec<TickRate>,
}

impl MockTick {
    pub fn new() -> Self {
        Self {
            rate: TickRate::Normal,
            requests: Vec::new(),
        }
    }
}

impl Default for MockTick {
    fn default() -> Self {
        Self::new()
    }
}

impl TickControl for MockTick {
    fn set_rate(&mut self, rate: TickRate) {
        self.requests.push(rate);
        self.rate = rate;
    }

    fn rate(&self) -> TickRate {
        self.rate
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
