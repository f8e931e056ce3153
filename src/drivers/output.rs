//! Output driver: mode → physical line pattern.
//!
//! Five output lines, all driven on every apply:
//!
//! | Bit | Line      | Lit in                 |
//! |-----|-----------|------------------------|
//! | 0   | Stage 1   | Stage1, AlarmOn        |
//! | 1   | Stage 2   | Stage2, AlarmOn        |
//! | 2   | Stage 3   | Stage3, AlarmOn        |
//! | 3   | Stage 4   | Stage4, AlarmOn        |
//! | 4   | Siren     | AlarmOn                |
//!
//! The mapping is pure and total.  [`OutputDriver`] only remembers the
//! last pattern it wrote.

use core::fmt;

use embedded_hal::digital::{Error as _, OutputPin};
use log::warn;

use crate::app::ports::OutputPort;
use crate::fsm::{AlarmPhase, Mode};

/// A 5-bit output line pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pattern(u8);

impl Pattern {
    /// Number of output lines.
    pub const WIDTH: usize = 5;
    const MASK: u8 = 0b1_1111;

    pub const OFF: Self = Self(0b0_0000);
    pub const STAGE_1: Self = Self(0b0_0001);
    pub const STAGE_2: Self = Self(0b0_0010);
    pub const STAGE_3: Self = Self(0b0_0100);
    pub const STAGE_4: Self = Self(0b0_1000);
    /// Every stage line plus the siren.
    pub const ALARM: Self = Self(0b1_1111);

    /// Build from raw bits; bits above the siren line are discarded.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The pattern shown for `mode`.
    pub const fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Idle => Self::OFF,
            Mode::Stage1 => Self::STAGE_1,
            Mode::Stage2 => Self::STAGE_2,
            Mode::Stage3 => Self::STAGE_3,
            Mode::Stage4 => Self::STAGE_4,
            Mode::Alarm(AlarmPhase::On) => Self::ALARM,
            Mode::Alarm(AlarmPhase::Off) => Self::OFF,
        }
    }

    /// Level of line `index` (0 = stage 1, 4 = siren).
    pub const fn line(self, index: usize) -> bool {
        index < Self::WIDTH && self.0 & (1 << index) != 0
    }

    pub const fn siren(self) -> bool {
        self.line(4)
    }

    /// The single lit stage line (1..=4), if exactly one is lit and the
    /// siren is off.
    pub fn lit_stage(self) -> Option<u8> {
        if self.siren() || self.0.count_ones() != 1 {
            return None;
        }
        Some(self.0.trailing_zeros() as u8 + 1)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07b}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Applies mode patterns to an [`OutputPort`] and tracks the last write.
#[derive(Debug, Default)]
pub struct OutputDriver {
    last: Option<Pattern>,
    writes: u32,
}

impl OutputDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `mode`'s pattern to `port`.  Synchronous; nothing is deferred.
    pub fn apply(&mut self, mode: Mode, port: &mut impl OutputPort) -> Pattern {
        let pattern = Pattern::for_mode(mode);
        port.write_pattern(pattern);
        self.last = Some(pattern);
        self.writes = self.writes.wrapping_add(1);
        pattern
    }

    /// Pattern written by the most recent [`apply`](Self::apply).
    pub fn last_applied(&self) -> Option<Pattern> {
        self.last
    }

    pub fn write_count(&self) -> u32 {
        self.writes
    }
}

// ---------------------------------------------------------------------------
// embedded-hal pin bank
// ---------------------------------------------------------------------------

/// The five output lines as `embedded-hal` pins.
pub struct PinBank<P: OutputPin> {
    stages: [P; 4],
    siren: P,
}

impl<P: OutputPin> PinBank<P> {
    pub fn new(stages: [P; 4], siren: P) -> Self {
        Self { stages, siren }
    }

    fn line_mut(&mut self, line: usize) -> &mut P {
        match line {
            0..=3 => &mut self.stages[line],
            _ => &mut self.siren,
        }
    }

    fn drive(pin: &mut P, line: usize, high: bool) {
        let result = if high { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            warn!("output line {} write failed: {:?}", line, e.kind());
        }
    }
}

impl<P: OutputPin> OutputPort for PinBank<P> {
    /// Pins are separate writes, so every line going low is driven before
    /// any line going high.  Between the two passes the bank shows at most
    /// the lines both patterns share, never a mix of the two.  Only the
    /// main loop writes outputs, so that window is a few microseconds.
    fn write_pattern(&mut self, pattern: Pattern) {
        for high in [false, true] {
            for line in (0..Pattern::WIDTH).filter(|&l| pattern.line(l) == high) {
                Self::drive(self.line_mut(line), line, high);
            }
        }
    }
}
