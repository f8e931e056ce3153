//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  StateTable                                               │
//! │  ┌──────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ Mode     │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├──────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Idle     │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Stage1-4 │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ AlarmOn  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ AlarmOff │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └──────────┴───────────┴──────────┴───────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine first shows the **current** mode's pattern, then
//! calls its `on_update`.  If that returns `Some(next)`, the engine
//! commits `next` to the [`ModeCell`], runs the old mode's `on_exit` and
//! the new mode's `on_enter`, and shows the new mode's pattern.  A raw mode value that decodes to no
//! mode is treated as corruption: the Idle pattern is shown and the cell
//! is reset to `Idle`.
//!
//! Breach and disarm do not go through `on_update`; the controller
//! forces those transitions with [`Fsm::force_transition`].

pub mod context;
pub mod states;

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use context::FsmContext;
use log::{debug, info, warn};

use crate::app::ports::OutputPort;
use crate::drivers::output::OutputDriver;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Phase of the alarm hyperstate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmPhase {
    /// Every line lit, siren on.
    On,
    /// Every line dark.
    Off,
}

impl AlarmPhase {
    pub const fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

/// Operating mode of the controller.
///
/// `Alarm(_)` is a closed sub-machine: ticks only toggle its phase, it is
/// entered by an armed breach and left by a disarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Idle,
    Stage1,
    Stage2,
    Stage3,
    Stage4,
    Alarm(AlarmPhase),
}

impl Mode {
    /// Total number of modes — used to size the table array.
    pub const COUNT: usize = 7;

    /// Every mode, in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Idle,
        Self::Stage1,
        Self::Stage2,
        Self::Stage3,
        Self::Stage4,
        Self::Alarm(AlarmPhase::On),
        Self::Alarm(AlarmPhase::Off),
    ];

    /// Wire value stored in the [`ModeCell`].  Zero is deliberately unused
    /// so that a cleared byte reads as corruption, not as a valid mode.
    pub const fn to_raw(self) -> u8 {
        match self {
            Self::Idle => 1,
            Self::Stage1 => 2,
            Self::Stage2 => 3,
            Self::Stage3 => 4,
            Self::Stage4 => 5,
            Self::Alarm(AlarmPhase::On) => 6,
            Self::Alarm(AlarmPhase::Off) => 7,
        }
    }

    /// Decode a raw cell value.  `None` for anything outside the seven modes.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Idle),
            2 => Some(Self::Stage1),
            3 => Some(Self::Stage2),
            4 => Some(Self::Stage3),
            5 => Some(Self::Stage4),
            6 => Some(Self::Alarm(AlarmPhase::On)),
            7 => Some(Self::Alarm(AlarmPhase::Off)),
            _ => None,
        }
    }

    /// Index into the state table.
    pub const fn index(self) -> usize {
        self.to_raw() as usize - 1
    }

    /// True inside the alarm hyperstate.
    pub const fn is_alarm(self) -> bool {
        matches!(self, Self::Alarm(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Stage1 => write!(f, "Stage1"),
            Self::Stage2 => write!(f, "Stage2"),
            Self::Stage3 => write!(f, "Stage3"),
            Self::Stage4 => write!(f, "Stage4"),
            Self::Alarm(AlarmPhase::On) => write!(f, "AlarmOn"),
            Self::Alarm(AlarmPhase::Off) => write!(f, "AlarmOff"),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode cell
// ---------------------------------------------------------------------------

/// The single piece of shared mutable state: the current mode, stored as
/// one atomic byte.
///
/// Readers in any context get a consistent value without locking.  The
/// tick path commits with [`compare_and_set`](Self::compare_and_set) so a
/// step computed from a stale read is discarded instead of overwriting a
/// newer mode.
pub struct ModeCell(AtomicU8);

impl ModeCell {
    pub const fn new(mode: Mode) -> Self {
        Self(AtomicU8::new(mode.to_raw()))
    }

    /// Current mode, or `None` if the cell holds an undefined value.
    pub fn load(&self) -> Option<Mode> {
        Mode::from_raw(self.load_raw())
    }

    pub fn load_raw(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    pub fn store(&self, mode: Mode) {
        self.0.store(mode.to_raw(), Ordering::Release);
    }

    /// Overwrite the raw byte.  Only the fault-injection paths (tests,
    /// simulation console) have a reason to store an undefined value.
    pub fn store_raw(&self, raw: u8) {
        self.0.store(raw, Ordering::Release);
    }

    /// Atomically replace `expected` with `new`.  Returns `false` (and
    /// leaves the cell untouched) if the cell no longer holds `expected`.
    pub fn compare_and_set(&self, expected: u8, new: Mode) -> bool {
        self.0
            .compare_exchange(expected, new.to_raw(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<Mode>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single mode.
pub struct StateDescriptor {
    pub mode: Mode,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// What a single [`Fsm::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The current mode's update kept it where it was.
    Stayed(Mode),
    /// A table transition was committed.
    Moved { from: Mode, to: Mode },
    /// The cell held an undefined value; it was reset to `Idle`.
    Recovered { raw: u8 },
    /// The cell changed under the tick; the step was discarded.
    Superseded,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table; the current mode lives in a borrowed
/// [`ModeCell`] so other contexts can observe it.
pub struct Fsm<'a> {
    /// Fixed-size table indexed by `Mode::index()`.
    table: [StateDescriptor; Mode::COUNT],
    current: &'a ModeCell,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current mode was entered.
    state_entry_tick: u64,
}

impl<'a> Fsm<'a> {
    /// Construct an FSM over `cell`, resetting it to `initial`.
    pub fn new(table: [StateDescriptor; Mode::COUNT], cell: &'a ModeCell, initial: Mode) -> Self {
        cell.store(initial);
        Self {
            table,
            current: cell,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` and show the starting pattern.
    /// Call once after construction, before the first `tick()`.
    pub fn start(
        &mut self,
        ctx: &mut FsmContext,
        output: &mut OutputDriver,
        port: &mut impl OutputPort,
    ) {
        let mode = self.current_mode();
        info!("FSM starting in mode: {mode}");
        if let Some(enter) = self.table[mode.index()].on_enter {
            enter(ctx);
        }
        output.apply(mode, port);
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Show the current mode's pattern.
    /// 2. Call `on_update` for the current mode.
    /// 3. If it returns `Some(next)`, commit and enter `next`.
    pub fn tick(
        &mut self,
        ctx: &mut FsmContext,
        output: &mut OutputDriver,
        port: &mut impl OutputPort,
    ) -> TickOutcome {
        self.tick_count += 1;

        let raw = self.current.load_raw();
        let Some(mode) = Mode::from_raw(raw) else {
            warn!("FSM: undefined mode value {raw:#04x}, recovering to Idle");
            output.apply(Mode::Idle, port);
            if !self.current.compare_and_set(raw, Mode::Idle) {
                return TickOutcome::Superseded;
            }
            self.state_entry_tick = self.tick_count;
            return TickOutcome::Recovered { raw };
        };

        output.apply(mode, port);
        let Some(next) = (self.table[mode.index()].on_update)(ctx) else {
            return TickOutcome::Stayed(mode);
        };

        if !self.current.compare_and_set(raw, next) {
            debug!("FSM: tick step {mode} -> {next} superseded");
            return TickOutcome::Superseded;
        }
        if let Some(exit) = self.table[mode.index()].on_exit {
            exit(ctx);
        }
        self.enter(next, ctx, output, port);
        debug!("FSM tick: {mode} -> {next}");
        TickOutcome::Moved { from: mode, to: next }
    }

    /// Force an immediate transition (used for breach and disarm, which
    /// bypass the tick table).  No-op if `next` is already current.
    pub fn force_transition(
        &mut self,
        next: Mode,
        ctx: &mut FsmContext,
        output: &mut OutputDriver,
        port: &mut impl OutputPort,
    ) {
        let prev = self.current.load();
        if prev == Some(next) {
            return;
        }

        match prev {
            Some(prev) => {
                info!("FSM transition: {prev} -> {next}");
                if let Some(exit) = self.table[prev.index()].on_exit {
                    exit(ctx);
                }
            }
            None => info!("FSM transition: <undefined> -> {next}"),
        }

        self.current.store(next);
        self.enter(next, ctx, output, port);
    }

    /// The current mode.  An undefined cell value reads as `Idle`, which is
    /// what the next tick will commit.
    pub fn current_mode(&self) -> Mode {
        self.current.load().unwrap_or(Mode::Idle)
    }

    /// How many ticks the FSM has been in the current mode.
    pub fn ticks_in_current_mode(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn enter(
        &mut self,
        next: Mode,
        ctx: &mut FsmContext,
        output: &mut OutputDriver,
        port: &mut impl OutputPort,
    ) {
        self.state_entry_tick = self.tick_count;

        if let Some(enter) = self.table[next.index()].on_enter {
            enter(ctx);
        }
        output.apply(next, port);
    }
}
