//! Controller service — the hexagonal core.
//!
//! [`Controller`] owns the FSM, its context and the output driver, and
//! reacts to the three signals the firmware knows about.  All I/O flows
//! through port traits injected at call sites, making the whole service
//! testable with mock adapters.
//!
//! ```text
//!  ArmedInput ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       Controller        │
//!  OutputPort ◀── │  FSM · gating · rate    │ ──▶ TickControl
//!                 └────────────────────────┘
//! ```
//!
//! Handlers run one at a time from the main loop, so a breach can never
//! land in the middle of a tick step.  The tick commit still goes through
//! the [`ModeCell`](crate::fsm::ModeCell) compare-and-set.

use log::{debug, info, warn};

use crate::drivers::hw_timer::TickRate;
use crate::drivers::output::{OutputDriver, Pattern};
use crate::events::Event;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{AlarmPhase, Fsm, Mode, TickOutcome};
use crate::signals::Signals;

use super::events::AppEvent;
use super::ports::{ArmedInput, EventSink, OutputPort, TickControl};

/// Running counters, for the status log and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub ticks: u64,
    pub breaches_accepted: u32,
    pub breaches_ignored: u32,
    pub disarms: u32,
    pub disarms_ignored: u32,
    pub recoveries: u32,
    /// Events lost to a full queue (mirrors the queue's counter).
    pub dropped_events: u32,
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// The controller orchestrates all domain logic.
pub struct Controller<'a, T: TickControl> {
    fsm: Fsm<'a>,
    ctx: FsmContext,
    output: OutputDriver,
    signals: &'a Signals,
    tick: T,
    stats: ControllerStats,
}

impl<'a, T: TickControl> Controller<'a, T> {
    /// Construct over `signals`, resetting the mode to `Idle`.
    ///
    /// Does **not** touch the outputs — call [`start`](Self::start) next.
    pub fn new(signals: &'a Signals, tick: T) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), &signals.mode, Mode::Idle),
            ctx: FsmContext::new(),
            output: OutputDriver::new(),
            signals,
            tick,
            stats: ControllerStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Show the Idle pattern, set the boot line gating and normal rate.
    pub fn start(&mut self, hw: &mut impl OutputPort, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx, &mut self.output, hw);
        self.signals.breach.enable();
        self.signals.disarm.disable();
        self.tick.set_rate(TickRate::Normal);
        sink.emit(&AppEvent::Started(self.fsm.current_mode()));
        info!("Controller started in {}", self.fsm.current_mode());
    }

    // ── Signal handlers ───────────────────────────────────────

    /// Advance the FSM by one tick.
    ///
    /// The `hw` parameter satisfies **both** [`ArmedInput`] and
    /// [`OutputPort`] — this avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn on_tick(&mut self, hw: &mut (impl ArmedInput + OutputPort), sink: &mut impl EventSink) {
        self.stats.ticks += 1;
        self.ctx.armed = hw.is_armed();

        match self.fsm.tick(&mut self.ctx, &mut self.output, hw) {
            TickOutcome::Stayed(_) => {}
            TickOutcome::Moved { from, to } => {
                sink.emit(&AppEvent::StateChanged { from, to });
            }
            TickOutcome::Recovered { raw } => {
                self.stats.recoveries += 1;
                // Rate and gating may belong to whatever mode was lost.
                self.tick.set_rate(TickRate::Normal);
                self.signals.breach.enable();
                self.signals.disarm.disable();
                sink.emit(&AppEvent::Recovered { raw });
            }
            TickOutcome::Superseded => {
                debug!("Controller: tick superseded");
            }
        }
    }

    /// React to a breach edge.
    pub fn on_breach(&mut self, hw: &mut (impl ArmedInput + OutputPort), sink: &mut impl EventSink) {
        let from = self.fsm.current_mode();
        if from.is_alarm() {
            // Latched before the line was masked.
            self.stats.breaches_ignored += 1;
            sink.emit(&AppEvent::BreachIgnored { mode: from });
            return;
        }

        if !hw.is_armed() {
            self.stats.breaches_ignored += 1;
            self.fsm.force_transition(Mode::Idle, &mut self.ctx, &mut self.output, hw);
            sink.emit(&AppEvent::BreachIgnored { mode: from });
            if from != Mode::Idle {
                sink.emit(&AppEvent::StateChanged { from, to: Mode::Idle });
            }
            return;
        }

        let to = Mode::Alarm(AlarmPhase::On);
        self.signals.breach.disable();
        self.fsm.force_transition(to, &mut self.ctx, &mut self.output, hw);
        self.tick.set_rate(TickRate::Alarm);
        self.signals.disarm.enable();
        self.stats.breaches_accepted += 1;
        warn!("Breach while armed in {from}, alarm raised");
        sink.emit(&AppEvent::AlarmRaised { from, rate: TickRate::Alarm });
        sink.emit(&AppEvent::StateChanged { from, to });
    }

    /// React to a disarm edge.  Only meaningful inside the hyperstate.
    pub fn on_disarm(&mut self, hw: &mut impl OutputPort, sink: &mut impl EventSink) {
        let from = self.fsm.current_mode();
        if !from.is_alarm() {
            self.stats.disarms_ignored += 1;
            debug!("Disarm in {from} ignored, alarm not active");
            return;
        }

        let flashes = self.ctx.alarm_flashes;
        self.ctx.alarm_flashes = 0;
        self.signals.disarm.disable();
        self.signals.breach.enable();
        self.fsm.force_transition(Mode::Stage1, &mut self.ctx, &mut self.output, hw);
        self.tick.set_rate(TickRate::Normal);
        self.stats.disarms += 1;
        info!("Disarmed after {flashes} flashes");
        sink.emit(&AppEvent::AlarmSilenced { flashes });
        sink.emit(&AppEvent::StateChanged { from, to: Mode::Stage1 });
    }

    /// Route one queued event to its handler.
    pub fn dispatch(
        &mut self,
        event: Event,
        hw: &mut (impl ArmedInput + OutputPort),
        sink: &mut impl EventSink,
    ) {
        match event {
            Event::Tick => self.on_tick(hw, sink),
            Event::Breach => self.on_breach(hw, sink),
            Event::Disarm => self.on_disarm(hw, sink),
        }
    }

    /// Dispatch every pending event, oldest first.  Returns how many ran.
    pub fn run_pending(
        &mut self,
        hw: &mut (impl ArmedInput + OutputPort),
        sink: &mut impl EventSink,
    ) -> usize {
        let signals = self.signals;
        let mut handled = 0;
        signals.events.drain(|event| {
            self.dispatch(event, hw, sink);
            handled += 1;
        });
        let dropped = signals.events.dropped();
        if dropped > self.stats.dropped_events {
            let lost = dropped - self.stats.dropped_events;
            warn!("Event queue full: {lost} event(s) lost, {dropped} since boot");
            sink.emit(&AppEvent::EventsDropped { lost, total: dropped });
        }
        self.stats.dropped_events = dropped;
        handled
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.fsm.current_mode()
    }

    pub fn tick_rate(&self) -> TickRate {
        self.tick.rate()
    }

    pub fn tick_source(&self) -> &T {
        &self.tick
    }

    pub fn tick_source_mut(&mut self) -> &mut T {
        &mut self.tick
    }

    /// Pattern most recently written to the outputs.
    pub fn last_pattern(&self) -> Option<Pattern> {
        self.output.last_applied()
    }

    pub fn context(&self) -> &FsmContext {
        &self.ctx
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    pub fn signals(&self) -> &'a Signals {
        self.signals
    }
}
