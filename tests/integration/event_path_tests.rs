//! End-to-end event path: edge lines and the software tick divider feed
//! the queue, the controller drains it.
//!
//! Uses the real [`TickTimer`] (host build) so rate switches are checked
//! against actual period arithmetic.

use crate::mock_hw::{MockHardware, RecordingSink};

use perimeter::app::events::AppEvent;
use perimeter::app::service::Controller;
use perimeter::config::TimingConfig;
use perimeter::drivers::hw_timer::{TickRate, TickTimer};
use perimeter::events::{EVENT_QUEUE_CAP, Event};
use perimeter::fsm::{AlarmPhase, Mode};
use perimeter::signals::Signals;

fn make_controller(signals: &Signals, armed: bool) -> (Controller<'_, TickTimer>, MockHardware, RecordingSink) {
    let timer = TickTimer::new(&TimingConfig::default()).expect("reference timing is valid");
    let mut hw = MockHardware::new(armed);
    let mut sink = RecordingSink::new();
    let mut c = Controller::new(signals, timer);
    c.start(&mut hw, &mut sink);
    (c, hw, sink)
}

/// Let `elapsed_us` of wall time pass, queue the ticks that fell due and
/// drain the queue.
fn elapse(c: &mut Controller<'_, TickTimer>, hw: &mut MockHardware, sink: &mut RecordingSink, elapsed_us: u64) -> u32 {
    let due = c.tick_source_mut().advance(elapsed_us);
    for _ in 0..due {
        c.signals().events.push(Event::Tick);
    }
    c.run_pending(hw, sink);
    due
}

#[test]
fn one_tick_per_second_outside_the_alarm() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    assert_eq!(elapse(&mut c, &mut hw, &mut sink, 999_999), 0);
    assert_eq!(c.mode(), Mode::Idle);
    assert_eq!(elapse(&mut c, &mut hw, &mut sink, 1), 1);
    assert_eq!(c.mode(), Mode::Stage1);
}

#[test]
fn breach_switches_to_fast_rate_and_restarts_the_period() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    elapse(&mut c, &mut hw, &mut sink, 900_000);

    signals.breach.on_edge(&signals.events);
    c.run_pending(&mut hw, &mut sink);
    assert_eq!(c.tick_rate(), TickRate::Alarm);
    // The 900 ms already counted towards a normal tick are discarded.
    assert_eq!(c.tick_source().until_next_us(), 250_000);

    assert_eq!(elapse(&mut c, &mut hw, &mut sink, 1_000_000), 4);
    assert_eq!(c.mode(), Mode::Alarm(AlarmPhase::On));
}

#[test]
fn disarm_restores_the_normal_period() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    signals.breach.on_edge(&signals.events);
    c.run_pending(&mut hw, &mut sink);
    elapse(&mut c, &mut hw, &mut sink, 600_000);

    assert!(signals.disarm.on_edge(&signals.events));
    c.run_pending(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Stage1);
    assert_eq!(c.tick_rate(), TickRate::Normal);
    assert_eq!(c.tick_source().until_next_us(), 1_000_000);
    assert_eq!(c.tick_source().restarts(), 2);
}

#[test]
fn queued_events_are_handled_strictly_in_order() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);

    // Tick and breach latched back to back: the tick completes first.
    signals.events.push(Event::Tick);
    signals.breach.on_edge(&signals.events);
    signals.events.push(Event::Tick);
    assert_eq!(c.run_pending(&mut hw, &mut sink), 3);

    assert_eq!(c.mode(), Mode::Alarm(AlarmPhase::Off));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::AlarmRaised { from: Mode::Stage1, .. }
    )));
}

#[test]
fn overflowing_the_queue_is_counted() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, false);
    for _ in 0..EVENT_QUEUE_CAP + 3 {
        signals.events.push(Event::Tick);
    }
    assert_eq!(c.run_pending(&mut hw, &mut sink), EVENT_QUEUE_CAP);
    assert_eq!(c.stats().dropped_events, 3);
    assert_eq!(c.stats().ticks, EVENT_QUEUE_CAP as u64);
}

#[test]
fn lost_breach_is_reported_once_per_drain() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    for _ in 0..EVENT_QUEUE_CAP {
        signals.events.push(Event::Tick);
    }
    assert!(!signals.breach.on_edge(&signals.events));
    c.run_pending(&mut hw, &mut sink);

    let is_drop = |e: &AppEvent| matches!(e, AppEvent::EventsDropped { .. });
    assert_eq!(sink.count(is_drop), 1);
    assert!(sink.events.contains(&AppEvent::EventsDropped { lost: 1, total: 1 }));
    assert_ne!(c.mode(), Mode::Alarm(AlarmPhase::On));

    // Nothing new lost: no further report.
    signals.events.push(Event::Tick);
    c.run_pending(&mut hw, &mut sink);
    assert_eq!(sink.count(is_drop), 1);

    for _ in 0..EVENT_QUEUE_CAP + 2 {
        signals.events.push(Event::Tick);
    }
    c.run_pending(&mut hw, &mut sink);
    assert_eq!(sink.count(is_drop), 2);
    assert_eq!(sink.events.last(), Some(&AppEvent::EventsDropped { lost: 2, total: 3 }));
}
