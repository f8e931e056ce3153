//! Integration tests for the Controller → FSM → output pipeline.
//!
//! Each test drives the controller's handlers directly, the way the main
//! loop does after draining the queue, and asserts on mode, tick rate,
//! line gating and the pattern on the mock output lines.

use crate::mock_hw::{MockHardware, MockTick, RecordingSink};

use perimeter::app::events::AppEvent;
use perimeter::app::service::Controller;
use perimeter::drivers::hw_timer::TickRate;
use perimeter::drivers::output::Pattern;
use perimeter::fsm::{AlarmPhase, Mode};
use perimeter::signals::Signals;

const ALARM_ON: Mode = Mode::Alarm(AlarmPhase::On);
const ALARM_OFF: Mode = Mode::Alarm(AlarmPhase::Off);

fn make_controller(
    signals: &Signals,
    armed: bool,
) -> (Controller<'_, MockTick>, MockHardware, RecordingSink) {
    let mut hw = MockHardware::new(armed);
    let mut sink = RecordingSink::new();
    let mut c = Controller::new(signals, MockTick::new());
    c.start(&mut hw, &mut sink);
    (c, hw, sink)
}

/// Tick an armed controller from Idle into `target` (a non-alarm mode).
fn drive_to(c: &mut Controller<'_, MockTick>, hw: &mut MockHardware, sink: &mut RecordingSink, target: Mode) {
    let was = hw.armed;
    hw.armed = true;
    for _ in 0..8 {
        if c.mode() == target {
            break;
        }
        c.on_tick(hw, sink);
    }
    hw.armed = was;
    assert_eq!(c.mode(), target, "could not reach {target}");
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boots_idle_with_dark_outputs() {
    let signals = Signals::new();
    let (c, hw, sink) = make_controller(&signals, false);
    assert_eq!(c.mode(), Mode::Idle);
    assert_eq!(hw.shown(), Some(Pattern::OFF));
    assert_eq!(c.tick_rate(), TickRate::Normal);
    assert_eq!(sink.events, vec![AppEvent::Started(Mode::Idle)]);
}

// ── Tick table ────────────────────────────────────────────────

#[test]
fn idle_stays_idle_through_the_day() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, false);
    for _ in 0..100 {
        c.on_tick(&mut hw, &mut sink);
        assert_eq!(c.mode(), Mode::Idle);
    }
    assert!(hw.writes.iter().all(|p| *p == Pattern::OFF));
    assert_eq!(hw.armed_reads, 100);
}

#[test]
fn two_armed_ticks_show_the_second_line() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);

    c.on_tick(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Stage1);
    assert_eq!(hw.shown(), Some(Pattern::STAGE_1));

    c.on_tick(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Stage2);
    assert_eq!(hw.shown().and_then(Pattern::lit_stage), Some(2));
}

#[test]
fn night_must_hold_for_two_ticks() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    c.on_tick(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Stage1);

    // One armed reading is not enough.
    hw.armed = false;
    c.on_tick(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Idle);
    assert_eq!(hw.shown(), Some(Pattern::OFF));
}

#[test]
fn chase_cycles_indefinitely() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    drive_to(&mut c, &mut hw, &mut sink, Mode::Stage2);
    hw.armed = true;

    let expected = [Mode::Stage3, Mode::Stage4, Mode::Stage1, Mode::Stage2];
    for lap in 0..25 {
        for want in expected {
            c.on_tick(&mut hw, &mut sink);
            assert_eq!(c.mode(), want, "lap {lap}");
            assert_eq!(hw.shown(), Some(Pattern::for_mode(want)));
        }
    }
    assert_eq!(c.context().chase_laps, 25);
}

#[test]
fn later_stages_run_on_through_daybreak() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    drive_to(&mut c, &mut hw, &mut sink, Mode::Stage2);

    hw.armed = false;
    c.on_tick(&mut hw, &mut sink);
    c.on_tick(&mut hw, &mut sink);
    c.on_tick(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Stage1);
    c.on_tick(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Idle);
}

// ── Breach ────────────────────────────────────────────────────

#[test]
fn armed_breach_from_every_non_alarm_mode_raises_alarm() {
    for start in [Mode::Idle, Mode::Stage1, Mode::Stage2, Mode::Stage3, Mode::Stage4] {
        let signals = Signals::new();
        let (mut c, mut hw, mut sink) = make_controller(&signals, true);
        drive_to(&mut c, &mut hw, &mut sink, start);

        c.on_breach(&mut hw, &mut sink);
        assert_eq!(c.mode(), ALARM_ON, "from {start}");
        assert_eq!(c.tick_rate(), TickRate::Alarm, "from {start}");
        assert_eq!(hw.shown(), Some(Pattern::ALARM));
        assert!(hw.shown().is_some_and(Pattern::siren));
        assert!(!signals.breach.is_enabled());
        assert!(signals.disarm.is_enabled());
        assert!(sink.events.contains(&AppEvent::AlarmRaised { from: start, rate: TickRate::Alarm }));
    }
}

#[test]
fn unarmed_breach_resets_to_idle_without_rate_change() {
    for start in [Mode::Idle, Mode::Stage1, Mode::Stage2, Mode::Stage3, Mode::Stage4] {
        let signals = Signals::new();
        let (mut c, mut hw, mut sink) = make_controller(&signals, true);
        drive_to(&mut c, &mut hw, &mut sink, start);
        let requests_before = c.tick_source().requests.len();

        hw.armed = false;
        c.on_breach(&mut hw, &mut sink);
        assert_eq!(c.mode(), Mode::Idle, "from {start}");
        assert_eq!(hw.shown(), Some(Pattern::OFF));
        assert_eq!(c.tick_rate(), TickRate::Normal);
        assert_eq!(c.tick_source().requests.len(), requests_before);
        assert!(signals.breach.is_enabled());
        assert!(sink.events.contains(&AppEvent::BreachIgnored { mode: start }));
    }
}

#[test]
fn breach_reads_armed_at_the_moment_it_arrives() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, false);
    c.on_tick(&mut hw, &mut sink);
    let reads = hw.armed_reads;

    hw.armed = true;
    c.on_breach(&mut hw, &mut sink);
    assert_eq!(hw.armed_reads, reads + 1);
    assert_eq!(c.mode(), ALARM_ON);
}

// ── Alarm hyperstate ──────────────────────────────────────────

#[test]
fn ticks_toggle_the_hyperstate_and_never_leave_it() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    c.on_breach(&mut hw, &mut sink);

    for i in 0..40 {
        // The armed reading has no say inside the hyperstate.
        hw.armed = i % 3 == 0;
        let before = c.mode();
        c.on_tick(&mut hw, &mut sink);
        let after = c.mode();
        assert!(after.is_alarm());
        assert_ne!(before, after);
        let expected = if after == ALARM_ON { Pattern::ALARM } else { Pattern::OFF };
        assert_eq!(hw.shown(), Some(expected));
    }
    assert_eq!(c.tick_rate(), TickRate::Alarm);
}

#[test]
fn breach_edges_are_masked_while_alarm_is_active() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    c.on_breach(&mut hw, &mut sink);

    assert!(!signals.breach.on_edge(&signals.events));
    assert!(signals.events.is_empty());
    assert_eq!(signals.breach.suppressed(), 1);
}

// ── Disarm ────────────────────────────────────────────────────

#[test]
fn disarm_from_either_phase_returns_to_stage1() {
    for phase in [ALARM_ON, ALARM_OFF] {
        let signals = Signals::new();
        let (mut c, mut hw, mut sink) = make_controller(&signals, true);
        c.on_breach(&mut hw, &mut sink);
        if phase == ALARM_OFF {
            c.on_tick(&mut hw, &mut sink);
        }
        assert_eq!(c.mode(), phase);

        c.on_disarm(&mut hw, &mut sink);
        assert_eq!(c.mode(), Mode::Stage1);
        assert_eq!(c.tick_rate(), TickRate::Normal);
        assert_eq!(hw.shown(), Some(Pattern::STAGE_1));
        assert!(signals.breach.is_enabled());
        assert!(!signals.disarm.is_enabled());
        assert!(sink.events.contains(&AppEvent::StateChanged { from: phase, to: Mode::Stage1 }));
    }
}

#[test]
fn breach_right_after_disarm_is_accepted() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    c.on_breach(&mut hw, &mut sink);
    c.on_disarm(&mut hw, &mut sink);

    assert!(signals.breach.on_edge(&signals.events));
    c.run_pending(&mut hw, &mut sink);
    assert_eq!(c.mode(), ALARM_ON);
    assert_eq!(c.stats().breaches_accepted, 2);
    assert_eq!(c.stats().disarms, 1);
}

#[test]
fn disarm_edges_are_masked_outside_the_alarm() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    drive_to(&mut c, &mut hw, &mut sink, Mode::Stage3);

    assert!(!signals.disarm.on_edge(&signals.events));
    // A direct call is ignored too.
    c.on_disarm(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Stage3);
    assert_eq!(c.stats().disarms_ignored, 1);
}

#[test]
fn stage1_after_disarm_still_needs_night() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    c.on_breach(&mut hw, &mut sink);
    c.on_disarm(&mut hw, &mut sink);

    hw.armed = false;
    c.on_tick(&mut hw, &mut sink);
    assert_eq!(hw.writes[hw.writes.len() - 2], Pattern::STAGE_1);
    assert_eq!(c.mode(), Mode::Idle);
}

// ── Corruption ────────────────────────────────────────────────

#[test]
fn undefined_mode_value_recovers_to_idle() {
    for raw in [0u8, 8, 0x42, 0xFF] {
        let signals = Signals::new();
        let (mut c, mut hw, mut sink) = make_controller(&signals, true);
        drive_to(&mut c, &mut hw, &mut sink, Mode::Stage3);

        signals.mode.store_raw(raw);
        c.on_tick(&mut hw, &mut sink);
        assert_eq!(signals.mode.load(), Some(Mode::Idle), "raw {raw:#x}");
        assert_eq!(hw.shown(), Some(Pattern::OFF));
        assert!(sink.events.contains(&AppEvent::Recovered { raw }));
    }
}

#[test]
fn recovery_from_corrupted_alarm_restores_normal_operation() {
    let signals = Signals::new();
    let (mut c, mut hw, mut sink) = make_controller(&signals, true);
    c.on_breach(&mut hw, &mut sink);

    signals.mode.store_raw(0);
    c.on_tick(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Idle);
    assert_eq!(c.tick_rate(), TickRate::Normal);
    assert!(signals.breach.is_enabled());
    assert!(!signals.disarm.is_enabled());

    // Next armed tick resumes the chase.
    c.on_tick(&mut hw, &mut sink);
    assert_eq!(c.mode(), Mode::Stage1);
}
