//! Concrete state handler functions and table builder.
//!
//! Each mode is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!   IDLE ──[armed]──▶ STAGE1 ──[armed]──▶ STAGE2 ──▶ STAGE3 ──▶ STAGE4
//!    ▲  ◀──[day]──────┘   ▲                                      │
//!    │                    └──────────────────────────────────────┘
//!    │
//!    └─[breach, day]── any non-alarm mode ──[breach, night]──▶ ALARM_ON ⇄ ALARM_OFF
//!                                                                  │
//!                                  STAGE1 ◀────────[disarm]────────┘
//! ```
//!
//! Idle and Stage1 both sample the armed reading, so the chase only
//! continues past Stage1 once night has held for two consecutive ticks.

use super::context::FsmContext;
use super::{AlarmPhase, Mode, StateDescriptor};
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; Mode::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            mode: Mode::Idle,
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — Stage1
        StateDescriptor {
            mode: Mode::Stage1,
            on_enter: None,
            on_exit: None,
            on_update: stage1_update,
        },
        // Index 2 — Stage2
        StateDescriptor {
            mode: Mode::Stage2,
            on_enter: None,
            on_exit: None,
            on_update: stage2_update,
        },
        // Index 3 — Stage3
        StateDescriptor {
            mode: Mode::Stage3,
            on_enter: None,
            on_exit: None,
            on_update: stage3_update,
        },
        // Index 4 — Stage4
        StateDescriptor {
            mode: Mode::Stage4,
            on_enter: None,
            on_exit: Some(stage4_exit),
            on_update: stage4_update,
        },
        // Index 5 — AlarmOn
        StateDescriptor {
            mode: Mode::Alarm(AlarmPhase::On),
            on_enter: Some(alarm_on_enter),
            on_exit: None,
            on_update: alarm_on_update,
        },
        // Index 6 — AlarmOff
        StateDescriptor {
            mode: Mode::Alarm(AlarmPhase::Off),
            on_enter: None,
            on_exit: None,
            on_update: alarm_off_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE — daytime, all lines dark
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.chase_laps = 0;
    info!("IDLE: indicator dark, waiting for night");
}

fn idle_update(ctx: &mut FsmContext) -> Option<Mode> {
    if ctx.armed {
        return Some(Mode::Stage1);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  STAGE1..STAGE4 — chase sequence
// ═══════════════════════════════════════════════════════════════════════════

fn stage1_update(ctx: &mut FsmContext) -> Option<Mode> {
    // Second look at the sensor before the chase continues.
    if ctx.armed {
        Some(Mode::Stage2)
    } else {
        info!("STAGE1: armed reading dropped, back to Idle");
        Some(Mode::Idle)
    }
}

fn stage2_update(_ctx: &mut FsmContext) -> Option<Mode> {
    Some(Mode::Stage3)
}

fn stage3_update(_ctx: &mut FsmContext) -> Option<Mode> {
    Some(Mode::Stage4)
}

fn stage4_update(_ctx: &mut FsmContext) -> Option<Mode> {
    Some(Mode::Stage1)
}

fn stage4_exit(ctx: &mut FsmContext) {
    ctx.chase_laps = ctx.chase_laps.wrapping_add(1);
    debug!("STAGE4: chase lap {} complete", ctx.chase_laps);
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALARM hyperstate — flashes until disarmed
// ═══════════════════════════════════════════════════════════════════════════

fn alarm_on_enter(ctx: &mut FsmContext) {
    ctx.alarm_flashes = ctx.alarm_flashes.wrapping_add(1);
}

fn alarm_on_update(_ctx: &mut FsmContext) -> Option<Mode> {
    Some(Mode::Alarm(AlarmPhase::Off))
}

fn alarm_off_update(_ctx: &mut FsmContext) -> Option<Mode> {
    Some(Mode::Alarm(AlarmPhase::On))
}
