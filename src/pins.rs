//! GPIO pin assignments for the perimeter controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Chase indicator (4 sequence-position LEDs, left to right)
// ---------------------------------------------------------------------------

pub const STAGE_1_GPIO: i32 = 1;
pub const STAGE_2_GPIO: i32 = 2;
pub const STAGE_3_GPIO: i32 = 3;
pub const STAGE_4_GPIO: i32 = 4;

/// Stage lines in display order; index `n` is lit in `Stage{n+1}`.
pub const STAGE_GPIOS: [i32; 4] = [STAGE_1_GPIO, STAGE_2_GPIO, STAGE_3_GPIO, STAGE_4_GPIO];

// ---------------------------------------------------------------------------
// Alarm output
// ---------------------------------------------------------------------------

/// Siren / strobe driver (active HIGH).
pub const SIREN_GPIO: i32 = 5;

/// Every output line, in pattern bit order (bit 0 = stage 1, bit 4 = siren).
pub const OUTPUT_GPIOS: [i32; 5] = [
    STAGE_1_GPIO,
    STAGE_2_GPIO,
    STAGE_3_GPIO,
    STAGE_4_GPIO,
    SIREN_GPIO,
];

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Perimeter loop / beam receiver.  Rising edge = breach.
pub const BREACH_GPIO: i32 = 6;
/// Disarm key switch.  Rising edge = disarm.
pub const DISARM_GPIO: i32 = 7;
/// Day/night photo sensor comparator.  HIGH = night (armed).
pub const DAY_NIGHT_GPIO: i32 = 8;
