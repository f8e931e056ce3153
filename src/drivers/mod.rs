//! Output, input and timer drivers, plus one-shot hardware initialisation.

pub mod day_night;
pub mod event_lines;
pub mod hw_init;
pub mod hw_timer;
pub mod output;
