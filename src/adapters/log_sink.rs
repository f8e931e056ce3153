//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC on the board, stderr in the simulation).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | initial_mode={}", mode);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::AlarmRaised { from, rate } => {
                warn!("ALARM | breach while armed in {}, tick rate {}", from, rate);
            }
            AppEvent::AlarmSilenced { flashes } => {
                info!("ALARM | disarmed after {} flashes", flashes);
            }
            AppEvent::BreachIgnored { mode } => {
                if mode.is_alarm() {
                    info!("BREACH | ignored, alarm already active");
                } else {
                    info!("BREACH | not armed, {} reset to Idle", mode);
                }
            }
            AppEvent::Recovered { raw } => {
                warn!("FAULT | undefined mode value {:#04x}, reset to Idle", raw);
            }
            AppEvent::EventsDropped { lost, total } => {
                warn!("QUEUE | {} event(s) lost, {} since boot", lost, total);
            }
        }
    }
}
