//! Day/night sensor: the armed reading.
//!
//! A photo-switch pulls the line to its active level after dark.  Every
//! call to [`ArmedInput::is_armed`] reads the pin; nothing is cached.

use embedded_hal::digital::{Error as _, InputPin};
use log::warn;

use crate::app::ports::ArmedInput;

pub struct DayNightSensor<P: InputPin> {
    pin: P,
    /// Line level that means "night".
    active_high: bool,
}

impl<P: InputPin> DayNightSensor<P> {
    pub fn new(pin: P, active_high: bool) -> Self {
        Self { pin, active_high }
    }
}

impl<P: InputPin> ArmedInput for DayNightSensor<P> {
    fn is_armed(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high == self.active_high,
            Err(e) => {
                warn!("day/night read failed ({:?}), treating as not armed", e.kind());
                false
            }
        }
    }
}
