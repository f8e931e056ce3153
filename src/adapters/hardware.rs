//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the output pin bank and the day/night sensor, exposing them
//! through [`OutputPort`] and [`ArmedInput`].  On host builds the pins
//! resolve to the simulated line register in
//! [`hw_init`](crate::drivers::hw_init).

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ArmedInput, OutputPort};
use crate::config::SystemConfig;
use crate::drivers::day_night::DayNightSensor;
use crate::drivers::hw_init::GpioPin;
use crate::drivers::output::{Pattern, PinBank};
use crate::pins;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<O: OutputPin = GpioPin, I: InputPin = GpioPin> {
    outputs: PinBank<O>,
    day_night: DayNightSensor<I>,
}

impl<O: OutputPin, I: InputPin> HardwareAdapter<O, I> {
    pub fn new(outputs: PinBank<O>, day_night: DayNightSensor<I>) -> Self {
        Self { outputs, day_night }
    }
}

impl HardwareAdapter {
    /// Adapter over the board's pin map.
    pub fn from_pins(config: &SystemConfig) -> Self {
        let outputs = PinBank::new(pins::STAGE_GPIOS.map(GpioPin::new), GpioPin::new(pins::SIREN_GPIO));
        let day_night = DayNightSensor::new(GpioPin::new(pins::DAY_NIGHT_GPIO), config.armed_active_high);
        Self::new(outputs, day_night)
    }
}

// ── OutputPort implementation ─────────────────────────────────

impl<O: OutputPin, I: InputPin> OutputPort for HardwareAdapter<O, I> {
    fn write_pattern(&mut self, pattern: Pattern) {
        self.outputs.write_pattern(pattern);
    }
}

// ── ArmedInput implementation ─────────────────────────────────

impl<O: OutputPin, I: InputPin> ArmedInput for HardwareAdapter<O, I> {
    fn is_armed(&mut self) -> bool {
        self.day_night.is_armed()
    }
}
