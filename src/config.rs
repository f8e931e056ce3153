//! System configuration parameters
//!
//! Tick timing is derived the way the reference board's 16-bit timer does
//! it: a fixed compare count against a prescaled source clock.  The two
//! prescalers select the normal chase rate and the alarm flash rate.
//!
//! Configuration is compile-time only; serde support exists so the
//! effective values can be logged at boot and checked in tests.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Required ratio between the normal and alarm tick periods.
pub const NORMAL_TO_ALARM_RATIO: u64 = 4;

/// Timer parameters from which both tick periods are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Timer source clock (Hz).
    pub base_clock_hz: u32,
    /// Compare-match count that raises one tick.
    pub compare_count: u16,
    /// Clock divisor used outside the alarm hyperstate.
    pub normal_prescaler: u16,
    /// Clock divisor used while the alarm is active.
    pub alarm_prescaler: u16,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_clock_hz: 8_000_000, // 8 MHz
            compare_count: 31_250,
            normal_prescaler: 256, // 1.000 s
            alarm_prescaler: 64,   // 0.250 s
        }
    }
}

impl TimingConfig {
    /// Normal (chase) tick period in microseconds.
    pub fn normal_period_us(&self) -> u64 {
        self.period_us(self.normal_prescaler)
    }

    /// Alarm (flash) tick period in microseconds.
    pub fn alarm_period_us(&self) -> u64 {
        self.period_us(self.alarm_prescaler)
    }

    fn period_us(&self, prescaler: u16) -> u64 {
        if self.base_clock_hz == 0 {
            return 0;
        }
        u64::from(self.compare_count) * u64::from(prescaler) * 1_000_000
            / u64::from(self.base_clock_hz)
    }

    /// Reject timing that would break the alarm/normal contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_clock_hz == 0 {
            return Err(ConfigError::ValidationFailed("base_clock_hz must be non-zero"));
        }
        if self.compare_count == 0 {
            return Err(ConfigError::ValidationFailed("compare_count must be non-zero"));
        }
        if self.normal_prescaler == 0 || self.alarm_prescaler == 0 {
            return Err(ConfigError::ValidationFailed("prescalers must be non-zero"));
        }

        let normal = self.normal_period_us();
        let alarm = self.alarm_period_us();
        if alarm == 0 {
            return Err(ConfigError::ValidationFailed("alarm period rounds to zero"));
        }
        if alarm >= normal {
            return Err(ConfigError::ValidationFailed(
                "alarm period must be strictly faster than normal period",
            ));
        }
        if normal != alarm * NORMAL_TO_ALARM_RATIO {
            return Err(ConfigError::ValidationFailed(
                "normal period must be exactly 4x the alarm period",
            ));
        }
        Ok(())
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Tick source timing.
    pub timing: TimingConfig,
    /// Day/night input polarity: `true` = line HIGH means night (armed).
    pub armed_active_high: bool,
}

impl SystemConfig {
    /// Reference board configuration.
    pub fn reference() -> Self {
        Self {
            timing: TimingConfig::default(),
            armed_active_high: true,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self::reference()
    }
}
