//! Tick source built on ESP-IDF's esp_timer API.
//!
//! One periodic timer pushes [`Event::Tick`] into the shared event queue.
//! Its period is either the normal chase period or the alarm flash period;
//! switching rate restarts the timer, so the partially elapsed period is
//! discarded and the new period counts from the switch.
//!
//! On simulation targets nothing is armed.  The host loop instead feeds
//! elapsed wall time through [`TickTimer::advance`], which emulates the
//! same divider-restart behaviour in software.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely take the event queue's critical section.

use core::fmt;

use log::{debug, info};

use crate::app::ports::TickControl;
use crate::config::TimingConfig;
use crate::drivers::hw_init::HwInitError;
use crate::error::ConfigError;

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

/// Which of the two tick periods is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickRate {
    /// Chase rate, used in every non-alarm mode.
    Normal,
    /// Flash rate, used inside the alarm hyperstate.
    Alarm,
}

impl fmt::Display for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Alarm => write!(f, "alarm"),
        }
    }
}

#[cfg(feature = "espidf")]
unsafe extern "C" fn tick_cb(_arg: *mut core::ffi::c_void) {
    crate::signals::SIGNALS.events.push(crate::events::Event::Tick);
}

/// The periodic tick source.
pub struct TickTimer {
    normal_us: u64,
    alarm_us: u64,
    rate: TickRate,
    /// Time accumulated towards the next tick (software divider only).
    phase_us: u64,
    restarts: u32,
    #[cfg(feature = "espidf")]
    handle: esp_timer_handle_t,
}

impl TickTimer {
    /// Derive both periods from `timing`.  Starts at the normal rate.
    pub fn new(timing: &TimingConfig) -> Result<Self, ConfigError> {
        timing.validate()?;
        Ok(Self {
            normal_us: timing.normal_period_us(),
            alarm_us: timing.alarm_period_us(),
            rate: TickRate::Normal,
            phase_us: 0,
            restarts: 0,
            #[cfg(feature = "espidf")]
            handle: core::ptr::null_mut(),
        })
    }

    /// Period for `rate` in microseconds.
    pub fn period_for(&self, rate: TickRate) -> u64 {
        match rate {
            TickRate::Normal => self.normal_us,
            TickRate::Alarm => self.alarm_us,
        }
    }

    /// Period currently in effect.
    pub fn period_us(&self) -> u64 {
        self.period_for(self.rate)
    }

    /// Number of rate switches since construction.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Feed `elapsed_us` of wall time into the software divider and return
    /// how many ticks fell due.
    pub fn advance(&mut self, elapsed_us: u64) -> u32 {
        let period = self.period_us();
        self.phase_us += elapsed_us;
        let due = self.phase_us / period;
        self.phase_us %= period;
        due as u32
    }

    /// Time left until the next software tick.
    pub fn until_next_us(&self) -> u64 {
        self.period_us() - self.phase_us
    }

    /// Create and arm the hardware timer at the current rate.
    #[cfg(feature = "espidf")]
    pub fn start(&mut self) -> Result<(), HwInitError> {
        let args = esp_timer_create_args_t {
            callback: Some(tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"tick\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        // SAFETY: `handle` is owned by this struct and written once here,
        // from the main task, before any callback can fire.
        let ret = unsafe { esp_timer_create(&args, &mut self.handle) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerCreateFailed(ret));
        }
        // SAFETY: handle was created above.
        let ret = unsafe { esp_timer_start_periodic(self.handle, self.period_us()) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerStartFailed(ret));
        }
        info!("hw_timer: tick timer started ({} us)", self.period_us());
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    pub fn start(&mut self) -> Result<(), HwInitError> {
        self.phase_us = 0;
        info!("hw_timer(sim): software divider at {} us", self.period_us());
        Ok(())
    }

    /// Stop the hardware timer.  Safe to call if never started.
    #[cfg(feature = "espidf")]
    pub fn stop(&mut self) {
        if self.handle.is_null() {
            return;
        }
        // SAFETY: non-null handle was created in start(); main task only.
        unsafe {
            esp_timer_stop(self.handle);
        }
    }

    #[cfg(not(feature = "espidf"))]
    pub fn stop(&mut self) {}

    /// Re-arm the timer so the new period counts from now.
    #[cfg(feature = "espidf")]
    fn restart(&mut self) {
        self.phase_us = 0;
        if self.handle.is_null() {
            return;
        }
        // SAFETY: non-null handle was created in start(); main task only.
        // ESP_ERR_INVALID_STATE from stop just means it was not running.
        unsafe {
            esp_timer_stop(self.handle);
            let ret = esp_timer_start_periodic(self.handle, self.period_us());
            if ret != ESP_OK as i32 {
                log::error!("hw_timer: restart failed (rc={}), ticks halted", ret);
            }
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn restart(&mut self) {
        self.phase_us = 0;
    }
}

impl TickControl for TickTimer {
    fn set_rate(&mut self, rate: TickRate) {
        if rate == self.rate {
            debug!("hw_timer: already at {} rate", rate);
            return;
        }
        self.rate = rate;
        self.restarts = self.restarts.wrapping_add(1);
        self.restart();
        info!("hw_timer: {} rate, period {} us", rate, self.period_us());
    }

    fn rate(&self) -> TickRate {
        self.rate
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.stop();
        #[cfg(feature = "espidf")]
        if !self.handle.is_null() {
            // SAFETY: timer stopped above; handle is not used again.
            unsafe {
                esp_timer_delete(self.handle);
            }
        }
    }
}
