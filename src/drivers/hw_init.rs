//! One-shot hardware peripheral initialization and raw GPIO access.
//!
//! Configures GPIO directions, initial output levels and the two edge
//! interrupts using raw ESP-IDF sys calls.  Called once from `main()`
//! before the tick timer starts, and leaves every output line low (the
//! Idle pattern).
//!
//! Host builds replace the GPIO matrix with an in-memory line register.
//! [`sim_set_input`] drives an input line and, on a rising edge of an edge
//! line, runs the same handler the hardware interrupt would.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
    TimerCreateFailed(i32),
    TimerStartFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc)  => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc)  => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed(rc)  => write!(f, "GPIO ISR handler add failed (rc={})", rc),
            Self::TimerCreateFailed(rc) => write!(f, "tick timer create failed (rc={})", rc),
            Self::TimerStartFailed(rc)  => write!(f, "tick timer start failed (rc={})", rc),
        }
    }
}

// ── Bring-up ──────────────────────────────────────────────────

#[cfg(feature = "espidf")]
use log::info;

#[cfg(feature = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the tick timer starts;
    // single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_gpio_inputs()?;
        init_isr_service()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(feature = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    for &gpio in &pins::OUTPUT_GPIOS {
        gpio_write(gpio, false);
    }
    log::info!("hw_init(sim): outputs cleared, interrupts simulated");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(feature = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let mask = pins::OUTPUT_GPIOS.iter().fold(0u64, |m, &pin| m | (1u64 << pin));
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    for &pin in &pins::OUTPUT_GPIOS {
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: {} output lines low", pins::OUTPUT_GPIOS.len());
    Ok(())
}

#[cfg(feature = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    unsafe { gpio_set_level(pin, if high { 1 } else { 0 }); }
}

#[cfg(not(feature = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    sim::write(pin, high);
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(feature = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // Day/night: level input, sampled on demand.
    let level_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::DAY_NIGHT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&level_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    // Breach and disarm: rising-edge inputs.  Interrupts stay masked until
    // init_isr_service() decides which line starts enabled.
    let edge_cfg = gpio_config_t {
        pin_bit_mask: (1u64 << pins::BREACH_GPIO) | (1u64 << pins::DISARM_GPIO),
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
    };
    let ret = unsafe { gpio_config(&edge_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(feature = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(feature = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::read(pin)
}

// ── Edge interrupt gating ─────────────────────────────────────

/// Unmask or mask the edge interrupt on `pin`.
#[cfg(feature = "espidf")]
pub fn set_edge_interrupt(pin: i32, enabled: bool) {
    // SAFETY: gpio_intr_enable/disable only touch the interrupt enable bit
    // of a pin configured in init_gpio_inputs().
    unsafe {
        if enabled {
            gpio_intr_enable(pin);
        } else {
            gpio_intr_disable(pin);
        }
    }
}

#[cfg(not(feature = "espidf"))]
pub fn set_edge_interrupt(pin: i32, enabled: bool) {
    log::debug!("hw_init(sim): GPIO{} interrupt {}", pin, if enabled { "on" } else { "off" });
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(feature = "espidf")]
use crate::drivers::event_lines::{breach_isr_handler, disarm_isr_handler};

#[cfg(feature = "espidf")]
unsafe extern "C" fn breach_gpio_isr(_arg: *mut core::ffi::c_void) {
    breach_isr_handler();
}

#[cfg(feature = "espidf")]
unsafe extern "C" fn disarm_gpio_isr(_arg: *mut core::ffi::c_void) {
    disarm_isr_handler();
}

/// Install the per-pin GPIO ISR service and register the edge handlers.
///
/// Breach starts unmasked; disarm stays masked until the alarm is raised.
#[cfg(feature = "espidf")]
unsafe fn init_isr_service() -> Result<(), HwInitError> {
    use crate::signals::SIGNALS;

    // SAFETY: ESP_ERR_INVALID_STATE means the service was already
    // installed (acceptable).  The handlers registered below only push
    // into the critical-section event queue.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(pins::BREACH_GPIO, Some(breach_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 { return Err(HwInitError::IsrHandlerFailed(ret)); }

        let ret = gpio_isr_handler_add(pins::DISARM_GPIO, Some(disarm_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 { return Err(HwInitError::IsrHandlerFailed(ret)); }
    }

    set_edge_interrupt(pins::BREACH_GPIO, SIGNALS.breach.is_enabled());
    set_edge_interrupt(pins::DISARM_GPIO, SIGNALS.disarm.is_enabled());

    info!("hw_init: ISR service installed (breach, disarm)");
    Ok(())
}

// ── embedded-hal pin ──────────────────────────────────────────

/// A single GPIO line behind the `embedded-hal` digital traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioPin {
    gpio: i32,
}

impl GpioPin {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for GpioPin {
    type Error = Infallible;
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.gpio, true);
        Ok(())
    }
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.gpio))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.gpio))
    }
}

// ── Host line register ────────────────────────────────────────

/// Drive a simulated input line.  A low→high transition on the breach or
/// disarm line runs that line's interrupt handler.
#[cfg(not(feature = "espidf"))]
pub fn sim_set_input(pin: i32, high: bool) {
    let rising = sim::write(pin, high);
    if !rising {
        return;
    }
    if pin == pins::BREACH_GPIO {
        crate::drivers::event_lines::breach_isr_handler();
    } else if pin == pins::DISARM_GPIO {
        crate::drivers::event_lines::disarm_isr_handler();
    }
}

/// Pulse a simulated edge line (low, high, low).
#[cfg(not(feature = "espidf"))]
pub fn sim_pulse(pin: i32) {
    sim_set_input(pin, false);
    sim_set_input(pin, true);
    sim_set_input(pin, false);
}

#[cfg(not(feature = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU64, Ordering};

    static LINES: AtomicU64 = AtomicU64::new(0);

    fn bit(pin: i32) -> u64 {
        1u64 << (pin as u32 & 63)
    }

    /// Returns `true` on a low→high transition.
    pub fn write(pin: i32, high: bool) -> bool {
        let prev = if high {
            LINES.fetch_or(bit(pin), Ordering::AcqRel)
        } else {
            LINES.fetch_and(!bit(pin), Ordering::AcqRel)
        };
        high && prev & bit(pin) == 0
    }

    pub fn read(pin: i32) -> bool {
        LINES.load(Ordering::Acquire) & bit(pin) != 0
    }
}
