//! Perimeter Alarm Firmware — Main Entry Point
//!
//! Hexagonal architecture with interrupt-latched, main-loop-dispatched
//! events.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          LogEventSink        TickTimer        │
//! │  (Output + ArmedInput)    (EventSink)         (TickControl)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  FSM · line gating · tick rate                         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ISRs + tick timer ──▶ SIGNALS.events ──▶ main loop drain      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Host builds run the same controller against the simulated line
//! register.  Type `breach`, `disarm`, `night`, `day`, `status`,
//! `corrupt` or `quit` on stdin.
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use perimeter::adapters::hardware::HardwareAdapter;
use perimeter::adapters::log_sink::LogEventSink;
use perimeter::app::service::Controller;
use perimeter::config::SystemConfig;
use perimeter::drivers::hw_init;
use perimeter::drivers::hw_timer::TickTimer;
use perimeter::error::Error;
use perimeter::signals::SIGNALS;

fn main() -> Result<()> {
    // ── 1. Bootstrap + logging ────────────────────────────────
    init_logging()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Perimeter v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration (compile-time, validated) ────────────
    let config = SystemConfig::reference();
    config.validate().map_err(Error::Config)?;
    let encoded = serde_json::to_string(&config).map_err(|e| anyhow::anyhow!("config encode: {e}"))?;
    info!("Config: {}", encoded);

    // ── 3. Hardware bring-up (outputs left at the Idle pattern) ─
    hw_init::init_peripherals().map_err(Error::Init)?;
    let mut hw = HardwareAdapter::from_pins(&config);
    let mut sink = LogEventSink::new();

    // ── 4. Tick source + controller ───────────────────────────
    let mut timer = TickTimer::new(&config.timing).map_err(Error::Config)?;
    timer.start().map_err(Error::Init)?;
    info!(
        "Tick periods: normal={} us, alarm={} us",
        config.timing.normal_period_us(),
        config.timing.alarm_period_us()
    );

    let mut controller = Controller::new(&SIGNALS, timer);
    controller.start(&mut hw, &mut sink);

    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    run_event_loop(&mut controller, &mut hw, &mut sink, &config)
}

/// On the board, ticks and edges arrive from the timer task and ISRs; the
/// loop only drains them.
#[cfg(feature = "espidf")]
fn run_event_loop(
    controller: &mut Controller<'_, TickTimer>,
    hw: &mut HardwareAdapter,
    sink: &mut LogEventSink,
    _config: &SystemConfig,
) -> Result<()> {
    loop {
        controller.run_pending(hw, sink);
        esp_idf_hal::delay::FreeRtos::delay_ms(5);
    }
}

#[cfg(not(feature = "espidf"))]
fn run_event_loop(
    controller: &mut Controller<'_, TickTimer>,
    hw: &mut HardwareAdapter,
    sink: &mut LogEventSink,
    config: &SystemConfig,
) -> Result<()> {
    sim::run(controller, hw, sink, config.armed_active_high)
}

#[cfg(feature = "espidf")]
fn init_logging() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(not(feature = "espidf"))]
fn init_logging() -> Result<()> {
    use tracing_subscriber::EnvFilter;

    // `log` records are forwarded through tracing-subscriber's log bridge.
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger init failed: {e}"))
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(feature = "espidf"))]
mod sim {
    use std::io::BufRead;
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
    use std::time::{Duration, Instant};

    use anyhow::Result;
    use log::{info, warn};

    use perimeter::adapters::hardware::HardwareAdapter;
    use perimeter::adapters::log_sink::LogEventSink;
    use perimeter::app::service::Controller;
    use perimeter::drivers::hw_init::{sim_pulse, sim_set_input};
    use perimeter::drivers::hw_timer::TickTimer;
    use perimeter::events::Event;
    use perimeter::pins;
    use perimeter::signals::SIGNALS;

    /// Console commands standing in for the physical inputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Command {
        Breach,
        Disarm,
        Night,
        Day,
        Status,
        Corrupt,
        Quit,
    }

    impl Command {
        fn parse(line: &str) -> Option<Self> {
            match line.trim() {
                "breach" | "b" => Some(Self::Breach),
                "disarm" | "x" => Some(Self::Disarm),
                "night" | "n" => Some(Self::Night),
                "day" | "d" => Some(Self::Day),
                "status" | "s" => Some(Self::Status),
                "corrupt" => Some(Self::Corrupt),
                "quit" | "q" => Some(Self::Quit),
                _ => None,
            }
        }
    }

    fn spawn_console() -> Receiver<Command> {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match Command::parse(&line) {
                    Some(cmd) => {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("unknown command {:?}", line.trim()),
                }
            }
        });
        rx
    }

    /// Run until `quit`.  Ticks come from the timer's software divider;
    /// console commands are applied between ticks.
    pub fn run(
        controller: &mut Controller<'_, TickTimer>,
        hw: &mut HardwareAdapter,
        sink: &mut LogEventSink,
        active_high: bool,
    ) -> Result<()> {
        let mut console = Some(spawn_console());

        loop {
            let wait = Duration::from_micros(controller.tick_source().until_next_us());
            let started = Instant::now();

            let received = match &console {
                Some(rx) => rx.recv_timeout(wait),
                None => {
                    std::thread::sleep(wait);
                    Err(RecvTimeoutError::Timeout)
                }
            };
            let command = match received {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    info!("console closed, running unattended");
                    console = None;
                    None
                }
            };

            match command {
                Some(Command::Breach) => sim_pulse(pins::BREACH_GPIO),
                Some(Command::Disarm) => sim_pulse(pins::DISARM_GPIO),
                Some(Command::Night) => sim_set_input(pins::DAY_NIGHT_GPIO, active_high),
                Some(Command::Day) => sim_set_input(pins::DAY_NIGHT_GPIO, !active_high),
                Some(Command::Corrupt) => SIGNALS.mode.store_raw(0xFF),
                Some(Command::Status) => {
                    info!(
                        "STATUS | mode={} rate={} pattern={} stats={:?}",
                        controller.mode(),
                        controller.tick_rate(),
                        controller.last_pattern().unwrap_or_default(),
                        controller.stats()
                    );
                }
                Some(Command::Quit) => return Ok(()),
                None => {}
            }

            let elapsed = started.elapsed().as_micros() as u64;
            let due = controller.tick_source_mut().advance(elapsed);
            for _ in 0..due {
                SIGNALS.events.push(Event::Tick);
            }
            controller.run_pending(hw, sink);
        }
    }

}
