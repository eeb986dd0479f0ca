//! Refill controller: host simulation entry point.
//!
//! Wires the application core to simulated pins and runs an accelerated
//! dispenser session: door opened and closed, tank refilled, water drawn,
//! door held open for diagnostics, then a shutdown request.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HardwareAdapter   LogEventSink   ConfigStore    SimClock    │
//! │  (Sensor+Actuator) (EventSink)    (ConfigPort)   (TimePort)  │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            AppService (pure logic)                     │  │
//! │  │  FSM · SafetyGuard · DutyCycleLimiter · FaultLog       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  LoopScheduler (adaptive cadence) · SimWatchdog              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use anyhow::{Context, Result};
use env_logger::Env;
use log::{info, warn};

use refill::adapters::hardware::{HardwareAdapter, Pins};
use refill::adapters::log_sink::LogEventSink;
use refill::adapters::sim_pins::SimLine;
use refill::adapters::storage::{ConfigStore, MemoryStorage};
use refill::adapters::time::SimClock;
use refill::app::commands::{AppCommand, COMMAND_CHANNEL};
use refill::app::ports::{ConfigPort, TimePort};
use refill::app::service::AppService;
use refill::diagnostics::dump_faults;
use refill::drivers::watchdog::SimWatchdog;
use refill::scheduler::LoopScheduler;
use refill::sensors::battery::BatteryMonitor;

// ── Simulated plant ───────────────────────────────────────────

const TANK_CAPACITY_ML: u32 = 1_000;
const SIM_STEP_MS: u64 = 5;
const SIM_END_MS: u64 = 600_000;
const STATUS_PERIOD_MS: u64 = 30_000;
/// Raw ADC reading of a healthy 3.3 V supply.
const BATTERY_RAW: u16 = 2_048;

/// Tank contents and the physical switch lines around it.
struct Plant {
    door: SimLine,
    water: SimLine,
    pump: SimLine,
    level_ml: u32,
    flow_ml_per_sec: u32,
    pumped_ms: u64,
}

impl Plant {
    fn set_door(&self, closed: bool) {
        // NC reed switch, active low: closed door reads HIGH.
        self.door.set_high(closed);
    }

    /// Advance the water model by `dt` ms.
    fn step(&mut self, dt: u64) {
        if self.pump.is_high() {
            self.pumped_ms += dt;
            let whole_secs = self.pumped_ms / 1_000;
            if whole_secs > 0 {
                self.pumped_ms %= 1_000;
                let added = whole_secs as u32 * self.flow_ml_per_sec;
                self.level_ml = (self.level_ml + added).min(TANK_CAPACITY_ML);
            }
        }
        // NO float switch, active low: full tank pulls the line LOW.
        self.water.set_high(self.level_ml < TANK_CAPACITY_ML);
    }

    fn draw(&mut self, ml: u32) {
        self.level_ml = self.level_ml.saturating_sub(ml);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().filter_or("REFILL_LOG", "info")).init();
    info!("Refill controller simulation v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let mut config_store = ConfigStore::new(MemoryStorage::new());
    let config = config_store.load_or_default();
    config.validate().context("default configuration invalid")?;
    config_store
        .save(&config)
        .context("persisting configuration")?;

    // ── 2. Pins and hardware adapter ──────────────────────────
    let mut plant = Plant {
        door: SimLine::new(false),
        water: SimLine::new(true),
        pump: SimLine::new(false),
        level_ml: 0,
        flow_ml_per_sec: u32::from(config.pump_flow_ml_per_sec),
        pumped_ms: 0,
    };
    let program_led = SimLine::new(false);
    let status_led = SimLine::new(false);
    let overflow = SimLine::new(true);

    let mut hw = HardwareAdapter::new(
        Pins {
            door: plant.door.input(),
            water: plant.water.input(),
            overflow: Some(overflow.input()),
            pump: plant.pump.output(),
            program_led: program_led.output(),
            status_led: status_led.output(),
        },
        &config,
    )
    .context("hardware init")?;

    // ── 3. Service, clock, watchdog ───────────────────────────
    let clock = SimClock::new(0);
    let mut sink = LogEventSink::new();
    let mut app = AppService::with_stored_faults(config, config_store.storage());
    let mut scheduler = LoopScheduler::new();
    let mut watchdog = SimWatchdog::default();
    let mut battery = BatteryMonitor::new();

    watchdog.arm(clock.now_ms());
    if let Err(e) = app.start(clock.now_ms(), &mut hw, &mut sink) {
        warn!("Continuing with latched sensor fault: {}", e);
    }

    // ── 4. Scripted session ───────────────────────────────────
    let mut last_status = 0u64;
    let mut shutdown_sent = false;

    while !app.is_halted() {
        let now = clock.now_ms();

        match now {
            3_000 => plant.set_door(true),
            200_000 => plant.draw(600),
            400_000 => plant.set_door(false),
            412_000 => plant.set_door(true),
            _ => {}
        }
        if now >= SIM_END_MS && !shutdown_sent {
            shutdown_sent = COMMAND_CHANNEL.try_send(AppCommand::Shutdown).is_ok();
        }

        let due = scheduler.poll(now);
        if due.feed_watchdog {
            scheduler.feed(now, &mut watchdog);
        }
        if due.control_tick {
            app.drain_commands(&mut hw, &mut sink);
            app.tick(now, &mut hw, &mut sink);
            scheduler.adapt(app.state());
        }

        if now.saturating_sub(last_status) >= STATUS_PERIOD_MS {
            last_status = now;
            let mv = battery.sample(BATTERY_RAW);
            app.report_status(Some(mv), &mut sink);
        }

        plant.step(SIM_STEP_MS);
        clock.advance(SIM_STEP_MS);
    }

    // ── 5. Summary ────────────────────────────────────────────
    let stats = app.stats();
    let usage = app.usage();
    info!(
        "Session: cycles={} last_fill={}ms errors={} fills={} volume={}mL (~{} L)",
        stats.cycle_count,
        stats.last_fill_duration_ms,
        stats.error_count,
        usage.total_fills,
        usage.total_millilitres,
        usage.total_litres()
    );
    info!(
        "Loop: {} control ticks, {} watchdog feeds, {} missed",
        scheduler.ticks(),
        watchdog.feeds(),
        watchdog.expirations()
    );
    dump_faults(app.fault_log());
    app.fault_log()
        .save(config_store.storage_mut())
        .context("saving fault log")?;

    Ok(())
}
