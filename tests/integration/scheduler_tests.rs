//! Main-loop composition: scheduler cadence, watchdog feeding and the
//! command channel, driven by a simulated clock.

use crate::mock_hw::{MockHardware, RecordingSink};
use refill::adapters::time::SimClock;
use refill::app::commands::{AppCommand, COMMAND_CHANNEL};
use refill::app::events::AppEvent;
use refill::app::ports::TimePort;
use refill::app::service::AppService;
use refill::config::SystemConfig;
use refill::drivers::watchdog::SimWatchdog;
use refill::fsm::StateId;
use refill::scheduler::{LoopScheduler, FILLING_INTERVAL_MS, RELAXED_INTERVAL_MS};

struct Rig {
    clock: SimClock,
    scheduler: LoopScheduler,
    watchdog: SimWatchdog,
    app: AppService,
    hw: MockHardware,
    sink: RecordingSink,
    /// The command channel is process-wide; only one test may drain it.
    drain_commands: bool,
}

impl Rig {
    fn new(hw: MockHardware) -> Self {
        let clock = SimClock::new(0);
        let mut watchdog = SimWatchdog::default();
        watchdog.arm(clock.now_ms());
        let mut app = AppService::new(SystemConfig::default());
        let mut sink = RecordingSink::new();
        let mut hw = hw;
        let _ = app.start(clock.now_ms(), &mut hw, &mut sink);
        Self {
            clock,
            scheduler: LoopScheduler::new(),
            watchdog,
            app,
            hw,
            sink,
            drain_commands: false,
        }
    }

    /// Spin the loop in 1 ms steps for `ms` milliseconds.
    fn spin(&mut self, ms: u64) {
        for _ in 0..ms {
            self.clock.advance(1);
            let now = self.clock.now_ms();
            let due = self.scheduler.poll(now);
            if due.feed_watchdog {
                self.scheduler.feed(now, &mut self.watchdog);
            }
            if due.control_tick {
                if self.drain_commands {
                    self.app.drain_commands(&mut self.hw, &mut self.sink);
                }
                self.app.tick(now, &mut self.hw, &mut self.sink);
                self.scheduler.adapt(self.app.state());
            }
        }
    }
}

#[test]
fn loop_feeds_watchdog_without_expiry() {
    let mut rig = Rig::new(MockHardware::closed_full());
    rig.spin(60_000);
    assert_eq!(rig.watchdog.expirations(), 0);
    assert_eq!(rig.watchdog.feeds(), 20);
}

#[test]
fn cadence_follows_state() {
    let mut rig = Rig::new(MockHardware::closed_full());
    rig.spin(1_000);
    assert_eq!(rig.app.state(), StateId::Full);
    assert_eq!(rig.scheduler.interval_ms(), RELAXED_INTERVAL_MS);
    let relaxed_ticks = rig.scheduler.ticks();
    assert!((19..=21).contains(&relaxed_ticks));

    rig.hw.set_full(false);
    rig.spin(13_000);
    assert_eq!(rig.app.state(), StateId::Filling);
    assert_eq!(rig.scheduler.interval_ms(), FILLING_INTERVAL_MS);

    let before = rig.scheduler.ticks();
    rig.spin(1_000);
    assert_eq!(rig.scheduler.ticks() - before, 100);
}

#[test]
fn queued_shutdown_is_drained_by_the_loop() {
    let mut rig = Rig::new(MockHardware::closed_empty());
    rig.drain_commands = true;
    rig.spin(5_000);
    assert_eq!(rig.app.state(), StateId::Filling);
    assert!(rig.hw.pump_on());

    COMMAND_CHANNEL
        .try_send(AppCommand::Shutdown)
        .expect("channel has room");
    rig.spin(100);

    assert!(rig.app.is_halted());
    assert!(!rig.hw.pump_on());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::Halted)),
        1
    );
}
