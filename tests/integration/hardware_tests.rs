//! HardwareAdapter wired to simulated pins: polarity, debounce and the
//! pump output seen from the electrical side.

use crate::mock_hw::RecordingSink;
use refill::adapters::hardware::{HardwareAdapter, Pins};
use refill::adapters::sim_pins::{SimInputPin, SimLine, SimOutputPin};
use refill::app::ports::SensorPort;
use refill::app::service::AppService;
use refill::config::SystemConfig;
use refill::drivers::output::OutputPolarity;
use refill::fsm::StateId;

type Adapter = HardwareAdapter<
    SimInputPin,
    SimInputPin,
    SimInputPin,
    SimOutputPin,
    SimOutputPin,
    SimOutputPin,
>;

struct Bench {
    door: SimLine,
    water: SimLine,
    overflow: SimLine,
    pump: SimLine,
    program_led: SimLine,
    hw: Adapter,
}

/// Door closed (NC, active low reads HIGH) and tank empty (NO, active low
/// reads HIGH).
fn bench(config: &SystemConfig) -> Bench {
    let door = SimLine::new(true);
    let water = SimLine::new(true);
    let overflow = SimLine::new(true);
    let pump = SimLine::new(true);
    let program_led = SimLine::new(false);
    let status_led = SimLine::new(true);
    let hw = HardwareAdapter::new(
        Pins {
            door: door.input(),
            water: water.input(),
            overflow: Some(overflow.input()),
            pump: pump.output(),
            program_led: program_led.output(),
            status_led: status_led.output(),
        },
        config,
    )
    .expect("adapter");
    Bench {
        door,
        water,
        overflow,
        pump,
        program_led,
        hw,
    }
}

fn run_until(
    app: &mut AppService,
    b: &mut Bench,
    sink: &mut RecordingSink,
    from: u64,
    until: StateId,
) -> u64 {
    let mut t = from;
    for _ in 0..1_000 {
        t += 10;
        app.tick(t, &mut b.hw, sink);
        if app.state() == until {
            return t;
        }
    }
    panic!("never reached {}", until);
}

#[test]
fn construction_drives_outputs_off() {
    let b = bench(&SystemConfig::default());
    assert!(!b.pump.is_high());
    // Program LED is active low: off means HIGH.
    assert!(b.program_led.is_high());
    assert!(!b.hw.pump().is_running());
}

#[test]
fn switch_polarity_resolves_to_logical_states() {
    let mut b = bench(&SystemConfig::default());
    let snap = b.hw.read_all(0);
    assert!(snap.door_closed);
    assert!(!snap.tank_full);
    assert!(snap.tank_empty);
    // Overflow sensor disabled by default.
    assert!(!snap.overflow);
    assert!(b.overflow.is_high());
}

#[test]
fn short_glitch_is_debounced() {
    let mut b = bench(&SystemConfig::default());
    b.hw.read_all(0);
    b.door.set_high(false);
    assert!(b.hw.read_all(10).door_closed);
    b.door.set_high(true);
    assert!(b.hw.read_all(50).door_closed);

    b.door.set_high(false);
    b.hw.read_all(100);
    assert!(b.hw.read_all(150).door_closed);
    assert!(!b.hw.read_all(200).door_closed);
}

#[test]
fn full_cycle_on_simulated_pins() {
    let config = SystemConfig::default();
    let mut b = bench(&config);
    let mut app = AppService::new(config);
    let mut sink = RecordingSink::new();

    app.start(0, &mut b.hw, &mut sink).expect("self-test");
    assert_eq!(app.state(), StateId::Idle);

    let t = run_until(&mut app, &mut b, &mut sink, 0, StateId::Filling);
    assert!(t >= 2_000);
    assert!(b.pump.is_high());
    assert!(b.hw.pump().is_running());

    // Float switch closes: line pulled low.
    b.water.set_high(false);
    let t = run_until(&mut app, &mut b, &mut sink, t, StateId::Full);
    assert!(!b.pump.is_high());
    assert_eq!(b.hw.pump().starts(), 1);

    b.door.set_high(false);
    run_until(&mut app, &mut b, &mut sink, t, StateId::DoorOpen);
    assert!(!b.pump.is_high());
}

#[test]
fn inverted_pump_output_still_tracks_state() {
    let config = SystemConfig {
        pump_output: OutputPolarity::ActiveLow,
        ..SystemConfig::default()
    };
    let mut b = bench(&config);
    assert!(b.pump.is_high());

    let mut app = AppService::new(config);
    let mut sink = RecordingSink::new();
    app.start(0, &mut b.hw, &mut sink).expect("self-test");
    run_until(&mut app, &mut b, &mut sink, 0, StateId::Filling);
    assert!(!b.pump.is_high());
}
