//! End-to-end refill scenarios: AppService → FSM → actuators, driven by
//! scripted sensor snapshots.

use crate::mock_hw::{MockHardware, MockStorage, RecordingSink};
use refill::app::commands::AppCommand;
use refill::app::events::AppEvent;
use refill::app::service::AppService;
use refill::config::SystemConfig;
use refill::diagnostics::FaultLog;
use refill::drivers::led_patterns::LedOutputs;
use refill::error::{ErrorCode, SensorError};
use refill::fsm::StateId;

fn started(config: SystemConfig, hw: &mut MockHardware) -> (AppService, RecordingSink) {
    let mut app = AppService::new(config);
    let mut sink = RecordingSink::new();
    let _ = app.start(0, hw, &mut sink);
    (app, sink)
}

/// Tick every `step` ms over `(from, to]`, asserting the pump is only ever
/// driven while filling.
fn run(
    app: &mut AppService,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
    from: u64,
    to: u64,
    step: u64,
) {
    let mut t = from + step;
    while t <= to {
        app.tick(t, hw, sink);
        assert_eq!(
            hw.pump_on(),
            app.state() == StateId::Filling,
            "pump level disagrees with {} at {} ms",
            app.state_name(),
            t
        );
        t += step;
    }
}

/// Door closed, tank empty: settle then start filling at 2000 ms.
fn filling(config: SystemConfig) -> (AppService, MockHardware, RecordingSink) {
    let mut hw = MockHardware::closed_empty();
    let (mut app, mut sink) = started(config, &mut hw);
    app.tick(0, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::WaitSettle);
    app.tick(2_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Filling);
    (app, hw, sink)
}

// ── Normal refill cycle ───────────────────────────────────────

#[test]
fn boot_with_door_open_settles_and_fills() {
    let mut hw = MockHardware::door_open();
    let (mut app, mut sink) = started(SystemConfig::default(), &mut hw);
    assert_eq!(app.state(), StateId::DoorOpen);
    assert!(matches!(sink.events[0], AppEvent::Started(StateId::DoorOpen)));
    assert!(!hw.pump_on());

    hw.set_door(true);
    app.tick(0, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::WaitSettle);

    app.tick(1_999, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::WaitSettle);
    assert!(!hw.pump_on());

    app.tick(2_001, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Filling);
    assert!(hw.pump_on());
    assert_eq!(app.stats().cycle_count, 1);

    run(&mut app, &mut hw, &mut sink, 2_001, 52_000, 1_000);
    hw.set_full(true);
    app.tick(52_001, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Full);
    assert!(!hw.pump_on());

    let stats = app.stats();
    assert_eq!(stats.last_fill_duration_ms, 50_000);
    assert_eq!(stats.total_run_time_ms, 50_000);

    let usage = app.usage();
    assert_eq!(usage.total_fills, 1);
    assert_eq!(usage.total_runtime_secs, 50);
    assert_eq!(usage.total_millilitres, 1_000);

    assert_eq!(
        sink.transitions(),
        vec![
            ("DOOR_OPEN", "WAIT_SETTLE"),
            ("WAIT_SETTLE", "FILLING"),
            ("FILLING", "FULL"),
        ]
    );
}

#[test]
fn drawn_tank_rests_in_cooldown_then_refills() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    hw.set_full(true);
    app.tick(30_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Full);

    hw.set_full(false);
    app.tick(100_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Cooldown);

    run(&mut app, &mut hw, &mut sink, 100_000, 109_000, 1_000);
    assert_eq!(app.state(), StateId::Cooldown);

    app.tick(110_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::WaitSettle);

    app.tick(112_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Filling);
    assert_eq!(app.stats().cycle_count, 2);
    assert!(hw.pump_on());
}

#[test]
fn door_opened_mid_fill_stops_pump_immediately() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    run(&mut app, &mut hw, &mut sink, 2_000, 10_000, 500);

    hw.set_door(false);
    app.tick(10_010, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::DoorOpen);
    assert!(!hw.pump_on());
    assert_eq!(app.stats().total_run_time_ms, 8_010);
}

#[test]
fn pump_written_exactly_once_per_tick() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    for t in (2_010..2_200).step_by(10) {
        hw.clear_calls();
        app.tick(t, &mut hw, &mut sink);
        assert_eq!(hw.pump_writes(), 1);
    }
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn supply_empty_latches_error_and_logs_fault() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());

    app.tick(362_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Filling);

    app.tick(362_001, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Error);
    assert_eq!(app.error_code(), ErrorCode::GallonEmpty);
    assert!(!hw.pump_on());

    let stats = app.stats();
    assert_eq!(stats.error_count, 1);
    assert_eq!(stats.last_error_code, ErrorCode::GallonEmpty);

    let record = app.fault_log().latest().copied().expect("fault recorded");
    assert_eq!(record.error_code, ErrorCode::GallonEmpty);
    assert_eq!(record.state_at_fault, StateId::Filling);
    assert_eq!(record.timestamp_ms, 362_001);
    assert_eq!(record.cycle_count, 1);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::FaultRecorded(_))),
        1
    );

    // Error indication: LEDs alternate.
    app.tick(363_000, &mut hw, &mut sink);
    let leds = hw.leds();
    assert_ne!(leds.program, leds.status);
}

#[test]
fn error_clears_after_door_held_open() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    app.tick(362_001, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Error);

    // Door stays closed: nothing happens, however long.
    run(&mut app, &mut hw, &mut sink, 362_001, 400_000, 1_000);
    assert_eq!(app.state(), StateId::Error);

    hw.set_door(false);
    app.tick(401_000, &mut hw, &mut sink);
    app.tick(402_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Error);

    // Closing again restarts the hold.
    hw.set_door(true);
    app.tick(402_500, &mut hw, &mut sink);
    hw.set_door(false);
    app.tick(405_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Error);

    app.tick(405_500, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::DoorOpen);
    assert_eq!(app.error_code(), ErrorCode::None);
    assert_eq!(app.stats().cycle_count, 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ErrorCleared)), 1);
    assert!(!hw.pump_on());
}

#[test]
fn short_cycles_latch_rapid_cycling_from_settle() {
    // Cooldown off: only the rapid-cycle rule can refuse a start.
    let config = SystemConfig {
        cooldown_enabled: false,
        ..SystemConfig::default()
    };
    let (mut app, mut hw, mut sink) = filling(config);

    // Ten more 100 ms runs, each cut short by the door.
    let mut t = 2_000;
    for _ in 0..10 {
        hw.set_door(false);
        app.tick(t + 100, &mut hw, &mut sink);
        assert_eq!(app.state(), StateId::DoorOpen);
        hw.set_door(true);
        app.tick(t + 200, &mut hw, &mut sink);
        assert_eq!(app.state(), StateId::WaitSettle);
        app.tick(t + 2_200, &mut hw, &mut sink);
        assert_eq!(app.state(), StateId::Filling);
        t += 2_200;
    }
    assert_eq!(app.stats().cycle_count, 11);

    hw.set_door(false);
    app.tick(t + 100, &mut hw, &mut sink);
    hw.set_door(true);
    app.tick(t + 200, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::WaitSettle);
    assert_eq!(app.stats().total_run_time_ms, 1_100);

    app.tick(t + 2_200, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Error);
    assert_eq!(app.error_code(), ErrorCode::RapidCycling);
    assert!(!hw.pump_on());

    assert_eq!(app.fault_log().len(), 1);
    let record = app.fault_log().latest().copied().expect("fault recorded");
    assert_eq!(record.error_code, ErrorCode::RapidCycling);
    assert_eq!(record.state_at_fault, StateId::WaitSettle);
    assert_eq!(record.cycle_count, 11);
}

#[test]
fn overflow_trips_error_while_filling() {
    let config = SystemConfig {
        overflow_sensor_enabled: true,
        ..SystemConfig::default()
    };
    let (mut app, mut hw, mut sink) = filling(config);
    run(&mut app, &mut hw, &mut sink, 2_000, 5_000, 100);

    hw.set_overflow(true);
    app.tick(5_010, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Error);
    assert_eq!(app.error_code(), ErrorCode::Overflow);
    assert!(!hw.pump_on());
}

#[test]
fn duty_breach_forces_cooldown_without_error_code() {
    let config = SystemConfig {
        max_duty_percent: 50,
        ..SystemConfig::default()
    };
    let (mut app, mut hw, mut sink) = filling(config);

    app.tick(3_000, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Cooldown);
    assert!(!hw.pump_on());
    assert_eq!(app.error_code(), ErrorCode::None);
    assert_eq!(app.stats().error_count, 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::DutyCycleBreach)), 1);
    assert!(app.fault_log().is_empty());
}

#[test]
fn failed_self_test_latches_sensor_fault() {
    let mut hw = MockHardware::closed_empty();
    hw.self_test_error = Some(SensorError::Contradictory);
    let mut app = AppService::new(SystemConfig::default());
    let mut sink = RecordingSink::new();

    let result = app.start(0, &mut hw, &mut sink);
    assert_eq!(result, Err(SensorError::Contradictory));
    assert_eq!(app.state(), StateId::Error);
    assert_eq!(app.error_code(), ErrorCode::SensorFault);

    // Boot sequence opens with the alternating self-test failure pattern.
    app.tick(10, &mut hw, &mut sink);
    assert_eq!(hw.leds(), LedOutputs::new(true, false));
    run(&mut app, &mut hw, &mut sink, 10, 5_000, 10);
    assert_eq!(app.state(), StateId::Error);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn clear_error_is_idempotent() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    app.tick(362_001, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Error);

    app.handle_command(AppCommand::ClearError, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Idle);
    assert_eq!(app.error_code(), ErrorCode::None);
    assert_eq!(app.stats().cycle_count, 0);

    app.handle_command(AppCommand::ClearError, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Idle);
    assert_eq!(app.error_code(), ErrorCode::None);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ErrorCleared)), 1);
    assert!(!hw.pump_on());
}

#[test]
fn shutdown_halts_and_ignores_further_commands() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    assert!(hw.pump_on());

    app.handle_command(AppCommand::Shutdown, &mut hw, &mut sink);
    assert!(app.is_halted());
    assert!(!hw.pump_on());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Halted)), 1);

    for t in (2_010..4_000).step_by(10) {
        app.tick(t, &mut hw, &mut sink);
        assert!(!hw.pump_on());
        assert_eq!(hw.leds(), LedOutputs::OFF);
    }

    app.handle_command(AppCommand::SensorSelfTestFailed, &mut hw, &mut sink);
    assert_eq!(app.error_code(), ErrorCode::None);
    assert!(app.status().halted);
}

// ── Diagnostics ───────────────────────────────────────────────

#[test]
fn door_held_open_triggers_diagnostics_and_rearms() {
    let mut hw = MockHardware::door_open();
    let (mut app, mut sink) = started(SystemConfig::default(), &mut hw);
    let diags = |s: &RecordingSink| s.count(|e| matches!(e, AppEvent::Diagnostics(_)));

    app.tick(0, &mut hw, &mut sink);
    run(&mut app, &mut hw, &mut sink, 0, 10_000, 1_000);
    assert_eq!(diags(&sink), 0);

    app.tick(11_000, &mut hw, &mut sink);
    assert_eq!(diags(&sink), 1);
    match sink.events.last() {
        Some(AppEvent::Diagnostics(summary)) => {
            assert!(!summary.door_closed);
            assert_eq!(summary.error_blinks, 0);
            assert_eq!(summary.cycle_tens, 0);
        }
        other => panic!("expected diagnostics, got {:?}", other),
    }

    run(&mut app, &mut hw, &mut sink, 11_000, 21_000, 1_000);
    assert_eq!(diags(&sink), 1);
    app.tick(22_000, &mut hw, &mut sink);
    assert_eq!(diags(&sink), 2);

    // Closing the door disarms the trigger.
    hw.set_door(true);
    app.tick(23_000, &mut hw, &mut sink);
    hw.set_door(false);
    run(&mut app, &mut hw, &mut sink, 23_000, 33_000, 1_000);
    assert_eq!(diags(&sink), 2);
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn fault_log_survives_save_and_restore() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    app.tick(362_001, &mut hw, &mut sink);
    app.handle_command(AppCommand::ClearError, &mut hw, &mut sink);
    app.handle_command(AppCommand::SensorSelfTestFailed, &mut hw, &mut sink);

    let mut storage = MockStorage::new();
    app.fault_log().save(&mut storage).expect("save");

    let restored = FaultLog::restore(&storage).expect("restore");
    let codes: Vec<ErrorCode> = restored.records().map(|r| r.error_code).collect();
    assert_eq!(codes, vec![ErrorCode::GallonEmpty, ErrorCode::SensorFault]);
}

#[test]
fn boot_resumes_stored_fault_history() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    app.tick(362_001, &mut hw, &mut sink);
    let mut storage = MockStorage::new();
    app.fault_log().save(&mut storage).expect("save");

    let mut hw = MockHardware::closed_empty();
    let mut rebooted = AppService::with_stored_faults(SystemConfig::default(), &storage);
    let _ = rebooted.start(0, &mut hw, &mut sink);
    assert_eq!(rebooted.fault_log().len(), 1);

    rebooted.handle_command(AppCommand::SensorSelfTestFailed, &mut hw, &mut sink);
    let codes: Vec<ErrorCode> = rebooted.fault_log().records().map(|r| r.error_code).collect();
    assert_eq!(codes, vec![ErrorCode::GallonEmpty, ErrorCode::SensorFault]);
}

#[test]
fn unreadable_fault_history_boots_empty() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    app.tick(362_001, &mut hw, &mut sink);
    let mut storage = MockStorage::new();
    app.fault_log().save(&mut storage).expect("save");
    storage.corrupt("faults", "ring");

    let rebooted = AppService::with_stored_faults(SystemConfig::default(), &storage);
    assert!(rebooted.fault_log().is_empty());
}

#[test]
fn corrupted_fault_log_is_reported() {
    let (mut app, mut hw, mut sink) = filling(SystemConfig::default());
    app.tick(362_001, &mut hw, &mut sink);

    let mut storage = MockStorage::new();
    app.fault_log().save(&mut storage).expect("save");
    storage.corrupt("faults", "ring");

    assert!(FaultLog::restore(&storage).is_err());
    assert!(FaultLog::restore(&MockStorage::new())
        .expect("missing log is empty")
        .is_empty());
}
