//! Integration tests for command handling in `RelayScheduler`.
//!
//! Cover replacement of running cycles, stop semantics, relay isolation
//! and rejection of bad parameters, all against the recording port.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pumpctl::app::relay::{CycleSpec, RelayId};
use pumpctl::scheduler::RelayMode;
use pumpctl::{DurationError, Error};

use crate::mock_hw::make_scheduler;

const MAX_PHASE_MS: u64 = 86_400_000;

fn spec(relay: RelayId, on_ms: i64, off_ms: i64) -> CycleSpec {
    CycleSpec::from_millis(relay, on_ms, off_ms, MAX_PHASE_MS).unwrap()
}

// ── Replacement ───────────────────────────────────────────────

#[test]
fn back_to_back_start_leaves_only_the_second_cycle() {
    let (port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay1, 1_000, 1_000)).unwrap();
    sched.start_cycle(spec(RelayId::Relay1, 40, 40)).unwrap();

    assert_eq!(sched.active_cycles(), 1);
    assert_eq!(
        sched.mode(RelayId::Relay1),
        RelayMode::Cycling { on_ms: 40, off_ms: 40 }
    );

    // The second cycle toggles at its own 40 ms rhythm.
    thread::sleep(Duration::from_millis(300));
    assert!(port.transitions_for(RelayId::Relay1).len() >= 4);

    sched.stop(RelayId::Relay1).unwrap();
    let settled = port.write_count(RelayId::Relay1);
    thread::sleep(Duration::from_millis(200));
    assert_eq!(port.write_count(RelayId::Relay1), settled, "no task may survive stop");
}

#[test]
fn replaced_cycle_goes_low_before_the_new_one_goes_high() {
    let (port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay1, 10_000, 10_000)).unwrap();
    thread::sleep(Duration::from_millis(50));
    sched.start_cycle(spec(RelayId::Relay1, 10_000, 10_000)).unwrap();
    thread::sleep(Duration::from_millis(100));

    // Old HIGH, old task's final LOW, new HIGH, and nothing from the old
    // task after the new one started.
    let levels: Vec<bool> = port
        .writes_for(RelayId::Relay1)
        .iter()
        .map(|w| w.high)
        .collect();
    assert_eq!(levels, [true, false, true]);

    let writes = port.writes_for(RelayId::Relay1);
    assert!(writes[1].at <= writes[2].at);

    sched.stop(RelayId::Relay1).unwrap();
}

#[test]
fn concurrent_starts_on_one_relay_install_one_task() {
    let (port, sched) = make_scheduler();
    let sched = Arc::new(sched);

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let sched = sched.clone();
            thread::spawn(move || {
                sched
                    .start_cycle(spec(RelayId::Relay2, 20 + i, 20))
                    .unwrap();
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(sched.active_cycles(), 1);

    sched.stop(RelayId::Relay2).unwrap();
    let settled = port.write_count(RelayId::Relay2);
    thread::sleep(Duration::from_millis(150));
    assert_eq!(port.write_count(RelayId::Relay2), settled);
    assert!(!port.level(RelayId::Relay2));
}

// ── Stop ──────────────────────────────────────────────────────

#[test]
fn stop_without_cycle_still_drives_low() {
    let (port, sched) = make_scheduler();

    sched.turn_on(RelayId::Relay3).unwrap();
    assert!(port.level(RelayId::Relay3));

    sched.stop(RelayId::Relay3).unwrap();
    assert!(!port.level(RelayId::Relay3));
    assert_eq!(sched.mode(RelayId::Relay3), RelayMode::Off);
}

#[test]
fn stop_mid_on_phase_drives_low() {
    let (port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay1, 10_000, 10)).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(port.level(RelayId::Relay1));

    sched.stop(RelayId::Relay1).unwrap();
    assert!(!port.level(RelayId::Relay1));
    assert!(!sched.is_cycling(RelayId::Relay1));
}

// ── Isolation ─────────────────────────────────────────────────

#[test]
fn manual_level_is_unaffected_by_other_relays_cycles() {
    let (port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay2, 30, 30)).unwrap();
    sched.start_cycle(spec(RelayId::Relay3, 30, 30)).unwrap();
    sched.turn_on(RelayId::Relay1).unwrap();

    thread::sleep(Duration::from_millis(250));

    assert_eq!(port.write_count(RelayId::Relay1), 1);
    assert!(port.level(RelayId::Relay1));
    assert_eq!(sched.mode(RelayId::Relay1), RelayMode::On);
    assert_eq!(sched.active_cycles(), 2);

    sched.shutdown();
}

#[test]
fn commands_on_different_relays_run_concurrently() {
    let (port, sched) = make_scheduler();
    let sched = Arc::new(sched);

    let workers: Vec<_> = RelayId::ALL
        .into_iter()
        .map(|relay| {
            let sched = sched.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    sched.start_cycle(spec(relay, 15, 15)).unwrap();
                    thread::sleep(Duration::from_millis(10));
                    sched.turn_on(relay).unwrap();
                    sched.stop(relay).unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(sched.active_cycles(), 0);
    for relay in RelayId::ALL {
        assert!(!port.level(relay), "{relay} left high");
        assert_eq!(sched.mode(relay), RelayMode::Off);
    }
}

#[test]
fn hardware_failure_on_one_relay_does_not_touch_others() {
    let (port, sched) = make_scheduler();
    port.set_failing(RelayId::Relay2, true);

    assert_eq!(
        sched.turn_on(RelayId::Relay2),
        Err(Error::HardwareWriteFailure(RelayId::Relay2))
    );
    assert_eq!(sched.mode(RelayId::Relay2), RelayMode::Unknown);

    sched.turn_on(RelayId::Relay1).unwrap();
    assert_eq!(sched.mode(RelayId::Relay1), RelayMode::On);
    assert_eq!(sched.mode(RelayId::Relay3), RelayMode::Off);
}

// ── Rejection ─────────────────────────────────────────────────

#[test]
fn negative_duration_installs_no_task() {
    let (port, sched) = make_scheduler();

    let err = CycleSpec::from_millis(RelayId::Relay1, -5, 100, MAX_PHASE_MS).unwrap_err();
    assert_eq!(err, Error::InvalidDuration(DurationError::Negative));

    let too_long = CycleSpec {
        relay: RelayId::Relay1,
        on_duration: Duration::from_millis(MAX_PHASE_MS + 1),
        off_interval: Duration::from_millis(100),
    };
    assert!(matches!(
        sched.start_cycle(too_long),
        Err(Error::InvalidDuration(DurationError::TooLong { .. }))
    ));

    assert!(!sched.is_cycling(RelayId::Relay1));
    assert!(port.writes().is_empty());
}

#[test]
fn rejected_restart_keeps_the_running_cycle() {
    let (_port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay3, 50, 50)).unwrap();
    let both_zero = CycleSpec {
        relay: RelayId::Relay3,
        on_duration: Duration::ZERO,
        off_interval: Duration::ZERO,
    };
    assert_eq!(
        sched.start_cycle(both_zero),
        Err(Error::InvalidDuration(DurationError::BothZero))
    );
    assert!(sched.is_cycling(RelayId::Relay3));

    sched.shutdown();
}

#[test]
fn unknown_relay_ids_are_rejected() {
    for raw in [0, 4, -1, i64::MAX] {
        assert_eq!(RelayId::from_raw(raw), Err(Error::UnknownRelay(raw)));
    }
}
