//! Timing tests for running cycles.
//!
//! Phase boundaries are checked against the recorded write timestamps
//! with a generous lateness allowance; timers never fire early.

use std::thread;
use std::time::Duration;

use pumpctl::app::relay::{CycleSpec, RelayId};
use pumpctl::scheduler::RelayMode;

use crate::mock_hw::{LevelWrite, make_scheduler};

const MAX_PHASE_MS: u64 = 86_400_000;
const EARLY_MS: u64 = 5;
const LATE_MS: u64 = 200;

fn spec(relay: RelayId, on_ms: i64, off_ms: i64) -> CycleSpec {
    CycleSpec::from_millis(relay, on_ms, off_ms, MAX_PHASE_MS).unwrap()
}

fn assert_near(write: &LevelWrite, t0: Duration, expected_ms: u64, high: bool) {
    let offset = write.at.saturating_sub(t0).as_millis() as u64;
    assert_eq!(write.high, high, "wrong level at ~{expected_ms} ms");
    assert!(
        offset + EARLY_MS >= expected_ms && offset <= expected_ms + LATE_MS,
        "edge expected at {expected_ms} ms, happened at {offset} ms"
    );
}

// ── 500 ms on / 1000 ms off ───────────────────────────────────

#[test]
fn duty_cycle_edges_follow_phase_lengths() {
    let (port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay2, 500, 1_000)).unwrap();
    thread::sleep(Duration::from_millis(2_250));
    sched.stop(RelayId::Relay2).unwrap();

    let edges = port.transitions_for(RelayId::Relay2);
    assert!(edges.len() >= 4, "only {} edges: {:?}", edges.len(), edges);

    let t0 = edges[0].at;
    assert!(edges[0].high);
    assert_near(&edges[1], t0, 500, false);
    assert_near(&edges[2], t0, 1_500, true);
    assert_near(&edges[3], t0, 2_000, false);

    // After stop the output stays low with no further writes.
    assert!(!port.level(RelayId::Relay2));
    let settled = port.write_count(RelayId::Relay2);
    thread::sleep(Duration::from_millis(600));
    assert_eq!(port.write_count(RelayId::Relay2), settled);
}

// ── Manual override of a running cycle ────────────────────────

#[test]
fn turn_on_cancels_cycle_and_holds_high() {
    let (port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay1, 100, 100)).unwrap();
    thread::sleep(Duration::from_millis(250));
    sched.turn_on(RelayId::Relay1).unwrap();

    assert!(port.level(RelayId::Relay1));
    assert_eq!(sched.mode(RelayId::Relay1), RelayMode::On);
    assert!(!sched.is_cycling(RelayId::Relay1));

    let settled = port.write_count(RelayId::Relay1);
    thread::sleep(Duration::from_millis(400));
    assert_eq!(port.write_count(RelayId::Relay1), settled, "cycle kept toggling");
    assert!(port.level(RelayId::Relay1));
}

// ── Zero-length phases ────────────────────────────────────────

#[test]
fn zero_off_interval_holds_output_high() {
    let (port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay3, 50, 0)).unwrap();
    thread::sleep(Duration::from_millis(300));

    let writes = port.writes_for(RelayId::Relay3);
    assert!(writes.len() >= 3);
    assert!(writes.iter().all(|w| w.high), "off phase must be skipped");

    sched.stop(RelayId::Relay3).unwrap();
    assert!(!port.level(RelayId::Relay3));
}

#[test]
fn zero_on_duration_never_drives_high() {
    let (port, sched) = make_scheduler();

    sched.start_cycle(spec(RelayId::Relay1, 0, 40)).unwrap();
    thread::sleep(Duration::from_millis(200));
    sched.stop(RelayId::Relay1).unwrap();

    assert!(port.writes_for(RelayId::Relay1).iter().all(|w| !w.high));
}

// ── Hardware failure inside a cycle ───────────────────────────

#[test]
fn cycle_keeps_running_through_write_failures() {
    let (port, sched) = make_scheduler();
    port.set_failing(RelayId::Relay2, true);

    sched.start_cycle(spec(RelayId::Relay2, 30, 30)).unwrap();
    thread::sleep(Duration::from_millis(250));
    let failed_attempts = port.write_count(RelayId::Relay2);
    assert!(failed_attempts >= 4, "loop stopped after a failed write");
    assert!(sched.is_cycling(RelayId::Relay2));

    port.set_failing(RelayId::Relay2, false);
    thread::sleep(Duration::from_millis(150));
    assert!(port.write_count(RelayId::Relay2) > failed_attempts);

    sched.stop(RelayId::Relay2).unwrap();
    assert!(!port.level(RelayId::Relay2));
}
