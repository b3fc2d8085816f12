// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::worker::NO_DEVICES_MESSAGE;
use std::time::Duration;
use sweep_core::{DiscoveryType, JobState};
use sweep_scan::test_support::{MockPinger, MockSnmpClient, MockSnmpFactory};
use sweep_sinks::test_support::RecordingSink;

const MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];

fn test_config(workers: usize, max_active_jobs: usize) -> EngineConfig {
    EngineConfig {
        workers,
        max_active_jobs,
        timeout: Duration::from_millis(100),
        ..Default::default()
    }
}

fn collaborators(
    pinger: MockPinger,
    factory: MockSnmpFactory,
) -> (Collaborators, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    (
        Collaborators {
            pinger: Arc::new(pinger),
            snmp: Arc::new(factory),
            unifi: Vec::new(),
            publisher: Arc::clone(&sink) as Arc<dyn Publisher>,
        },
        sink,
    )
}

fn engine_with(
    config: EngineConfig,
    pinger: MockPinger,
    factory: MockSnmpFactory,
) -> (Engine<SystemClock>, Arc<RecordingSink>) {
    let (collab, sink) = collaborators(pinger, factory);
    let engine = Engine::new(config, collab, SystemClock).unwrap();
    (engine, sink)
}

fn params(seeds: &[&str]) -> JobParams {
    JobParams::new(seeds.iter().map(|s| s.to_string()).collect(), DiscoveryType::Basic)
        .agent_id("agent-1")
        .poller_id("poller-1")
}

async fn wait_terminal(engine: &Engine<SystemClock>, id: JobId) -> JobStatus {
    for _ in 0..1_000 {
        let status = engine.discovery_status(&id).unwrap();
        if status.state.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {} never reached a terminal state", id);
}

async fn wait_state(engine: &Engine<SystemClock>, id: JobId, state: JobState) {
    for _ in 0..1_000 {
        if engine.discovery_status(&id).unwrap().state == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {} never reached {}", id, state);
}

#[test]
fn invalid_config_is_rejected() {
    let (collab, _) = collaborators(MockPinger::reachable(), MockSnmpFactory::new());
    assert!(Engine::new(test_config(0, 5), collab, SystemClock).is_err());
}

#[tokio::test]
async fn empty_seeds_are_rejected_without_state_change() {
    let (engine, _) = engine_with(test_config(2, 5), MockPinger::reachable(), MockSnmpFactory::new());
    engine.start();

    let err = engine.start_discovery(params(&[])).unwrap_err();
    assert!(matches!(err, EngineError::NoSeeds));
    assert_eq!(engine.job_counts(), (0, 0, 0));

    engine.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn single_seed_discovery_completes() {
    let factory =
        MockSnmpFactory::new().with_client("192.168.1.1", MockSnmpClient::system("dev1", MAC));
    let (engine, sink) = engine_with(test_config(2, 5), MockPinger::reachable(), factory);
    engine.start();

    let id = engine.start_discovery(params(&["192.168.1.1"])).unwrap();
    let status = wait_terminal(&engine, id).await;

    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.progress, 100.0);
    assert_eq!(status.devices_found, 1);
    assert!(status.end_ms >= status.start_ms);

    let results = engine.discovery_results(&id, false).unwrap();
    assert_eq!(results.results.devices.len(), 1);
    let device = &results.results.devices[0];
    assert_eq!(device.device_id, "agent-1:poller-1:00:11:22:33:44:55");
    assert_eq!(device.hostname, "dev1");
    assert!(results.results.raw.is_empty());

    let with_raw = engine.discovery_results(&id, true).unwrap();
    assert!(with_raw.results.raw.contains_key("192.168.1.1"));

    assert_eq!(sink.devices().len(), 1);
    engine.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn unreachable_targets_complete_with_no_devices_error() {
    let (engine, sink) =
        engine_with(test_config(1, 2), MockPinger::unreachable(), MockSnmpFactory::new());
    engine.start();

    let id = engine.start_discovery(params(&["10.0.0.1", "10.0.0.2"])).unwrap();
    let status = wait_terminal(&engine, id).await;

    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.devices_found, 0);
    assert_eq!(status.error.as_deref(), Some(NO_DEVICES_MESSAGE));
    assert!(sink.devices().is_empty());

    engine.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn admission_rejects_when_at_capacity() {
    let factory = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let (engine, _) = engine_with(
        test_config(1, 1),
        MockPinger::reachable().with_delay(Duration::from_millis(200)),
        factory,
    );
    engine.start();

    let first = engine.start_discovery(params(&["10.0.0.1"])).unwrap();
    wait_state(&engine, first, JobState::Running).await;

    let err = engine.start_discovery(params(&["10.0.0.2"])).unwrap_err();
    assert!(matches!(err, EngineError::AtCapacity(_) | EngineError::WorkersBusy));
    assert_eq!(engine.active_job_ids().len(), 1);

    engine.cancel_discovery(&first).unwrap();
    engine.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn cancel_mid_scan_keeps_partial_results() {
    let factory = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let (engine, _) = engine_with(
        test_config(1, 1),
        MockPinger::reachable().with_delay(Duration::from_millis(100)),
        factory,
    );
    engine.start();

    let id = engine.start_discovery(params(&["10.0.0.0/24"])).unwrap();
    wait_state(&engine, id, JobState::Running).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    engine.cancel_discovery(&id).unwrap();
    let status = engine.discovery_status(&id).unwrap();
    assert_eq!(status.state, JobState::Canceled);
    assert_eq!(status.progress, 100.0);
    assert!(status.end_ms > status.start_ms);

    // The partial set is queryable immediately.
    let results = engine.discovery_results(&id, false).unwrap();
    assert_eq!(results.status.state, JobState::Canceled);
    assert!(results.results.devices.len() < 254);

    // Cancelling again is a no-op; cancelling nonsense is an error.
    engine.cancel_discovery(&id).unwrap();
    let unknown = JobId::new();
    assert!(matches!(
        engine.cancel_discovery(&unknown),
        Err(EngineError::JobNotActive(_)),
    ));

    engine.stop(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn results_gate_on_job_state() {
    let factory = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let (engine, _) = engine_with(
        test_config(1, 1),
        MockPinger::reachable().with_delay(Duration::from_millis(100)),
        factory,
    );
    engine.start();

    let id = engine.start_discovery(params(&["10.0.0.1"])).unwrap();
    wait_state(&engine, id, JobState::Running).await;
    assert!(matches!(
        engine.discovery_results(&id, false),
        Err(EngineError::JobStillActive(_)),
    ));

    let unknown = JobId::new();
    assert!(matches!(
        engine.discovery_results(&unknown, false),
        Err(EngineError::JobNotCompleted(_)),
    ));
    assert!(matches!(
        engine.discovery_status(&unknown),
        Err(EngineError::JobNotFound(_)),
    ));

    wait_terminal(&engine, id).await;
    assert!(engine.discovery_results(&id, false).is_ok());
    engine.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn latest_cached_returns_newest_end_time() {
    let factory = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let (engine, _) = engine_with(test_config(1, 2), MockPinger::reachable(), factory);
    engine.start();

    assert!(matches!(
        engine.latest_cached_results(false),
        Err(EngineError::NoCachedResults),
    ));

    let first = engine.start_discovery(params(&["10.0.0.1"])).unwrap();
    wait_terminal(&engine, first).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = engine.start_discovery(params(&["10.0.0.2"])).unwrap();
    wait_terminal(&engine, second).await;

    let latest = engine.latest_cached_results(false).unwrap();
    let first_end = engine.discovery_status(&first).unwrap().end_ms;
    let second_end = engine.discovery_status(&second).unwrap().end_ms;
    assert_eq!(latest.status.end_ms, first_end.max(second_end));

    engine.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn stop_rejects_new_work_and_fails_queued_jobs() {
    let factory = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let (engine, _) = engine_with(
        test_config(1, 2),
        MockPinger::reachable().with_delay(Duration::from_millis(100)),
        factory,
    );
    engine.start();

    let running = engine.start_discovery(params(&["10.0.0.0/24"])).unwrap();
    wait_state(&engine, running, JobState::Running).await;
    let queued = engine.start_discovery(params(&["10.0.0.99"])).unwrap();

    engine.stop(Duration::from_secs(2)).await.unwrap();

    // The running job was interrupted; the queued one never ran. Both
    // end up failed in the completed map.
    for id in [running, queued] {
        let status = engine.discovery_status(&id).unwrap();
        assert_eq!(status.state, JobState::Failed, "job {}", id);
        assert_eq!(status.error.as_deref(), Some(SHUTDOWN_MESSAGE));
        assert!(status.end_ms != 0);
    }
    assert_eq!(engine.active_job_ids().len(), 0);

    assert!(matches!(
        engine.start_discovery(params(&["10.0.0.1"])),
        Err(EngineError::ShuttingDown),
    ));
}

#[tokio::test]
async fn progress_is_monotonic_while_running() {
    let factory = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let (engine, _) = engine_with(
        test_config(1, 1),
        MockPinger::reachable().with_delay(Duration::from_millis(20)),
        factory,
    );
    engine.start();

    let id = engine.start_discovery(params(&["10.0.0.0/28"])).unwrap();
    let mut last = 0.0f64;
    loop {
        let status = engine.discovery_status(&id).unwrap();
        assert!(status.progress >= last, "progress regressed: {} < {}", status.progress, last);
        last = status.progress;
        if status.state.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(3)).await;
    }
    assert_eq!(last, 100.0);
    engine.stop(Duration::from_secs(1)).await.unwrap();
}
