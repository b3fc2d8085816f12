// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end discovery scenarios against the engine with mock
//! collaborators: reachability, SNMP, UniFi controllers, and the
//! publisher are all in-memory doubles.

use std::sync::Arc;
use std::time::Duration;
use sweep_core::{DiscoveryType, JobId, JobParams, JobState, JobStatus, SystemClock};
use sweep_engine::{Collaborators, Engine, EngineConfig, EngineError};
use sweep_scan::test_support::{MockPinger, MockSnmpClient, MockSnmpFactory};
use sweep_sinks::test_support::RecordingSink;
use sweep_unifi::test_support::MockUnifiApi;
use sweep_unifi::{UnifiApi, UnifiDevice};

const MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];

struct Harness {
    engine: Engine<SystemClock>,
    sink: Arc<RecordingSink>,
}

impl Harness {
    fn start(
        config: EngineConfig,
        pinger: MockPinger,
        snmp: MockSnmpFactory,
        unifi: Vec<MockUnifiApi>,
    ) -> Self {
        let sink = Arc::new(RecordingSink::new());
        let collab = Collaborators {
            pinger: Arc::new(pinger),
            snmp: Arc::new(snmp),
            unifi: unifi
                .into_iter()
                .map(|api| Arc::new(api) as Arc<dyn UnifiApi>)
                .collect(),
            publisher: Arc::clone(&sink) as Arc<dyn sweep_sinks::Publisher>,
        };
        let engine = Engine::new(config, collab, SystemClock).expect("engine config");
        engine.start();
        Self { engine, sink }
    }

    async fn wait_terminal(&self, id: JobId) -> JobStatus {
        for _ in 0..2_000 {
            let status = self.engine.discovery_status(&id).expect("status");
            if status.state.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} never reached a terminal state", id);
    }

    async fn stop(&self) {
        self.engine.stop(Duration::from_secs(2)).await.expect("stop");
    }
}

fn config(workers: usize, max_active_jobs: usize) -> EngineConfig {
    EngineConfig {
        workers,
        max_active_jobs,
        timeout: Duration::from_millis(100),
        ..Default::default()
    }
}

fn params(seeds: &[&str], discovery_type: DiscoveryType) -> JobParams {
    JobParams::new(seeds.iter().map(|s| s.to_string()).collect(), discovery_type)
        .agent_id("agent-1")
        .poller_id("poller-1")
}

/// S1: single seed, no UniFi, responsive SNMP device.
#[tokio::test]
async fn s1_single_seed_basic_discovery() {
    let snmp = MockSnmpFactory::new()
        .with_client("192.168.1.1", MockSnmpClient::system("dev1", MAC));
    let harness = Harness::start(config(2, 5), MockPinger::reachable(), snmp, vec![]);

    let id = harness
        .engine
        .start_discovery(params(&["192.168.1.1"], DiscoveryType::Basic))
        .expect("admitted");

    // pending → running → completed; observed progress never decreases.
    let mut last_progress = 0.0f64;
    let status = loop {
        let status = harness.engine.discovery_status(&id).expect("status");
        assert!(status.progress >= last_progress);
        last_progress = status.progress;
        if status.state.is_terminal() {
            break status;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    };

    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.progress, 100.0);
    assert_eq!(status.devices_found, 1);

    let results = harness.engine.discovery_results(&id, false).expect("results");
    assert_eq!(results.results.devices.len(), 1);
    assert_eq!(
        results.results.devices[0].device_id,
        "agent-1:poller-1:00:11:22:33:44:55",
    );
    assert_eq!(harness.sink.devices().len(), 1);

    harness.stop().await;
}

/// S2: empty seed list is rejected with no state change.
#[tokio::test]
async fn s2_empty_seeds_rejected() {
    let harness =
        Harness::start(config(2, 5), MockPinger::reachable(), MockSnmpFactory::new(), vec![]);

    let err = harness
        .engine
        .start_discovery(params(&[], DiscoveryType::Basic))
        .expect_err("must reject");
    assert!(matches!(err, EngineError::NoSeeds));
    assert_eq!(harness.engine.job_counts(), (0, 0, 0));
    assert!(harness.sink.records().is_empty());

    harness.stop().await;
}

/// S3: cancel mid-scan over a /24 with a slow ping stub.
#[tokio::test]
async fn s3_cancel_mid_scan() {
    let snmp = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let harness = Harness::start(
        config(1, 1),
        MockPinger::reachable().with_delay(Duration::from_millis(200)),
        snmp,
        vec![],
    );

    let id = harness
        .engine
        .start_discovery(params(&["10.0.0.0/24"], DiscoveryType::Basic))
        .expect("admitted");
    tokio::time::sleep(Duration::from_millis(50)).await;

    harness.engine.cancel_discovery(&id).expect("cancel");
    let status = harness.engine.discovery_status(&id).expect("status");
    assert_eq!(status.state, JobState::Canceled);
    assert!(status.end_ms > status.start_ms);

    let results = harness.engine.discovery_results(&id, false).expect("partial results");
    assert_eq!(results.status.state, JobState::Canceled);
    assert!(results.results.devices.len() < 254);

    harness.stop().await;
}

/// S4: the same device under two IPs via UniFi deduplicates on MAC.
#[tokio::test]
async fn s4_unifi_mac_dedup() {
    let device = |id: &str, ip: &str| UnifiDevice {
        id: id.to_string(),
        name: "switch".to_string(),
        mac: "AA:BB:CC:DD:EE:FF".to_string(),
        ip: ip.to_string(),
        features: vec!["switching".to_string()],
        ..Default::default()
    };
    let api = MockUnifiApi::new("lab")
        .with_site("default")
        .with_device("default", device("dev-a", "10.0.0.1"))
        .with_device("default", device("dev-b", "10.0.0.2"));
    let snmp = MockSnmpFactory::new().with_fallback(MockSnmpClient::new());
    let harness = Harness::start(config(1, 1), MockPinger::unreachable(), snmp, vec![api]);

    let id = harness
        .engine
        .start_discovery(params(&["10.0.0.1", "10.0.0.2"], DiscoveryType::Basic))
        .expect("admitted");
    harness.wait_terminal(id).await;

    let results = harness.engine.discovery_results(&id, false).expect("results");
    assert_eq!(results.results.devices.len(), 1);
    let device = &results.results.devices[0];
    assert_eq!(device.ip, "10.0.0.1");
    assert_eq!(device.mac, "aa:bb:cc:dd:ee:ff");
    assert_eq!(device.metadata["alternate_ip_10.0.0.2"], "10.0.0.2");

    harness.stop().await;
}

/// S5: with one active job at max capacity, the next admission is
/// rejected and the active count holds.
#[tokio::test]
async fn s5_capacity_rejection() {
    let snmp = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let harness = Harness::start(
        config(1, 1),
        MockPinger::reachable().with_delay(Duration::from_millis(300)),
        snmp,
        vec![],
    );

    let first = harness
        .engine
        .start_discovery(params(&["10.0.0.0/28"], DiscoveryType::Basic))
        .expect("admitted");

    let err = harness
        .engine
        .start_discovery(params(&["10.0.1.1"], DiscoveryType::Basic))
        .expect_err("must reject");
    assert!(matches!(err, EngineError::AtCapacity(_) | EngineError::WorkersBusy));
    assert_eq!(harness.engine.active_job_ids().len(), 1);

    harness.engine.cancel_discovery(&first).expect("cancel");
    harness.stop().await;
}

/// S6: with a 1s retention window the completed job is evicted and both
/// result queries stop returning it.
#[tokio::test]
async fn s6_retention_eviction() {
    let snmp = MockSnmpFactory::new()
        .with_client("192.168.1.1", MockSnmpClient::system("dev1", MAC));
    let harness = Harness::start(
        EngineConfig {
            workers: 1,
            max_active_jobs: 1,
            timeout: Duration::from_millis(100),
            result_retention: Duration::from_secs(1),
            ..Default::default()
        },
        MockPinger::reachable(),
        snmp,
        vec![],
    );

    let id = harness
        .engine
        .start_discovery(params(&["192.168.1.1"], DiscoveryType::Basic))
        .expect("admitted");
    harness.wait_terminal(id).await;
    assert!(harness.engine.discovery_results(&id, false).is_ok());

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(matches!(
        harness.engine.discovery_results(&id, false),
        Err(EngineError::JobNotCompleted(_)),
    ));
    assert!(matches!(
        harness.engine.latest_cached_results(false),
        Err(EngineError::NoCachedResults),
    ));

    harness.stop().await;
}

/// Invariant 2: every admitted ID is in exactly one map at all times,
/// observed through the status/results surface across a job's life.
#[tokio::test]
async fn admitted_ids_always_resolve_until_eviction() {
    let snmp = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let harness = Harness::start(
        config(2, 4),
        MockPinger::reachable().with_delay(Duration::from_millis(10)),
        snmp,
        vec![],
    );

    let mut ids = Vec::new();
    for seed in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        ids.push(
            harness
                .engine
                .start_discovery(params(&[seed], DiscoveryType::Basic))
                .expect("admitted"),
        );
    }
    // Status answers for every admitted ID at any point in the
    // lifecycle.
    for _ in 0..50 {
        for id in &ids {
            harness.engine.discovery_status(id).expect("always resolvable");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    for id in ids {
        let status = harness.wait_terminal(id).await;
        assert!(status.state.is_terminal());
    }
    harness.stop().await;
}

/// Invariant 3: cancellation is idempotent, and unknown jobs report
/// not-active.
#[tokio::test]
async fn cancel_idempotence() {
    let snmp = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let harness = Harness::start(
        config(1, 1),
        MockPinger::reachable().with_delay(Duration::from_millis(100)),
        snmp,
        vec![],
    );

    let id = harness
        .engine
        .start_discovery(params(&["10.0.0.0/28"], DiscoveryType::Basic))
        .expect("admitted");
    harness.engine.cancel_discovery(&id).expect("first cancel");
    harness.engine.cancel_discovery(&id).expect("second cancel is a no-op");

    let never_admitted = JobId::new();
    assert!(matches!(
        harness.engine.cancel_discovery(&never_admitted),
        Err(EngineError::JobNotActive(_)),
    ));

    harness.stop().await;
}

/// Invariant 9: stop returns within its bound and the engine refuses
/// further work.
#[tokio::test]
async fn stop_honors_deadline() {
    let snmp = MockSnmpFactory::new().with_fallback(MockSnmpClient::system("dev", MAC));
    let harness = Harness::start(
        config(2, 4),
        MockPinger::reachable().with_delay(Duration::from_millis(50)),
        snmp,
        vec![],
    );
    let _ = harness
        .engine
        .start_discovery(params(&["10.0.0.0/26"], DiscoveryType::Basic))
        .expect("admitted");

    let started = std::time::Instant::now();
    harness.engine.stop(Duration::from_secs(5)).await.expect("stop");
    assert!(started.elapsed() < Duration::from_secs(5));

    assert!(matches!(
        harness.engine.start_discovery(params(&["10.0.0.1"], DiscoveryType::Basic)),
        Err(EngineError::ShuttingDown),
    ));
}

/// UniFi-found devices become SNMP targets; SNMP then enriches the same
/// device record (identity upgrade happens through the reconciler).
#[tokio::test]
async fn unifi_seeds_snmp_polling() {
    let api = MockUnifiApi::new("lab").with_site("default").with_device(
        "default",
        UnifiDevice {
            id: "dev-a".to_string(),
            name: "edge".to_string(),
            mac: "00:11:22:33:44:55".to_string(),
            ip: "10.0.0.40".to_string(),
            features: vec!["switching".to_string()],
            ..Default::default()
        },
    );
    let snmp = MockSnmpFactory::new()
        .with_client("10.0.0.40", MockSnmpClient::system("edge-snmp", MAC));
    let harness = Harness::start(config(1, 1), MockPinger::reachable(), snmp, vec![api]);

    let id = harness
        .engine
        .start_discovery(params(&["192.168.7.7"], DiscoveryType::Basic))
        .expect("admitted");
    let status = harness.wait_terminal(id).await;
    assert_eq!(status.state, JobState::Completed);

    let results = harness.engine.discovery_results(&id, false).expect("results");
    // One merged device: the UniFi record upgraded by the SNMP poll.
    assert_eq!(results.results.devices.len(), 1);
    let device = &results.results.devices[0];
    assert_eq!(device.hostname, "edge-snmp");
    assert_eq!(device.metadata["source"], "unifi-api");

    harness.stop().await;
}
