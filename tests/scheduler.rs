//! Scheduled sweeps against memory stores.

use std::time::Duration;

use status_checker::config::SchedulerConfig;
use status_checker::recorder::ReadQuery;
use status_checker::{Scheduler, Shutdown};

mod common;
use common::{memory_config, start_mock_backend, TestServer};

#[tokio::test]
async fn test_scheduled_sweep_records_configured_services() {
    let ping = start_mock_backend("ok").await;
    let server = TestServer::start(memory_config(ping)).await;

    let scheduler = Scheduler::new(
        server.app.monitor.clone(),
        SchedulerConfig {
            enabled: true,
            interval_secs: 3600,
            services: vec!["micro".into(), "drive".into()],
        },
    );
    let shutdown = Shutdown::new();
    let task = tokio::spawn(scheduler.run(shutdown.subscribe()));

    // First tick fires immediately; wait for its records to land.
    let recorder = server.app.recorder.clone();
    let mut stored = Vec::new();
    for _ in 0..50 {
        stored = recorder.summaries(&ReadQuery::default()).await.unwrap();
        if stored.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let mut services: Vec<_> = stored.iter().map(|s| s.service.as_str()).collect();
    services.sort();
    assert_eq!(services, vec!["drive", "micro"]);
    assert!(stored.iter().all(|s| s.passed));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
    server.stop();
}
