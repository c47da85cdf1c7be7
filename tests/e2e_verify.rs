//! E2E: fleet verification through the scripted probe

use std::sync::Arc;
use std::time::Duration;

use fleet_e2e_tests::{test_fleet, test_server};
use fleet_engine::domain::ports::ScriptedProbe;
use fleet_engine::domain::{Capability, MonitoringType, VerificationService};

fn service(probe: &ScriptedProbe) -> VerificationService {
    VerificationService::new(Arc::new(probe.clone())).with_retry(3, Duration::from_millis(1))
}

#[tokio::test]
async fn summary_counts_partially_healthy_servers_as_unhealthy() {
    let probe = ScriptedProbe::new();
    probe.mark_down("web-01-host", 8080);

    let fleet = vec![
        test_server("web-01", MonitoringType::DockerSystem),
        test_server("db-01", MonitoringType::System),
    ];
    let summary = service(&probe).verify(&fleet).await;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.healthy, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].server, "web-01");
    assert_eq!(summary.failures[0].capability, Capability::Cadvisor);
    assert!(!summary.all_healthy());
}

#[tokio::test]
async fn verification_is_repeatable() {
    let probe = ScriptedProbe::new();
    let fleet = test_fleet(5);

    let first = service(&probe).verify(&fleet).await;
    let second = service(&probe).verify(&fleet).await;

    assert_eq!(first.total, second.total);
    assert_eq!(first.healthy, second.healthy);
    assert!(first.all_healthy() && second.all_healthy());
}

#[tokio::test]
async fn flaky_endpoints_recover_within_the_retry_budget() {
    let probe = ScriptedProbe::new();
    probe.fail_first("web-01-host", 9100, 2);
    probe.fail_first("web-02-host", 9100, 3); // one more than the budget

    let summary = service(&probe).verify(&test_fleet(2)).await;

    assert_eq!(summary.healthy, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].server, "web-02");
    // Both endpoints were given exactly the full attempt budget
    assert_eq!(probe.attempts("web-01-host", 9100), 3);
    assert_eq!(probe.attempts("web-02-host", 9100), 3);
}
