//! Shared test utilities for E2E tests
//!
//! Tests drive the engine exactly the way the CLI does: inventories live in
//! real temporary YAML files, remote execution and probing go through the
//! scripted transports from `fleet_engine::domain::ports`. Each test owns
//! its own TempDir, so tests run in parallel without interference.

use std::path::PathBuf;
use tempfile::TempDir;

use fleet_engine::domain::{MonitoringType, ServerRecord};
use fleet_engine::infrastructure::YamlInventoryStore;

/// A three-server inventory covering every monitoring type
pub const SAMPLE_INVENTORY: &str = "\
servers:
  - name: web-01
    hostname: web01-host
    ip: 10.0.0.10
    environment: production
    role: web-application
    monitoring_type: docker+system
    system_monitoring: true
    docker_enabled: true
    prometheus_port: 9100
    cadvisor_port: 8080
  - name: db-01
    hostname: db01-host
    ip: 10.0.0.20
    environment: production
    role: database
    monitoring_type: system
    prometheus_port: 9100
  - name: k8s-01
    hostname: k8s01-host
    ip: 10.0.0.30
    environment: staging
    role: kubernetes-node
    monitoring_type: kubernetes+system
    system_monitoring: true
    docker_enabled: true
    prometheus_port: 9100
    cadvisor_port: 8080
";

/// Write an inventory file into its own temp dir; keep the TempDir alive
/// for the duration of the test
pub fn write_inventory(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("servers.yaml");
    std::fs::write(&path, content).expect("failed to write inventory");
    (dir, path)
}

pub fn store_for(path: &PathBuf) -> YamlInventoryStore {
    YamlInventoryStore::new(path)
}

/// A minimal valid server record for building fleets programmatically
pub fn test_server(name: &str, monitoring_type: MonitoringType) -> ServerRecord {
    ServerRecord::from_monitoring_type(
        name,
        format!("{name}-host"),
        "10.0.0.1",
        "production",
        "web-application",
        monitoring_type,
    )
}

/// A fleet of `n` system-monitored servers named web-01..web-NN
pub fn test_fleet(n: usize) -> Vec<ServerRecord> {
    (1..=n)
        .map(|i| test_server(&format!("web-{:02}", i), MonitoringType::System))
        .collect()
}
