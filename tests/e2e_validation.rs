//! E2E: validation reports the complete defect list from a real file

use fleet_e2e_tests::{store_for, write_inventory};
use fleet_engine::domain::validate_inventory;

const DEFECTIVE_INVENTORY: &str = "\
servers:
  - name: ok-01
    hostname: ok01-host
    ip: 10.0.0.1
    environment: production
    role: web-application
    monitoring_type: system
    prometheus_port: 9100
  - name: bad-01
    hostname: bad01-host
    ip: 10.0.0.2
    environment: ''
    role: web-application
    monitoring_type: system
    prometheus_port: 9100
  - name: bad-02
    hostname: bad02-host
    ip: 10.0.0.3
    environment: production
    role: database
    monitoring_type: docker+system
    docker_enabled: true
    prometheus_port: 9100
  - name: bad-03
    hostname: bad03-host
    ip: 10.0.0.4
    environment: production
    role: database
    monitoring_type: system
    docker_enabled: true
    prometheus_port: 9100
    cadvisor_port: 8080
";

#[test]
fn all_independent_defects_are_reported() {
    let (_dir, path) = write_inventory(DEFECTIVE_INVENTORY);
    let inventory = store_for(&path).load().unwrap();

    // bad-01: empty environment
    // bad-02: docker_enabled without cadvisor_port
    // bad-03: docker_enabled but monitoring_type 'system'
    let errors = validate_inventory(&inventory);
    assert_eq!(errors.len(), 3, "errors: {:?}", errors);

    let servers: Vec<_> = errors.iter().map(|e| e.server.as_str()).collect();
    assert_eq!(servers, vec!["bad-01", "bad-02", "bad-03"]);
    assert!(errors.iter().all(|e| e.server != "ok-01"));
}

#[test]
fn missing_monitoring_type_does_not_hide_other_defects() {
    // One record omits monitoring_type entirely, another has an empty
    // required field; the load must survive so both defects get reported
    let (_dir, path) = write_inventory(
        "\
servers:
  - name: bad-01
    hostname: bad01-host
    ip: 10.0.0.1
    environment: production
    role: web-application
    prometheus_port: 9100
  - name: bad-02
    hostname: bad02-host
    ip: 10.0.0.2
    environment: ''
    role: database
    monitoring_type: system
    prometheus_port: 9100
",
    );
    let inventory = store_for(&path).load().unwrap();

    let errors = validate_inventory(&inventory);
    assert_eq!(errors.len(), 2, "errors: {:?}", errors);
    assert_eq!(errors[0].server, "bad-01");
    assert_eq!(errors[0].field, "monitoring_type");
    assert_eq!(errors[1].server, "bad-02");
    assert_eq!(errors[1].field, "environment");
}

#[test]
fn clean_inventory_reports_nothing() {
    let (_dir, path) = write_inventory(fleet_e2e_tests::SAMPLE_INVENTORY);
    let inventory = store_for(&path).load().unwrap();
    assert!(validate_inventory(&inventory).is_empty());
}
