//! E2E: inventory CRUD against a real file

use fleet_e2e_tests::{store_for, test_server, write_inventory, SAMPLE_INVENTORY};
use fleet_engine::domain::{DomainError, MonitoringType};

#[test]
fn add_then_persist_then_reload() {
    let (_dir, path) = write_inventory(SAMPLE_INVENTORY);
    let store = store_for(&path);

    let mut inventory = store.load().unwrap();
    inventory
        .add(test_server("cache-01", MonitoringType::System))
        .unwrap();
    store.persist(&inventory).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.len(), 4);
    assert!(reloaded.contains("cache-01"));
}

#[test]
fn duplicate_add_leaves_file_unchanged() {
    let (_dir, path) = write_inventory(SAMPLE_INVENTORY);
    let store = store_for(&path);
    let before = std::fs::read_to_string(&path).unwrap();

    let mut inventory = store.load().unwrap();
    let err = inventory
        .add(test_server("web-01", MonitoringType::System))
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateServer(_)));

    // The mutation failed, so nothing gets persisted (the CLI add path
    // persists only after a successful add)
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn remove_absent_server_is_a_no_op() {
    let (_dir, path) = write_inventory(SAMPLE_INVENTORY);
    let store = store_for(&path);
    let before = store.load().unwrap();

    let mut inventory = store.load().unwrap();
    assert!(!inventory.remove("ghost-99"));
    assert_eq!(inventory, before);
}

#[test]
fn add_then_remove_restores_semantic_state() {
    let (_dir, path) = write_inventory(SAMPLE_INVENTORY);
    let store = store_for(&path);

    let original = store.load().unwrap();

    let mut inventory = store.load().unwrap();
    inventory
        .add(test_server("cache-01", MonitoringType::System))
        .unwrap();
    assert!(inventory.remove("cache-01"));
    store.persist(&inventory).unwrap();

    assert_eq!(store.load().unwrap(), original);
}

#[test]
fn update_round_trips_through_the_file() {
    let (_dir, path) = write_inventory(SAMPLE_INVENTORY);
    let store = store_for(&path);

    let mut inventory = store.load().unwrap();
    inventory.update("db-01", "environment", "staging").unwrap();
    inventory.update("db-01", "prometheus_port", "9101").unwrap();
    store.persist(&inventory).unwrap();

    let db = store.load().unwrap().get("db-01").cloned().unwrap();
    assert_eq!(db.environment, "staging");
    assert_eq!(db.prometheus_port, Some(9101));
}

#[test]
fn update_unknown_field_fails_without_persisting() {
    let (_dir, path) = write_inventory(SAMPLE_INVENTORY);
    let store = store_for(&path);

    let mut inventory = store.load().unwrap();
    let err = inventory.update("db-01", "cpu_cores", "8").unwrap_err();
    assert!(matches!(err, DomainError::UnknownField(_)));
}

#[test]
fn load_persist_cycle_loses_no_records_or_fields() {
    let (_dir, path) = write_inventory(SAMPLE_INVENTORY);
    let store = store_for(&path);

    let first = store.load().unwrap();
    store.persist(&first).unwrap();
    let second = store.load().unwrap();
    store.persist(&second).unwrap();
    let third = store.load().unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    // And the file itself is stable after the first normalization
    store.persist(&third).unwrap();
    let a = std::fs::read_to_string(&path).unwrap();
    store.persist(&third).unwrap();
    let b = std::fs::read_to_string(&path).unwrap();
    assert_eq!(a, b);
}
