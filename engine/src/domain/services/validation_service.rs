//! Inventory validation service
//! Checks every record's required-field and cross-field invariants

use std::fmt;

use crate::domain::{Inventory, ServerRecord};

/// One invariant violation, tagged with the offending server and field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub server: String,
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(server: &str, field: &str, reason: impl Into<String>) -> Self {
        Self {
            server: server.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server '{}': {}: {}", self.server, self.field, self.reason)
    }
}

/// Validate the whole inventory, returning every violation rather than
/// stopping at the first. An empty result means the inventory is deployable.
pub fn validate_inventory(inventory: &Inventory) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for server in inventory.iter() {
        validate_record(server, &mut errors);
    }
    errors
}

fn validate_record(server: &ServerRecord, errors: &mut Vec<ValidationError>) {
    let name = server.name.as_str();

    for (field, value) in [
        ("name", &server.name),
        ("hostname", &server.hostname),
        ("ip", &server.ip),
        ("environment", &server.environment),
        ("role", &server.role),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(name, field, "required field is empty"));
        }
    }

    if server.monitoring_type.is_none() {
        errors.push(ValidationError::new(
            name,
            "monitoring_type",
            "required field is missing",
        ));
    }

    if server.system_monitoring && server.prometheus_port.is_none() {
        errors.push(ValidationError::new(
            name,
            "prometheus_port",
            "system_monitoring is enabled but no port is set",
        ));
    }

    if server.docker_enabled && server.cadvisor_port.is_none() {
        errors.push(ValidationError::new(
            name,
            "cadvisor_port",
            "docker_enabled is set but no port is set",
        ));
    }

    // Flag/label agreement is only checkable when the label is present;
    // its absence is already reported above
    if let Some(monitoring_type) = server.monitoring_type {
        if server.docker_enabled && !monitoring_type.includes_docker() {
            errors.push(ValidationError::new(
                name,
                "monitoring_type",
                format!(
                    "docker_enabled is set but monitoring_type is '{}'",
                    monitoring_type
                ),
            ));
        } else if !server.docker_enabled && monitoring_type.includes_docker() {
            errors.push(ValidationError::new(
                name,
                "docker_enabled",
                format!(
                    "monitoring_type '{}' declares docker but docker_enabled is false",
                    monitoring_type
                ),
            ));
        }
    }
}
