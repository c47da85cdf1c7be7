//! ServerRecord entity
//! One managed host: identity, tags, capability flags, and SSH credentials

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CADVISOR_PORT, DEFAULT_PROMETHEUS_PORT};
use crate::domain::{Capability, DomainError, MonitoringType, Result};

/// One managed host in the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Unique short identifier; the inventory key
    pub name: String,

    /// DNS name or address used for SSH and metrics scraping
    pub hostname: String,

    /// Informational address; not required to be routable
    pub ip: String,

    /// Free-form tag, e.g. production/staging/development
    pub environment: String,

    /// Free-form workload tag, e.g. web-application, database
    pub role: String,

    /// Declared monitoring profile (label only; flags are authoritative).
    /// `None` when the inventory entry omitted it; `validate` reports that
    /// as a missing required field.
    pub monitoring_type: Option<MonitoringType>,

    /// Whether a node_exporter-equivalent agent is expected
    pub system_monitoring: bool,

    /// Whether a container-metrics agent is expected
    pub docker_enabled: bool,

    /// node_exporter port; required when system_monitoring is set
    pub prometheus_port: Option<u16>,

    /// cAdvisor port; required when docker_enabled is set
    pub cadvisor_port: Option<u16>,

    /// Remote-execution user
    pub ssh_user: String,

    /// Remote-execution private key path
    pub ssh_key_path: String,

    /// Free-form tags
    pub tags: Vec<String>,
}

impl ServerRecord {
    /// Build a record from the identity fields, deriving the capability flags
    /// and default ports from the monitoring type. This is the `add` path;
    /// hand-edited inventory files may set the flags independently.
    pub fn from_monitoring_type(
        name: impl Into<String>,
        hostname: impl Into<String>,
        ip: impl Into<String>,
        environment: impl Into<String>,
        role: impl Into<String>,
        monitoring_type: MonitoringType,
    ) -> Self {
        let docker = monitoring_type.includes_docker();
        Self {
            name: name.into(),
            hostname: hostname.into(),
            ip: ip.into(),
            environment: environment.into(),
            role: role.into(),
            monitoring_type: Some(monitoring_type),
            system_monitoring: true,
            docker_enabled: docker,
            prometheus_port: Some(DEFAULT_PROMETHEUS_PORT),
            cadvisor_port: docker.then_some(DEFAULT_CADVISOR_PORT),
            ssh_user: crate::constants::DEFAULT_SSH_USER.to_string(),
            ssh_key_path: crate::constants::DEFAULT_SSH_KEY_PATH.to_string(),
            tags: Vec::new(),
        }
    }

    /// Enabled capabilities, in declared emission order
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| c.enabled_for(self))
            .collect()
    }

    /// Declared metrics ports for every enabled capability
    pub fn metrics_ports(&self) -> Vec<u16> {
        Capability::ALL
            .into_iter()
            .filter_map(|c| c.port_for(self))
            .collect()
    }

    /// Update one named field from its string representation.
    ///
    /// `name` is the inventory key and cannot be updated in place; unknown
    /// field names are rejected rather than silently ignored.
    pub fn update_field(&mut self, field: &str, value: &str) -> Result<()> {
        match field {
            "hostname" => self.hostname = value.to_string(),
            "ip" => self.ip = value.to_string(),
            "environment" => self.environment = value.to_string(),
            "role" => self.role = value.to_string(),
            "monitoring_type" => self.monitoring_type = Some(value.parse()?),
            "system_monitoring" => self.system_monitoring = parse_bool(field, value)?,
            "docker_enabled" => self.docker_enabled = parse_bool(field, value)?,
            "prometheus_port" => self.prometheus_port = Some(parse_port(field, value)?),
            "cadvisor_port" => self.cadvisor_port = Some(parse_port(field, value)?),
            "ssh_user" => self.ssh_user = value.to_string(),
            "ssh_key_path" => self.ssh_key_path = value.to_string(),
            "tags" => self.tags = value.split(',').map(|t| t.trim().to_string()).collect(),
            other => return Err(DomainError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(DomainError::InvalidFieldValue {
            field: field.to_string(),
            reason: format!("'{}' is not a boolean", value),
        }),
    }
}

fn parse_port(field: &str, value: &str) -> Result<u16> {
    value.parse().map_err(|_| DomainError::InvalidFieldValue {
        field: field.to_string(),
        reason: format!("'{}' is not a valid port", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web_server() -> ServerRecord {
        ServerRecord::from_monitoring_type(
            "web-01",
            "web01.example.com",
            "10.0.0.10",
            "production",
            "web-application",
            MonitoringType::DockerSystem,
        )
    }

    #[test]
    fn test_flags_derived_from_type() {
        let server = web_server();
        assert!(server.system_monitoring);
        assert!(server.docker_enabled);
        assert_eq!(server.prometheus_port, Some(9100));
        assert_eq!(server.cadvisor_port, Some(8080));

        let db = ServerRecord::from_monitoring_type(
            "db-01",
            "db01.example.com",
            "10.0.0.20",
            "production",
            "database",
            MonitoringType::System,
        );
        assert!(db.system_monitoring);
        assert!(!db.docker_enabled);
        assert_eq!(db.cadvisor_port, None);
    }

    #[test]
    fn test_capabilities_follow_flags_not_label() {
        let mut server = web_server();
        server.monitoring_type = Some(MonitoringType::KubernetesSystem);
        assert_eq!(
            server.capabilities(),
            vec![Capability::NodeExporter, Capability::Cadvisor]
        );

        server.docker_enabled = false;
        assert_eq!(server.capabilities(), vec![Capability::NodeExporter]);
    }

    #[test]
    fn test_update_known_fields() {
        let mut server = web_server();
        server.update_field("environment", "staging").unwrap();
        assert_eq!(server.environment, "staging");

        server.update_field("prometheus_port", "9101").unwrap();
        assert_eq!(server.prometheus_port, Some(9101));

        server.update_field("docker_enabled", "false").unwrap();
        assert!(!server.docker_enabled);

        server.update_field("tags", "edge, canary").unwrap();
        assert_eq!(server.tags, vec!["edge", "canary"]);
    }

    #[test]
    fn test_update_rejects_unknown_field() {
        let mut server = web_server();
        let err = server.update_field("disk_size", "100G").unwrap_err();
        assert!(matches!(err, DomainError::UnknownField(f) if f == "disk_size"));
    }

    #[test]
    fn test_update_rejects_bad_values() {
        let mut server = web_server();
        assert!(server.update_field("prometheus_port", "ninety").is_err());
        assert!(server.update_field("system_monitoring", "maybe").is_err());
        assert!(server.update_field("monitoring_type", "windows").is_err());
    }
}
