//! Inventory persistence
//! YAML file storage for the server inventory, with atomic rewrites

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{DEFAULT_SSH_KEY_PATH, DEFAULT_SSH_USER};
use crate::domain::{DomainError, Inventory, MonitoringType, Result, ServerRecord};

/// On-disk inventory document. Unknown keys are rejected so a hand-edit typo
/// in a capability field surfaces instead of silently changing a deploy.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct InventoryFile {
    #[serde(default)]
    servers: Vec<ServerEntry>,
}

/// One server entry as stored in the YAML file.
///
/// Required fields default to empty/absent so that a missing field is
/// reported by `validate` (with the offending server name) rather than
/// aborting the load; that keeps the violation list complete even when one
/// record is badly broken. An unrecognized `monitoring_type` value still
/// fails the parse.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerEntry {
    #[serde(default)]
    name: String,

    #[serde(default)]
    hostname: String,

    #[serde(default)]
    ip: String,

    #[serde(default)]
    environment: String,

    #[serde(default)]
    role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    monitoring_type: Option<MonitoringType>,

    #[serde(default = "default_true")]
    system_monitoring: bool,

    #[serde(default)]
    docker_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    prometheus_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    cadvisor_port: Option<u16>,

    #[serde(default = "default_ssh_user")]
    ssh_user: String,

    #[serde(default = "default_ssh_key_path")]
    ssh_key_path: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_ssh_user() -> String {
    DEFAULT_SSH_USER.to_string()
}

fn default_ssh_key_path() -> String {
    DEFAULT_SSH_KEY_PATH.to_string()
}

impl From<ServerEntry> for ServerRecord {
    fn from(entry: ServerEntry) -> Self {
        ServerRecord {
            name: entry.name,
            hostname: entry.hostname,
            ip: entry.ip,
            environment: entry.environment,
            role: entry.role,
            monitoring_type: entry.monitoring_type,
            system_monitoring: entry.system_monitoring,
            docker_enabled: entry.docker_enabled,
            prometheus_port: entry.prometheus_port,
            cadvisor_port: entry.cadvisor_port,
            ssh_user: entry.ssh_user,
            ssh_key_path: entry.ssh_key_path,
            tags: entry.tags,
        }
    }
}

impl From<&ServerRecord> for ServerEntry {
    fn from(record: &ServerRecord) -> Self {
        ServerEntry {
            name: record.name.clone(),
            hostname: record.hostname.clone(),
            ip: record.ip.clone(),
            environment: record.environment.clone(),
            role: record.role.clone(),
            monitoring_type: record.monitoring_type,
            system_monitoring: record.system_monitoring,
            docker_enabled: record.docker_enabled,
            prometheus_port: record.prometheus_port,
            cadvisor_port: record.cadvisor_port,
            ssh_user: record.ssh_user.clone(),
            ssh_key_path: record.ssh_key_path.clone(),
            tags: record.tags.clone(),
        }
    }
}

/// YAML-file-backed inventory storage.
///
/// `persist` assumes a single CLI invocation per inventory file; there is no
/// cross-process lock, only atomicity against interruption.
pub struct YamlInventoryStore {
    path: PathBuf,
}

impl YamlInventoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and key-check the inventory. A missing or malformed file is an
    /// error; semantic problems are left to `validate`.
    pub fn load(&self) -> Result<Inventory> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            DomainError::InventoryIo(format!("{}: {}", self.path.display(), e))
        })?;
        let file: InventoryFile = serde_yaml::from_str(&raw)
            .map_err(|e| DomainError::InventoryParse(e.to_string()))?;

        let records = file.servers.into_iter().map(ServerRecord::from).collect();
        let inventory = Inventory::from_records(records)?;
        debug!(path = %self.path.display(), servers = inventory.len(), "Inventory loaded");
        Ok(inventory)
    }

    /// Rewrite the inventory file atomically: serialize to a sibling
    /// temporary file, then rename over the target. The file on disk is
    /// always either the complete old or the complete new content.
    pub fn persist(&self, inventory: &Inventory) -> Result<()> {
        let file = InventoryFile {
            servers: inventory.iter().map(ServerEntry::from).collect(),
        };
        let yaml = serde_yaml::to_string(&file)
            .map_err(|e| DomainError::InventoryIo(e.to_string()))?;

        let tmp = self.path.with_extension("yaml.tmp");
        fs::write(&tmp, &yaml).map_err(|e| {
            DomainError::InventoryIo(format!("{}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            // Leave no partial target behind
            let _ = fs::remove_file(&tmp);
            DomainError::InventoryIo(format!("{}: {}", self.path.display(), e))
        })?;

        info!(path = %self.path.display(), servers = inventory.len(), "Inventory persisted");
        Ok(())
    }
}
