//! MonitoringType value object
//! The closed set of monitoring profiles a server can declare

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::DomainError;

/// Declared monitoring profile of a server.
///
/// This is a label; the boolean capability flags on the record are
/// authoritative for what actually gets deployed and scraped. A disagreement
/// between the two is a validation error, never silently reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitoringType {
    /// System metrics only (node_exporter)
    #[serde(rename = "system")]
    System,

    /// System plus container metrics (node_exporter + cAdvisor)
    #[serde(rename = "docker+system")]
    DockerSystem,

    /// Kubernetes node: system plus container metrics, labeled as kubernetes
    #[serde(rename = "kubernetes+system")]
    KubernetesSystem,
}

impl MonitoringType {
    /// Whether this profile carries the container-metrics component
    pub fn includes_docker(&self) -> bool {
        matches!(
            self,
            MonitoringType::DockerSystem | MonitoringType::KubernetesSystem
        )
    }
}

impl FromStr for MonitoringType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MonitoringType::System),
            "docker+system" => Ok(MonitoringType::DockerSystem),
            "kubernetes+system" => Ok(MonitoringType::KubernetesSystem),
            other => Err(DomainError::InvalidMonitoringType(other.to_string())),
        }
    }
}

impl fmt::Display for MonitoringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitoringType::System => write!(f, "system"),
            MonitoringType::DockerSystem => write!(f, "docker+system"),
            MonitoringType::KubernetesSystem => write!(f, "kubernetes+system"),
        }
    }
}
