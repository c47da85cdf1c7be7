//! Capability value object
//! A monitoring facility a host may expose, independent of its type label

use std::fmt;

use crate::domain::ServerRecord;

/// A monitoring capability with a scrapeable endpoint.
///
/// Scrape jobs are emitted one per capability, in the order of `Capability::ALL`.
/// Membership is derived from the record's boolean flags, never from the
/// `monitoring_type` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// System metrics via node_exporter
    NodeExporter,

    /// Container metrics via cAdvisor
    Cadvisor,
}

impl Capability {
    /// Declared emission order for scrape jobs
    pub const ALL: [Capability; 2] = [Capability::NodeExporter, Capability::Cadvisor];

    /// Prometheus job name for this capability
    pub fn job_name(&self) -> &'static str {
        match self {
            Capability::NodeExporter => "node-exporter",
            Capability::Cadvisor => "cadvisor",
        }
    }

    /// Whether the given server has this capability enabled
    pub fn enabled_for(&self, server: &ServerRecord) -> bool {
        match self {
            Capability::NodeExporter => server.system_monitoring,
            Capability::Cadvisor => server.docker_enabled,
        }
    }

    /// The port this capability's endpoint listens on for the given server,
    /// if the capability is enabled and the port is declared
    pub fn port_for(&self, server: &ServerRecord) -> Option<u16> {
        if !self.enabled_for(server) {
            return None;
        }
        match self {
            Capability::NodeExporter => server.prometheus_port,
            Capability::Cadvisor => server.cadvisor_port,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.job_name())
    }
}
