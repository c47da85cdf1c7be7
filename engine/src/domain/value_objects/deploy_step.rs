//! Deploy step value objects
//! Per-host provisioning state machine and step outcome records

use serde::{Deserialize, Serialize};
use std::fmt;

/// One provisioning step in the per-host deploy sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeployStep {
    /// Open a remote session within the connect timeout
    CheckConnectivity,

    /// Ensure inbound rules exist for SSH and the declared metrics ports
    ConfigureFirewall,

    /// Ensure node_exporter is running on prometheus_port
    InstallSystemAgent,

    /// Ensure cAdvisor is running on cadvisor_port (requires a container runtime)
    InstallContainerAgent,
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployStep::CheckConnectivity => write!(f, "check-connectivity"),
            DeployStep::ConfigureFirewall => write!(f, "configure-firewall"),
            DeployStep::InstallSystemAgent => write!(f, "install-system-agent"),
            DeployStep::InstallContainerAgent => write!(f, "install-container-agent"),
        }
    }
}

/// How one step against one host ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step ran and changed the host into the desired state
    Completed,

    /// Host was already in the desired state; nothing to do
    AlreadySatisfied,

    /// Step did not apply to this host (e.g. no container runtime present)
    Skipped,

    /// Step failed; the host's remaining steps are not attempted
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::AlreadySatisfied => write!(f, "already satisfied"),
            StepStatus::Skipped => write!(f, "skipped"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one step against one host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: DeployStep,
    pub status: StepStatus,
    pub message: String,
}

impl StepOutcome {
    pub fn new(step: DeployStep, status: StepStatus, message: impl Into<String>) -> Self {
        Self {
            step,
            status,
            message: message.into(),
        }
    }
}

/// Where a host's deploy sequence currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeployState {
    /// Not yet dispatched
    #[default]
    Pending,

    ConnectivityChecked,
    FirewallConfigured,
    SystemAgentInstalled,
    ContainerAgentInstalled,

    /// Every applicable step succeeded or was already satisfied
    Done,

    /// The named step failed; later steps were not attempted
    Failed(DeployStep),
}

impl DeployState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployState::Done | DeployState::Failed(_))
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployState::Pending => write!(f, "pending"),
            DeployState::ConnectivityChecked => write!(f, "connectivity-checked"),
            DeployState::FirewallConfigured => write!(f, "firewall-configured"),
            DeployState::SystemAgentInstalled => write!(f, "system-agent-installed"),
            DeployState::ContainerAgentInstalled => write!(f, "container-agent-installed"),
            DeployState::Done => write!(f, "done"),
            DeployState::Failed(step) => write!(f, "failed({})", step),
        }
    }
}

/// Aggregated result of one host's deploy run. Ephemeral; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentOutcome {
    /// Server name from the inventory
    pub server: String,
    pub state: DeployState,
    pub steps: Vec<StepOutcome>,
}

impl DeploymentOutcome {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            state: DeployState::Pending,
            steps: Vec::new(),
        }
    }

    /// True iff the host reached `Done`
    pub fn overall_success(&self) -> bool {
        self.state == DeployState::Done
    }

    /// The step that failed, if any
    pub fn failed_step(&self) -> Option<DeployStep> {
        match self.state {
            DeployState::Failed(step) => Some(step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_outcome_is_pending() {
        let outcome = DeploymentOutcome::new("web-01");
        assert_eq!(outcome.state, DeployState::Pending);
        assert!(!outcome.overall_success());
        assert!(outcome.failed_step().is_none());
    }

    #[test]
    fn test_failed_state_is_terminal() {
        assert!(DeployState::Done.is_terminal());
        assert!(DeployState::Failed(DeployStep::CheckConnectivity).is_terminal());
        assert!(!DeployState::FirewallConfigured.is_terminal());
    }
}
