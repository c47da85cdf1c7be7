//! Fleet deployment service
//! Rolls agents out across the fleet with bounded parallelism,
//! per-host failure isolation, and a per-host wall-clock ceiling

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::constants::{DEFAULT_MAX_PARALLEL, DEFAULT_SERVER_TIMEOUT};
use crate::domain::ports::RemoteExecutor;
use crate::domain::{
    DeployState, DeployStep, DeploymentOutcome, ServerRecord, StepError, StepOutcome, StepStatus,
};

/// Pinned node_exporter release installed by the system-agent step.
/// The exact payload is a swappable detail; steps only rely on the agent
/// ending up active under systemd on the declared port.
const NODE_EXPORTER_URL: &str = "https://github.com/prometheus/node_exporter/releases/download/v1.8.2/node_exporter-1.8.2.linux-amd64.tar.gz";

const CADVISOR_IMAGE: &str = "gcr.io/cadvisor/cadvisor:v0.49.1";

/// Drives the per-server provisioning state machine across the fleet.
///
/// Servers are deployed concurrently up to `max_parallel`; one host's
/// failure only marks that host and never aborts its siblings. Cancelling
/// the token stops dispatching new hosts while in-flight hosts run to
/// completion or their own timeout.
pub struct FleetDeploymentService {
    executor: Arc<dyn RemoteExecutor>,
    max_parallel: usize,
    server_timeout: Duration,
    cancel: CancellationToken,
}

impl FleetDeploymentService {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self {
            executor,
            max_parallel: DEFAULT_MAX_PARALLEL,
            server_timeout: DEFAULT_SERVER_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Cap on simultaneously in-flight hosts (minimum 1)
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Wall-clock ceiling for one host's full step sequence
    pub fn with_server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout = timeout;
        self
    }

    /// Operator abort token; cancelling stops new dispatch only
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Deploy every server, returning one outcome per server in input order.
    /// The run always completes the whole fleet; aggregate success is
    /// "zero hosts failed".
    pub async fn deploy(&self, servers: &[ServerRecord]) -> Vec<DeploymentOutcome> {
        info!(
            servers = servers.len(),
            max_parallel = self.max_parallel,
            "Starting fleet deployment"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut outcomes: Vec<DeploymentOutcome> = servers
            .iter()
            .map(|s| DeploymentOutcome::new(&s.name))
            .collect();

        let mut join_set = JoinSet::new();
        for (index, server) in servers.iter().cloned().enumerate() {
            let executor = self.executor.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let server_timeout = self.server_timeout;

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, DeploymentOutcome::new(&server.name)),
                };

                // Abort stops dispatching; hosts already past this point
                // finish on their own.
                if cancel.is_cancelled() {
                    debug!(server = %server.name, "Skipping dispatch, run was cancelled");
                    return (index, DeploymentOutcome::new(&server.name));
                }

                let outcome = Mutex::new(DeploymentOutcome::new(&server.name));
                let result = tokio::time::timeout(
                    server_timeout,
                    deploy_server(executor.as_ref(), &server, &outcome),
                )
                .await;

                let mut outcome = outcome.into_inner().unwrap();
                if result.is_err() {
                    let step = next_planned_step(&server, outcome.steps.len());
                    warn!(
                        server = %server.name,
                        step = %step,
                        timeout_secs = server_timeout.as_secs(),
                        "Host exceeded its deploy time ceiling"
                    );
                    outcome.steps.push(StepOutcome::new(
                        step,
                        StepStatus::Failed,
                        format!(
                            "deploy exceeded {}s ceiling during {}",
                            server_timeout.as_secs(),
                            step
                        ),
                    ));
                    outcome.state = DeployState::Failed(step);
                }
                (index, outcome)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(slot) = outcomes.get_mut(index) {
                        *slot = outcome;
                    }
                }
                Err(e) => error!(error = %e, "Deploy task aborted unexpectedly"),
            }
        }

        let failed = outcomes.iter().filter(|o| o.failed_step().is_some()).count();
        info!(
            servers = outcomes.len(),
            failed, "Fleet deployment finished"
        );
        outcomes
    }
}

/// True iff every host reached `Done`
pub fn all_succeeded(outcomes: &[DeploymentOutcome]) -> bool {
    outcomes.iter().all(|o| o.overall_success())
}

/// The ordered step plan for one server (container step only when the
/// record declares docker capability; a bare system server never reaches it)
fn planned_steps(server: &ServerRecord) -> Vec<DeployStep> {
    let mut steps = vec![DeployStep::CheckConnectivity, DeployStep::ConfigureFirewall];
    if server.system_monitoring {
        steps.push(DeployStep::InstallSystemAgent);
    }
    if server.docker_enabled {
        steps.push(DeployStep::InstallContainerAgent);
    }
    steps
}

fn next_planned_step(server: &ServerRecord, completed: usize) -> DeployStep {
    let plan = planned_steps(server);
    plan.get(completed).copied().unwrap_or(DeployStep::CheckConnectivity)
}

fn record_step(
    outcome: &Mutex<DeploymentOutcome>,
    step: DeployStep,
    status: StepStatus,
    message: impl Into<String>,
    state: DeployState,
) {
    let mut outcome = outcome.lock().unwrap();
    outcome.steps.push(StepOutcome::new(step, status, message));
    outcome.state = state;
}

fn record_failure(
    outcome: &Mutex<DeploymentOutcome>,
    server: &ServerRecord,
    step: DeployStep,
    error: &StepError,
) {
    warn!(server = %server.name, step = %step, error = %error, "Deploy step failed");
    record_step(
        outcome,
        step,
        StepStatus::Failed,
        error.to_string(),
        DeployState::Failed(step),
    );
}

/// Run the full step sequence against one host, recording each step as it
/// concludes so partial progress survives a timeout.
async fn deploy_server(
    executor: &dyn RemoteExecutor,
    server: &ServerRecord,
    outcome: &Mutex<DeploymentOutcome>,
) {
    debug!(server = %server.name, hostname = %server.hostname, "Deploying host");

    // Connectivity gate: fail fast so an unreachable host frees its slot
    if let Err(e) = executor.connect(server).await {
        record_failure(outcome, server, DeployStep::CheckConnectivity, &e);
        return;
    }
    record_step(
        outcome,
        DeployStep::CheckConnectivity,
        StepStatus::Completed,
        "session established",
        DeployState::ConnectivityChecked,
    );

    match configure_firewall(executor, server).await {
        Ok((status, message)) => record_step(
            outcome,
            DeployStep::ConfigureFirewall,
            status,
            message,
            DeployState::FirewallConfigured,
        ),
        Err(e) => {
            record_failure(outcome, server, DeployStep::ConfigureFirewall, &e);
            return;
        }
    }

    if server.system_monitoring {
        match install_system_agent(executor, server).await {
            Ok((status, message)) => record_step(
                outcome,
                DeployStep::InstallSystemAgent,
                status,
                message,
                DeployState::SystemAgentInstalled,
            ),
            Err(e) => {
                record_failure(outcome, server, DeployStep::InstallSystemAgent, &e);
                return;
            }
        }
    }

    if server.docker_enabled {
        match install_container_agent(executor, server).await {
            Ok((status, message)) => record_step(
                outcome,
                DeployStep::InstallContainerAgent,
                status,
                message,
                DeployState::ContainerAgentInstalled,
            ),
            Err(e) => {
                record_failure(outcome, server, DeployStep::InstallContainerAgent, &e);
                return;
            }
        }
    }

    outcome.lock().unwrap().state = DeployState::Done;
    info!(server = %server.name, "Host deployed");
}

/// Run one remote command, mapping a non-zero exit into a step error
async fn run_checked(
    executor: &dyn RemoteExecutor,
    server: &ServerRecord,
    command: &str,
) -> Result<String, StepError> {
    let output = executor.run(server, command).await?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(StepError::CommandFailed {
            code: output.exit_code,
            stderr: output.stderr,
        })
    }
}

/// Ensure inbound rules exist for SSH and every declared metrics port.
/// The SSH rule comes first so enabling ufw can never lock the controller
/// out mid-deploy. `ufw allow` is idempotent; re-adding an existing rule
/// reports it and exits zero. Unrelated rules are never touched.
async fn configure_firewall(
    executor: &dyn RemoteExecutor,
    server: &ServerRecord,
) -> Result<(StepStatus, String), StepError> {
    let mut rules = vec!["ssh".to_string()];
    rules.extend(server.metrics_ports().iter().map(|p| format!("{}/tcp", p)));

    let mut added = Vec::new();
    let mut existing = Vec::new();
    for rule in &rules {
        let stdout = run_checked(executor, server, &format!("sudo ufw allow {}", rule)).await?;
        if stdout.to_lowercase().contains("existing") {
            existing.push(rule.clone());
        } else {
            added.push(rule.clone());
        }
    }

    if added.is_empty() {
        Ok((
            StepStatus::AlreadySatisfied,
            format!("rules already present for {}", existing.join(", ")),
        ))
    } else {
        Ok((
            StepStatus::Completed,
            format!("opened {}", added.join(", ")),
        ))
    }
}

/// Ensure node_exporter is active on the declared port
async fn install_system_agent(
    executor: &dyn RemoteExecutor,
    server: &ServerRecord,
) -> Result<(StepStatus, String), StepError> {
    let active = executor
        .run(server, "systemctl is-active node_exporter")
        .await?;
    if active.success() && active.stdout.trim() == "active" {
        return Ok((
            StepStatus::AlreadySatisfied,
            "node_exporter already active".to_string(),
        ));
    }

    let port = server
        .prometheus_port
        .unwrap_or(crate::constants::DEFAULT_PROMETHEUS_PORT);
    run_checked(executor, server, &install_node_exporter_command(port)).await?;
    Ok((
        StepStatus::Completed,
        format!("node_exporter installed on port {}", port),
    ))
}

/// Ensure cAdvisor runs on the declared port, skipping (not failing) hosts
/// that claim docker capability but carry no runtime. That is a common,
/// recoverable misconfiguration; validate reports it, deploy moves on.
async fn install_container_agent(
    executor: &dyn RemoteExecutor,
    server: &ServerRecord,
) -> Result<(StepStatus, String), StepError> {
    let runtime = executor.run(server, "command -v docker").await?;
    if !runtime.success() {
        return Ok((
            StepStatus::Skipped,
            "no container runtime present".to_string(),
        ));
    }

    let running = executor
        .run(
            server,
            "sudo docker ps --filter name=cadvisor --format '{{.Names}}'",
        )
        .await?;
    if running.success() && running.stdout.contains("cadvisor") {
        return Ok((
            StepStatus::AlreadySatisfied,
            "cadvisor container already running".to_string(),
        ));
    }

    let port = server
        .cadvisor_port
        .unwrap_or(crate::constants::DEFAULT_CADVISOR_PORT);
    run_checked(executor, server, &run_cadvisor_command(port)).await?;
    Ok((
        StepStatus::Completed,
        format!("cadvisor started on port {}", port),
    ))
}

fn install_node_exporter_command(port: u16) -> String {
    format!(
        "curl -fsSL {url} -o /tmp/node_exporter.tar.gz \
         && sudo tar -xzf /tmp/node_exporter.tar.gz -C /usr/local/bin --strip-components=1 --wildcards '*/node_exporter' \
         && printf '[Unit]\\nDescription=Node Exporter\\nAfter=network.target\\n[Service]\\nUser=nobody\\nExecStart=/usr/local/bin/node_exporter --web.listen-address=:{port}\\nRestart=always\\n[Install]\\nWantedBy=multi-user.target\\n' | sudo tee /etc/systemd/system/node_exporter.service >/dev/null \
         && sudo systemctl daemon-reload && sudo systemctl enable --now node_exporter",
        url = NODE_EXPORTER_URL,
        port = port
    )
}

fn run_cadvisor_command(port: u16) -> String {
    format!(
        "sudo docker run -d --name=cadvisor --restart=unless-stopped \
         -p {port}:8080 \
         -v /:/rootfs:ro -v /var/run:/var/run:ro -v /sys:/sys:ro \
         -v /var/lib/docker/:/var/lib/docker:ro \
         {image}",
        port = port,
        image = CADVISOR_IMAGE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ScriptedExecutor;
    use crate::domain::MonitoringType;

    fn server(name: &str, monitoring_type: MonitoringType) -> ServerRecord {
        ServerRecord::from_monitoring_type(
            name,
            format!("{name}-host"),
            "10.0.0.1",
            "production",
            "web-application",
            monitoring_type,
        )
    }

    fn service(executor: &ScriptedExecutor) -> FleetDeploymentService {
        FleetDeploymentService::new(Arc::new(executor.clone()))
    }

    #[tokio::test]
    async fn test_full_sequence_for_docker_server() {
        let executor = ScriptedExecutor::new();
        let outcomes = service(&executor)
            .deploy(&[server("web-01", MonitoringType::DockerSystem)])
            .await;

        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert_eq!(outcome.state, DeployState::Done);
        let steps: Vec<_> = outcome.steps.iter().map(|s| s.step).collect();
        assert_eq!(
            steps,
            vec![
                DeployStep::CheckConnectivity,
                DeployStep::ConfigureFirewall,
                DeployStep::InstallSystemAgent,
                DeployStep::InstallContainerAgent,
            ]
        );
        assert!(outcome.overall_success());
    }

    #[tokio::test]
    async fn test_system_only_server_never_reaches_container_step() {
        let executor = ScriptedExecutor::new();
        let outcomes = service(&executor)
            .deploy(&[server("db-01", MonitoringType::System)])
            .await;

        let steps: Vec<_> = outcomes[0].steps.iter().map(|s| s.step).collect();
        assert!(!steps.contains(&DeployStep::InstallContainerAgent));
        assert_eq!(outcomes[0].state, DeployState::Done);
    }

    #[tokio::test]
    async fn test_firewall_opens_ssh_before_metrics_ports() {
        let executor = ScriptedExecutor::new();
        service(&executor)
            .deploy(&[server("web-01", MonitoringType::DockerSystem)])
            .await;

        let ufw: Vec<_> = executor
            .commands_for("web-01")
            .into_iter()
            .filter(|c| c.contains("ufw allow"))
            .collect();
        assert_eq!(
            ufw,
            vec![
                "sudo ufw allow ssh",
                "sudo ufw allow 9100/tcp",
                "sudo ufw allow 8080/tcp",
            ]
        );
    }

    #[tokio::test]
    async fn test_already_provisioned_host_reports_satisfied() {
        let executor = ScriptedExecutor::new();
        executor.respond_success("ufw allow", "Skipping adding existing rule");
        executor.respond_success("is-active", "active");
        executor.respond_success("docker ps", "cadvisor");

        let outcomes = service(&executor)
            .deploy(&[server("web-01", MonitoringType::DockerSystem)])
            .await;

        let outcome = &outcomes[0];
        assert_eq!(outcome.state, DeployState::Done);
        for step in &outcome.steps[1..] {
            assert_eq!(step.status, StepStatus::AlreadySatisfied, "{:?}", step);
        }
        // Nothing was reinstalled
        assert!(!executor
            .commands_for("web-01")
            .iter()
            .any(|c| c.contains("docker run") || c.contains("daemon-reload")));
    }

    #[tokio::test]
    async fn test_missing_runtime_skips_container_step() {
        let executor = ScriptedExecutor::new();
        executor.respond_failure("command -v docker", 1, "");

        let outcomes = service(&executor)
            .deploy(&[server("web-01", MonitoringType::DockerSystem)])
            .await;

        let outcome = &outcomes[0];
        assert_eq!(outcome.state, DeployState::Done);
        let container = outcome
            .steps
            .iter()
            .find(|s| s.step == DeployStep::InstallContainerAgent)
            .unwrap();
        assert_eq!(container.status, StepStatus::Skipped);
        assert!(container.message.contains("no container runtime"));
    }

    #[tokio::test]
    async fn test_one_unreachable_host_does_not_block_the_rest() {
        let executor = ScriptedExecutor::new();
        executor.mark_unreachable("web-03");

        let fleet: Vec<_> = (1..=5)
            .map(|i| server(&format!("web-{:02}", i), MonitoringType::System))
            .collect();
        let outcomes = service(&executor).deploy(&fleet).await;

        let failed: Vec<_> = outcomes
            .iter()
            .filter(|o| o.failed_step().is_some())
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].server, "web-03");
        assert_eq!(
            failed[0].state,
            DeployState::Failed(DeployStep::CheckConnectivity)
        );
        assert_eq!(outcomes.iter().filter(|o| o.overall_success()).count(), 4);
        assert!(!all_succeeded(&outcomes));
    }

    #[tokio::test]
    async fn test_step_failure_stops_that_host_only() {
        let executor = ScriptedExecutor::new();
        executor.respond_failure("ufw allow", 1, "ufw: command not found");

        let outcomes = service(&executor)
            .deploy(&[server("web-01", MonitoringType::System)])
            .await;

        let outcome = &outcomes[0];
        assert_eq!(
            outcome.state,
            DeployState::Failed(DeployStep::ConfigureFirewall)
        );
        // Later steps were never attempted
        assert!(outcome
            .steps
            .iter()
            .all(|s| s.step != DeployStep::InstallSystemAgent));
    }

    #[tokio::test]
    async fn test_parallelism_stays_under_the_cap() {
        let executor = ScriptedExecutor::new().with_delay(Duration::from_millis(20));
        let fleet: Vec<_> = (1..=10)
            .map(|i| server(&format!("web-{:02}", i), MonitoringType::System))
            .collect();

        let outcomes = service(&executor)
            .with_max_parallel(2)
            .deploy(&fleet)
            .await;

        assert!(all_succeeded(&outcomes));
        assert!(
            executor.peak_in_flight() <= 2,
            "peak in-flight was {}",
            executor.peak_in_flight()
        );
    }

    #[tokio::test]
    async fn test_hung_host_hits_its_ceiling_and_frees_the_slot() {
        let executor = ScriptedExecutor::new();
        executor.mark_hung("web-01");

        let outcomes = service(&executor)
            .with_server_timeout(Duration::from_millis(200))
            .deploy(&[
                server("web-01", MonitoringType::System),
                server("web-02", MonitoringType::System),
            ])
            .await;

        assert_eq!(
            outcomes[0].state,
            DeployState::Failed(DeployStep::CheckConnectivity)
        );
        assert!(outcomes[0].steps[0].message.contains("ceiling"));
        assert_eq!(outcomes[1].state, DeployState::Done);
    }

    #[tokio::test]
    async fn test_cancellation_stops_new_dispatch() {
        let executor = ScriptedExecutor::new().with_delay(Duration::from_millis(100));
        let cancel = CancellationToken::new();
        let fleet: Vec<_> = (1..=5)
            .map(|i| server(&format!("web-{:02}", i), MonitoringType::System))
            .collect();

        let service = service(&executor)
            .with_max_parallel(1)
            .with_cancellation(cancel.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        let outcomes = service.deploy(&fleet).await;
        canceller.await.unwrap();

        // The in-flight host finished; hosts not yet dispatched stayed pending
        let done = outcomes.iter().filter(|o| o.overall_success()).count();
        let pending = outcomes
            .iter()
            .filter(|o| o.state == DeployState::Pending)
            .count();
        assert_eq!(done, 1);
        assert_eq!(pending, 4);
    }
}
