//! Verification service
//! Probes every deployed metrics endpoint and summarizes fleet health

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::constants::{DEFAULT_MAX_PARALLEL, PROBE_ATTEMPTS, PROBE_BACKOFF};
use crate::domain::ports::MetricsProbe;
use crate::domain::{Capability, ProbeError, ServerRecord};

/// One capability endpoint that never answered
#[derive(Debug, Clone)]
pub struct CapabilityFailure {
    pub server: String,
    pub capability: Capability,
    pub reason: String,
}

/// Fleet health summary. A server counts as healthy only when every enabled
/// capability's endpoint responded.
#[derive(Debug, Clone, Default)]
pub struct VerificationSummary {
    pub total: usize,
    pub healthy: usize,
    pub failures: Vec<CapabilityFailure>,
}

impl VerificationSummary {
    pub fn all_healthy(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read-only health sweep over the fleet. Safe to run repeatedly; mutates
/// nothing and touches the network only through the probe port.
pub struct VerificationService {
    probe: Arc<dyn MetricsProbe>,
    max_parallel: usize,
    attempts: u32,
    backoff: std::time::Duration,
}

impl VerificationService {
    pub fn new(probe: Arc<dyn MetricsProbe>) -> Self {
        Self {
            probe,
            max_parallel: DEFAULT_MAX_PARALLEL,
            attempts: PROBE_ATTEMPTS,
            backoff: PROBE_BACKOFF,
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Probe attempt count and the fixed delay between attempts
    pub fn with_retry(mut self, attempts: u32, backoff: std::time::Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    /// Verify every server's enabled capability endpoints
    pub async fn verify(&self, servers: &[ServerRecord]) -> VerificationSummary {
        info!(servers = servers.len(), "Verifying fleet metrics endpoints");

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut join_set = JoinSet::new();

        for (index, server) in servers.iter().cloned().enumerate() {
            let probe = self.probe.clone();
            let semaphore = semaphore.clone();
            let attempts = self.attempts;
            let backoff = self.backoff;

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, Vec::new()),
                };
                let failures = verify_server(probe.as_ref(), &server, attempts, backoff).await;
                (index, failures)
            });
        }

        let mut per_server: Vec<Option<Vec<CapabilityFailure>>> = vec![None; servers.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, failures)) => {
                    if let Some(slot) = per_server.get_mut(index) {
                        *slot = Some(failures);
                    }
                }
                Err(e) => error!(error = %e, "Verify task aborted unexpectedly"),
            }
        }

        let mut summary = VerificationSummary {
            total: servers.len(),
            ..Default::default()
        };
        for failures in per_server.into_iter().flatten() {
            if failures.is_empty() {
                summary.healthy += 1;
            } else {
                summary.failures.extend(failures);
            }
        }

        info!(
            total = summary.total,
            healthy = summary.healthy,
            failing_endpoints = summary.failures.len(),
            "Verification finished"
        );
        summary
    }
}

async fn verify_server(
    probe: &dyn MetricsProbe,
    server: &ServerRecord,
    attempts: u32,
    backoff: std::time::Duration,
) -> Vec<CapabilityFailure> {
    let mut failures = Vec::new();
    for capability in server.capabilities() {
        let Some(port) = capability.port_for(server) else {
            failures.push(CapabilityFailure {
                server: server.name.clone(),
                capability,
                reason: "no port declared".to_string(),
            });
            continue;
        };

        if let Err(e) = probe_with_retry(probe, &server.hostname, port, attempts, backoff).await {
            warn!(
                server = %server.name,
                capability = %capability,
                port,
                error = %e,
                "Endpoint failed verification"
            );
            failures.push(CapabilityFailure {
                server: server.name.clone(),
                capability,
                reason: e.to_string(),
            });
        } else {
            debug!(server = %server.name, capability = %capability, port, "Endpoint healthy");
        }
    }
    failures
}

async fn probe_with_retry(
    probe: &dyn MetricsProbe,
    hostname: &str,
    port: u16,
    attempts: u32,
    backoff: std::time::Duration,
) -> Result<(), ProbeError> {
    let mut last = ProbeError::Timeout;
    for attempt in 1..=attempts {
        match probe.probe(hostname, port).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!(hostname, port, attempt, error = %e, "Probe attempt failed");
                last = e;
            }
        }
        if attempt < attempts && !backoff.is_zero() {
            sleep(backoff).await;
        }
    }
    Err(last)
}
