//! Scripted transport implementations for testing
//! In-memory RemoteExecutor and MetricsProbe with programmable behavior

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{CommandOutput, MetricsProbe, RemoteExecutor};
use crate::domain::{ProbeError, ServerRecord, StepError};

/// Scripted in-memory executor for tests.
///
/// Hosts can be marked unreachable, commands answered by substring-matched
/// canned outputs, and every call can carry an artificial delay. The executor
/// tracks its in-flight high-water mark so tests can assert the deployment
/// concurrency bound.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    state: Arc<ScriptedState>,
}

#[derive(Default)]
struct ScriptedState {
    delay: Mutex<Duration>,
    unreachable: Mutex<HashSet<String>>,
    hung: Mutex<HashSet<String>>,
    responses: Mutex<Vec<(String, CommandOutput)>>,
    commands: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

struct FlightGuard {
    state: Arc<ScriptedState>,
}

impl FlightGuard {
    fn enter(state: &Arc<ScriptedState>) -> Self {
        let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        Self {
            state: state.clone(),
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artificial delay to every connect/run call
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = delay;
        self
    }

    /// Make connectivity checks against this server fail
    pub fn mark_unreachable(&self, name: &str) {
        self.state.unreachable.lock().unwrap().insert(name.to_string());
    }

    /// Make every call against this server block until cancelled from
    /// outside (used to exercise the per-host timeout)
    pub fn mark_hung(&self, name: &str) {
        self.state.hung.lock().unwrap().insert(name.to_string());
    }

    /// Answer commands containing `pattern` with the given output.
    /// Rules are matched in registration order; unmatched commands succeed
    /// with empty output.
    pub fn respond(&self, pattern: &str, output: CommandOutput) {
        self.state
            .responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), output));
    }

    /// Shorthand: commands containing `pattern` succeed with `stdout`
    pub fn respond_success(&self, pattern: &str, stdout: &str) {
        self.respond(
            pattern,
            CommandOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    /// Shorthand: commands containing `pattern` fail with `code` and `stderr`
    pub fn respond_failure(&self, pattern: &str, code: i32, stderr: &str) {
        self.respond(
            pattern,
            CommandOutput {
                exit_code: code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
    }

    /// Every command recorded against the named server, in execution order
    pub fn commands_for(&self, name: &str) -> Vec<String> {
        self.state
            .commands
            .lock()
            .unwrap()
            .iter()
            .filter(|(server, _)| server == name)
            .map(|(_, command)| command.clone())
            .collect()
    }

    /// Highest number of simultaneously in-flight calls observed
    pub fn peak_in_flight(&self) -> usize {
        self.state.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self, server: &ServerRecord) {
        if self.state.hung.lock().unwrap().contains(&server.name) {
            // Far beyond any per-host ceiling a test would configure
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let delay = *self.state.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RemoteExecutor for ScriptedExecutor {
    async fn connect(&self, server: &ServerRecord) -> Result<(), StepError> {
        let _guard = FlightGuard::enter(&self.state);
        self.simulate_latency(server).await;
        if self.state.unreachable.lock().unwrap().contains(&server.name) {
            return Err(StepError::Connectivity(format!(
                "no route to host {}",
                server.hostname
            )));
        }
        Ok(())
    }

    async fn run(
        &self,
        server: &ServerRecord,
        command: &str,
    ) -> Result<CommandOutput, StepError> {
        let _guard = FlightGuard::enter(&self.state);
        self.simulate_latency(server).await;
        if self.state.unreachable.lock().unwrap().contains(&server.name) {
            return Err(StepError::Connectivity(format!(
                "no route to host {}",
                server.hostname
            )));
        }

        self.state
            .commands
            .lock()
            .unwrap()
            .push((server.name.clone(), command.to_string()));

        let responses = self.state.responses.lock().unwrap();
        for (pattern, output) in responses.iter() {
            if command.contains(pattern.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(CommandOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Scripted in-memory probe for tests.
///
/// Endpoints can be marked permanently down or flaky (failing the first N
/// attempts); attempt counts are recorded per endpoint.
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    state: Arc<ProbeState>,
}

#[derive(Default)]
struct ProbeState {
    down: Mutex<HashSet<(String, u16)>>,
    flaky: Mutex<HashMap<(String, u16), u32>>,
    attempts: Mutex<HashMap<(String, u16), u32>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make this endpoint fail every probe
    pub fn mark_down(&self, hostname: &str, port: u16) {
        self.state
            .down
            .lock()
            .unwrap()
            .insert((hostname.to_string(), port));
    }

    /// Make this endpoint fail its first `failures` probes, then succeed
    pub fn fail_first(&self, hostname: &str, port: u16, failures: u32) {
        self.state
            .flaky
            .lock()
            .unwrap()
            .insert((hostname.to_string(), port), failures);
    }

    /// Number of probes issued against this endpoint
    pub fn attempts(&self, hostname: &str, port: u16) -> u32 {
        self.state
            .attempts
            .lock()
            .unwrap()
            .get(&(hostname.to_string(), port))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MetricsProbe for ScriptedProbe {
    async fn probe(&self, hostname: &str, port: u16) -> Result<(), ProbeError> {
        let key = (hostname.to_string(), port);
        let attempt = {
            let mut attempts = self.state.attempts.lock().unwrap();
            let entry = attempts.entry(key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        if self.state.down.lock().unwrap().contains(&key) {
            return Err(ProbeError::Unreachable(format!(
                "connection refused: {}:{}",
                hostname, port
            )));
        }

        if let Some(failures) = self.state.flaky.lock().unwrap().get(&key) {
            if attempt <= *failures {
                return Err(ProbeError::Unreachable(format!(
                    "connection reset: {}:{}",
                    hostname, port
                )));
            }
        }

        Ok(())
    }
}
