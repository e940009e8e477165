/// Readiness Poller
///
/// Bounded-retry loop that runs a probe command until it exits 0 or a
/// wall-clock deadline passes.
///
/// **Rules:**
/// - Fixed interval between attempts, no backoff
/// - Exec-level failures count as "not ready yet" while the container is
///   still running
/// - A container that has exited fails the wait at once
/// - Otherwise only the deadline is fatal
/// - An in-flight probe is never cancelled, so a stuck probe can overrun the
///   deadline by one execution

use crate::config::HarnessConfig;
use crate::error::PhaseError;
use crate::executor::CommandExecutor;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct Probe {
    /// Named in the timeout error
    pub purpose: String,
    pub command: String,
    pub timeout: Duration,
    pub interval: Duration,
}

impl Probe {
    /// Database accepting connections
    pub fn database(config: &HarnessConfig) -> Self {
        Self {
            purpose: "PostgreSQL to be ready".to_string(),
            command: format!("pg_isready -U {}", config.database.user),
            timeout: config.database_ready.timeout(),
            interval: config.database_ready.interval(),
        }
    }

    /// Cluster manager REST health endpoint
    pub fn cluster_health(config: &HarnessConfig) -> Self {
        Self {
            purpose: "Patroni to initialize".to_string(),
            command: format!("curl -sf {}", config.cluster.health_url),
            timeout: config.cluster_ready.timeout(),
            interval: config.cluster_ready.interval(),
        }
    }
}

pub async fn wait_until_ready(
    executor: &CommandExecutor,
    container_id: &str,
    probe: &Probe,
) -> Result<(), PhaseError> {
    let start_time = Instant::now();
    let deadline = start_time + probe.timeout;
    let mut attempts = 0u32;

    while Instant::now() < deadline {
        attempts += 1;
        let result = executor.run(container_id, &probe.command).await;

        if result.succeeded() {
            info!(
                container_id = %container_id,
                attempts,
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Ready: {}", probe.purpose
            );
            return Ok(());
        }

        match &result.execution_error {
            Some(err) => {
                debug!(attempt = attempts, error = %err, "Probe could not run");
                match executor.ensure_running(container_id).await {
                    Err(e @ PhaseError::NotRunning(_)) => {
                        warn!(container_id = %container_id, attempts, "Container exited while waiting: {}", probe.purpose);
                        return Err(e);
                    }
                    // Inspect failures are as transient as the exec failure
                    Err(e) => debug!(attempt = attempts, error = %e, "Running check failed"),
                    Ok(()) => {}
                }
            }
            None => debug!(attempt = attempts, exit_code = result.exit_code, "Probe not ready"),
        }

        tokio::time::sleep(probe.interval).await;
    }

    Err(PhaseError::ReadinessTimeout {
        purpose: probe.purpose.clone(),
        timeout: probe.timeout,
    })
}
