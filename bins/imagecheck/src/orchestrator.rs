/// Phase Orchestrator
///
/// **Phases (in order, each independent):**
/// 1. Default entrypoint: image's own command, wait for the database
/// 2. Cluster-manager entrypoint (extended images only): wait for REST health
/// 3. Extension verification: preload-configured database, run the suite
///
/// A failed phase counts once and never stops the following phases. The
/// exit status is decided after all of them ran.

use crate::config::HarnessConfig;
use crate::error::PhaseError;
use crate::executor::CommandExecutor;
use crate::lifecycle::{ContainerLease, ContainerManager};
use crate::readiness::{wait_until_ready, Probe};
use crate::report;
use crate::runner::run_cases;
use crate::runtime::{ContainerRuntime, ContainerSpec};
use base64::{engine::general_purpose, Engine as _};
use imagecheck_common::types::{CaseOutcome, RunSummary, TestCase, Variant};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared state built once in `main` and passed to every component
#[derive(Clone)]
pub struct HarnessContext {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub config: Arc<HarnessConfig>,
}

const PATRONI_CONFIG_PATH: &str = "/tmp/patroni.yml";

/// Minimal single-node Patroni document for the cluster-manager phase
fn patroni_config(config: &HarnessConfig) -> String {
    format!(
        r#"scope: {scope}
name: {name}

restapi:
  listen: 0.0.0.0:8008
  connect_address: 127.0.0.1:8008

bootstrap:
  dcs:
    ttl: 30
    loop_wait: 10
    retry_timeout: 10
    maximum_lag_on_failover: 1048576
  initdb:
    - encoding: UTF8
    - data-checksums

postgresql:
  listen: 0.0.0.0:5432
  connect_address: 127.0.0.1:5432
  data_dir: /var/lib/pgsql/data
  authentication:
    superuser:
      username: {user}
      password: {password}
    replication:
      username: replicator
      password: {password}
"#,
        scope = config.cluster.scope,
        name = config.cluster.node_name,
        user = config.database.user,
        password = config.database.password,
    )
}

/// Container command that writes the Patroni config and execs Patroni
///
/// The document travels base64-encoded so no quoting in it can break the
/// shell line.
fn cluster_command(config: &HarnessConfig) -> Vec<String> {
    let encoded = general_purpose::STANDARD.encode(patroni_config(config));
    vec![
        "sh".to_string(),
        "-c".to_string(),
        format!(
            "echo '{}' | base64 -d > {path} && exec patroni {path}",
            encoded,
            path = PATRONI_CONFIG_PATH
        ),
    ]
}

/// Postgres command line with the preload settings the extensions need
fn extension_command(config: &HarnessConfig, variant: Variant) -> Vec<String> {
    let settings = [
        format!("shared_preload_libraries={}", config.preload_libraries(variant)),
        "wal_level=logical".to_string(),
        "track_commit_timestamp=on".to_string(),
        "max_replication_slots=10".to_string(),
        "max_wal_senders=10".to_string(),
        "snowflake.node=1".to_string(),
        "lolor.node=1".to_string(),
    ];

    let mut cmd = vec!["postgres".to_string()];
    for setting in settings {
        cmd.push("-c".to_string());
        cmd.push(setting);
    }
    cmd
}

pub struct Orchestrator {
    config: Arc<HarnessConfig>,
    manager: ContainerManager,
    executor: CommandExecutor,
    image: String,
    variant: Variant,
}

impl Orchestrator {
    pub fn new(ctx: &HarnessContext, image: impl Into<String>, variant: Variant) -> Self {
        Self {
            config: ctx.config.clone(),
            manager: ContainerManager::new(ctx.runtime.clone()),
            executor: CommandExecutor::new(ctx.runtime.clone()),
            image: image.into(),
            variant,
        }
    }

    /// Run all phases and return the aggregated summary
    pub async fn run(&self, suite: &[TestCase]) -> RunSummary {
        let mut summary = RunSummary::default();

        report::print_phase(1, "Default Entrypoint Test");
        let result = self.default_entrypoint_phase().await;
        summary.record(finish_phase("Default entrypoint test", result));

        if self.variant.is_extended() {
            report::print_phase(2, "Patroni Entrypoint Test");
            let result = self.cluster_entrypoint_phase().await;
            summary.record(finish_phase("Patroni entrypoint test", result));
        } else {
            info!(variant = %self.variant, "Skipping cluster-manager phase");
        }

        report::print_phase(3, "Extension Tests");
        match self.extension_phase(suite).await {
            Ok(outcomes) => {
                for outcome in &outcomes {
                    summary.record(outcome.passed());
                }
            }
            Err(e) => {
                summary.record(finish_phase("Extension container setup", Err(e)));
            }
        }

        info!(
            executed = summary.executed,
            failed = summary.failed,
            status = ?summary.status(),
            "Run complete"
        );

        summary
    }

    #[instrument(skip(self), fields(phase = "default-entrypoint"))]
    async fn default_entrypoint_phase(&self) -> Result<(), PhaseError> {
        println!("  Starting container with default entrypoint...");

        let spec = ContainerSpec::new(&self.image).env(self.config.database_env());
        self.smoke_phase(spec, Probe::database(&self.config)).await
    }

    #[instrument(skip(self), fields(phase = "cluster-entrypoint"))]
    async fn cluster_entrypoint_phase(&self) -> Result<(), PhaseError> {
        println!("  Starting container with Patroni entrypoint...");

        let spec = ContainerSpec::new(&self.image)
            .env(vec![
                format!("PATRONI_SCOPE={}", self.config.cluster.scope),
                format!("PATRONI_NAME={}", self.config.cluster.node_name),
            ])
            .cmd(cluster_command(&self.config));
        self.smoke_phase(spec, Probe::cluster_health(&self.config)).await
    }

    /// Boot, wait for readiness, release
    async fn smoke_phase(&self, spec: ContainerSpec, probe: Probe) -> Result<(), PhaseError> {
        let lease = self.manager.acquire(spec, self.variant).await?;

        println!("  Waiting for {}...", probe.purpose);
        let result = wait_until_ready(&self.executor, lease.id(), &probe).await;
        lease.release().await;

        result
    }

    #[instrument(skip(self, suite), fields(phase = "extension-verification"))]
    async fn extension_phase(&self, suite: &[TestCase]) -> Result<Vec<CaseOutcome>, PhaseError> {
        let lease = self.start_extension_container().await?;

        let result = match self.executor.ensure_running(lease.id()).await {
            Ok(()) => Ok(run_cases(&self.executor, lease.id(), suite, self.variant).await),
            Err(e) => Err(e),
        };

        println!();
        println!("  Cleaning up...");
        lease.release().await;

        result
    }

    /// Setup step; the returned lease is released by `extension_phase`
    async fn start_extension_container(&self) -> Result<ContainerLease, PhaseError> {
        println!("  Starting container with extension config...");

        let spec = ContainerSpec::new(&self.image)
            .env(self.config.database_env())
            .cmd(extension_command(&self.config, self.variant));
        let lease = self.manager.acquire(spec, self.variant).await?;
        println!("  Container created: {}", lease.handle().short_id());

        let probe = Probe::database(&self.config);
        println!("  Waiting for {}...", probe.purpose);
        if let Err(e) = wait_until_ready(&self.executor, lease.id(), &probe).await {
            lease.release().await;
            return Err(e);
        }

        // Background initialisation (extension workers) is not visible to
        // pg_isready
        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            info!(settle_secs = settle.as_secs(), "Waiting for background initialization");
            tokio::time::sleep(settle).await;
        }

        println!("  PostgreSQL is ready!");
        println!();
        Ok(lease)
    }
}

/// Print the phase status line and turn the result into pass/fail
fn finish_phase(label: &str, result: Result<(), PhaseError>) -> bool {
    match result {
        Ok(()) => {
            report::print_status(label, true);
            println!();
            true
        }
        Err(e) => {
            report::print_status(label, false);
            error!(phase = %label, error = %e, "Phase failed");
            println!();
            false
        }
    }
}
