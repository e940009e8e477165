/// Remote Command Executor
///
/// **Responsibility:**
/// Run one command string inside a running container and capture the result.
///
/// **Execution Rules:**
/// 1. The command string is tokenized, never handed to a shell
/// 2. Each call creates a fresh exec instance; instances are not reused
/// 3. stdout and stderr are merged into one buffer
/// 4. The exit code comes from inspecting the finished exec
///
/// A runtime API failure sets `execution_error`. A program that exits
/// non-zero is a normal result, not an executor error.

use crate::error::PhaseError;
use crate::runtime::ContainerRuntime;
use anyhow::{Context, Result};
use imagecheck_common::command::tokenize;
use imagecheck_common::types::ExecutionResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Clone)]
pub struct CommandExecutor {
    runtime: Arc<dyn ContainerRuntime>,
}

impl CommandExecutor {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Precondition check for `run`: a stopped container is reported
    /// immediately instead of surfacing as exec failures.
    pub async fn ensure_running(&self, container_id: &str) -> Result<(), PhaseError> {
        match self.runtime.is_running(container_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(PhaseError::NotRunning(container_id.to_string())),
            Err(e) => Err(PhaseError::Setup(e)),
        }
    }

    pub async fn run(&self, container_id: &str, command: &str) -> ExecutionResult {
        let argv = tokenize(command);
        let start_time = Instant::now();

        let result = match self.exec(container_id, &argv).await {
            Ok((exit_code, output)) => ExecutionResult::completed(exit_code, output),
            Err(e) => ExecutionResult::failed(format!("{:#}", e)),
        };

        debug!(
            container_id = %container_id,
            program = %argv[0],
            exit_code = result.exit_code,
            execution_error = result.execution_error.is_some(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Exec finished"
        );

        result
    }

    async fn exec(&self, container_id: &str, argv: &[String]) -> Result<(i64, String)> {
        let exec_id = self.runtime.create_exec(container_id, argv).await?;
        let output = self.runtime.attach_exec(&exec_id).await?;
        let exit_code = self
            .runtime
            .inspect_exec(&exec_id)
            .await?
            .with_context(|| format!("Exec {} finished without an exit code", exec_id))?;

        Ok((exit_code, output))
    }
}
