// Docker runtime using Bollard
use crate::runtime::{ContainerRuntime, ContainerSpec};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogOutput, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::stream::StreamExt;
use tracing::{debug, info, warn};

/// HTTP status the daemon returns for a container that is already stopped
const NOT_MODIFIED: u16 = 304;
const NOT_FOUND: u16 = 404;
/// Removal already in progress
const CONFLICT: u16 = 409;

fn server_status(err: &BollardError) -> Option<u16> {
    match err {
        BollardError::DockerResponseServerError { status_code, .. } => Some(*status_code),
        _ => None,
    }
}

/// Container runtime backed by the local Docker daemon
pub struct DockerRuntime {
    docker: Docker,
    pull_missing: bool,
    stop_timeout_secs: i64,
}

impl DockerRuntime {
    /// Connect using the local defaults (`DOCKER_HOST` or the unix socket)
    pub fn connect(pull_missing: bool, stop_timeout_secs: i64) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .context("Failed to connect to Docker daemon")?;

        Ok(Self {
            docker,
            pull_missing,
            stop_timeout_secs,
        })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    /// Image cache check: inspect first, pull only on a miss
    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.docker.inspect_image(image).await.is_ok() {
            debug!(image = %image, "Image cache hit");
            return Ok(());
        }

        if !self.pull_missing {
            bail!("Image '{}' is not present locally and pulling is disabled", image);
        }

        warn!(image = %image, "Image cache miss, pulling");

        let options = Some(CreateImageOptions {
            from_image: image,
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);
        while let Some(result) = stream.next().await {
            result.with_context(|| format!("Failed to pull image '{}'", image))?;
        }

        info!(image = %image, "Image pulled");
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env.clone()),
            cmd: spec.cmd.clone(),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.as_str(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .with_context(|| format!("Failed to create container from '{}'", spec.image))?;

        for warning in &response.warnings {
            warn!(container_id = %response.id, warning = %warning, "Docker create warning");
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .context("Failed to start container")
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        let options = StopContainerOptions {
            t: self.stop_timeout_secs,
        };

        match self.docker.stop_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) if matches!(server_status(&e), Some(NOT_MODIFIED | NOT_FOUND)) => {
                debug!(container_id = %id, "Container already stopped");
                Ok(())
            }
            Err(e) => Err(e).context("Failed to stop container"),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) if matches!(server_status(&e), Some(NOT_FOUND | CONFLICT)) => {
                debug!(container_id = %id, "Container already removed");
                Ok(())
            }
            Err(e) => Err(e).context("Failed to remove container"),
        }
    }

    async fn is_running(&self, id: &str) -> Result<bool> {
        let inspect = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .context("Failed to inspect container")?;

        Ok(inspect
            .state
            .and_then(|state| state.running)
            .unwrap_or(false))
    }

    async fn create_exec(&self, id: &str, argv: &[String]) -> Result<String> {
        let exec_config = CreateExecOptions {
            cmd: Some(argv.to_vec()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = self
            .docker
            .create_exec(id, exec_config)
            .await
            .context("Failed to create exec")?;

        Ok(exec.id)
    }

    async fn attach_exec(&self, exec_id: &str) -> Result<String> {
        let start_config = StartExecOptions {
            detach: false,
            ..Default::default()
        };

        let results = self
            .docker
            .start_exec(exec_id, Some(start_config))
            .await
            .context("Failed to attach to exec")?;

        let mut output = String::new();

        let StartExecResults::Attached { output: mut stream, .. } = results else {
            bail!("Exec {} started detached", exec_id);
        };

        // stdout and stderr share one buffer; relative order is not guaranteed
        while let Some(msg) = stream.next().await {
            match msg.context("Failed to read exec output")? {
                LogOutput::StdOut { message }
                | LogOutput::StdErr { message }
                | LogOutput::Console { message } => {
                    output.push_str(&String::from_utf8_lossy(&message));
                }
                LogOutput::StdIn { .. } => {}
            }
        }

        Ok(output)
    }

    async fn inspect_exec(&self, exec_id: &str) -> Result<Option<i64>> {
        let inspect = self
            .docker
            .inspect_exec(exec_id)
            .await
            .context("Failed to inspect exec")?;

        Ok(inspect.exit_code)
    }
}
