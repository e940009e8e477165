//! Container runtime interface.
//!
//! The harness only consumes the generic container API (create, start, stop,
//! remove, exec). Production uses `DockerRuntime`; tests use an in-memory fake.

use anyhow::Result;
use async_trait::async_trait;

/// Everything needed to create one container
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: Vec<String>,
    /// `None` keeps the image's default command
    pub cmd: Option<Vec<String>>,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            name: format!("imagecheck-{}", uuid::Uuid::new_v4()),
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn env(mut self, env: Vec<String>) -> Self {
        self.env = env;
        self
    }

    pub fn cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = Some(cmd);
        self
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Make sure the image is present locally
    async fn ensure_image(&self, image: &str) -> Result<()>;

    /// Create a container and return its id
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    /// Stop a container; already stopped or missing is not an error
    async fn stop_container(&self, id: &str) -> Result<()>;

    /// Remove a container; already removed is not an error
    async fn remove_container(&self, id: &str) -> Result<()>;

    async fn is_running(&self, id: &str) -> Result<bool>;

    /// Create an exec instance with stdout and stderr attached
    async fn create_exec(&self, id: &str, argv: &[String]) -> Result<String>;

    /// Start the exec and drain its merged output
    async fn attach_exec(&self, exec_id: &str) -> Result<String>;

    /// Exit code of a finished exec, `None` if it has none
    async fn inspect_exec(&self, exec_id: &str) -> Result<Option<i64>>;
}
