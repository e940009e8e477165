/// Container Lifecycle Manager
///
/// Every container the harness creates is owned by a `ContainerLease`. The
/// lease exists from the moment the runtime hands back an id, so a failed
/// start, a failed phase body, a panic, or a dropped future all end with the
/// container stopped and removed exactly once.
///
/// A phase that needs the container past its setup step simply returns the
/// lease; the caller that ends up holding it releases it.

use crate::error::PhaseError;
use crate::runtime::{ContainerRuntime, ContainerSpec};
use imagecheck_common::types::Variant;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Stopped,
    Removed,
}

/// One live container instance
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    pub id: String,
    pub image: String,
    pub variant: Variant,
    pub state: ContainerState,
}

impl ContainerHandle {
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(12)]
    }
}

#[derive(Clone)]
pub struct ContainerManager {
    runtime: Arc<dyn ContainerRuntime>,
}

impl ContainerManager {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Create and start a container
    ///
    /// If the start fails the container is released before the error is
    /// returned.
    pub async fn acquire(&self, spec: ContainerSpec, variant: Variant) -> Result<ContainerLease, PhaseError> {
        self.runtime
            .ensure_image(&spec.image)
            .await
            .map_err(PhaseError::Setup)?;

        let id = self
            .runtime
            .create_container(&spec)
            .await
            .map_err(PhaseError::Setup)?;

        // Release obligation starts here
        let mut lease = ContainerLease {
            runtime: self.runtime.clone(),
            handle: ContainerHandle {
                id,
                image: spec.image,
                variant,
                state: ContainerState::Created,
            },
            released: false,
        };
        info!(
            container_id = %lease.handle.short_id(),
            name = %spec.name,
            image = %lease.handle.image,
            variant = %lease.handle.variant,
            "Container created"
        );

        if let Err(e) = self.runtime.start_container(&lease.handle.id).await {
            lease.release().await;
            return Err(PhaseError::Setup(e));
        }

        lease.handle.state = ContainerState::Running;
        info!(container_id = %lease.handle.short_id(), "Container started");

        Ok(lease)
    }
}

/// Exclusive ownership of one container
pub struct ContainerLease {
    runtime: Arc<dyn ContainerRuntime>,
    handle: ContainerHandle,
    released: bool,
}

impl ContainerLease {
    pub fn handle(&self) -> &ContainerHandle {
        &self.handle
    }

    pub fn id(&self) -> &str {
        &self.handle.id
    }

    /// Stop then remove the container
    ///
    /// Failures are logged and never escalate.
    pub async fn release(mut self) -> ContainerHandle {
        release_container(self.runtime.as_ref(), &mut self.handle).await;
        self.released = true;
        self.handle.clone()
    }
}

impl Drop for ContainerLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        // Cannot await in Drop; hand the release to the runtime
        let runtime = self.runtime.clone();
        let mut handle = self.handle.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                warn!(container_id = %handle.short_id(), "Container lease dropped without release, cleaning up");
                rt.spawn(async move {
                    release_container(runtime.as_ref(), &mut handle).await;
                });
            }
            Err(_) => {
                warn!(container_id = %handle.id, "No async runtime available, container leaked");
            }
        }
    }
}

async fn release_container(runtime: &dyn ContainerRuntime, handle: &mut ContainerHandle) {
    match runtime.stop_container(&handle.id).await {
        Ok(()) => {
            handle.state = ContainerState::Stopped;
            info!(container_id = %handle.short_id(), "Container stopped");
        }
        Err(e) => warn!(container_id = %handle.short_id(), error = %format!("{:#}", e), "Error stopping container"),
    }

    match runtime.remove_container(&handle.id).await {
        Ok(()) => {
            handle.state = ContainerState::Removed;
            info!(container_id = %handle.short_id(), "Container removed");
        }
        Err(e) => warn!(container_id = %handle.short_id(), error = %format!("{:#}", e), "Error removing container"),
    }
}
