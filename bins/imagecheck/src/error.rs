//! Phase-level failures.

use std::time::Duration;
use thiserror::Error;

/// Anything that ends a phase early
///
/// Case-level failures are not errors; they are recorded per case and the
/// phase continues.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// Container could not be created or started
    #[error("container setup failed: {0:#}")]
    Setup(anyhow::Error),

    #[error("timeout after {}s waiting for {purpose}", .timeout.as_secs())]
    ReadinessTimeout { purpose: String, timeout: Duration },

    #[error("container {0} is not running")]
    NotRunning(String),
}
