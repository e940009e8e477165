// Harness configuration for imagecheck
use anyhow::{bail, Context, Result};
use imagecheck_common::types::Variant;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Overrides `settle_delay_secs` when set
pub const SETTLE_DELAY_ENV: &str = "IMAGECHECK_SETTLE_DELAY_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: "postgres".to_string(),
            password: "testpassword".to_string(),
            name: "testdb".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub scope: String,
    pub node_name: String,
    pub health_url: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            scope: "pgedge-test".to_string(),
            node_name: "node1".to_string(),
            health_url: "http://127.0.0.1:8008/health".to_string(),
        }
    }
}

/// Bounded-retry settings for one readiness target
///
/// A partially specified object keeps the database poll defaults for the
/// missing fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub timeout_secs: u64,
    pub interval_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            interval_secs: 1,
        }
    }
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub database: DatabaseConfig,
    pub cluster: ClusterConfig,
    pub database_ready: ReadinessConfig,
    pub cluster_ready: ReadinessConfig,
    /// Extra wait after the extension container first reports ready
    pub settle_delay_secs: u64,
    pub stop_timeout_secs: i64,
    pub pull_missing_images: bool,
    pub baseline_preload: Vec<String>,
    pub extended_preload: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            cluster: ClusterConfig::default(),
            database_ready: ReadinessConfig::default(),
            cluster_ready: ReadinessConfig { timeout_secs: 90, interval_secs: 2 },
            settle_delay_secs: 3,
            stop_timeout_secs: 10,
            pull_missing_images: true,
            baseline_preload: vec!["spock".to_string(), "snowflake".to_string()],
            extended_preload: vec![
                "spock".to_string(),
                "snowflake".to_string(),
                "pgaudit".to_string(),
            ],
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a JSON file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Harness config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Load from `path` when given, defaults otherwise, then apply env overrides
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Ok(raw) = std::env::var(SETTLE_DELAY_ENV) {
            config.settle_delay_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {}", SETTLE_DELAY_ENV, raw))?;
        }

        Ok(config)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Environment the image's init logic uses to provision the database
    pub fn database_env(&self) -> Vec<String> {
        vec![
            format!("POSTGRES_PASSWORD={}", self.database.password),
            format!("POSTGRES_USER={}", self.database.user),
            format!("POSTGRES_DB={}", self.database.name),
        ]
    }

    /// Libraries that must be preloaded for the extension checks
    pub fn preload_libraries(&self, variant: Variant) -> String {
        match variant {
            Variant::Baseline => self.baseline_preload.join(","),
            Variant::Extended => self.extended_preload.join(","),
        }
    }
}
