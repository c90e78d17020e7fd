//! Configuration for the server update-status subsystem

use crate::domain::errors::UpdateError;
use serde::{Deserialize, Serialize};
use std::env;

/// Update-status configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusConfig {
    /// Report revalidation flags to caches (`useRevalPending`)
    pub use_reval_pending: bool,
    /// Replans after a conflicting concurrent commit before giving up
    pub max_commit_retries: u32,
    /// Upper bound on cache groups visited by one hierarchy walk
    pub max_topology_nodes: usize,
}

impl Default for UpdateStatusConfig {
    fn default() -> Self {
        Self {
            use_reval_pending: true,
            max_commit_retries: 3,
            max_topology_nodes: 10_000,
        }
    }
}

impl UpdateStatusConfig {
    /// Small bounds for tests.
    pub fn for_testing() -> Self {
        Self {
            use_reval_pending: true,
            max_commit_retries: 2,
            max_topology_nodes: 256,
        }
    }

    /// Defaults overridden by environment variables.
    ///
    /// - `TC_USE_REVAL_PENDING`: true/false
    /// - `TC_MAX_COMMIT_RETRIES`: integer
    /// - `TC_MAX_TOPOLOGY_NODES`: integer
    pub fn from_env() -> Result<Self, UpdateError> {
        let mut config = Self::default();

        if let Ok(value) = env::var("TC_USE_REVAL_PENDING") {
            config.use_reval_pending = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(UpdateError::Config(format!(
                        "TC_USE_REVAL_PENDING must be a boolean, got '{}'",
                        other
                    )))
                }
            };
        }
        if let Ok(value) = env::var("TC_MAX_COMMIT_RETRIES") {
            config.max_commit_retries = parse_number("TC_MAX_COMMIT_RETRIES", &value)?;
        }
        if let Ok(value) = env::var("TC_MAX_TOPOLOGY_NODES") {
            config.max_topology_nodes = parse_number("TC_MAX_TOPOLOGY_NODES", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), UpdateError> {
        if self.max_topology_nodes == 0 {
            return Err(UpdateError::Config(
                "max_topology_nodes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, UpdateError> {
    value
        .trim()
        .parse()
        .map_err(|_| UpdateError::Config(format!("{} must be a number, got '{}'", name, value)))
}
