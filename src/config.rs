//! Filter engine configuration.

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

pub const DEFAULT_INITIAL_BATCH_SIZE: usize = 4;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "ticket-filter";

/// Worker pool and batch sizing for the filter coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Fixed worker count. `None` derives it from the available cores.
    pub worker_threads: Option<usize>,
    /// Size of the first batch of every generation.
    pub initial_batch_size: usize,
    /// Upper bound for the doubling batch size.
    pub max_batch_size: usize,
    pub thread_name_prefix: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            initial_batch_size: DEFAULT_INITIAL_BATCH_SIZE,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == Some(0) {
            return Err(FilterError::InvalidConfig(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.initial_batch_size == 0 {
            return Err(FilterError::InvalidConfig(
                "initial_batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_batch_size < self.initial_batch_size {
            return Err(FilterError::InvalidConfig(format!(
                "max_batch_size ({}) must not be smaller than initial_batch_size ({})",
                self.max_batch_size, self.initial_batch_size
            )));
        }
        Ok(())
    }

    /// Number of worker threads the coordinator should start.
    pub fn resolved_worker_threads(&self) -> usize {
        match self.worker_threads {
            Some(count) => count.max(1),
            None => {
                let cores = thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1);
                workers_for_cores(cores)
            }
        }
    }

    /// Loads a JSON config file, falling back to defaults if it does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data).map_err(|error| {
            FilterError::Serialization(format!(
                "failed to parse filter config {}: {error}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).map_err(|error| {
            FilterError::Serialization(format!("failed to serialize filter config: {error}"))
        })?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Leaves a quarter of the cores to the thread that owns the view when there
/// are enough of them.
fn workers_for_cores(cores: usize) -> usize {
    if cores > 3 {
        (cores * 3 / 4).max(1)
    } else {
        cores.max(1)
    }
}
