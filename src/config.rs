//! Workload files.
//!
//! A workload is a TOML document with an optional `[scheduler]` table and a
//! list of `[[process]]` entries:
//!
//! ```toml
//! [scheduler]
//! strategy = "target-latency"
//! sched_latency = 6
//! min_granularity = 1
//!
//! [[process]]
//! pid = 1
//! arrival_time = 0
//! burst_time = 4
//! priority = 4
//! ```

use std::{fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, scheduler::SliceStrategy, sim::ProcessSpec};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub scheduler: SliceStrategy,
    #[serde(default, rename = "process")]
    pub processes: Vec<ProcessSpec>,
}

impl SimConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;
        Ok(())
    }
}

impl FromStr for SimConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
