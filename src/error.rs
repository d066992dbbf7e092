use std::{io, path::PathBuf};

use thiserror::Error;

use crate::core::Pid;

/// Workloads the simulator refuses to start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("workload contains no processes")]
    EmptyWorkload,
    #[error("process {pid} has a zero burst time")]
    ZeroBurst { pid: Pid },
    #[error("pid {pid} appears more than once")]
    DuplicatePid { pid: Pid },
    #[error("sched_latency must be at least 1 tick")]
    ZeroLatency,
    #[error("min_granularity must be at least 1 tick")]
    ZeroGranularity,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed workload file")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] SimError),
}
