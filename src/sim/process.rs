use serde::{Deserialize, Serialize};

use crate::core::{Pid, ProcessRecord, Ticks};

/// Static description of one process in a workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub pid: Pid,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    /// 0 (heaviest) ..= 9 (lightest); anything else is clamped.
    pub priority: i32,
}

impl ProcessSpec {
    pub fn new(pid: Pid, arrival_time: Ticks, burst_time: Ticks, priority: i32) -> Self {
        Self {
            pid,
            arrival_time,
            burst_time,
            priority,
        }
    }
}

impl From<&ProcessSpec> for ProcessRecord {
    fn from(spec: &ProcessSpec) -> Self {
        ProcessRecord::new(spec.pid, spec.arrival_time, spec.burst_time, spec.priority)
    }
}
