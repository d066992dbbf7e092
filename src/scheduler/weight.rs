//! Priority to weight mapping.
//!
//! Priority 0 is the heaviest (most CPU share), 9 the lightest. Each step
//! down the table shrinks the weight roughly threefold, with priority 4 as
//! the reference weight [`BASE_WEIGHT`].

use serde::{Deserialize, Serialize};

use crate::core::Ticks;

pub const BASE_WEIGHT: f64 = 1024.0;

pub const MIN_PRIORITY: i32 = 0;
pub const MAX_PRIORITY: i32 = 9;

const PRIO_TO_WEIGHT: [f64; 10] = [
    88761.0, 29154.0, 9548.0, 3121.0, 1024.0, 335.0, 110.0, 35.0, 10.0, 2.0,
];

/// A priority level already clamped into `MIN_PRIORITY..=MAX_PRIORITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct Priority(u8);

impl Priority {
    pub fn get(self) -> i32 {
        self.0 as i32
    }
}

impl From<i32> for Priority {
    fn from(raw: i32) -> Self {
        clamp_priority(raw)
    }
}

impl From<Priority> for i32 {
    fn from(prio: Priority) -> Self {
        prio.get()
    }
}

/// Out-of-range priorities are clamped, never rejected.
pub fn clamp_priority(raw: i32) -> Priority {
    Priority(raw.clamp(MIN_PRIORITY, MAX_PRIORITY) as u8)
}

pub fn weight_for(priority: i32) -> f64 {
    PRIO_TO_WEIGHT[clamp_priority(priority).0 as usize]
}

/// Virtual runtime accrued by running `ticks` ticks at `weight`.
pub fn vruntime_delta(weight: f64, ticks: Ticks) -> f64 {
    ticks as f64 * (BASE_WEIGHT / weight)
}

/// Share of `period` owed to `weight` out of `total_weight`, truncated to
/// whole ticks.
pub fn slice_share(period: Ticks, weight: f64, total_weight: f64) -> Ticks {
    if total_weight <= 0.0 {
        return period;
    }
    (period as f64 * weight / total_weight) as Ticks
}
