pub mod cfs;
pub mod weight;

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        Ticks,
        state::{ProcId, SimCtx},
    },
    error::SimError,
};
pub use cfs::CfsScheduler;

pub type EnqueueFlags = u64;

/// First enqueue after arrival.
pub const ENQ_WAKEUP: EnqueueFlags = 1 << 0;
/// Running process handed back to the queue by the reclaim check.
pub const ENQ_PREEMPT: EnqueueFlags = 1 << 1;

pub const SCHED_LATENCY: Ticks = 6;
pub const MIN_GRANULARITY: Ticks = 1;

/// How long a dispatched process may hold the CPU before the next reclaim
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum SliceStrategy {
    /// One-tick slices: the running process is requeued every tick and the
    /// minimum reselected.
    Uniform,
    /// Slices proportional to the process's share of the ready load, never
    /// shorter than `min_granularity`.
    TargetLatency {
        #[serde(default = "default_sched_latency")]
        sched_latency: Ticks,
        #[serde(default = "default_min_granularity")]
        min_granularity: Ticks,
    },
}

fn default_sched_latency() -> Ticks {
    SCHED_LATENCY
}

fn default_min_granularity() -> Ticks {
    MIN_GRANULARITY
}

impl Default for SliceStrategy {
    fn default() -> Self {
        Self::TargetLatency {
            sched_latency: SCHED_LATENCY,
            min_granularity: MIN_GRANULARITY,
        }
    }
}

impl SliceStrategy {
    /// Every granted slice must cover at least one tick.
    pub fn validate(&self) -> Result<(), SimError> {
        match *self {
            Self::Uniform => Ok(()),
            Self::TargetLatency { sched_latency: 0, .. } => Err(SimError::ZeroLatency),
            Self::TargetLatency {
                min_granularity: 0, ..
            } => Err(SimError::ZeroGranularity),
            Self::TargetLatency { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimDecision {
    /// Slice not used up yet.
    Keep,
    /// Slice expired but nobody is owed the CPU; run on for the given ticks.
    Renew(Ticks),
    /// Put the running process back on the queue.
    Preempt,
}

pub trait Scheduler {
    fn init(ctx: &mut SimCtx, strategy: SliceStrategy) -> Self;

    /// A process arrived. Called before its first enqueue.
    fn enable(&mut self, ctx: &mut SimCtx, proc: ProcId);

    fn enqueue(&mut self, ctx: &mut SimCtx, proc: ProcId, flags: EnqueueFlags);

    /// Remove and return the next process to run.
    fn dispatch(&mut self, ctx: &mut SimCtx) -> Option<ProcId>;

    fn slice(&self, ctx: &SimCtx, proc: ProcId) -> Ticks;

    /// Charge `proc` for one executed tick.
    fn tick(&mut self, ctx: &mut SimCtx, proc: ProcId);

    fn check_reclaim(&self, ctx: &SimCtx, proc: ProcId) -> ReclaimDecision;

    /// `proc` finished and leaves the system.
    fn disable(&mut self, _ctx: &mut SimCtx, _proc: ProcId) {}

    fn nr_queued(&self) -> usize;

    fn queued(&self) -> Vec<ProcId>;
}
