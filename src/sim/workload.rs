use rand::prelude::*;

use super::ProcessSpec;
use crate::{
    core::{Pid, Ticks},
    scheduler::weight::{MAX_PRIORITY, MIN_PRIORITY},
};

/// Parameters of a synthetic workload with Bernoulli arrivals.
#[derive(Debug, Clone, Copy)]
pub struct BernoulliWorkload {
    /// Number of ticks during which processes may arrive.
    pub ticks: Ticks,
    pub p_arrival: f64,
    pub p_short: f64,
    pub short_ticks: Ticks,
    pub long_ticks: Ticks,
    pub seed: u64,
}

impl Default for BernoulliWorkload {
    fn default() -> Self {
        Self {
            ticks: 50,
            p_arrival: 0.3,
            p_short: 0.3,
            short_ticks: 2,
            long_ticks: 6,
            seed: 0,
        }
    }
}

impl BernoulliWorkload {
    /// Each tick a process arrives with probability `p_arrival`; it is short
    /// with probability `p_short` and gets a uniformly random priority.
    pub fn generate(&self) -> Vec<ProcessSpec> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut specs = Vec::new();

        for t in 0..self.ticks {
            if rng.random::<f64>() < self.p_arrival {
                let burst_time = if rng.random::<f64>() < self.p_short {
                    self.short_ticks
                } else {
                    self.long_ticks
                };

                specs.push(ProcessSpec {
                    pid: specs.len() as Pid + 1,
                    arrival_time: t,
                    burst_time,
                    priority: rng.random_range(MIN_PRIORITY..=MAX_PRIORITY),
                });
            }
        }

        specs
    }
}
