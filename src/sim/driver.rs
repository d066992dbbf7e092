use log::info;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{process::ProcessSpec, report::SimReport};
use crate::{
    core::{
        driver::SchedCore,
        event::Telemetry,
        state::{Pid, ProcId, ProcessRecord, Ticks},
    },
    error::SimError,
    scheduler::{Scheduler, SliceStrategy},
};

pub struct Sim<S: Scheduler> {
    pub core: SchedCore<S>,
    // Process indices sorted by (arrival_time, pid)
    arrival_order: Vec<ProcId>,
    arrival_cursor: usize,
    // Pid --> index into core.ctx.procs
    pids: FxHashMap<Pid, ProcId>,
}

impl<S: Scheduler> Sim<S> {
    pub fn new(specs: &[ProcessSpec], strategy: SliceStrategy) -> Result<Self, SimError> {
        validate(specs)?;
        strategy.validate()?;

        let procs: Vec<ProcessRecord> = specs.iter().map(ProcessRecord::from).collect();
        let pids = procs
            .iter()
            .enumerate()
            .map(|(id, proc)| (proc.pid, id))
            .collect();

        let mut arrival_order: Vec<ProcId> = (0..procs.len()).collect();
        arrival_order.sort_by(|&a, &b| {
            procs[a]
                .arrival_time
                .cmp(&procs[b].arrival_time)
                .then_with(|| procs[a].pid.cmp(&procs[b].pid))
        });

        Ok(Self {
            core: SchedCore::new(procs, strategy),
            arrival_order,
            arrival_cursor: 0,
            pids,
        })
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.arrival_cursor = 0;
    }

    /// Advance one tick. Returns the process completed during it, if any.
    pub fn step(&mut self, telemetry: &mut impl Telemetry) -> Option<ProcId> {
        self.handle_arrivals();
        self.core.tick(telemetry)
    }

    /// Reset and simulate until every process completes.
    pub fn run(&mut self, telemetry: &mut impl Telemetry) -> SimReport {
        self.reset();
        info!(
            "simulating {} processes with {:?}",
            self.core.ctx.procs.len(),
            self.core.strategy()
        );

        while !self.all_completed() {
            self.step(telemetry);
        }

        let report = SimReport::new(&self.core.ctx.procs, self.core.now());
        info!(
            "finished at t={} (avg waiting {:.2}, jain {:.4})",
            report.total_time, report.avg_waiting_time, report.jain_index
        );
        report
    }

    fn handle_arrivals(&mut self) {
        let now = self.core.now();
        while let Some(&id) = self.arrival_order.get(self.arrival_cursor) {
            // Contiguous, since arrival_order is sorted
            if self.core.ctx.proc(id).arrival_time != now {
                break;
            }
            self.core.admit(id);
            self.arrival_cursor += 1;
        }
    }

    pub fn all_completed(&self) -> bool {
        self.core.ctx.all_completed()
    }

    pub fn now(&self) -> Ticks {
        self.core.now()
    }

    pub fn procs(&self) -> &[ProcessRecord] {
        &self.core.ctx.procs
    }

    pub fn record(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.pids.get(&pid).map(|&id| self.core.ctx.proc(id))
    }
}

fn validate(specs: &[ProcessSpec]) -> Result<(), SimError> {
    if specs.is_empty() {
        return Err(SimError::EmptyWorkload);
    }

    let mut seen = FxHashSet::default();
    for spec in specs {
        if spec.burst_time == 0 {
            return Err(SimError::ZeroBurst { pid: spec.pid });
        }
        if !seen.insert(spec.pid) {
            return Err(SimError::DuplicatePid { pid: spec.pid });
        }
    }
    Ok(())
}
