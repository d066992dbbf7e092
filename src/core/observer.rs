use super::state::{ProcState, SimCtx};

/// Head count of processes by lifecycle state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Census {
    pub pending: usize,
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
}

impl Census {
    pub fn take(ctx: &SimCtx, nr_queued: usize) -> Self {
        Self {
            pending: ctx.count(ProcState::Pending),
            queued: nr_queued,
            running: usize::from(ctx.running.is_some()),
            completed: ctx.count(ProcState::Completed),
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.queued + self.running + self.completed
    }
}

#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn observe(&mut self, ctx: &SimCtx, queued: &[usize]) {
        self.step += 1;

        let census = Census::take(ctx, queued.len());
        debug_assert_eq!(
            census.total(),
            ctx.procs.len(),
            "Process count not conserved at step {} (t={}): {census:?}",
            self.step,
            ctx.now
        );
        debug_assert_eq!(
            census.queued,
            ctx.count(ProcState::Ready),
            "Ready processes and queue length disagree at t={}",
            ctx.now
        );

        if let Some(id) = ctx.running {
            let proc = ctx.proc(id);
            debug_assert_eq!(
                proc.state,
                ProcState::Running,
                "running slot holds pid {} in state {:?}",
                proc.pid,
                proc.state
            );
            debug_assert!(
                !queued.contains(&id),
                "Running pid {} must not be queued",
                proc.pid
            );
        }

        for &id in queued {
            let proc = ctx.proc(id);
            debug_assert_eq!(
                proc.state,
                ProcState::Ready,
                "Queued pid {} is {:?}",
                proc.pid,
                proc.state
            );
        }

        for proc in &ctx.procs {
            debug_assert!(
                proc.remaining_time <= proc.burst_time,
                "pid {} remaining time exceeds burst",
                proc.pid
            );
            debug_assert_eq!(
                proc.completed(),
                proc.remaining_time == 0,
                "pid {} completion flag out of sync with remaining time",
                proc.pid
            );
        }
    }
}
