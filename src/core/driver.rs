use log::{debug, trace};

use super::{
    event::{RunSegment, Telemetry, VruntimeSample},
    observer::Observer,
    state::{ProcId, ProcessRecord, SimCtx, Ticks},
};
use crate::scheduler::{ENQ_PREEMPT, ENQ_WAKEUP, ReclaimDecision, Scheduler, SliceStrategy};

pub struct SchedCore<S: Scheduler> {
    pub ctx: SimCtx,
    pub scheduler: S,
    strategy: SliceStrategy,
    observer: Observer,
    // Segment of the running process, closed on every scheduling decision
    segment: Option<RunSegment>,
}

impl<S: Scheduler> SchedCore<S> {
    pub fn new(procs: Vec<ProcessRecord>, strategy: SliceStrategy) -> Self {
        let mut ctx = SimCtx::new(procs);
        let scheduler = S::init(&mut ctx, strategy);
        Self {
            ctx,
            scheduler,
            strategy,
            observer: Observer::new(),
            segment: None,
        }
    }

    /// Put every process back in its pre-run state and start a fresh
    /// scheduler.
    pub fn reset(&mut self) {
        self.ctx.reset();
        self.scheduler = S::init(&mut self.ctx, self.strategy);
        self.observer = Observer::new();
        self.segment = None;
    }

    pub fn admit(&mut self, proc: ProcId) {
        self.scheduler.enable(&mut self.ctx, proc);
        self.ctx.mark_ready(proc);
        self.scheduler.enqueue(&mut self.ctx, proc, ENQ_WAKEUP);

        let record = self.ctx.proc(proc);
        debug!(
            "t={} admit pid={} weight={} vruntime={:.4}",
            self.ctx.now, record.pid, record.weight, record.vruntime
        );
    }

    /// Run one tick: reclaim, select, execute, finalize. Returns the process
    /// that completed during the tick, if any.
    pub fn tick(&mut self, telemetry: &mut impl Telemetry) -> Option<ProcId> {
        self.reclaim_running(telemetry);

        if self.ctx.running.is_none() {
            self.try_schedule_cpu();
        }

        let Some(current) = self.ctx.running else {
            trace!("t={} idle", self.ctx.now);
            self.ctx.advance_time(1);
            self.observe();
            return None;
        };

        let now = self.ctx.now;
        {
            let proc = self.ctx.proc_mut(current);
            proc.remaining_time -= 1;
            proc.slice_remaining = proc.slice_remaining.saturating_sub(1);
        }
        self.scheduler.tick(&mut self.ctx, current);

        let proc = self.ctx.proc(current);
        let (pid, completed) = (proc.pid, proc.remaining_time == 0);
        telemetry.on_vruntime_sample(VruntimeSample {
            tick: now,
            pid,
            vruntime: proc.vruntime,
        });
        self.ctx.advance_time(1);

        if completed {
            self.ctx.mark_completed(current);
            self.close_segment(telemetry);
            self.scheduler.disable(&mut self.ctx, current);
            self.ctx.clear_running();
            debug!("t={} pid={pid} completed", self.ctx.now);
        }

        self.observe();
        completed.then_some(current)
    }

    fn reclaim_running(&mut self, telemetry: &mut impl Telemetry) {
        let Some(current) = self.ctx.running else {
            return;
        };

        match self.scheduler.check_reclaim(&self.ctx, current) {
            ReclaimDecision::Keep => {}
            ReclaimDecision::Renew(slice) => {
                self.close_segment(telemetry);
                self.ctx.proc_mut(current).slice_remaining = slice;
                self.open_segment(current);
                trace!("t={} renew pid={} slice={slice}", self.ctx.now, self.ctx.proc(current).pid);
            }
            ReclaimDecision::Preempt => {
                self.close_segment(telemetry);
                self.ctx.clear_running();
                self.ctx.mark_ready(current);
                self.scheduler.enqueue(&mut self.ctx, current, ENQ_PREEMPT);
            }
        }
    }

    fn try_schedule_cpu(&mut self) {
        let Some(next) = self.scheduler.dispatch(&mut self.ctx) else {
            return;
        };

        let slice = self.scheduler.slice(&self.ctx, next);
        let first_run = self.ctx.set_running(next, slice);
        self.open_segment(next);

        let proc = self.ctx.proc(next);
        if first_run {
            debug!(
                "t={} first dispatch pid={} response={}",
                self.ctx.now,
                proc.pid,
                self.ctx.now - proc.arrival_time
            );
        }
        trace!(
            "t={} dispatch pid={} vruntime={:.4} slice={slice}",
            self.ctx.now, proc.pid, proc.vruntime
        );
    }

    fn open_segment(&mut self, proc: ProcId) {
        debug_assert!(self.segment.is_none(), "Previous segment still open");
        let now = self.ctx.now;
        self.segment = Some(RunSegment {
            pid: self.ctx.proc(proc).pid,
            start: now,
            end: now,
        });
    }

    fn close_segment(&mut self, telemetry: &mut impl Telemetry) {
        if let Some(mut segment) = self.segment.take() {
            segment.end = self.ctx.now;
            if segment.end > segment.start {
                telemetry.on_segment(segment);
            }
        }
    }

    fn observe(&mut self) {
        if cfg!(debug_assertions) {
            let queued = self.scheduler.queued();
            self.observer.observe(&self.ctx, &queued);
        }
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    pub fn strategy(&self) -> SliceStrategy {
        self.strategy
    }
}
