use log::trace;

use super::{
    ENQ_PREEMPT, EnqueueFlags, ProcId, ReclaimDecision, Scheduler, SimCtx, SliceStrategy, Ticks,
    weight,
};
use crate::{avl::AvlTree, core::VruntimeKey};

/// Virtual-runtime fair scheduler.
///
/// Ready processes sit in an AVL tree keyed by `(vruntime, pid)`; the
/// leftmost one runs next. Each executed tick adds `BASE_WEIGHT / weight` to
/// the runner's vruntime, so heavy processes fall behind in virtual time and
/// get picked more often.
pub struct CfsScheduler {
    queue: AvlTree<VruntimeKey, ProcId>,
    strategy: SliceStrategy,
    // Sum of weights of every arrived, not yet completed process
    load: f64,
}

impl CfsScheduler {
    pub fn min_vruntime(&self) -> Option<f64> {
        self.queue.first().map(|(key, _)| key.vruntime)
    }

    pub fn load(&self) -> f64 {
        self.load
    }

    pub fn queue(&self) -> &AvlTree<VruntimeKey, ProcId> {
        &self.queue
    }
}

impl Scheduler for CfsScheduler {
    fn init(_ctx: &mut SimCtx, strategy: SliceStrategy) -> Self {
        Self {
            queue: AvlTree::new(),
            strategy,
            load: 0.0,
        }
    }

    // Newcomers start at the queue minimum (or the runner's vruntime when the
    // queue is empty) so they neither jump ahead nor starve.
    fn enable(&mut self, ctx: &mut SimCtx, proc: ProcId) {
        let seed = self
            .min_vruntime()
            .or_else(|| ctx.running_proc().map(|p| p.vruntime))
            .unwrap_or(0.0);

        let proc = ctx.proc_mut(proc);
        proc.vruntime = seed;
        self.load += proc.weight;
    }

    fn enqueue(&mut self, ctx: &mut SimCtx, proc: ProcId, flags: EnqueueFlags) {
        let key = ctx.proc(proc).key();
        trace!(
            "enqueue pid={} vruntime={:.4} preempted={}",
            key.pid,
            key.vruntime,
            flags & ENQ_PREEMPT != 0
        );
        debug_assert!(!self.queue.contains(&key), "pid {} enqueued twice", key.pid);
        self.queue.insert(key, proc);
    }

    fn dispatch(&mut self, _ctx: &mut SimCtx) -> Option<ProcId> {
        let (key, proc) = self.queue.first()?;
        self.queue.remove(&key);
        Some(proc)
    }

    fn slice(&self, ctx: &SimCtx, proc: ProcId) -> Ticks {
        match self.strategy {
            SliceStrategy::Uniform => 1,
            SliceStrategy::TargetLatency {
                sched_latency,
                min_granularity,
            } => {
                let share = weight::slice_share(sched_latency, ctx.proc(proc).weight, self.load);
                share.max(min_granularity)
            }
        }
    }

    fn tick(&mut self, ctx: &mut SimCtx, proc: ProcId) {
        let proc = ctx.proc_mut(proc);
        proc.vruntime += weight::vruntime_delta(proc.weight, 1);
    }

    fn check_reclaim(&self, ctx: &SimCtx, proc: ProcId) -> ReclaimDecision {
        let proc = ctx.proc(proc);
        if proc.slice_remaining > 0 {
            return ReclaimDecision::Keep;
        }

        match self.strategy {
            SliceStrategy::Uniform => ReclaimDecision::Preempt,
            SliceStrategy::TargetLatency {
                min_granularity, ..
            } => match self.min_vruntime() {
                Some(min) if min < proc.vruntime => ReclaimDecision::Preempt,
                // Renewing with the minimum granularity rather than a full
                // proportional slice approximates fairness under lopsided
                // weights.
                _ => ReclaimDecision::Renew(min_granularity),
            },
        }
    }

    fn disable(&mut self, ctx: &mut SimCtx, proc: ProcId) {
        self.load -= ctx.proc(proc).weight;
    }

    fn nr_queued(&self) -> usize {
        self.queue.len()
    }

    fn queued(&self) -> Vec<ProcId> {
        self.queue.iter().map(|(_, proc)| proc).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{ProcState, ProcessRecord},
        scheduler::{ENQ_WAKEUP, MIN_GRANULARITY},
    };

    fn ctx_with(priorities: &[i32]) -> SimCtx {
        let procs = priorities
            .iter()
            .enumerate()
            .map(|(i, &prio)| ProcessRecord::new(i as u32 + 1, 0, 10, prio))
            .collect();
        SimCtx::new(procs)
    }

    fn arrive(sched: &mut CfsScheduler, ctx: &mut SimCtx, proc: ProcId) {
        sched.enable(ctx, proc);
        ctx.mark_ready(proc);
        sched.enqueue(ctx, proc, ENQ_WAKEUP);
    }

    #[test]
    fn arrival_seeds_from_queue_minimum() {
        let mut ctx = ctx_with(&[4, 4, 4]);
        let mut sched = CfsScheduler::init(&mut ctx, SliceStrategy::Uniform);

        ctx.proc_mut(0).vruntime = 0.0;
        arrive(&mut sched, &mut ctx, 0);
        let first = sched.dispatch(&mut ctx).unwrap();
        ctx.set_running(first, 1);
        ctx.proc_mut(first).vruntime = 7.5;

        // Queue is empty, so the newcomer inherits the runner's vruntime
        arrive(&mut sched, &mut ctx, 1);
        assert_eq!(ctx.proc(1).vruntime, 7.5);

        // Queue is non-empty, so the minimum wins
        ctx.proc_mut(2).vruntime = 100.0;
        arrive(&mut sched, &mut ctx, 2);
        assert_eq!(ctx.proc(2).vruntime, 7.5);
        assert_eq!(sched.nr_queued(), 2);
        assert_eq!(ctx.proc(2).state, ProcState::Ready);
    }

    #[test]
    fn dispatch_takes_lowest_key() {
        let mut ctx = ctx_with(&[4, 4, 4]);
        let mut sched = CfsScheduler::init(&mut ctx, SliceStrategy::Uniform);
        for proc in 0..3 {
            arrive(&mut sched, &mut ctx, proc);
        }
        assert_eq!(sched.dispatch(&mut ctx), Some(0));
        assert_eq!(sched.dispatch(&mut ctx), Some(1));
        assert_eq!(sched.dispatch(&mut ctx), Some(2));
        assert_eq!(sched.dispatch(&mut ctx), None);
    }

    #[test]
    fn target_latency_slice_is_proportional() {
        let mut ctx = ctx_with(&[4, 4, 0, 9]);
        let mut sched = CfsScheduler::init(&mut ctx, SliceStrategy::default());
        arrive(&mut sched, &mut ctx, 0);
        arrive(&mut sched, &mut ctx, 1);
        assert_eq!(sched.load(), 2048.0);
        assert_eq!(sched.slice(&ctx, 0), 3);

        sched.disable(&mut ctx, 1);
        arrive(&mut sched, &mut ctx, 2);
        arrive(&mut sched, &mut ctx, 3);
        // The lightest process still gets the minimum granularity
        assert_eq!(sched.slice(&ctx, 3), MIN_GRANULARITY);
        assert!(sched.slice(&ctx, 2) >= 5);
    }

    #[test]
    fn target_latency_renews_when_nobody_is_behind() {
        let mut ctx = ctx_with(&[4, 4]);
        let mut sched = CfsScheduler::init(&mut ctx, SliceStrategy::default());
        arrive(&mut sched, &mut ctx, 0);
        let running = sched.dispatch(&mut ctx).unwrap();
        ctx.set_running(running, 0);
        ctx.proc_mut(running).vruntime = 3.0;

        assert_eq!(
            sched.check_reclaim(&ctx, running),
            ReclaimDecision::Renew(MIN_GRANULARITY)
        );

        arrive(&mut sched, &mut ctx, 1);
        ctx.proc_mut(1).vruntime = 3.0;
        // Equal vruntime is not strictly behind
        assert_eq!(
            sched.check_reclaim(&ctx, running),
            ReclaimDecision::Renew(MIN_GRANULARITY)
        );

        ctx.proc_mut(running).vruntime = 3.5;
        assert_eq!(sched.check_reclaim(&ctx, running), ReclaimDecision::Preempt);

        ctx.proc_mut(running).slice_remaining = 2;
        assert_eq!(sched.check_reclaim(&ctx, running), ReclaimDecision::Keep);
    }

    #[test]
    fn uniform_always_preempts_on_expiry() {
        let mut ctx = ctx_with(&[4]);
        let mut sched = CfsScheduler::init(&mut ctx, SliceStrategy::Uniform);
        arrive(&mut sched, &mut ctx, 0);
        let running = sched.dispatch(&mut ctx).unwrap();
        ctx.set_running(running, sched.slice(&ctx, running));
        assert_eq!(sched.check_reclaim(&ctx, running), ReclaimDecision::Keep);
        ctx.proc_mut(running).slice_remaining = 0;
        assert_eq!(sched.check_reclaim(&ctx, running), ReclaimDecision::Preempt);
    }

    #[test]
    fn tick_charges_inverse_weight() {
        let mut ctx = ctx_with(&[4, 9]);
        let mut sched = CfsScheduler::init(&mut ctx, SliceStrategy::Uniform);
        sched.tick(&mut ctx, 0);
        sched.tick(&mut ctx, 1);
        assert_eq!(ctx.proc(0).vruntime, 1.0);
        assert_eq!(ctx.proc(1).vruntime, 512.0);
    }
}
