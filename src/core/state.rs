use std::cmp::Ordering;

use serde::Serialize;

use crate::scheduler::weight::{self, Priority};

// Index into the process Vec
pub type ProcId = usize;
pub type Pid = u32;
pub type Ticks = u64;

/// Ordering key of the ready index: virtual runtime, ties broken by pid.
///
/// `f64::total_cmp` keeps the order total so that equal runtimes never need
/// an epsilon comparison.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VruntimeKey {
    pub vruntime: f64,
    pub pid: Pid,
}

impl VruntimeKey {
    pub fn new(vruntime: f64, pid: Pid) -> Self {
        Self { vruntime, pid }
    }
}

impl PartialEq for VruntimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VruntimeKey {}

impl PartialOrd for VruntimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VruntimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.vruntime
            .total_cmp(&other.vruntime)
            .then_with(|| self.pid.cmp(&other.pid))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    /// Not yet arrived.
    Pending,
    /// Waiting in the ready index.
    Ready,
    Running,
    Completed,
}

#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub priority: Priority,

    pub weight: f64,
    pub vruntime: f64,
    pub remaining_time: Ticks,
    pub state: ProcState,
    pub slice_remaining: Ticks,

    pub start_time: Option<Ticks>,
    pub completion_time: Option<Ticks>,
}

impl ProcessRecord {
    pub fn new(pid: Pid, arrival_time: Ticks, burst_time: Ticks, priority: i32) -> Self {
        let priority = weight::clamp_priority(priority);
        let mut record = Self {
            pid,
            arrival_time,
            burst_time,
            priority,
            weight: 0.0,
            vruntime: 0.0,
            remaining_time: burst_time,
            state: ProcState::Pending,
            slice_remaining: 0,
            start_time: None,
            completion_time: None,
        };
        record.reset();
        record
    }

    /// Return the record to its pre-run state.
    pub fn reset(&mut self) {
        self.weight = weight::weight_for(self.priority.get());
        self.vruntime = 0.0;
        self.remaining_time = self.burst_time;
        self.state = ProcState::Pending;
        self.slice_remaining = 0;
        self.start_time = None;
        self.completion_time = None;
    }

    pub fn key(&self) -> VruntimeKey {
        VruntimeKey::new(self.vruntime, self.pid)
    }

    pub fn started(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn completed(&self) -> bool {
        self.state == ProcState::Completed
    }

    pub fn response_time(&self) -> Option<Ticks> {
        self.start_time.map(|start| start - self.arrival_time)
    }

    pub fn turnaround_time(&self) -> Option<Ticks> {
        self.completion_time.map(|end| end - self.arrival_time)
    }

    pub fn waiting_time(&self) -> Option<Ticks> {
        self.turnaround_time().map(|tat| tat - self.burst_time)
    }
}

#[derive(Debug)]
pub struct SimCtx {
    pub now: Ticks,
    pub procs: Vec<ProcessRecord>,
    pub running: Option<ProcId>,
}

impl SimCtx {
    pub fn new(procs: Vec<ProcessRecord>) -> Self {
        Self {
            now: 0,
            procs,
            running: None,
        }
    }

    pub fn reset(&mut self) {
        self.now = 0;
        self.running = None;
        for proc in &mut self.procs {
            proc.reset();
        }
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn proc(&self, id: ProcId) -> &ProcessRecord {
        &self.procs[id]
    }

    pub fn proc_mut(&mut self, id: ProcId) -> &mut ProcessRecord {
        &mut self.procs[id]
    }

    pub fn running_proc(&self) -> Option<&ProcessRecord> {
        self.running.map(|id| self.proc(id))
    }

    pub fn count(&self, state: ProcState) -> usize {
        self.procs.iter().filter(|p| p.state == state).count()
    }

    pub fn all_completed(&self) -> bool {
        self.procs.iter().all(ProcessRecord::completed)
    }

    pub fn mark_ready(&mut self, id: ProcId) {
        let proc = self.proc_mut(id);
        debug_assert!(
            proc.state != ProcState::Completed,
            "Completed process {} cannot become ready",
            proc.pid
        );
        proc.state = ProcState::Ready;
    }

    // Return true on the first dispatch of the process
    pub fn set_running(&mut self, id: ProcId, slice: Ticks) -> bool {
        debug_assert!(self.running.is_none(), "CPU already running a process");

        let now = self.now;
        self.running = Some(id);
        let proc = self.proc_mut(id);
        debug_assert_eq!(
            proc.state,
            ProcState::Ready,
            "Process {} must be ready before it runs",
            proc.pid
        );
        proc.state = ProcState::Running;
        proc.slice_remaining = slice;

        if proc.start_time.is_none() {
            proc.start_time = Some(now);
            return true;
        }
        false
    }

    pub fn clear_running(&mut self) -> Option<ProcId> {
        self.running.take()
    }

    pub fn mark_completed(&mut self, id: ProcId) {
        debug_assert_eq!(self.running, Some(id), "Only the running process completes");

        let now = self.now;
        let proc = self.proc_mut(id);
        debug_assert_eq!(proc.remaining_time, 0);
        proc.state = ProcState::Completed;
        proc.slice_remaining = 0;
        proc.completion_time = Some(now);
    }
}
