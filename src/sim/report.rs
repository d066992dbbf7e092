use std::fmt;

use average::{Estimate, Mean};
use serde::Serialize;

use crate::core::{Pid, ProcessRecord, Ticks};

/// Final metrics of one completed process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessMetrics {
    pub pid: Pid,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub priority: i32,
    pub weight: f64,
    pub vruntime: f64,
    pub start_time: Ticks,
    pub completion_time: Ticks,
    pub response_time: Ticks,
    pub turnaround_time: Ticks,
    pub waiting_time: Ticks,
}

impl ProcessMetrics {
    /// `None` unless the process ran to completion.
    pub fn of(proc: &ProcessRecord) -> Option<Self> {
        Some(Self {
            pid: proc.pid,
            arrival_time: proc.arrival_time,
            burst_time: proc.burst_time,
            priority: proc.priority.get(),
            weight: proc.weight,
            vruntime: proc.vruntime,
            start_time: proc.start_time?,
            completion_time: proc.completion_time?,
            response_time: proc.response_time()?,
            turnaround_time: proc.turnaround_time()?,
            waiting_time: proc.waiting_time()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimReport {
    pub processes: Vec<ProcessMetrics>,
    /// Clock value when the last process completed.
    pub total_time: Ticks,
    pub total_burst: Ticks,
    /// Latest completion minus earliest arrival, at least 1.
    pub makespan: Ticks,
    pub idle_ticks: Ticks,
    pub avg_waiting_time: f64,
    pub avg_turnaround_time: f64,
    pub avg_response_time: f64,
    /// Percentage of the makespan spent executing.
    pub cpu_utilization: f64,
    /// Processes completed per tick of makespan.
    pub throughput: f64,
    pub jain_index: f64,
}

impl SimReport {
    pub fn new(procs: &[ProcessRecord], total_time: Ticks) -> Self {
        let processes: Vec<ProcessMetrics> = procs.iter().filter_map(ProcessMetrics::of).collect();
        debug_assert_eq!(processes.len(), procs.len(), "Report built before completion");

        let total_burst: Ticks = procs.iter().map(|p| p.burst_time).sum();
        let first_arrival = processes.iter().map(|p| p.arrival_time).min().unwrap_or(0);
        let last_completion = processes.iter().map(|p| p.completion_time).max().unwrap_or(0);
        let makespan = last_completion.saturating_sub(first_arrival).max(1);

        Self {
            total_time,
            total_burst,
            makespan,
            idle_ticks: total_time.saturating_sub(total_burst),
            avg_waiting_time: avg(processes.iter().map(|p| p.waiting_time as f64)),
            avg_turnaround_time: avg(processes.iter().map(|p| p.turnaround_time as f64)),
            avg_response_time: avg(processes.iter().map(|p| p.response_time as f64)),
            cpu_utilization: total_burst as f64 / makespan as f64 * 100.0,
            throughput: processes.len() as f64 / makespan as f64,
            jain_index: jain_index(
                processes
                    .iter()
                    .map(|p| p.burst_time as f64 / p.turnaround_time as f64),
            ),
            processes,
        }
    }
}

/// Jain's fairness index `(Σx)² / (n·Σx²)`, in `(0, 1]` for any non-zero
/// allocation. Empty or all-zero input yields 0.
pub fn jain_index(allocations: impl IntoIterator<Item = f64>) -> f64 {
    let (n, sum, sum_sq) = allocations
        .into_iter()
        .fold((0usize, 0.0, 0.0), |(n, sum, sum_sq), x| {
            (n + 1, sum + x, sum_sq + x * x)
        });
    if n == 0 || sum_sq == 0.0 {
        return 0.0;
    }
    (sum * sum) / (n as f64 * sum_sq)
}

fn avg(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<Mean>().estimate()
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PID\tAT\tBT\tPRIO\tWT\tTAT\tRT")?;
        for p in &self.processes {
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                p.pid,
                p.arrival_time,
                p.burst_time,
                p.priority,
                p.waiting_time,
                p.turnaround_time,
                p.response_time
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Average Waiting Time       = {:.2}", self.avg_waiting_time)?;
        writeln!(f, "Average Turnaround Time    = {:.2}", self.avg_turnaround_time)?;
        writeln!(f, "Average Response Time      = {:.2}", self.avg_response_time)?;
        writeln!(f, "CPU Utilization            = {:.2}%", self.cpu_utilization)?;
        writeln!(
            f,
            "Throughput                 = {:.2} processes/unit time",
            self.throughput
        )?;
        write!(f, "Jain Fairness Index        = {:.4}", self.jain_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(pid: Pid, arrival: Ticks, burst: Ticks, start: Ticks, end: Ticks) -> ProcessRecord {
        let mut p = ProcessRecord::new(pid, arrival, burst, 4);
        p.remaining_time = 0;
        p.state = crate::core::ProcState::Completed;
        p.start_time = Some(start);
        p.completion_time = Some(end);
        p
    }

    #[test]
    fn jain_index_bounds() {
        assert_eq!(jain_index(Vec::new()), 0.0);
        assert_eq!(jain_index([0.0, 0.0]), 0.0);
        assert!((jain_index([0.5, 0.5, 0.5]) - 1.0).abs() < 1e-12);
        // One process gets everything
        assert!((jain_index([1.0, 0.0, 0.0, 0.0]) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn aggregates() {
        let procs = [finished(1, 0, 4, 0, 7), finished(2, 0, 4, 1, 8)];
        let report = SimReport::new(&procs, 8);

        assert_eq!(report.total_burst, 8);
        assert_eq!(report.makespan, 8);
        assert_eq!(report.idle_ticks, 0);
        assert_eq!(report.avg_waiting_time, 3.5);
        assert_eq!(report.avg_turnaround_time, 7.5);
        assert_eq!(report.avg_response_time, 0.5);
        assert_eq!(report.cpu_utilization, 100.0);
        assert_eq!(report.throughput, 0.25);
        assert!(report.jain_index > 0.99 && report.jain_index <= 1.0);
    }

    #[test]
    fn table_lists_every_process() {
        let procs = [finished(5, 1, 2, 1, 3)];
        let text = SimReport::new(&procs, 3).to_string();
        assert!(text.starts_with("PID\tAT\tBT\tPRIO\tWT\tTAT\tRT\n5\t1\t2\t4\t0\t2\t0\n"));
        assert!(text.contains("Jain Fairness Index        = 1.0000"));
    }
}
