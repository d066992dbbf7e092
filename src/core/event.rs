use serde::Serialize;

use crate::core::{Pid, Ticks};

/// One uninterrupted span on the CPU, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSegment {
    pub pid: Pid,
    pub start: Ticks,
    pub end: Ticks,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VruntimeSample {
    #[serde(rename = "time")]
    pub tick: Ticks,
    pub pid: Pid,
    pub vruntime: f64,
}

/// Receives the timeline of a run as it happens.
pub trait Telemetry {
    fn on_segment(&mut self, segment: RunSegment);

    fn on_vruntime_sample(&mut self, sample: VruntimeSample);
}

/// Discards everything.
impl Telemetry for () {
    fn on_segment(&mut self, _segment: RunSegment) {}

    fn on_vruntime_sample(&mut self, _sample: VruntimeSample) {}
}

/// Append-only in-memory sink.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Recorder {
    pub segments: Vec<RunSegment>,
    pub vruntime: Vec<VruntimeSample>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments_of(&self, pid: Pid) -> impl Iterator<Item = &RunSegment> {
        self.segments.iter().filter(move |s| s.pid == pid)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Telemetry for Recorder {
    fn on_segment(&mut self, segment: RunSegment) {
        debug_assert!(segment.end > segment.start, "Empty segment {segment:?}");
        debug_assert!(
            self.segments.last().is_none_or(|last| last.end <= segment.start),
            "Segment {segment:?} overlaps its predecessor"
        );
        self.segments.push(segment);
    }

    fn on_vruntime_sample(&mut self, sample: VruntimeSample) {
        self.vruntime.push(sample);
    }
}
