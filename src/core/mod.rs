pub mod driver;
pub mod event;
pub mod observer;
pub mod state;

pub use driver::SchedCore;
pub use event::{Recorder, RunSegment, Telemetry, VruntimeSample};
pub use observer::{Census, Observer};
pub use state::{Pid, ProcId, ProcState, ProcessRecord, SimCtx, Ticks, VruntimeKey};
