pub mod avl;
pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use config::SimConfig;
pub use crate::core::{Recorder, RunSegment, Telemetry, VruntimeSample};
pub use error::{ConfigError, SimError};
pub use scheduler::{CfsScheduler, Scheduler, SliceStrategy};
pub use sim::{ProcessSpec, Sim, SimReport};
