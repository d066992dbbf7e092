pub mod driver;
pub mod process;
pub mod report;
pub mod workload;

pub use driver::Sim;
pub use process::ProcessSpec;
pub use report::{ProcessMetrics, SimReport, jain_index};
pub use workload::BernoulliWorkload;
