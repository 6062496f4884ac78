pub mod driver;
pub mod job;
pub mod report;

pub use driver::{ProcessResult, RunReport, Sim};
pub use job::{ProcessSpec, Workload};
pub use report::{Averages, PolicySummary};
