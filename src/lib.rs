pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod sim;

pub use config::SimConfig;
pub use crate::core::{SimEvent, SimulationEngine};
pub use error::SimError;
pub use scheduler::{Policy, PolicyParams, PolicyRegistry};
pub use sim::{ProcessSpec, RunReport, Sim, Workload};
