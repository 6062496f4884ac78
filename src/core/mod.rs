pub mod driver;
pub mod event;
pub mod observer;
pub mod state;

pub use driver::{RunOutcome, SimulationEngine};
pub use event::SimEvent;
pub use observer::Observer;
pub use state::{Process, ProcessId, ProcessStatus, ProcessTable, Ticks};
