use rustc_hash::FxHashMap;
use tracing::error;

use super::{
    event::SimEvent,
    state::{ProcessId, ProcessStatus, ProcessTable, Ticks},
};

#[derive(Debug, Clone, Copy, Default)]
struct Snapshot {
    remaining_time: Ticks,
    arrival_tick: Option<Ticks>,
    completion_tick: Option<Ticks>,
}

/// Per-run accounting plus invariant checks run after every engine step.
///
/// Violations are logged and kept rather than panicking so a test can
/// inspect them after the run.
#[derive(Debug, Default)]
pub struct Observer {
    steps: u64,
    running_ticks: FxHashMap<ProcessId, Ticks>,
    idle_ticks: Ticks,
    dispatches: u64,
    preemptions: u64,
    snapshots: FxHashMap<ProcessId, Snapshot>,
    violations: Vec<String>,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(
        &mut self,
        table: &ProcessTable,
        current: Option<ProcessId>,
        events: &[SimEvent],
        preemptive: bool,
    ) {
        self.steps += 1;

        for event in events {
            match *event {
                SimEvent::Ran { process, .. } => {
                    *self.running_ticks.entry(process).or_default() += 1;
                }
                SimEvent::Idle => self.idle_ticks += 1,
                SimEvent::FastForward { from, to } => self.idle_ticks += to - from,
                SimEvent::Dispatched { .. } => self.dispatches += 1,
                SimEvent::Preempted { process } => {
                    self.preemptions += 1;
                    if !preemptive {
                        self.violation(format!(
                            "non-preemptive run preempted {}",
                            table.process(process).name
                        ));
                    }
                }
                SimEvent::Admitted { .. } | SimEvent::Completed { .. } | SimEvent::Stalled { .. } => {}
            }
        }

        for process in table.iter() {
            if process.status() == ProcessStatus::Running && current != Some(process.id) {
                self.violation(format!("{} is RUNNING without holding the cpu", process.name));
            }

            let latest = Snapshot {
                remaining_time: process.remaining_time(),
                arrival_tick: process.arrival_tick(),
                completion_tick: process.completion_tick(),
            };
            if let Some(before) = self.snapshots.insert(process.id, latest) {
                if latest.remaining_time > before.remaining_time {
                    self.violation(format!("{} gained remaining time", process.name));
                }
                if before.arrival_tick.is_some() && before.arrival_tick != latest.arrival_tick {
                    self.violation(format!("{} arrival tick rewritten", process.name));
                }
                if before.completion_tick.is_some() && before.completion_tick != latest.completion_tick
                {
                    self.violation(format!("{} completion tick rewritten", process.name));
                }
            }

            if process.is_terminal() {
                let consistent = match (
                    process.arrival_tick(),
                    process.completion_tick(),
                    process.turnaround_time(),
                    process.waiting_time(),
                ) {
                    (Some(arrival), Some(completion), Some(turnaround), Some(waiting)) => {
                        completion >= arrival
                            && turnaround == completion - arrival
                            && turnaround >= process.service_time
                            && waiting == turnaround - process.service_time
                    }
                    _ => false,
                };
                if !consistent {
                    self.violation(format!("{} has inconsistent final times", process.name));
                }
            }
        }
    }

    fn violation(&mut self, message: String) {
        error!(step = self.steps, "{message}");
        self.violations.push(message);
    }

    pub fn running_ticks(&self, id: ProcessId) -> Ticks {
        self.running_ticks.get(&id).copied().unwrap_or(0)
    }

    pub fn total_running_ticks(&self) -> Ticks {
        self.running_ticks.values().sum()
    }

    pub fn idle_ticks(&self) -> Ticks {
        self.idle_ticks
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    pub fn preemptions(&self) -> u64 {
        self.preemptions
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}
