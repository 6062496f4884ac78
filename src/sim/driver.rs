use average::{Estimate, Mean};
use tracing::{info, info_span, warn};

use super::job::Workload;
use crate::{
    core::{ProcessStatus, ProcessTable, RunOutcome, SimulationEngine, Ticks},
    error::SimError,
    scheduler::{Policy, PolicyParams, PolicyRegistry},
};

/// Final state of one process after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub name: String,
    pub priority: u32,
    pub status: ProcessStatus,
    pub simulated_arrival_time: Ticks,
    pub arrival_tick: Option<Ticks>,
    pub service_time: Ticks,
    pub turnaround_time: Option<Ticks>,
    pub waiting_time: Option<Ticks>,
    pub completion_tick: Option<Ticks>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub policy: String,
    /// In workload order.
    pub processes: Vec<ProcessResult>,
    pub finished_at: Ticks,
    pub running_ticks: Ticks,
    pub idle_ticks: Ticks,
    pub dispatches: u64,
    pub preemptions: u64,
    pub violations: Vec<String>,
}

impl RunReport {
    fn average(&self, field: impl Fn(&ProcessResult) -> Option<Ticks>) -> f64 {
        self.processes
            .iter()
            .filter_map(field)
            .map(|t| t as f64)
            .collect::<Mean>()
            .estimate()
    }

    pub fn average_turnaround(&self) -> f64 {
        self.average(|p| p.turnaround_time)
    }

    pub fn average_waiting(&self) -> f64 {
        self.average(|p| p.waiting_time)
    }
}

/// Runs policies from a registry over one workload, each on its own copy of
/// the process set and with a freshly built policy.
pub struct Sim {
    processes: ProcessTable,
    registry: PolicyRegistry,
    params: PolicyParams,
    max_ticks: Ticks,
}

impl Sim {
    pub fn new(
        workload: &Workload,
        registry: PolicyRegistry,
        params: PolicyParams,
        max_ticks: Ticks,
    ) -> Self {
        Self {
            processes: workload.instantiate(),
            registry,
            params,
            max_ticks,
        }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Fails with [`SimError::DidNotTerminate`] when the tick bound is hit
    /// before every process terminates.
    pub fn run_policy(&self, name: &str) -> Result<RunReport, SimError> {
        let _span = info_span!("run", policy = name).entered();
        let policy = self.registry.build(name, &self.params)?;
        let mut engine = SimulationEngine::new(&self.processes, policy);

        match engine.run(self.max_ticks) {
            RunOutcome::Completed { now } => {
                let report = Self::report(name, &engine, now);
                info!(
                    finished_at = now,
                    avg_turnaround = report.average_turnaround(),
                    avg_waiting = report.average_waiting(),
                    preemptions = report.preemptions,
                    "run complete"
                );
                Ok(report)
            }
            RunOutcome::TickLimitReached { now, unfinished } => {
                warn!(now, unfinished = ?unfinished, "tick limit reached");
                Err(SimError::DidNotTerminate {
                    policy: name.to_owned(),
                    limit: self.max_ticks,
                    unfinished,
                })
            }
        }
    }

    /// Every registered policy, in registry order.
    pub fn run_all(&self) -> Vec<(&'static str, Result<RunReport, SimError>)> {
        self.registry
            .keys()
            .map(|name| (name, self.run_policy(name)))
            .collect()
    }

    fn report<P: Policy>(
        name: &str,
        engine: &SimulationEngine<P>,
        finished_at: Ticks,
    ) -> RunReport {
        let processes = engine
            .processes()
            .iter()
            .map(|p| ProcessResult {
                name: p.name.clone(),
                priority: p.priority,
                status: p.status(),
                simulated_arrival_time: p.simulated_arrival_time,
                arrival_tick: p.arrival_tick(),
                service_time: p.service_time,
                turnaround_time: p.turnaround_time(),
                waiting_time: p.waiting_time(),
                completion_tick: p.completion_tick(),
            })
            .collect();

        let observer = engine.observer();
        RunReport {
            policy: name.to_owned(),
            processes,
            finished_at,
            running_ticks: observer.total_running_ticks(),
            idle_ticks: observer.idle_ticks(),
            dispatches: observer.dispatches(),
            preemptions: observer.preemptions(),
            violations: observer.violations().to_vec(),
        }
    }
}
