use slotmap::{SlotMap, new_key_type};
use std::fmt;

use crate::sim::ProcessSpec;

pub type Ticks = u64;
new_key_type! {
    pub struct ProcessId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessStatus {
    New,
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl ProcessStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Blocked => "BLOCKED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One simulated workload unit.
///
/// Static attributes are copied from the [`ProcessSpec`] it was created from
/// and never change. Runtime fields only move through the lifecycle methods,
/// each of which silently does nothing when called from a state it does not
/// accept.
#[derive(Debug, Clone)]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    pub priority: u32,
    pub simulated_arrival_time: Ticks,
    pub service_time: Ticks,

    status: ProcessStatus,
    remaining_time: Ticks,
    arrival_tick: Option<Ticks>,
    completion_tick: Option<Ticks>,
    turnaround_time: Option<Ticks>,
    waiting_time: Option<Ticks>,
}

impl Process {
    fn new(id: ProcessId, spec: &ProcessSpec) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            priority: spec.priority,
            simulated_arrival_time: spec.simulated_arrival_time,
            service_time: spec.service_time,
            status: ProcessStatus::New,
            remaining_time: spec.service_time,
            arrival_tick: None,
            completion_tick: None,
            turnaround_time: None,
            waiting_time: None,
        }
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    pub fn remaining_time(&self) -> Ticks {
        self.remaining_time
    }

    pub fn arrival_tick(&self) -> Option<Ticks> {
        self.arrival_tick
    }

    pub fn completion_tick(&self) -> Option<Ticks> {
        self.completion_tick
    }

    pub fn turnaround_time(&self) -> Option<Ticks> {
        self.turnaround_time
    }

    pub fn waiting_time(&self) -> Option<Ticks> {
        self.waiting_time
    }

    pub fn is_terminal(&self) -> bool {
        self.status == ProcessStatus::Terminated
    }

    /// Admission (`now = Some`) or return from RUNNING/BLOCKED.
    ///
    /// `arrival_tick` is only recorded the first time; a preempted process
    /// passes `None` and keeps its original admission tick.
    pub fn ready(&mut self, now: Option<Ticks>) {
        if !matches!(
            self.status,
            ProcessStatus::New | ProcessStatus::Blocked | ProcessStatus::Running
        ) {
            return;
        }
        if self.arrival_tick.is_none() {
            self.arrival_tick = now;
        }
        self.status = ProcessStatus::Ready;
    }

    pub fn block(&mut self) {
        if self.status != ProcessStatus::Running {
            return;
        }
        self.status = ProcessStatus::Blocked;
    }

    /// Runs one tick. Reaching zero remaining time does not terminate the
    /// process; the engine observes that and calls [`Process::stop`].
    pub fn run_one_cycle(&mut self) {
        if !matches!(self.status, ProcessStatus::Ready | ProcessStatus::Running) {
            return;
        }
        self.status = ProcessStatus::Running;
        self.remaining_time = self.remaining_time.saturating_sub(1);
    }

    /// The process holds the CPU through the end of tick `now`.
    pub fn stop(&mut self, now: Ticks) {
        if self.status != ProcessStatus::Running {
            return;
        }
        self.status = ProcessStatus::Terminated;

        let completion = now.saturating_add(1);
        self.completion_tick = Some(completion);

        // RUNNING implies admitted
        let arrival = self.arrival_tick.unwrap_or(self.simulated_arrival_time);
        let turnaround = completion.saturating_sub(arrival);
        self.turnaround_time = Some(turnaround);
        self.waiting_time = Some(turnaround.saturating_sub(self.service_time));
    }

    fn reset(&mut self) {
        self.status = ProcessStatus::New;
        self.remaining_time = self.service_time;
        self.arrival_tick = None;
        self.completion_tick = None;
        self.turnaround_time = None;
        self.waiting_time = None;
    }
}

/// The full process set of one simulation run.
///
/// Iteration follows insertion order, which is the workload order.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    processes: SlotMap<ProcessId, Process>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a ProcessSpec>) -> Self {
        let mut table = Self::new();
        for spec in specs {
            table.insert(spec);
        }
        table
    }

    pub fn insert(&mut self, spec: &ProcessSpec) -> ProcessId {
        self.processes.insert_with_key(|id| Process::new(id, spec))
    }

    /// Independent copy with every runtime field back at its NEW default.
    pub fn fresh_copy(&self) -> Self {
        let mut copy = self.clone();
        for process in copy.processes.values_mut() {
            process.reset();
        }
        copy
    }

    pub fn process(&self, id: ProcessId) -> &Process {
        &self.processes[id]
    }

    pub(crate) fn process_mut(&mut self, id: ProcessId) -> &mut Process {
        &mut self.processes[id]
    }

    pub fn find(&self, name: &str) -> Option<&Process> {
        self.processes.values().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.processes.keys()
    }

    pub fn ids_with_status(&self, status: ProcessStatus) -> Vec<ProcessId> {
        self.processes
            .iter()
            .filter(|(_, p)| p.status == status)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn all_terminated(&self) -> bool {
        self.processes.values().all(Process::is_terminal)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, arrival: Ticks, service: Ticks) -> ProcessSpec {
        ProcessSpec::new(name, 1, arrival, service)
    }

    fn single(service: Ticks) -> (ProcessTable, ProcessId) {
        let mut table = ProcessTable::new();
        let id = table.insert(&spec("A", 0, service));
        (table, id)
    }

    #[test]
    fn lifecycle_to_termination() {
        let (mut table, id) = single(2);
        let p = table.process_mut(id);

        p.ready(Some(3));
        assert_eq!(p.status(), ProcessStatus::Ready);
        assert_eq!(p.arrival_tick(), Some(3));

        p.run_one_cycle();
        p.run_one_cycle();
        assert_eq!(p.remaining_time(), 0);
        assert_eq!(p.status(), ProcessStatus::Running);

        p.stop(4);
        assert_eq!(p.status(), ProcessStatus::Terminated);
        assert_eq!(p.completion_tick(), Some(5));
        assert_eq!(p.turnaround_time(), Some(2));
        assert_eq!(p.waiting_time(), Some(0));
    }

    #[test]
    fn invalid_transitions_are_ignored() {
        let (mut table, id) = single(3);
        let p = table.process_mut(id);

        p.block();
        p.stop(7);
        p.run_one_cycle();
        assert_eq!(p.status(), ProcessStatus::New);
        assert_eq!(p.remaining_time(), 3);
        assert_eq!(p.completion_tick(), None);

        p.ready(Some(0));
        p.block();
        assert_eq!(p.status(), ProcessStatus::Ready);

        p.run_one_cycle();
        p.block();
        assert_eq!(p.status(), ProcessStatus::Blocked);
        p.run_one_cycle();
        assert_eq!(p.remaining_time(), 2);

        p.ready(Some(9));
        assert_eq!(p.arrival_tick(), Some(0));
    }

    #[test]
    fn preemption_keeps_arrival_tick() {
        let (mut table, id) = single(4);
        let p = table.process_mut(id);
        p.ready(Some(2));
        p.run_one_cycle();
        p.ready(None);
        assert_eq!(p.status(), ProcessStatus::Ready);
        assert_eq!(p.arrival_tick(), Some(2));
    }

    #[test]
    fn stop_is_write_once() {
        let (mut table, id) = single(1);
        let p = table.process_mut(id);
        p.ready(Some(0));
        p.run_one_cycle();
        p.stop(0);
        p.stop(10);
        p.ready(Some(10));
        assert_eq!(p.completion_tick(), Some(1));
        assert_eq!(p.status(), ProcessStatus::Terminated);
    }

    #[test]
    fn fresh_copy_resets_runtime_state() {
        let mut table = ProcessTable::from_specs(&[spec("A", 0, 2), spec("B", 1, 3)]);
        let a = table.find("A").map(|p| p.id).unwrap();
        table.process_mut(a).ready(Some(0));
        table.process_mut(a).run_one_cycle();

        let copy = table.fresh_copy();
        let copied = copy.process(a);
        assert_eq!(copied.status(), ProcessStatus::New);
        assert_eq!(copied.remaining_time(), 2);
        assert_eq!(copied.arrival_tick(), None);

        // original untouched by the copy
        assert_eq!(table.process(a).remaining_time(), 1);
        let names: Vec<_> = copy.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }
}
