use keyed_priority_queue::KeyedPriorityQueue;
use std::cmp::Ordering;
use tracing::{debug, trace, warn};

use super::{
    event::SimEvent,
    observer::Observer,
    state::{ProcessId, ProcessStatus, ProcessTable, Ticks},
};
use crate::scheduler::Policy;

// KeyedPriorityQueue is a max-heap, so flip the ordering to pop the earliest
// arrival first
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
struct Arrival(Ticks);

impl PartialOrd for Arrival {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Arrival {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { now: Ticks },
    TickLimitReached { now: Ticks, unfinished: Vec<String> },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Single-CPU, tick-by-tick driver.
///
/// The engine is the only writer of process state. Each step admits due
/// arrivals, asks the policy for a process when the CPU is free, runs it for
/// one tick and cuts it off when a preemptive slice runs out.
pub struct SimulationEngine<P: Policy> {
    table: ProcessTable,
    policy: P,
    now: Ticks,
    current: Option<ProcessId>,
    slice_remaining: Option<Ticks>,
    // NEW processes still waiting for their simulated arrival
    pending: KeyedPriorityQueue<ProcessId, Arrival>,
    observer: Observer,
}

impl<P: Policy> SimulationEngine<P> {
    /// Runs `policy` over a fresh copy of `processes`; the caller's table is
    /// never touched.
    pub fn new(processes: &ProcessTable, policy: P) -> Self {
        let table = processes.fresh_copy();
        let mut pending = KeyedPriorityQueue::new();
        for process in table.iter() {
            pending.push(process.id, Arrival(process.simulated_arrival_time));
        }

        Self {
            table,
            policy,
            now: 0,
            current: None,
            slice_remaining: None,
            pending,
            observer: Observer::new(),
        }
    }

    pub fn step(&mut self) -> Vec<SimEvent> {
        let mut events = Vec::new();
        self.advance(&mut events);
        self.observer.observe(
            &self.table,
            self.current,
            &events,
            self.policy.preemptive(),
        );
        events
    }

    fn advance(&mut self, events: &mut Vec<SimEvent>) {
        self.admit_arrivals(events);

        let ready = self.table.ids_with_status(ProcessStatus::Ready);
        let cpu_free = self.current.is_none_or(|id| {
            matches!(
                self.table.process(id).status(),
                ProcessStatus::Terminated | ProcessStatus::Blocked
            )
        });

        if ready.is_empty() && cpu_free {
            let from = self.now;
            let to = match self.pending.peek() {
                Some((_, &Arrival(next))) => next.max(from.saturating_add(1)),
                None => from.saturating_add(1),
            };
            debug!(from, to, "cpu idle, fast-forwarding");
            self.now = to;
            events.push(SimEvent::FastForward { from, to });
            return;
        }

        if cpu_free {
            self.dispatch(&ready, events);
        }

        let Some(id) = self.current else {
            events.push(SimEvent::Idle);
            self.advance_time();
            return;
        };

        self.execute(id, events);

        if self.policy.preemptive() {
            let left = self.slice_remaining.unwrap_or(0).saturating_sub(1);
            self.slice_remaining = Some(left);

            let status = self.table.process(id).status();
            if left == 0 && !matches!(status, ProcessStatus::Terminated | ProcessStatus::Blocked)
            {
                self.table.process_mut(id).ready(None);
                self.current = None;
                self.slice_remaining = None;
                trace!(now = self.now, process = %self.table.process(id).name, "slice expired");
                events.push(SimEvent::Preempted { process: id });
            }
        }

        self.advance_time();
    }

    // the clock pins at Ticks::MAX instead of wrapping
    fn advance_time(&mut self) {
        self.now = self.now.saturating_add(1);
    }

    fn admit_arrivals(&mut self, events: &mut Vec<SimEvent>) {
        while let Some((_, &Arrival(at))) = self.pending.peek() {
            if at > self.now {
                break;
            }
            let Some((id, _)) = self.pending.pop() else {
                break;
            };
            let process = self.table.process_mut(id);
            if process.status() != ProcessStatus::New {
                continue;
            }
            process.ready(Some(self.now));
            trace!(now = self.now, process = %process.name, "admitted");
            events.push(SimEvent::Admitted { process: id });
        }
    }

    fn dispatch(&mut self, ready: &[ProcessId], events: &mut Vec<SimEvent>) {
        let chosen = self
            .policy
            .pick_next(&self.table, ready, self.now, self.current);

        self.current = chosen;
        self.slice_remaining = match chosen {
            Some(id) if self.policy.preemptive() => Some(
                self.policy
                    .preempt_interval(&self.table, self.now, Some(id))
                    .max(1),
            ),
            _ => None,
        };

        match chosen {
            Some(id) => {
                trace!(
                    now = self.now,
                    process = %self.table.process(id).name,
                    slice = ?self.slice_remaining,
                    "dispatched"
                );
                events.push(SimEvent::Dispatched {
                    process: id,
                    slice: self.slice_remaining,
                });
            }
            None if !ready.is_empty() => {
                warn!(
                    now = self.now,
                    policy = self.policy.name(),
                    ready = ready.len(),
                    "policy picked nothing from a non-empty ready set"
                );
                events.push(SimEvent::Stalled { ready: ready.len() });
            }
            None => {}
        }
    }

    fn execute(&mut self, id: ProcessId, events: &mut Vec<SimEvent>) {
        let now = self.now;
        let process = self.table.process_mut(id);
        process.run_one_cycle();
        events.push(SimEvent::Ran {
            process: id,
            remaining: process.remaining_time(),
        });

        if process.remaining_time() == 0 && process.status() == ProcessStatus::Running {
            process.stop(now);
            let completion_tick = process.completion_tick().unwrap_or(now.saturating_add(1));
            trace!(now, process = %process.name, completion_tick, "completed");
            events.push(SimEvent::Completed {
                process: id,
                completion_tick,
            });
        }
    }

    /// Steps until every process terminates or the clock reaches
    /// `max_ticks`.
    pub fn run(&mut self, max_ticks: Ticks) -> RunOutcome {
        self.run_with(max_ticks, |_, _| {})
    }

    /// [`SimulationEngine::run`], handing every event to `on_event` together
    /// with the tick at which its step began.
    pub fn run_with(
        &mut self,
        max_ticks: Ticks,
        mut on_event: impl FnMut(Ticks, &SimEvent),
    ) -> RunOutcome {
        while !self.table.all_terminated() {
            if self.now >= max_ticks {
                let unfinished = self
                    .table
                    .iter()
                    .filter(|p| !p.is_terminal())
                    .map(|p| p.name.clone())
                    .collect();
                return RunOutcome::TickLimitReached {
                    now: self.now,
                    unfinished,
                };
            }

            let now = self.now;
            for event in self.step() {
                on_event(now, &event);
            }
        }
        RunOutcome::Completed { now: self.now }
    }

    pub fn now(&self) -> Ticks {
        self.now
    }

    pub fn current(&self) -> Option<ProcessId> {
        self.current
    }

    pub fn slice_remaining(&self) -> Option<Ticks> {
        self.slice_remaining
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.table
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{FirstComeFirstServed, RoundRobin};
    use crate::sim::ProcessSpec;

    struct Refuses;

    impl Policy for Refuses {
        fn name(&self) -> &'static str {
            "refuses"
        }

        fn pick_next(
            &mut self,
            _table: &ProcessTable,
            _ready: &[ProcessId],
            _now: Ticks,
            _current: Option<ProcessId>,
        ) -> Option<ProcessId> {
            None
        }
    }

    fn table(specs: &[ProcessSpec]) -> ProcessTable {
        ProcessTable::from_specs(specs)
    }

    #[test]
    fn idle_cpu_jumps_to_next_arrival() {
        let processes = table(&[
            ProcessSpec::new("A", 1, 5, 2),
            ProcessSpec::new("B", 1, 5, 1),
        ]);
        let mut engine = SimulationEngine::new(&processes, FirstComeFirstServed);

        let events = engine.step();
        assert_eq!(events, [SimEvent::FastForward { from: 0, to: 5 }]);
        assert_eq!(engine.now(), 5);

        let events = engine.step();
        assert!(matches!(events[0], SimEvent::Admitted { .. }));
        assert!(events.iter().any(|e| matches!(e, SimEvent::Dispatched { .. })));
        assert_eq!(engine.now(), 6);
    }

    #[test]
    fn completion_is_recorded_in_the_same_tick() {
        let processes = table(&[ProcessSpec::new("A", 1, 0, 1)]);
        let mut engine = SimulationEngine::new(&processes, FirstComeFirstServed);
        let events = engine.step();
        let a = engine.processes().ids().next().unwrap();

        assert_eq!(
            events.last(),
            Some(&SimEvent::Completed {
                process: a,
                completion_tick: 1
            })
        );
        assert!(engine.processes().all_terminated());
    }

    #[test]
    fn preemptive_slice_is_set_on_dispatch() {
        let processes = table(&[ProcessSpec::new("A", 1, 0, 10)]);
        let mut engine = SimulationEngine::new(&processes, RoundRobin::new(4));
        engine.step();
        assert_eq!(engine.slice_remaining(), Some(3));
        engine.step();
        engine.step();
        let events = engine.step();
        assert!(matches!(events.last(), Some(SimEvent::Preempted { .. })));
        assert_eq!(engine.current(), None);
        assert_eq!(engine.slice_remaining(), None);
    }

    #[test]
    fn stalled_policy_advances_time() {
        let processes = table(&[ProcessSpec::new("A", 1, 0, 3)]);
        let mut engine = SimulationEngine::new(&processes, Refuses);

        let events = engine.step();
        assert!(events.contains(&SimEvent::Stalled { ready: 1 }));
        assert!(events.contains(&SimEvent::Idle));
        assert_eq!(engine.now(), 1);

        let outcome = engine.run(20);
        assert_eq!(
            outcome,
            RunOutcome::TickLimitReached {
                now: 20,
                unfinished: vec!["A".to_owned()]
            }
        );
    }

    #[test]
    fn blocked_process_yields_the_cpu_until_readied() {
        let processes = table(&[
            ProcessSpec::new("A", 1, 0, 10),
            ProcessSpec::new("B", 1, 0, 5),
        ]);
        let mut engine = SimulationEngine::new(&processes, RoundRobin::new(4));
        let a = engine.processes().find("A").map(|p| p.id).unwrap();
        let b = engine.processes().find("B").map(|p| p.id).unwrap();

        engine.step();
        engine.step();
        assert_eq!(engine.current(), Some(a));
        assert_eq!(engine.slice_remaining(), Some(2));

        engine.table.process_mut(a).block();
        let events = engine.step();
        assert!(events.contains(&SimEvent::Dispatched {
            process: b,
            slice: Some(4)
        }));
        assert_eq!(engine.current(), Some(b));

        // well past where A's slice would have run out
        while engine.now() < 8 {
            let events = engine.step();
            assert!(!events.contains(&SimEvent::Preempted { process: a }));
            assert_eq!(engine.processes().process(a).status(), ProcessStatus::Blocked);
        }
        assert!(engine.processes().process(b).is_terminal());
        assert_eq!(engine.processes().process(a).remaining_time(), 8);

        let now = engine.now();
        engine.table.process_mut(a).ready(Some(now));
        assert!(engine.run(100).is_completed());
        assert!(engine.observer().violations().is_empty());

        let a = engine.processes().process(a);
        assert_eq!(a.arrival_tick(), Some(0));
        assert_eq!(a.completion_tick(), Some(16));
        assert_eq!(a.waiting_time(), Some(6));
    }

    #[test]
    fn clock_saturates_at_the_end_of_time() {
        let processes = table(&[ProcessSpec::new("A", 1, Ticks::MAX, 2)]);
        let mut engine = SimulationEngine::new(&processes, FirstComeFirstServed);

        assert_eq!(
            engine.step(),
            [SimEvent::FastForward {
                from: 0,
                to: Ticks::MAX
            }]
        );
        engine.step();
        assert_eq!(engine.now(), Ticks::MAX);
        engine.step();

        let a = engine.processes().iter().next().unwrap();
        assert!(a.is_terminal());
        assert_eq!(a.completion_tick(), Some(Ticks::MAX));
        assert_eq!(engine.run(Ticks::MAX), RunOutcome::Completed { now: Ticks::MAX });
    }

    #[test]
    fn callers_table_is_not_mutated() {
        let processes = table(&[ProcessSpec::new("A", 1, 0, 3)]);
        let mut engine = SimulationEngine::new(&processes, FirstComeFirstServed);
        assert!(engine.run(100).is_completed());

        let original = processes.iter().next().unwrap();
        assert_eq!(original.status(), ProcessStatus::New);
        assert_eq!(original.remaining_time(), 3);
    }
}
