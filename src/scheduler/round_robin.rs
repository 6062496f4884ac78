use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use super::{Policy, ProcessId, ProcessStatus, ProcessTable, Ticks};

/// FIFO rotation with a fixed slice.
///
/// Newly ready processes join the tail in admission order. When the engine
/// asks again after a slice expires, the process that just ran moves behind
/// everyone who was waiting, including arrivals from that same tick.
pub struct RoundRobin {
    queue: VecDeque<ProcessId>,
    last_dispatched: Option<ProcessId>,
    quantum: Ticks,
}

impl RoundRobin {
    pub fn new(quantum: Ticks) -> Self {
        Self {
            queue: VecDeque::new(),
            last_dispatched: None,
            quantum: quantum.max(1),
        }
    }

    fn sync_queue(&mut self, table: &ProcessTable, ready: &[ProcessId]) {
        let ready_set: FxHashSet<ProcessId> = ready.iter().copied().collect();
        self.queue.retain(|id| ready_set.contains(id));

        let mut arrivals: Vec<ProcessId> = ready
            .iter()
            .copied()
            .filter(|id| !self.queue.contains(id))
            .collect();
        arrivals.sort_by_key(|&id| {
            let p = table.process(id);
            (p.arrival_tick(), p.simulated_arrival_time, p.name.as_str())
        });

        // The process that just ran was already queued, so it never counts
        // as an arrival here.
        let rotated = self
            .last_dispatched
            .take()
            .and_then(|prev| self.queue.iter().position(|&id| id == prev))
            .and_then(|pos| self.queue.remove(pos));

        self.queue.extend(arrivals);
        self.queue.extend(rotated);
    }

    pub fn queued(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.queue.iter().copied()
    }
}

impl Policy for RoundRobin {
    fn name(&self) -> &'static str {
        "rr"
    }

    fn preemptive(&self) -> bool {
        true
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        _now: Ticks,
        current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        if let Some(id) =
            current.filter(|&id| table.process(id).status() == ProcessStatus::Running)
        {
            return Some(id);
        }

        self.sync_queue(table, ready);
        let head = self.queue.front().copied();
        self.last_dispatched = head;
        head
    }

    fn preempt_interval(
        &mut self,
        _table: &ProcessTable,
        _now: Ticks,
        _current: Option<ProcessId>,
    ) -> Ticks {
        self.quantum
    }
}
