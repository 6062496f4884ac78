use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{Policy, Process, ProcessId, ProcessTable, Ticks};

/// Proportional-share draw: each ready process holds `max(1, priority)`
/// tickets and one ticket is drawn uniformly from the pool at every dispatch.
pub struct Lottery {
    rng: StdRng,
    quantum: Ticks,
}

impl Lottery {
    pub fn new(quantum: Ticks, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            quantum: quantum.max(1),
        }
    }

    pub fn tickets_for(p: &Process) -> u64 {
        u64::from(p.priority.max(1))
    }
}

impl Policy for Lottery {
    fn name(&self) -> &'static str {
        "lottery"
    }

    fn preemptive(&self) -> bool {
        true
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        _now: Ticks,
        _current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        let total: u64 = ready
            .iter()
            .map(|&id| Self::tickets_for(table.process(id)))
            .sum();
        if total == 0 {
            return None;
        }

        let mut ticket = self.rng.random_range(0..total);
        for &id in ready {
            let held = Self::tickets_for(table.process(id));
            if ticket < held {
                return Some(id);
            }
            ticket -= held;
        }
        None
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
