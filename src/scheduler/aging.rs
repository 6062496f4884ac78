use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::{Policy, Process, ProcessId, ProcessTable, Ticks};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgingParams {
    /// Slice granted to a process that has not waited at all.
    pub base_quantum: Ticks,
    /// Upper bound on any slice.
    pub max_quantum: Ticks,
    /// Every `age_boost_div` ticks of age add one tick to the slice.
    pub age_boost_div: Ticks,
    /// Weight of static priority in the selection score.
    pub priority_weight: f64,
}

impl Default for AgingParams {
    fn default() -> Self {
        Self {
            base_quantum: 2,
            max_quantum: 8,
            age_boost_div: 3,
            priority_weight: 0.5,
        }
    }
}

/// Round robin where waiting raises both the chance to be picked and the
/// length of the slice received.
///
/// A process's age is the time since it was last dispatched, or since it was
/// first seen ready if it never ran. Selection maximizes
/// `age + priority_weight * priority`.
pub struct DynamicAgingRoundRobin {
    params: AgingParams,
    last_dispatch_time: FxHashMap<ProcessId, Ticks>,
    first_ready_seen_at: FxHashMap<ProcessId, Ticks>,
}

impl DynamicAgingRoundRobin {
    pub fn new(params: AgingParams) -> Self {
        Self {
            params,
            last_dispatch_time: FxHashMap::default(),
            first_ready_seen_at: FxHashMap::default(),
        }
    }

    pub fn age(&self, id: ProcessId, now: Ticks) -> Ticks {
        let start = self
            .last_dispatch_time
            .get(&id)
            .or_else(|| self.first_ready_seen_at.get(&id))
            .copied()
            .unwrap_or(now);
        now.saturating_sub(start)
    }

    fn score(&self, p: &Process, now: Ticks) -> f64 {
        self.age(p.id, now) as f64 + self.params.priority_weight * f64::from(p.priority)
    }
}

impl Policy for DynamicAgingRoundRobin {
    fn name(&self) -> &'static str {
        "dyn_aging_rr"
    }

    fn preemptive(&self) -> bool {
        true
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        now: Ticks,
        _current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        for &id in ready {
            self.first_ready_seen_at.entry(id).or_insert(now);
        }

        let chosen = ready.iter().copied().min_by(|&a, &b| {
            let (pa, pb) = (table.process(a), table.process(b));
            self.score(pb, now)
                .total_cmp(&self.score(pa, now))
                .then_with(|| pa.simulated_arrival_time.cmp(&pb.simulated_arrival_time))
                .then_with(|| pa.name.cmp(&pb.name))
        })?;

        self.last_dispatch_time.insert(chosen, now);
        Some(chosen)
    }

    /// `base_quantum + age / age_boost_div`, clamped to
    /// `[1, min(max_quantum, remaining_time)]`. The engine asks right after
    /// [`Policy::pick_next`] stamped the dispatch, so a freshly picked
    /// process has age 0 and gets `base_quantum`.
    fn preempt_interval(
        &mut self,
        table: &ProcessTable,
        now: Ticks,
        current: Option<ProcessId>,
    ) -> Ticks {
        let Some(id) = current else {
            return self.params.base_quantum.max(1);
        };

        let grow = self.age(id, now) / self.params.age_boost_div.max(1);
        let remaining = table.process(id).remaining_time().max(1);

        (self.params.base_quantum + grow)
            .min(remaining)
            .min(self.params.max_quantum)
            .max(1)
    }
}
