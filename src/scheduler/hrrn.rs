use std::cmp::Ordering;

use super::{Policy, Process, ProcessId, ProcessTable, Ticks, runnable_current};

/// Highest response ratio next: `(waited + service) / service`, where the
/// wait counts from admission. Non-preemptive.
pub struct HighestResponseRatioNext;

impl HighestResponseRatioNext {
    fn waited(p: &Process, now: Ticks) -> Ticks {
        now.saturating_sub(p.arrival_tick().unwrap_or(now))
    }

    // Ratios compared by cross-multiplication to stay in integers.
    fn compare_ratio(a: &Process, b: &Process, now: Ticks) -> Ordering {
        let lhs = u128::from(Self::waited(a, now) + a.service_time) * u128::from(b.service_time);
        let rhs = u128::from(Self::waited(b, now) + b.service_time) * u128::from(a.service_time);
        lhs.cmp(&rhs)
    }
}

impl Policy for HighestResponseRatioNext {
    fn name(&self) -> &'static str {
        "hrrn"
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        now: Ticks,
        current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        if let Some(id) = runnable_current(table, current) {
            return Some(id);
        }

        ready.iter().copied().min_by(|&a, &b| {
            let (pa, pb) = (table.process(a), table.process(b));
            Self::compare_ratio(pb, pa, now)
                .then_with(|| pa.simulated_arrival_time.cmp(&pb.simulated_arrival_time))
                .then_with(|| pa.name.cmp(&pb.name))
        })
    }
}
