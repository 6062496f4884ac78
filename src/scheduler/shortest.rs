//! Burst-length policies: shortest/longest job next run a chosen process to
//! completion, while the remaining-time variants re-decide every tick.

use std::cmp::Reverse;

use super::{Policy, ProcessId, ProcessTable, Ticks, min_by_rank, runnable_current};

pub struct ShortestJobNext;

impl Policy for ShortestJobNext {
    fn name(&self) -> &'static str {
        "sjn"
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        _now: Ticks,
        current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        runnable_current(table, current).or_else(|| min_by_rank(table, ready, |p| p.service_time))
    }
}

pub struct LongestJobNext;

impl Policy for LongestJobNext {
    fn name(&self) -> &'static str {
        "ljn"
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        _now: Ticks,
        current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        runnable_current(table, current)
            .or_else(|| min_by_rank(table, ready, |p| Reverse(p.service_time)))
    }
}

pub struct ShortestRemainingTime;

impl Policy for ShortestRemainingTime {
    fn name(&self) -> &'static str {
        "srt"
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
        min_by_rank(table, ready, |p| p.remaining_time())
    }
}

pub struct LongestRemainingTime;

impl Policy for LongestRemainingTime {
    fn name(&self) -> &'static str {
        "lrt"
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
        min_by_rank(table, ready, |p| Reverse(p.remaining_time()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{name_of, ready_table};
    use crate::sim::ProcessSpec;

    fn workload() -> Vec<ProcessSpec> {
        vec![
            ProcessSpec::new("A", 1, 0, 6),
            ProcessSpec::new("B", 1, 1, 2),
            ProcessSpec::new("C", 1, 0, 2),
            ProcessSpec::new("D", 1, 2, 9),
        ]
    }

    #[test]
    fn sjn_prefers_short_jobs_then_earlier_arrival() {
        let (table, ready) = ready_table(&workload());
        let picked = ShortestJobNext.pick_next(&table, &ready, 2, None);
        assert_eq!(name_of(&table, picked), Some("C"));
    }

    #[test]
    fn ljn_prefers_long_jobs() {
        let (table, ready) = ready_table(&workload());
        let picked = LongestJobNext.pick_next(&table, &ready, 2, None);
        assert_eq!(name_of(&table, picked), Some("D"));
    }

    #[test]
    fn remaining_time_policies_are_preemptive() {
        assert!(ShortestRemainingTime.preemptive());
        assert!(LongestRemainingTime.preemptive());
        assert!(!ShortestJobNext.preemptive());
        assert!(!LongestJobNext.preemptive());
    }

    #[test]
    fn srt_uses_remaining_not_service_time() {
        let (mut table, ready) = ready_table(&workload());
        let a = ready[0];
        for _ in 0..5 {
            table.process_mut(a).run_one_cycle();
        }
        table.process_mut(a).ready(None);

        let picked = ShortestRemainingTime.pick_next(&table, &ready, 5, None);
        assert_eq!(picked, Some(a));
        let picked = LongestRemainingTime.pick_next(&table, &ready, 5, None);
        assert_eq!(name_of(&table, picked), Some("D"));
    }
}
