use std::cmp::Reverse;

use super::{Policy, ProcessId, ProcessTable, Ticks, min_by_rank, runnable_current};

/// Highest priority wins and runs to completion.
pub struct Priority;

impl Policy for Priority {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        _now: Ticks,
        current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        runnable_current(table, current)
            .or_else(|| min_by_rank(table, ready, |p| Reverse(p.priority)))
    }
}

/// Highest priority wins, re-evaluated after every tick.
pub struct PreemptivePriority;

impl Policy for PreemptivePriority {
    fn name(&self) -> &'static str {
        "priority_preemptive"
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
        min_by_rank(table, ready, |p| Reverse(p.priority))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{name_of, ready_table};
    use crate::sim::ProcessSpec;

    #[test]
    fn highest_priority_then_arrival() {
        let (table, ready) = ready_table(&[
            ProcessSpec::new("low", 2, 0, 3),
            ProcessSpec::new("late", 9, 4, 3),
            ProcessSpec::new("early", 9, 1, 3),
        ]);
        assert_eq!(
            name_of(&table, Priority.pick_next(&table, &ready, 4, None)),
            Some("early")
        );
        assert_eq!(
            name_of(&table, PreemptivePriority.pick_next(&table, &ready, 4, None)),
            Some("early")
        );
    }

    #[test]
    fn only_preemptive_variant_ignores_current() {
        let (table, ready) = ready_table(&[
            ProcessSpec::new("low", 2, 0, 3),
            ProcessSpec::new("high", 9, 0, 3),
        ]);
        let low = ready[0];
        assert_eq!(Priority.pick_next(&table, &ready, 1, Some(low)), Some(low));
        assert_eq!(
            name_of(
                &table,
                PreemptivePriority.pick_next(&table, &ready, 1, Some(low))
            ),
            Some("high")
        );
    }
}
