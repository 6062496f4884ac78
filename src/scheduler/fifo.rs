use super::{Policy, ProcessId, ProcessTable, Ticks, min_by_rank, runnable_current};

pub struct FirstComeFirstServed;

impl Policy for FirstComeFirstServed {
    fn name(&self) -> &'static str {
        "fcfs"
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        _now: Ticks,
        current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        runnable_current(table, current)
            .or_else(|| min_by_rank(table, ready, |p| p.simulated_arrival_time))
    }
}
