pub mod aging;
pub mod fifo;
pub mod hrrn;
pub mod lottery;
pub mod priority;
pub mod registry;
pub mod round_robin;
pub mod shortest;

use serde::Deserialize;

use crate::core::{Process, ProcessId, ProcessStatus, ProcessTable, Ticks};
pub use aging::{AgingParams, DynamicAgingRoundRobin};
pub use fifo::FirstComeFirstServed;
pub use hrrn::HighestResponseRatioNext;
pub use lottery::Lottery;
pub use priority::{PreemptivePriority, Priority};
pub use registry::{PolicyCtor, PolicyRegistry};
pub use round_robin::RoundRobin;
pub use shortest::{
    LongestJobNext, LongestRemainingTime, ShortestJobNext, ShortestRemainingTime,
};

pub const DEFAULT_RR_QUANTUM: Ticks = 4;
pub const DEFAULT_LOTTERY_QUANTUM: Ticks = 3;

/// Knobs handed to every policy constructor in the registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolicyParams {
    pub rr_quantum: Ticks,
    pub lottery_quantum: Ticks,
    /// Seed for policies that draw random numbers.
    pub seed: u64,
    pub aging: AgingParams,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            rr_quantum: DEFAULT_RR_QUANTUM,
            lottery_quantum: DEFAULT_LOTTERY_QUANTUM,
            seed: 0,
            aging: AgingParams::default(),
        }
    }
}

/// A scheduling algorithm driven by [`crate::core::SimulationEngine`].
///
/// Policies see the process table read-only; every status change is made by
/// the engine. An instance may keep private bookkeeping, so a fresh one is
/// built for every run.
pub trait Policy {
    /// Registry key.
    fn name(&self) -> &'static str;

    /// Preemptive policies get their dispatches cut short after
    /// [`Policy::preempt_interval`] ticks.
    fn preemptive(&self) -> bool {
        false
    }

    /// Chooses who runs next. `ready` holds every READY process in table
    /// order. Non-preemptive policies hand back a still-runnable `current`.
    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        now: Ticks,
        current: Option<ProcessId>,
    ) -> Option<ProcessId>;

    /// Slice length (>= 1) granted to `current`. Only consulted when
    /// [`Policy::preemptive`] is true.
    fn preempt_interval(
        &mut self,
        _table: &ProcessTable,
        _now: Ticks,
        _current: Option<ProcessId>,
    ) -> Ticks {
        1
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn preemptive(&self) -> bool {
        (**self).preemptive()
    }

    fn pick_next(
        &mut self,
        table: &ProcessTable,
        ready: &[ProcessId],
        now: Ticks,
        current: Option<ProcessId>,
    ) -> Option<ProcessId> {
        (**self).pick_next(table, ready, now, current)
    }

    fn preempt_interval(
        &mut self,
        table: &ProcessTable,
        now: Ticks,
        current: Option<ProcessId>,
    ) -> Ticks {
        (**self).preempt_interval(table, now, current)
    }
}

/// `current`, if it can still use the CPU.
pub(crate) fn runnable_current(
    table: &ProcessTable,
    current: Option<ProcessId>,
) -> Option<ProcessId> {
    current.filter(|&id| {
        matches!(
            table.process(id).status(),
            ProcessStatus::Ready | ProcessStatus::Running
        )
    })
}

/// Smallest `key`, ties broken by simulated arrival time and then name.
pub(crate) fn min_by_rank<K: Ord>(
    table: &ProcessTable,
    ready: &[ProcessId],
    key: impl Fn(&Process) -> K,
) -> Option<ProcessId> {
    ready.iter().copied().min_by_key(|&id| {
        let p = table.process(id);
        (key(p), p.simulated_arrival_time, p.name.as_str())
    })
}
