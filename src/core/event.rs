use crate::core::{ProcessId, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    Admitted {
        process: ProcessId,
    },
    Dispatched {
        process: ProcessId,
        slice: Option<Ticks>,
    },
    Ran {
        process: ProcessId,
        remaining: Ticks,
    },
    Completed {
        process: ProcessId,
        completion_tick: Ticks,
    },
    // Slice expired; process went back to READY
    Preempted {
        process: ProcessId,
    },
    // CPU idle for this tick
    Idle,
    // Nothing ready and nothing running: clock jumped over dead time
    FastForward {
        from: Ticks,
        to: Ticks,
    },
    // Policy returned nothing despite a non-empty ready set
    Stalled {
        ready: usize,
    },
}
