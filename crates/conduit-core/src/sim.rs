//! Simulation time and the fixed work cycle.
//!
//! Every network spreads its transfer work over a cycle of
//! [`CYCLE_LENGTH`] steps. The first step of a cycle builds the work list;
//! the remaining steps drain it.

/// Steps are the atomic unit of simulation time.
pub type Ticks = u64;

/// Number of steps in one work cycle.
pub const CYCLE_LENGTH: Ticks = 20;

/// Steps per cycle that service containers (all but the build step).
pub const DRAIN_STEPS: usize = (CYCLE_LENGTH - 1) as usize;

/// Where a step falls in the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CyclePhase {
    /// First step: rebuild the work list, no transfers.
    Building,
    /// Middle steps: service up to the per-step share.
    Draining,
    /// Final step: service everything left.
    Finishing,
}

impl CyclePhase {
    pub fn of(step: Ticks) -> Self {
        match step % CYCLE_LENGTH {
            0 => CyclePhase::Building,
            r if r == CYCLE_LENGTH - 1 => CyclePhase::Finishing,
            _ => CyclePhase::Draining,
        }
    }
}

/// Items each draining step should service so `work_len` items finish
/// within one cycle. This is a pacing target: the final step drains
/// whatever remains regardless.
pub fn per_step_share(work_len: usize) -> usize {
    work_len.div_ceil(DRAIN_STEPS)
}
