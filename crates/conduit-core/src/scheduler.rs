//! Per-network cycle scheduler.
//!
//! Once per cycle the network hands the scheduler one [`WorkItem`] per
//! container-bearing pipe. Each following step drains up to
//! [`per_step_share`] items from the front; the final step of the cycle
//! drains the rest. Every item is popped exactly once, so every position
//! is serviced exactly once per cycle and no step does more than its share
//! of the work, except the last one which mops up rounding leftovers.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::grid::{DirectionSet, GridPos};
use crate::node::Node;
use crate::sim::{CyclePhase, per_step_share};

/// One pipe position's work for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub pos: GridPos,
    /// Sides of `pos` that touch a container.
    pub directions: DirectionSet,
    pub nodes: Arc<[Node]>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    work: VecDeque<WorkItem>,
    share: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the work list for a new cycle. Returns its length.
    ///
    /// Anything left over from the previous cycle is discarded so no
    /// position can be serviced twice in one cycle.
    pub fn build(&mut self, items: impl IntoIterator<Item = WorkItem>) -> usize {
        self.work.clear();
        self.work.extend(items);
        self.share = per_step_share(self.work.len());
        self.work.len()
    }

    /// Pop and hand items to `service` for one step. Returns how many were
    /// serviced. Nothing is drained during the build step.
    pub fn drain(&mut self, phase: CyclePhase, mut service: impl FnMut(WorkItem)) -> usize {
        let limit = match phase {
            CyclePhase::Building => return 0,
            CyclePhase::Draining => self.share,
            CyclePhase::Finishing => usize::MAX,
        };
        let mut serviced = 0;
        while serviced < limit {
            let Some(item) = self.work.pop_front() else {
                break;
            };
            service(item);
            serviced += 1;
        }
        serviced
    }

    /// Items still waiting this cycle.
    pub fn pending(&self) -> usize {
        self.work.len()
    }

    /// Items per draining step for the current cycle.
    pub fn share(&self) -> usize {
        self.share
    }

    pub fn clear(&mut self) {
        self.work.clear();
        self.share = 0;
    }
}
