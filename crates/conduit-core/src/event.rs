//! Structural events and per-step reports.
//!
//! Graph maintenance returns [`NetworkEvent`]s describing how the set of
//! networks changed. Each step returns a [`StepReport`] listing which
//! positions were serviced and how much moved.

use crate::grid::GridPos;
use crate::id::{NetworkId, NetworkType};
use crate::sim::Ticks;

/// A change to the set of networks of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A pipe with no adjacent network started a new one.
    Created { network: NetworkId },
    /// A pipe joined several networks; `absorbed` no longer exist.
    Merged {
        into: NetworkId,
        absorbed: Vec<NetworkId>,
    },
    /// Removing a pipe disconnected `from`; the parts in `into` were carved
    /// out of it. `from` keeps one part.
    Split {
        from: NetworkId,
        into: Vec<NetworkId>,
    },
    /// The last pipe of a network was removed.
    Removed { network: NetworkId },
}

/// One serviced work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRecord {
    pub network: NetworkId,
    pub pos: GridPos,
    pub moved: u64,
}

/// What one state did during one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub network_type: NetworkType,
    pub step: Ticks,
    /// Structural events from updates reconciled at the start of the step.
    pub events: Vec<NetworkEvent>,
    /// Networks that built a new work list this step.
    pub cycles_built: usize,
    pub serviced: Vec<ServiceRecord>,
}

impl StepReport {
    pub fn new(network_type: NetworkType, step: Ticks) -> Self {
        Self {
            network_type,
            step,
            events: Vec::new(),
            cycles_built: 0,
            serviced: Vec::new(),
        }
    }

    /// Total units moved by every service this step.
    pub fn moved(&self) -> u64 {
        self.serviced.iter().map(|s| s.moved).sum()
    }

    /// Services performed by one network this step.
    pub fn serviced_by(&self, network: NetworkId) -> impl Iterator<Item = &ServiceRecord> {
        self.serviced.iter().filter(move |s| s.network == network)
    }
}
