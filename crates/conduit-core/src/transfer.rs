//! Output and retriever services: the bounded moves an endpoint makes on
//! its turn.
//!
//! A service walks its route queue from the cursor, spending a budget equal
//! to the network's tier rate. Against each usable target it keeps moving
//! until a transaction moves nothing or the budget is spent, then advances.

use tracing::trace;

use crate::endpoint::{EndpointData, EndpointIndex, EndpointKind, FilterData};
use crate::grid::{Attachment, Direction, GridPos};
use crate::id::{NetworkType, ResourceId};
use crate::node::Node;
use crate::routing::RouteQueue;
use crate::world::{World, move_resources};

/// One endpoint's turn.
#[derive(Debug, Clone, Copy)]
pub struct Service<'a> {
    pub network_type: NetworkType,
    /// The pipe being serviced.
    pub pos: GridPos,
    /// The side of `pos` the endpoint's container sits on.
    pub dir: Direction,
    pub data: EndpointData,
    pub filter: &'a FilterData,
    pub endpoints: &'a EndpointIndex,
    /// Maximum units this service may move.
    pub budget: u64,
}

impl Service<'_> {
    /// The servicing endpoint's own container.
    pub fn attachment(&self) -> Attachment {
        Attachment::facing(self.pos, self.dir)
    }
}

/// Push from the endpoint's container into input (or unconfigured) targets.
/// Returns the amount moved.
pub fn service_output(world: &mut dyn World, service: &Service<'_>, queue: &mut RouteQueue<Node>) -> u64 {
    run_service(world, service, queue, |target_kind| {
        matches!(target_kind, None | Some(EndpointKind::Input))
    })
}

/// Pull into the endpoint's container from any target that is not itself a
/// retriever. Returns the amount moved.
pub fn service_retriever(
    world: &mut dyn World,
    service: &Service<'_>,
    queue: &mut RouteQueue<Node>,
) -> u64 {
    run_service(world, service, queue, |target_kind| {
        !matches!(target_kind, Some(EndpointKind::Retriever))
    })
}

fn run_service(
    world: &mut dyn World,
    service: &Service<'_>,
    queue: &mut RouteQueue<Node>,
    accepts_target: impl Fn(Option<EndpointKind>) -> bool,
) -> u64 {
    let own = service.attachment();
    if !world.is_loaded(own.pos) {
        return 0;
    }
    let pulling = service.data.kind == EndpointKind::Retriever;
    let mut remaining = service.budget;

    while remaining > 0 {
        let Some(node) = queue.pop_front() else {
            break;
        };
        let target = node.target();
        if target.pos == own.pos {
            continue;
        }
        if !world.is_loaded(node.target_pos) || !world.is_loaded(target.pos) {
            continue;
        }
        if !accepts_target(service.endpoints.endpoint(target).map(|d| d.kind)) {
            continue;
        }
        let target_filter = service.endpoints.filter(target);
        let filter = |r: ResourceId| service.filter.matches(r) && target_filter.matches(r);
        let (from, to) = if pulling { (target, own) } else { (own, target) };

        // Each pass either moves something (shrinking `remaining`) or stops.
        loop {
            let moved = move_resources(world, service.network_type, from, to, &filter, remaining);
            remaining -= moved.min(remaining);
            if moved == 0 || remaining == 0 {
                break;
            }
        }
    }

    let moved = service.budget - remaining;
    trace!(
        pos = %service.pos,
        dir = ?service.dir,
        kind = ?service.data.kind,
        moved,
        "endpoint serviced"
    );
    moved
}
