//! A single connected pipe network and its per-cycle work.
//!
//! # Invariants
//!
//! - `pipes` is one connected component of the pipe adjacency graph.
//!   [`NetworkState`](crate::state::NetworkState) restores this after every
//!   add (merge) and remove (split).
//! - `containers` holds exactly the member pipes with at least one side
//!   touching a storage of this network's type, with those sides.
//! - `nodes` is either empty and stale, or holds one node list per entry of
//!   `containers`, discovered from the current member set.
//! - `routes` only holds queues ordered from the current `nodes`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::TransferConfig;
use crate::endpoint::{EndpointIndex, EndpointKind};
use crate::event::{ServiceRecord, StepReport};
use crate::grid::{Attachment, Direction, DirectionSet, GridPos};
use crate::id::{NetworkId, NetworkType, Tier};
use crate::node::Node;
use crate::rng::SimRng;
use crate::routing::{OrderingContext, RouteCache};
use crate::scheduler::{Scheduler, WorkItem};
use crate::sim::CyclePhase;
use crate::transfer::{Service, service_output, service_retriever};
use crate::world::World;

/// Everything a network needs from its owner while it ticks.
pub struct TickContext<'a> {
    pub world: &'a mut dyn World,
    pub endpoints: &'a EndpointIndex,
    pub config: &'a TransferConfig,
    pub rng: &'a mut SimRng,
}

#[derive(Debug, Clone)]
pub struct Network {
    id: NetworkId,
    network_type: NetworkType,
    /// Lowest tier among member pipes.
    tier: Tier,
    pipes: BTreeMap<GridPos, Tier>,
    containers: BTreeMap<GridPos, DirectionSet>,
    nodes: BTreeMap<GridPos, Arc<[Node]>>,
    nodes_stale: bool,
    routes: RouteCache,
    scheduler: Scheduler,
}

impl Network {
    pub fn new(id: NetworkId, network_type: NetworkType) -> Self {
        Self {
            id,
            network_type,
            tier: Tier::Mk1,
            pipes: BTreeMap::new(),
            containers: BTreeMap::new(),
            nodes: BTreeMap::new(),
            nodes_stale: true,
            routes: RouteCache::new(),
            scheduler: Scheduler::new(),
        }
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn network_type(&self) -> NetworkType {
        self.network_type
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.pipes.contains_key(&pos)
    }

    /// Member pipe positions in grid order.
    pub fn pipes(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.pipes.keys().copied()
    }

    /// Member pipes that touch containers, with the touching sides.
    pub fn containers(&self) -> &BTreeMap<GridPos, DirectionSet> {
        &self.containers
    }

    /// Cached node list for a container-bearing pipe. `None` until built.
    pub fn nodes_at(&self, pos: GridPos) -> Option<&Arc<[Node]>> {
        self.nodes.get(&pos)
    }

    pub fn routes(&self) -> &RouteCache {
        &self.routes
    }

    /// Work items still waiting in the current cycle.
    pub fn pending_work(&self) -> usize {
        self.scheduler.pending()
    }

    // -- Membership (driven by NetworkState) --

    pub(crate) fn set_id(&mut self, id: NetworkId) {
        self.id = id;
    }

    pub(crate) fn insert_pipe(&mut self, pos: GridPos, tier: Tier) {
        if self.pipes.insert(pos, tier) != Some(tier) {
            self.recompute_tier();
            self.invalidate();
        }
    }

    pub(crate) fn remove_pipe(&mut self, pos: GridPos) -> bool {
        let removed = self.pipes.remove(&pos).is_some();
        self.containers.remove(&pos);
        if removed {
            self.recompute_tier();
            self.invalidate();
        }
        removed
    }

    /// Record which sides of a member pipe touch containers.
    pub(crate) fn set_container_dirs(&mut self, pos: GridPos, dirs: DirectionSet) {
        if !self.pipes.contains_key(&pos) {
            return;
        }
        let changed = if dirs.is_empty() {
            self.containers.remove(&pos).is_some()
        } else {
            self.containers.insert(pos, dirs) != Some(dirs)
        };
        if changed {
            self.invalidate();
        }
    }

    /// Move every pipe and container of `other` into this network.
    pub(crate) fn absorb(&mut self, other: Network) {
        self.pipes.extend(other.pipes);
        self.containers.extend(other.containers);
        self.recompute_tier();
        self.invalidate();
    }

    /// Remove `positions` from this network and return them as a new
    /// network. The caller assigns the new network's id.
    pub(crate) fn split_off(&mut self, positions: &BTreeSet<GridPos>) -> Network {
        let mut part = Network::new(NetworkId::default(), self.network_type);
        for pos in positions {
            if let Some(tier) = self.pipes.remove(pos) {
                part.pipes.insert(*pos, tier);
            }
            if let Some(dirs) = self.containers.remove(pos) {
                part.containers.insert(*pos, dirs);
            }
        }
        part.recompute_tier();
        self.recompute_tier();
        self.invalidate();
        part
    }

    /// Connected components of the member set, one per distinct seed.
    ///
    /// Flood fill never leaves the member set, so its cost is bounded by
    /// the size of this network.
    pub(crate) fn components_from(&self, seeds: &[GridPos]) -> Vec<BTreeSet<GridPos>> {
        let mut seen: BTreeSet<GridPos> = BTreeSet::new();
        let mut components = Vec::new();
        for &seed in seeds {
            if !self.pipes.contains_key(&seed) || seen.contains(&seed) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut frontier = VecDeque::from([seed]);
            seen.insert(seed);
            while let Some(pos) = frontier.pop_front() {
                component.insert(pos);
                for (_, next) in pos.neighbors() {
                    if self.pipes.contains_key(&next) && seen.insert(next) {
                        frontier.push_back(next);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    fn recompute_tier(&mut self) {
        self.tier = self.pipes.values().copied().min().unwrap_or_default();
    }

    // -- Node discovery --

    /// Throw away node lists and route queues; they are rediscovered lazily.
    pub(crate) fn invalidate(&mut self) {
        self.nodes.clear();
        self.nodes_stale = true;
        self.routes.clear();
    }

    /// Drop route orderings but keep node lists (endpoint config changed).
    pub(crate) fn clear_routes(&mut self) {
        self.routes.clear();
    }

    /// Rediscover node lists if the member set changed since the last build.
    pub(crate) fn ensure_nodes(&mut self) {
        if self.nodes_stale {
            self.rebuild_nodes();
        }
    }

    /// Breadth-first search from every container-bearing pipe, recording a
    /// node for every container side reached.
    fn rebuild_nodes(&mut self) {
        self.nodes.clear();
        for &origin in self.containers.keys() {
            let mut list = Vec::new();
            // (position, hops, first side left through)
            let mut frontier: VecDeque<(GridPos, u32, Option<Direction>)> =
                VecDeque::from([(origin, 0, None)]);
            let mut seen = BTreeSet::from([origin]);
            while let Some((pos, distance, first)) = frontier.pop_front() {
                if let Some(dirs) = self.containers.get(&pos) {
                    for dir in dirs.iter() {
                        list.push(Node {
                            source_pos: origin,
                            target_pos: pos,
                            source_dir: first.unwrap_or(dir),
                            target_dir: dir,
                            distance,
                        });
                    }
                }
                for (dir, next) in pos.neighbors() {
                    if self.pipes.contains_key(&next) && seen.insert(next) {
                        frontier.push_back((next, distance + 1, first.or(Some(dir))));
                    }
                }
            }
            self.nodes.insert(origin, Arc::from(list));
        }
        self.nodes_stale = false;
        self.routes.clear();
        trace!(
            network = ?self.id,
            containers = self.containers.len(),
            "node lists rebuilt"
        );
    }

    // -- Tick --

    /// Advance this network by one step.
    ///
    /// On the first step of a cycle the work list is rebuilt from the
    /// container index; on every other step a share of it is serviced.
    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>, report: &mut StepReport) {
        if self.containers.is_empty() {
            return;
        }
        self.ensure_nodes();

        let step = ctx.world.current_step();
        let phase = CyclePhase::of(step);
        if phase == CyclePhase::Building {
            let world = &*ctx.world;
            let items = self
                .containers
                .iter()
                .filter(|(pos, _)| world.is_loaded(**pos))
                .filter_map(|(pos, dirs)| {
                    self.nodes.get(pos).map(|nodes| WorkItem {
                        pos: *pos,
                        directions: *dirs,
                        nodes: Arc::clone(nodes),
                    })
                });
            let len = self.scheduler.build(items);
            report.cycles_built += 1;
            debug!(
                step,
                network = ?self.id,
                first_pipe = ?self.pipes.keys().next(),
                work = len,
                per_step = self.scheduler.share(),
                "{:?} network work list built",
                self.network_type
            );
            return;
        }

        let id = self.id;
        let network_type = self.network_type;
        let budget = ctx.config.max_transfer(network_type, self.tier);
        let routes = &mut self.routes;
        let containers = &self.containers;
        let nodes = &self.nodes;
        self.scheduler.drain(phase, |mut item| {
            // The member set may have changed since the build step.
            let (Some(dirs), Some(current)) = (containers.get(&item.pos), nodes.get(&item.pos))
            else {
                return;
            };
            item.directions = *dirs;
            item.nodes = Arc::clone(current);
            let moved = service_item(&item, network_type, budget, routes, ctx);
            report.serviced.push(ServiceRecord {
                network: id,
                pos: item.pos,
                moved,
            });
        });
    }
}

/// Service every initiating endpoint around one work item's pipe.
fn service_item(
    item: &WorkItem,
    network_type: NetworkType,
    budget: u64,
    routes: &mut RouteCache,
    ctx: &mut TickContext<'_>,
) -> u64 {
    let mut moved = 0;
    for dir in item.directions.iter() {
        let at = Attachment::facing(item.pos, dir);
        let Some(data) = ctx.endpoints.endpoint(at) else {
            continue;
        };
        if !data.kind.initiates() {
            continue;
        }
        let filter = ctx.endpoints.filter(at);
        let ordering = OrderingContext {
            network_type,
            endpoint: data.kind,
            own: at,
            filter,
            endpoints: ctx.endpoints,
            world: &*ctx.world,
        };
        let queue = routes.queue_for(item.pos, &data, &item.nodes, &ordering, ctx.rng);

        let service = Service {
            network_type,
            pos: item.pos,
            dir,
            data,
            filter,
            endpoints: ctx.endpoints,
            budget,
        };
        moved += match data.kind {
            EndpointKind::Output => service_output(ctx.world, &service, queue),
            EndpointKind::Retriever => service_retriever(ctx.world, &service, queue),
            EndpointKind::Input => 0,
        };
        queue.reset_head();
    }
    moved
}
