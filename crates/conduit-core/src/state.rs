//! Per-world registry of all networks of one type.
//!
//! `NetworkState` owns the networks (in a slotmap arena), the position
//! index mapping every member pipe to its network, the endpoint/filter
//! configuration, and the queue of positions awaiting reconciliation.
//!
//! Graph maintenance is incremental:
//! - adding a pipe joins the adjacent network, merges several adjacent
//!   networks (smaller into larger), or starts a new one;
//! - removing a pipe flood-fills the old member set from the removed
//!   pipe's neighbours and carves off every component but the largest.
//!
//! Calls about positions no network knows are no-ops.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::config::TransferConfig;
use crate::endpoint::{EndpointData, EndpointIndex, FilterData};
use crate::event::{NetworkEvent, StepReport};
use crate::grid::{Attachment, DirectionSet, GridPos};
use crate::id::{NetworkId, NetworkType};
use crate::network::{Network, TickContext};
use crate::node::Node;
use crate::rng::SimRng;
use crate::world::World;

#[derive(Debug, Clone)]
pub struct NetworkState {
    network_type: NetworkType,
    config: TransferConfig,
    networks: SlotMap<NetworkId, Network>,
    /// Every member pipe, mapped to the network that owns it.
    pipes: BTreeMap<GridPos, NetworkId>,
    endpoints: EndpointIndex,
    /// Positions queued by [`queue_update`](Self::queue_update).
    pending: BTreeSet<GridPos>,
    rng: SimRng,
}

impl NetworkState {
    pub fn new(network_type: NetworkType, config: TransferConfig) -> Self {
        let rng = SimRng::new(config.seed);
        Self {
            network_type,
            config,
            networks: SlotMap::with_key(),
            pipes: BTreeMap::new(),
            endpoints: EndpointIndex::new(),
            pending: BTreeSet::new(),
            rng,
        }
    }

    pub fn network_type(&self) -> NetworkType {
        self.network_type
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Drop every network, endpoint and pending update.
    pub fn clear(&mut self) {
        self.networks.clear();
        self.pipes.clear();
        self.endpoints.clear();
        self.pending.clear();
        self.rng = SimRng::new(self.config.seed);
    }

    // -- Queries --

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn network(&self, id: NetworkId) -> Option<&Network> {
        self.networks.get(id)
    }

    pub fn networks(&self) -> impl Iterator<Item = (NetworkId, &Network)> {
        self.networks.iter()
    }

    pub fn network_at(&self, pos: GridPos) -> Option<NetworkId> {
        self.pipes.get(&pos).copied()
    }

    /// Node list for a container-bearing pipe, discovering it if needed.
    pub fn nodes_at(&mut self, pos: GridPos) -> Option<&[Node]> {
        let id = self.network_at(pos)?;
        let network = self.networks.get_mut(id)?;
        network.ensure_nodes();
        network.nodes_at(pos).map(|nodes| &nodes[..])
    }

    pub fn endpoints(&self) -> &EndpointIndex {
        &self.endpoints
    }

    pub fn endpoint_data(&self, at: Attachment) -> Option<EndpointData> {
        self.endpoints.endpoint(at)
    }

    pub fn filter_data(&self, at: Attachment) -> &FilterData {
        self.endpoints.filter(at)
    }

    /// Positions waiting for the next reconciliation.
    pub fn pending_updates(&self) -> usize {
        self.pending.len()
    }

    // -- Configuration --

    pub fn set_endpoint(&mut self, at: Attachment, data: EndpointData) -> Option<EndpointData> {
        self.invalidate_routes_at(at);
        self.endpoints.set_endpoint(at, data)
    }

    pub fn clear_endpoint(&mut self, at: Attachment) -> Option<EndpointData> {
        self.invalidate_routes_at(at);
        self.endpoints.clear_endpoint(at)
    }

    pub fn set_filter(&mut self, at: Attachment, filter: FilterData) -> Option<FilterData> {
        self.invalidate_routes_at(at);
        self.endpoints.set_filter(at, filter)
    }

    pub fn clear_filter(&mut self, at: Attachment) -> Option<FilterData> {
        self.invalidate_routes_at(at);
        self.endpoints.clear_filter(at)
    }

    /// Orderings may depend on endpoint configuration, so the network the
    /// attachment hangs off re-sorts on its next fetch.
    fn invalidate_routes_at(&mut self, at: Attachment) {
        if let Some(network) = self
            .network_at(at.pipe_pos())
            .and_then(|id| self.networks.get_mut(id))
        {
            network.clear_routes();
        }
    }

    // -- Graph maintenance --

    /// A pipe appeared at `pos`.
    ///
    /// Blocks that are not pipes of this state's type are ignored.
    pub fn on_pipe_added(&mut self, world: &dyn World, pos: GridPos) -> Vec<NetworkEvent> {
        let Some(tier) = world.block_at(pos).as_pipe(self.network_type) else {
            trace!(%pos, network_type = ?self.network_type, "not a pipe of this type");
            return Vec::new();
        };
        let mut events = Vec::new();

        let id = match self.pipes.get(&pos) {
            Some(&id) => id,
            None => {
                let mut adjacent: Vec<NetworkId> = pos
                    .neighbors()
                    .filter_map(|(_, n)| self.pipes.get(&n).copied())
                    .collect();
                adjacent.sort();
                adjacent.dedup();
                let id = match adjacent.as_slice() {
                    [] => {
                        let network_type = self.network_type;
                        let id = self
                            .networks
                            .insert_with_key(|id| Network::new(id, network_type));
                        events.push(NetworkEvent::Created { network: id });
                        id
                    }
                    [only] => *only,
                    _ => self.merge(adjacent, &mut events),
                };
                self.pipes.insert(pos, id);
                id
            }
        };

        let dirs = self.scan_containers(world, pos);
        if let Some(network) = self.networks.get_mut(id) {
            network.insert_pipe(pos, tier);
            network.set_container_dirs(pos, dirs);
        }
        events
    }

    /// The pipe at `pos` is gone.
    pub fn on_pipe_removed(&mut self, pos: GridPos) -> Vec<NetworkEvent> {
        let Some(id) = self.pipes.remove(&pos) else {
            return Vec::new();
        };
        let Some(network) = self.networks.get_mut(id) else {
            return Vec::new();
        };
        network.remove_pipe(pos);

        if network.is_empty() {
            self.networks.remove(id);
            debug!(network = ?id, "network removed");
            return vec![NetworkEvent::Removed { network: id }];
        }

        let seeds: Vec<GridPos> = pos
            .neighbors()
            .map(|(_, n)| n)
            .filter(|n| network.contains(*n))
            .collect();
        let mut components = network.components_from(&seeds);
        if components.len() <= 1 {
            return Vec::new();
        }
        // The largest part keeps the id; ties go to the first seed found.
        components.sort_by_key(|c| Reverse(c.len()));

        let mut carved = Vec::with_capacity(components.len() - 1);
        for component in components.into_iter().skip(1) {
            let Some(network) = self.networks.get_mut(id) else {
                break;
            };
            let mut part = network.split_off(&component);
            let new_id = self.networks.insert_with_key(|new_id| {
                part.set_id(new_id);
                part
            });
            for p in component {
                self.pipes.insert(p, new_id);
            }
            carved.push(new_id);
        }
        debug!(from = ?id, into = ?carved, "network split");
        vec![NetworkEvent::Split {
            from: id,
            into: carved,
        }]
    }

    /// A storage block appeared or vanished at `pos`; rescan adjacent pipes
    /// on the next step.
    pub fn on_container_changed(&mut self, pos: GridPos) {
        for (_, n) in pos.neighbors() {
            if self.pipes.contains_key(&n) {
                self.pending.insert(n);
            }
        }
    }

    /// Mark `pos` for reconciliation at the start of the next step.
    ///
    /// Many updates in one network (a chunk loading) cost one node-list
    /// rebuild, not one per position.
    pub fn queue_update(&mut self, pos: GridPos) {
        self.pending.insert(pos);
    }

    /// Re-derive a network's container index and node lists from its member
    /// set. Returns `false` if the network does not exist.
    pub fn rebuild_network(&mut self, world: &dyn World, id: NetworkId) -> bool {
        let Some(network) = self.networks.get(id) else {
            return false;
        };
        let scanned: Vec<(GridPos, DirectionSet)> = network
            .pipes()
            .map(|pos| (pos, self.scan_containers(world, pos)))
            .collect();
        let Some(network) = self.networks.get_mut(id) else {
            return false;
        };
        for (pos, dirs) in scanned {
            network.set_container_dirs(pos, dirs);
        }
        network.invalidate();
        network.ensure_nodes();
        true
    }

    /// Merge `ids` (sorted, at least two) into the largest of them.
    fn merge(&mut self, ids: Vec<NetworkId>, events: &mut Vec<NetworkEvent>) -> NetworkId {
        let into = ids
            .iter()
            .copied()
            .max_by_key(|id| self.networks.get(*id).map_or(0, Network::len))
            .unwrap_or(ids[0]);
        let mut absorbed = Vec::with_capacity(ids.len() - 1);
        for id in ids {
            if id == into {
                continue;
            }
            let Some(other) = self.networks.remove(id) else {
                continue;
            };
            for pos in other.pipes() {
                self.pipes.insert(pos, into);
            }
            if let Some(target) = self.networks.get_mut(into) {
                target.absorb(other);
            }
            absorbed.push(id);
        }
        debug!(into = ?into, absorbed = ?absorbed, "networks merged");
        events.push(NetworkEvent::Merged { into, absorbed });
        into
    }

    /// Sides of `pos` with a storage of this type that is not itself a pipe.
    ///
    /// An unloaded neighbour cannot be inspected, so the side keeps whatever
    /// the network last recorded for it.
    fn scan_containers(&self, world: &dyn World, pos: GridPos) -> DirectionSet {
        let known = self
            .network_at(pos)
            .and_then(|id| self.networks.get(id))
            .and_then(|network| network.containers().get(&pos).copied())
            .unwrap_or_default();
        pos.neighbors()
            .filter(|(dir, n)| {
                if !world.is_loaded(*n) {
                    return known.contains(*dir);
                }
                world.block_at(*n).as_pipe(self.network_type).is_none()
                    && world
                        .storage(self.network_type, Attachment::facing(pos, *dir))
                        .is_some()
            })
            .map(|(dir, _)| dir)
            .collect()
    }

    /// Apply every queued update in one batch. Unloaded positions wait for
    /// a later batch.
    fn reconcile(&mut self, world: &dyn World) -> Vec<NetworkEvent> {
        let pending = std::mem::take(&mut self.pending);
        let mut events = Vec::new();
        for pos in pending {
            if !world.is_loaded(pos) {
                trace!(%pos, "update deferred until loaded");
                self.pending.insert(pos);
                continue;
            }
            let is_pipe = world.block_at(pos).as_pipe(self.network_type).is_some();
            if is_pipe {
                // Also refreshes the tier and container sides of tracked pipes.
                events.extend(self.on_pipe_added(world, pos));
            } else if self.pipes.contains_key(&pos) {
                events.extend(self.on_pipe_removed(pos));
            }
        }
        events
    }

    // -- Tick --

    /// Run one step: reconcile queued updates, then tick every network.
    pub fn on_step_end(&mut self, world: &mut dyn World) -> StepReport {
        let step = world.current_step();
        let mut report = StepReport::new(self.network_type, step);
        report.events = self.reconcile(&*world);

        for (_, network) in self.networks.iter_mut() {
            let mut ctx = TickContext {
                world: &mut *world,
                endpoints: &self.endpoints,
                config: &self.config,
                rng: &mut self.rng,
            };
            network.tick(&mut ctx, &mut report);
        }
        report
    }
}
