//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available outside the crate via the `test-utils` feature.

use std::collections::{BTreeMap, BTreeSet};

use crate::endpoint::{EndpointData, FilterData};
use crate::event::StepReport;
use crate::grid::{Attachment, Direction, GridPos};
use crate::hooks::TransportNetworks;
use crate::id::{NetworkType, ResourceId, Tier};
use crate::sim::Ticks;
use crate::state::NetworkState;
use crate::world::{Block, Storage, World};

// ===========================================================================
// Resource constructors
// ===========================================================================

pub fn iron() -> ResourceId {
    ResourceId(0)
}
pub fn copper() -> ResourceId {
    ResourceId(1)
}
pub fn gold() -> ResourceId {
    ResourceId(2)
}
pub fn water() -> ResourceId {
    ResourceId(10)
}
pub fn lava() -> ResourceId {
    ResourceId(11)
}
/// Energy networks carry a single resource.
pub fn power() -> ResourceId {
    ResourceId(20)
}

// ===========================================================================
// Storage
// ===========================================================================

/// A shared-capacity container that keeps resources in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestStorage {
    capacity: u64,
    contents: Vec<(ResourceId, u64)>,
    /// Cap on a single extract, to force multi-transaction services.
    transaction_limit: Option<u64>,
}

impl TestStorage {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn with(capacity: u64, contents: impl IntoIterator<Item = (ResourceId, u64)>) -> Self {
        Self {
            capacity,
            contents: contents.into_iter().collect(),
            transaction_limit: None,
        }
    }

    pub fn with_transaction_limit(mut self, limit: u64) -> Self {
        self.transaction_limit = Some(limit);
        self
    }

    pub fn amount(&self, resource: ResourceId) -> u64 {
        self.contents
            .iter()
            .find(|(r, _)| *r == resource)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total(&self) -> u64 {
        self.contents.iter().map(|(_, n)| n).sum()
    }

    fn free(&self) -> u64 {
        self.capacity.saturating_sub(self.total())
    }

    fn extractable(&self, resource: ResourceId, max: u64) -> u64 {
        let n = self.amount(resource).min(max);
        self.transaction_limit.map_or(n, |limit| n.min(limit))
    }
}

impl Storage for TestStorage {
    fn resources(&self) -> Vec<ResourceId> {
        self.contents
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(r, _)| *r)
            .collect()
    }

    fn simulate_extract(&self, resource: ResourceId, max: u64) -> u64 {
        self.extractable(resource, max)
    }

    fn extract(&mut self, resource: ResourceId, max: u64) -> u64 {
        let n = self.extractable(resource, max);
        if let Some((_, held)) = self.contents.iter_mut().find(|(r, _)| *r == resource) {
            *held -= n;
        }
        n
    }

    fn simulate_insert(&self, _resource: ResourceId, max: u64) -> u64 {
        self.free().min(max)
    }

    fn insert(&mut self, resource: ResourceId, max: u64) -> u64 {
        let n = self.free().min(max);
        if n == 0 {
            return 0;
        }
        match self.contents.iter_mut().find(|(r, _)| *r == resource) {
            Some((_, held)) => *held += n,
            None => self.contents.push((resource, n)),
        }
        n
    }
}

// ===========================================================================
// World
// ===========================================================================

/// An in-memory world. Every cell is loaded unless explicitly unloaded.
/// Storages are keyed by cell; the side they are reached from is ignored.
#[derive(Debug, Clone, Default)]
pub struct TestWorld {
    step: Ticks,
    blocks: BTreeMap<GridPos, Block>,
    storages: BTreeMap<(NetworkType, GridPos), TestStorage>,
    unloaded: BTreeSet<GridPos>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Ticks {
        self.step
    }

    pub fn set_step(&mut self, step: Ticks) {
        self.step = step;
    }

    pub fn advance(&mut self) {
        self.step += 1;
    }

    pub fn place_pipe(&mut self, network_type: NetworkType, pos: GridPos, tier: Tier) {
        self.blocks.insert(pos, Block::Pipe { network_type, tier });
    }

    pub fn remove_block(&mut self, pos: GridPos) -> Option<Block> {
        self.blocks.remove(&pos)
    }

    pub fn place_storage(&mut self, network_type: NetworkType, pos: GridPos, storage: TestStorage) {
        self.storages.insert((network_type, pos), storage);
    }

    pub fn remove_storage(&mut self, network_type: NetworkType, pos: GridPos) -> Option<TestStorage> {
        self.storages.remove(&(network_type, pos))
    }

    pub fn storage_at(&self, network_type: NetworkType, pos: GridPos) -> Option<&TestStorage> {
        self.storages.get(&(network_type, pos))
    }

    /// How much of `resource` the storage at `pos` holds (0 if none).
    pub fn amount(&self, network_type: NetworkType, pos: GridPos, resource: ResourceId) -> u64 {
        self.storage_at(network_type, pos)
            .map_or(0, |s| s.amount(resource))
    }

    pub fn unload(&mut self, pos: GridPos) {
        self.unloaded.insert(pos);
    }

    pub fn load(&mut self, pos: GridPos) {
        self.unloaded.remove(&pos);
    }
}

impl World for TestWorld {
    fn current_step(&self) -> Ticks {
        self.step
    }

    fn is_loaded(&self, pos: GridPos) -> bool {
        !self.unloaded.contains(&pos)
    }

    fn block_at(&self, pos: GridPos) -> Block {
        self.blocks.get(&pos).copied().unwrap_or(Block::Other)
    }

    fn storage(&self, network_type: NetworkType, at: Attachment) -> Option<&dyn Storage> {
        self.storages
            .get(&(network_type, at.pos))
            .map(|s| s as &dyn Storage)
    }

    fn storage_mut(
        &mut self,
        network_type: NetworkType,
        at: Attachment,
    ) -> Option<&mut dyn Storage> {
        self.storages
            .get_mut(&(network_type, at.pos))
            .map(|s| s as &mut dyn Storage)
    }
}

// ===========================================================================
// Layout helpers
// ===========================================================================

/// Pipe position `x` along the x axis.
pub fn pipe(x: i32) -> GridPos {
    GridPos::new(x, 0, 0)
}

/// Container cell sitting directly above pipe `x`.
pub fn above(x: i32) -> GridPos {
    GridPos::new(x, 1, 0)
}

/// The attachment of the container above pipe `x`.
pub fn above_side(x: i32) -> Attachment {
    Attachment::facing(pipe(x), Direction::Up)
}

/// Place pipes in the world and announce each one to `state`.
pub fn lay_pipes(
    world: &mut TestWorld,
    state: &mut NetworkState,
    network_type: NetworkType,
    tier: Tier,
    positions: impl IntoIterator<Item = GridPos>,
) {
    for pos in positions {
        world.place_pipe(network_type, pos, tier);
        state.on_pipe_added(&*world, pos);
    }
}

/// Place pipes and announce them through the host hooks.
pub fn lay_pipes_via_hooks(
    world: &mut TestWorld,
    networks: &mut TransportNetworks,
    network_type: NetworkType,
    tier: Tier,
    positions: impl IntoIterator<Item = GridPos>,
) {
    for pos in positions {
        world.place_pipe(network_type, pos, tier);
        networks.on_pipe_added(&*world, pos);
    }
}

/// Configure the container above pipe `x` as an endpoint.
pub fn attach(state: &mut NetworkState, x: i32, data: EndpointData) {
    state.set_endpoint(above_side(x), data);
}

/// Configure a filter on the container above pipe `x`.
pub fn filter_above(state: &mut NetworkState, x: i32, filter: FilterData) {
    state.set_filter(above_side(x), filter);
}

/// Tick `state` for `steps` steps, advancing the world clock after each.
pub fn run_steps(world: &mut TestWorld, state: &mut NetworkState, steps: u64) -> Vec<StepReport> {
    (0..steps)
        .map(|_| {
            let report = state.on_step_end(world);
            world.advance();
            report
        })
        .collect()
}
