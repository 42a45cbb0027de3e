//! Host-facing entry points: one [`NetworkState`] per network type, driven
//! from the host's step and block-change callbacks.

use tracing::debug;

use crate::config::{ConfigError, TransferConfig};
use crate::event::{NetworkEvent, StepReport};
use crate::grid::GridPos;
use crate::id::NetworkType;
use crate::state::NetworkState;
use crate::world::{Block, World};

/// The three per-type network registries of one world.
#[derive(Debug, Clone)]
pub struct TransportNetworks {
    energy: NetworkState,
    fluid: NetworkState,
    item: NetworkState,
}

impl TransportNetworks {
    /// Validate `config` and create empty registries.
    pub fn new(config: TransferConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            energy: NetworkState::new(NetworkType::Energy, config.clone()),
            fluid: NetworkState::new(NetworkType::Fluid, config.clone()),
            item: NetworkState::new(NetworkType::Item, config),
        })
    }

    pub fn state(&self, network_type: NetworkType) -> &NetworkState {
        match network_type {
            NetworkType::Energy => &self.energy,
            NetworkType::Fluid => &self.fluid,
            NetworkType::Item => &self.item,
        }
    }

    pub fn state_mut(&mut self, network_type: NetworkType) -> &mut NetworkState {
        match network_type {
            NetworkType::Energy => &mut self.energy,
            NetworkType::Fluid => &mut self.fluid,
            NetworkType::Item => &mut self.item,
        }
    }

    /// End-of-step callback. Energy ticks first, then fluid, then items.
    pub fn on_step_end(&mut self, world: &mut dyn World) -> Vec<StepReport> {
        NetworkType::all()
            .into_iter()
            .map(|ty| self.state_mut(ty).on_step_end(&mut *world))
            .collect()
    }

    /// A block at `pos` became loaded. Pipes are reconciled on the next
    /// step; any other block may be a container, so adjacent pipes rescan.
    pub fn on_entity_load(&mut self, world: &dyn World, pos: GridPos) {
        match world.block_at(pos) {
            Block::Pipe { network_type, .. } => self.state_mut(network_type).queue_update(pos),
            Block::Other => self.on_container_changed(pos),
        }
    }

    /// A pipe was placed at `pos`. Non-pipe blocks are ignored.
    pub fn on_pipe_added(&mut self, world: &dyn World, pos: GridPos) -> Vec<NetworkEvent> {
        match world.block_at(pos) {
            Block::Pipe { network_type, .. } => {
                self.state_mut(network_type).on_pipe_added(world, pos)
            }
            Block::Other => Vec::new(),
        }
    }

    /// A pipe of `network_type` was broken at `pos`.
    pub fn on_pipe_removed(&mut self, network_type: NetworkType, pos: GridPos) -> Vec<NetworkEvent> {
        self.state_mut(network_type).on_pipe_removed(pos)
    }

    /// A storage block changed at `pos`; any type's pipes may care.
    pub fn on_container_changed(&mut self, pos: GridPos) {
        for ty in NetworkType::all() {
            self.state_mut(ty).on_container_changed(pos);
        }
    }

    /// World unload: drop every network.
    pub fn clear(&mut self) {
        for ty in NetworkType::all() {
            self.state_mut(ty).clear();
        }
        debug!("transport networks cleared");
    }
}
