//! Host-facing interfaces: the world the networks live in and the storages
//! they move resources between.
//!
//! Both traits are object safe. The engine only ever reaches the host
//! through `&dyn World` / `&mut dyn World`, so hosts can back them with
//! whatever block and inventory model they already have.

use crate::grid::{Attachment, GridPos};
use crate::id::{NetworkType, ResourceId, Tier};
use crate::sim::Ticks;

/// What occupies a grid cell, as far as networks care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Pipe { network_type: NetworkType, tier: Tier },
    Other,
}

impl Block {
    /// The pipe tier, if this block is a pipe of the requested type.
    pub fn as_pipe(&self, network_type: NetworkType) -> Option<Tier> {
        match *self {
            Block::Pipe {
                network_type: ty,
                tier,
            } if ty == network_type => Some(tier),
            _ => None,
        }
    }
}

/// A transactional resource container.
///
/// `simulate_*` report what the matching mutating call would do right now
/// without changing anything. The mutating calls return the amount actually
/// moved, which may be less than requested.
pub trait Storage {
    /// Resources currently held that may be extracted, in slot order.
    fn resources(&self) -> Vec<ResourceId>;

    fn simulate_extract(&self, resource: ResourceId, max: u64) -> u64;

    fn extract(&mut self, resource: ResourceId, max: u64) -> u64;

    fn simulate_insert(&self, resource: ResourceId, max: u64) -> u64;

    fn insert(&mut self, resource: ResourceId, max: u64) -> u64;
}

/// The simulation host.
pub trait World {
    /// The current discrete step.
    fn current_step(&self) -> Ticks;

    /// Whether the cell is loaded. Storage at unloaded cells is never touched.
    fn is_loaded(&self, pos: GridPos) -> bool;

    fn block_at(&self, pos: GridPos) -> Block;

    /// The storage of the given network type at an attachment, if any.
    fn storage(&self, network_type: NetworkType, at: Attachment) -> Option<&dyn Storage>;

    fn storage_mut(&mut self, network_type: NetworkType, at: Attachment)
    -> Option<&mut dyn Storage>;
}

/// Move up to `max` units of one resource from `from` to `to`.
///
/// Walks the source's resources in order and performs a single transfer for
/// the first one that passes `filter` and that both sides can move a nonzero
/// amount of. Any amount the destination refuses after extraction is handed
/// back to the source. Returns the amount that arrived at `to`.
pub fn move_resources(
    world: &mut dyn World,
    network_type: NetworkType,
    from: Attachment,
    to: Attachment,
    filter: &dyn Fn(ResourceId) -> bool,
    max: u64,
) -> u64 {
    if max == 0 {
        return 0;
    }
    let Some(source) = world.storage(network_type, from) else {
        return 0;
    };
    let candidates: Vec<(ResourceId, u64)> = source
        .resources()
        .into_iter()
        .filter(|r| filter(*r))
        .map(|r| (r, source.simulate_extract(r, max)))
        .filter(|(_, available)| *available > 0)
        .collect();

    for (resource, available) in candidates {
        let accepted = match world.storage(network_type, to) {
            Some(dest) => dest.simulate_insert(resource, available),
            None => return 0,
        };
        if accepted == 0 {
            continue;
        }

        let extracted = match world.storage_mut(network_type, from) {
            Some(source) => source.extract(resource, accepted),
            None => return 0,
        };
        if extracted == 0 {
            continue;
        }
        let inserted = match world.storage_mut(network_type, to) {
            Some(dest) => dest.insert(resource, extracted),
            None => 0,
        };
        if inserted < extracted {
            if let Some(source) = world.storage_mut(network_type, from) {
                source.insert(resource, extracted - inserted);
            }
        }
        if inserted > 0 {
            return inserted;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Direction;
    use crate::test_utils::*;

    fn left() -> Attachment {
        Attachment::new(GridPos::new(0, 0, 0), Direction::East)
    }

    fn right() -> Attachment {
        Attachment::new(GridPos::new(2, 0, 0), Direction::West)
    }

    fn world_with(source: TestStorage, dest: TestStorage) -> TestWorld {
        let mut world = TestWorld::new();
        world.place_storage(NetworkType::Item, left().pos, source);
        world.place_storage(NetworkType::Item, right().pos, dest);
        world
    }

    #[test]
    fn block_cast_checks_network_type() {
        let pipe = Block::Pipe {
            network_type: NetworkType::Fluid,
            tier: Tier::Mk3,
        };
        assert_eq!(pipe.as_pipe(NetworkType::Fluid), Some(Tier::Mk3));
        assert_eq!(pipe.as_pipe(NetworkType::Item), None);
        assert_eq!(Block::Other.as_pipe(NetworkType::Item), None);
    }

    #[test]
    fn moves_up_to_max() {
        let mut world = world_with(
            TestStorage::with(1000, [(iron(), 100)]),
            TestStorage::new(1000),
        );
        let moved = move_resources(&mut world, NetworkType::Item, left(), right(), &|_| true, 30);
        assert_eq!(moved, 30);
        assert_eq!(world.amount(NetworkType::Item, left().pos, iron()), 70);
        assert_eq!(world.amount(NetworkType::Item, right().pos, iron()), 30);
    }

    #[test]
    fn moves_only_one_resource_per_call() {
        let mut world = world_with(
            TestStorage::with(1000, [(iron(), 5), (copper(), 5)]),
            TestStorage::new(1000),
        );
        let moved = move_resources(&mut world, NetworkType::Item, left(), right(), &|_| true, 64);
        assert_eq!(moved, 5);
        assert_eq!(world.amount(NetworkType::Item, right().pos, iron()), 5);
        assert_eq!(world.amount(NetworkType::Item, right().pos, copper()), 0);
    }

    #[test]
    fn filter_skips_rejected_resources() {
        let mut world = world_with(
            TestStorage::with(1000, [(iron(), 5), (copper(), 5)]),
            TestStorage::new(1000),
        );
        let only_copper = |r: ResourceId| r == copper();
        let moved = move_resources(&mut world, NetworkType::Item, left(), right(), &only_copper, 64);
        assert_eq!(moved, 5);
        assert_eq!(world.amount(NetworkType::Item, right().pos, copper()), 5);
        assert_eq!(world.amount(NetworkType::Item, left().pos, iron()), 5);
    }

    #[test]
    fn respects_destination_capacity() {
        let mut world = world_with(
            TestStorage::with(1000, [(iron(), 100)]),
            TestStorage::new(8),
        );
        let moved = move_resources(&mut world, NetworkType::Item, left(), right(), &|_| true, 64);
        assert_eq!(moved, 8);
        assert_eq!(world.amount(NetworkType::Item, left().pos, iron()), 92);
    }

    #[test]
    fn missing_destination_moves_nothing() {
        let mut world = TestWorld::new();
        world.place_storage(
            NetworkType::Item,
            left().pos,
            TestStorage::with(10, [(iron(), 10)]),
        );
        let moved = move_resources(&mut world, NetworkType::Item, left(), right(), &|_| true, 64);
        assert_eq!(moved, 0);
        assert_eq!(world.amount(NetworkType::Item, left().pos, iron()), 10);
    }

    #[test]
    fn zero_max_is_a_no_op() {
        let mut world = world_with(
            TestStorage::with(10, [(iron(), 10)]),
            TestStorage::new(10),
        );
        assert_eq!(
            move_resources(&mut world, NetworkType::Item, left(), right(), &|_| true, 0),
            0
        );
    }
}
