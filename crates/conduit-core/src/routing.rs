//! Routing modes and the cached per-position route queues they order.
//!
//! A route queue is a node list plus a read cursor. Services pop from the
//! cursor; afterwards the cursor is reset to the head so the next cycle
//! walks the same order again. Stable modes sort once per node-list build.
//! Rotating modes reorder on every fetch so no target is always first.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use crate::endpoint::{EndpointData, EndpointIndex, EndpointKind, FilterData};
use crate::grid::{Attachment, GridPos};
use crate::id::NetworkType;
use crate::node::Node;
use crate::rng::SimRng;
use crate::world::World;

// ---------------------------------------------------------------------------
// Routing modes
// ---------------------------------------------------------------------------

/// How an endpoint orders the targets it can reach.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum RoutingMode {
    /// Shortest pipe path first.
    #[default]
    NearestFirst,
    /// Longest pipe path first.
    FurthestFirst,
    /// Start one target later on every service.
    RoundRobin,
    /// Fresh shuffle on every service.
    Random,
    /// Highest target endpoint priority first, then nearest.
    Priority,
}

/// Everything an ordering may consult. Borrowed for the duration of one
/// fetch; the filter is the servicing endpoint's live filter.
pub struct OrderingContext<'a> {
    pub network_type: NetworkType,
    pub endpoint: EndpointKind,
    /// The servicing endpoint's own container.
    pub own: Attachment,
    pub filter: &'a FilterData,
    pub endpoints: &'a EndpointIndex,
    pub world: &'a dyn World,
}

impl OrderingContext<'_> {
    /// Whether a retriever could draw anything from `target` right now.
    /// Outputs push, so for them every target is eligible.
    fn eligible(&self, target: Attachment) -> bool {
        match self.endpoint {
            EndpointKind::Output | EndpointKind::Input => true,
            EndpointKind::Retriever => {
                if !self.world.is_loaded(target.pos) {
                    return false;
                }
                let Some(storage) = self.world.storage(self.network_type, target) else {
                    return false;
                };
                storage
                    .resources()
                    .into_iter()
                    .any(|r| self.filter.matches(r) && storage.simulate_extract(r, 1) > 0)
            }
        }
    }

    fn priority(&self, target: Attachment) -> i32 {
        self.endpoints.endpoint(target).map_or(0, |d| d.priority)
    }
}

impl RoutingMode {
    /// Modes that must be reapplied on every fetch to stay fair.
    pub fn refreshes_every_service(self) -> bool {
        match self {
            RoutingMode::RoundRobin | RoutingMode::Random => true,
            RoutingMode::NearestFirst | RoutingMode::FurthestFirst | RoutingMode::Priority => {
                false
            }
        }
    }

    /// Reorder `nodes` in place according to this mode.
    pub fn order(self, nodes: &mut [Node], ctx: &OrderingContext<'_>, rng: &mut SimRng) {
        match self {
            RoutingMode::NearestFirst => {
                nodes.sort_by_cached_key(|n| (!ctx.eligible(n.target()), n.distance));
            }
            RoutingMode::FurthestFirst => {
                nodes.sort_by_cached_key(|n| (!ctx.eligible(n.target()), Reverse(n.distance)));
            }
            RoutingMode::Priority => {
                nodes.sort_by_cached_key(|n| (Reverse(ctx.priority(n.target())), n.distance));
            }
            RoutingMode::RoundRobin => {
                if nodes.len() > 1 {
                    nodes.rotate_left(1);
                    // Never start on the servicing endpoint's own container.
                    if nodes[0].target() == ctx.own {
                        nodes.rotate_left(1);
                    }
                }
            }
            RoutingMode::Random => rng.shuffle(nodes),
        }
    }
}

// ---------------------------------------------------------------------------
// RouteQueue
// ---------------------------------------------------------------------------

/// A reusable queue: popping advances a cursor instead of dropping items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQueue<T> {
    items: Vec<T>,
    head: usize,
}

impl<T: Copy> RouteQueue<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, head: 0 }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let item = self.items.get(self.head).copied()?;
        self.head += 1;
        Some(item)
    }

    /// True once the cursor has passed every item.
    pub fn is_empty(&self) -> bool {
        self.head >= self.items.len()
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.head)
    }

    pub fn reset_head(&mut self) {
        self.head = 0;
    }

    /// Reorder the full backing list and rewind the cursor.
    pub fn reorder(&mut self, f: impl FnOnce(&mut [T])) {
        f(self.items.as_mut_slice());
        self.head = 0;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

// ---------------------------------------------------------------------------
// RouteCache
// ---------------------------------------------------------------------------

/// Route queues per pipe position and routing mode.
#[derive(Debug, Clone, Default)]
pub struct RouteCache {
    queues: BTreeMap<GridPos, BTreeMap<RoutingMode, RouteQueue<Node>>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the queue for `pos` under `data.mode`, building it from `nodes`
    /// on first use. Rotating modes are reordered on every fetch.
    pub fn queue_for(
        &mut self,
        pos: GridPos,
        data: &EndpointData,
        nodes: &[Node],
        ctx: &OrderingContext<'_>,
        rng: &mut SimRng,
    ) -> &mut RouteQueue<Node> {
        let mode = data.mode;
        match self.queues.entry(pos).or_default().entry(mode) {
            Entry::Occupied(entry) => {
                let queue = entry.into_mut();
                if mode.refreshes_every_service() {
                    queue.reorder(|items| mode.order(items, ctx, rng));
                }
                queue
            }
            Entry::Vacant(entry) => {
                let mut queue = RouteQueue::new(nodes.to_vec());
                queue.reorder(|items| mode.order(items, ctx, rng));
                entry.insert(queue)
            }
        }
    }

    /// Drop every cached queue; the next fetch rebuilds from fresh nodes.
    pub fn clear(&mut self) {
        self.queues.clear();
    }

    pub fn contains(&self, pos: GridPos, mode: RoutingMode) -> bool {
        self.queues
            .get(&pos)
            .is_some_and(|by_mode| by_mode.contains_key(&mode))
    }

    pub fn len(&self) -> usize {
        self.queues.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Direction;
    use crate::test_utils::*;

    fn node(x: i32, distance: u32) -> Node {
        Node {
            source_pos: GridPos::new(0, 0, 0),
            target_pos: GridPos::new(x, 0, 0),
            source_dir: Direction::East,
            target_dir: Direction::Up,
            distance,
        }
    }

    fn targets(nodes: &[Node]) -> Vec<i32> {
        nodes.iter().map(|n| n.target_pos.x).collect()
    }

    struct Fixture {
        world: TestWorld,
        endpoints: EndpointIndex,
        filter: FilterData,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: TestWorld::new(),
                endpoints: EndpointIndex::new(),
                filter: FilterData::default(),
            }
        }

        fn ctx(&self, endpoint: EndpointKind) -> OrderingContext<'_> {
            OrderingContext {
                network_type: NetworkType::Item,
                endpoint,
                own: node(0, 0).target(),
                filter: &self.filter,
                endpoints: &self.endpoints,
                world: &self.world,
            }
        }
    }

    #[test]
    fn queue_pops_then_resets() {
        let mut queue = RouteQueue::new(vec![1, 2, 3]);
        assert_eq!(queue.pop_front(), Some(1));
        assert_eq!(queue.pop_front(), Some(2));
        assert_eq!(queue.remaining(), 1);
        assert_eq!(queue.pop_front(), Some(3));
        assert!(queue.is_empty());
        assert_eq!(queue.pop_front(), None);

        queue.reset_head();
        assert_eq!(queue.remaining(), 3);
        assert_eq!(queue.pop_front(), Some(1));
    }

    #[test]
    fn reorder_rewinds_cursor() {
        let mut queue = RouteQueue::new(vec![3, 1, 2]);
        queue.pop_front();
        queue.reorder(|items| items.sort_unstable());
        assert_eq!(queue.as_slice(), &[1, 2, 3]);
        assert_eq!(queue.pop_front(), Some(1));
    }

    #[test]
    fn nearest_and_furthest_sort_by_distance() {
        let fx = Fixture::new();
        let mut rng = SimRng::new(0);
        let mut nodes = vec![node(1, 5), node(2, 1), node(3, 3)];

        RoutingMode::NearestFirst.order(&mut nodes, &fx.ctx(EndpointKind::Output), &mut rng);
        assert_eq!(targets(&nodes), vec![2, 3, 1]);

        RoutingMode::FurthestFirst.order(&mut nodes, &fx.ctx(EndpointKind::Output), &mut rng);
        assert_eq!(targets(&nodes), vec![1, 3, 2]);
    }

    #[test]
    fn retriever_prefers_targets_with_matching_contents() {
        let mut fx = Fixture::new();
        // Node at x=1 is nearest but holds only copper; x=2 holds iron.
        fx.world.place_storage(
            NetworkType::Item,
            GridPos::new(1, 1, 0),
            TestStorage::with(64, [(copper(), 10)]),
        );
        fx.world.place_storage(
            NetworkType::Item,
            GridPos::new(2, 1, 0),
            TestStorage::with(64, [(iron(), 10)]),
        );
        fx.filter = FilterData::allow([iron()]);

        let mut rng = SimRng::new(0);
        let mut nodes = vec![node(1, 1), node(2, 2)];
        RoutingMode::NearestFirst.order(&mut nodes, &fx.ctx(EndpointKind::Retriever), &mut rng);
        assert_eq!(targets(&nodes), vec![2, 1]);

        // Outputs ignore contents and stay purely distance-ordered.
        RoutingMode::NearestFirst.order(&mut nodes, &fx.ctx(EndpointKind::Output), &mut rng);
        assert_eq!(targets(&nodes), vec![1, 2]);
    }

    #[test]
    fn priority_orders_by_target_priority() {
        let mut fx = Fixture::new();
        let low = node(1, 1);
        let high = node(2, 9);
        fx.endpoints
            .set_endpoint(high.target(), EndpointData::input().with_priority(5));

        let mut rng = SimRng::new(0);
        let mut nodes = vec![low, high, node(3, 2)];
        RoutingMode::Priority.order(&mut nodes, &fx.ctx(EndpointKind::Output), &mut rng);
        assert_eq!(targets(&nodes), vec![2, 1, 3]);
    }

    #[test]
    fn round_robin_rotates() {
        let fx = Fixture::new();
        let mut rng = SimRng::new(0);
        let mut nodes = vec![node(1, 1), node(2, 1), node(3, 1)];
        RoutingMode::RoundRobin.order(&mut nodes, &fx.ctx(EndpointKind::Output), &mut rng);
        assert_eq!(targets(&nodes), vec![2, 3, 1]);

        // The servicing endpoint's own node never comes up first.
        let mut with_own = vec![node(0, 0), node(1, 1), node(2, 2)];
        let mut fronts = Vec::new();
        for _ in 0..4 {
            RoutingMode::RoundRobin.order(&mut with_own, &fx.ctx(EndpointKind::Output), &mut rng);
            fronts.push(with_own[0].target_pos.x);
        }
        assert_eq!(fronts, vec![1, 2, 1, 2]);

        let mut alone = vec![node(0, 0)];
        RoutingMode::RoundRobin.order(&mut alone, &fx.ctx(EndpointKind::Output), &mut rng);
        assert_eq!(targets(&alone), vec![0]);

        let mut empty: Vec<Node> = Vec::new();
        RoutingMode::RoundRobin.order(&mut empty, &fx.ctx(EndpointKind::Output), &mut rng);
        assert!(empty.is_empty());
    }

    #[test]
    fn stable_modes_are_cached_rotating_modes_refresh() {
        let fx = Fixture::new();
        let mut rng = SimRng::new(0);
        let mut cache = RouteCache::new();
        let pos = GridPos::new(0, 0, 0);
        let nodes = vec![node(1, 3), node(2, 1), node(3, 2)];

        let nearest = EndpointData::output(RoutingMode::NearestFirst);
        let first = targets(
            cache
                .queue_for(pos, &nearest, &nodes, &fx.ctx(EndpointKind::Output), &mut rng)
                .as_slice(),
        );
        // A different node list is ignored while the cached queue lives.
        let second = targets(
            cache
                .queue_for(pos, &nearest, &[node(9, 0)], &fx.ctx(EndpointKind::Output), &mut rng)
                .as_slice(),
        );
        assert_eq!(first, vec![2, 3, 1]);
        assert_eq!(first, second);

        let rr = EndpointData::output(RoutingMode::RoundRobin);
        let a = targets(
            cache
                .queue_for(pos, &rr, &nodes, &fx.ctx(EndpointKind::Output), &mut rng)
                .as_slice(),
        );
        let b = targets(
            cache
                .queue_for(pos, &rr, &nodes, &fx.ctx(EndpointKind::Output), &mut rng)
                .as_slice(),
        );
        assert_eq!(a, vec![2, 3, 1]);
        assert_eq!(b, vec![3, 1, 2]);

        assert!(cache.contains(pos, RoutingMode::NearestFirst));
        assert!(cache.contains(pos, RoutingMode::RoundRobin));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn random_mode_is_seeded() {
        let fx = Fixture::new();
        let nodes: Vec<Node> = (0..10).map(|x| node(x, 1)).collect();

        let mut a = nodes.clone();
        let mut b = nodes.clone();
        RoutingMode::Random.order(&mut a, &fx.ctx(EndpointKind::Output), &mut SimRng::new(11));
        RoutingMode::Random.order(&mut b, &fx.ctx(EndpointKind::Output), &mut SimRng::new(11));
        assert_eq!(a, b);
    }
}
