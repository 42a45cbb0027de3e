use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies one connected pipe network inside a [`NetworkState`](crate::state::NetworkState).
    pub struct NetworkId;
}

/// Identifies a transportable resource (an item kind, a fluid kind, or
/// energy). Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// The family of resource a pipe network carries. Each family has its own
/// independent registry of networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    Energy,
    Fluid,
    Item,
}

impl NetworkType {
    /// All network types, in the order the host ticks them.
    pub fn all() -> [NetworkType; 3] {
        [NetworkType::Energy, NetworkType::Fluid, NetworkType::Item]
    }
}

/// Pipe capability class. Higher tiers move more per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    Mk1,
    Mk2,
    Mk3,
    Mk4,
}

impl Tier {
    pub fn all() -> [Tier; 4] {
        [Tier::Mk1, Tier::Mk2, Tier::Mk3, Tier::Mk4]
    }
}
