use serde::{Deserialize, Serialize};

use crate::grid::{Attachment, Direction, GridPos};

/// A discovered route from a container-bearing pipe to a reachable endpoint.
///
/// `target_pos` is the pipe next to the target container and `target_dir`
/// the side of that pipe the container sits on. `source_dir` is the side the
/// path leaves `source_pos` through, or `target_dir` when the target hangs
/// off the source pipe itself. Nodes are immutable; a network throws its
/// node lists away and rediscovers them whenever its pipe graph changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub source_pos: GridPos,
    pub target_pos: GridPos,
    pub source_dir: Direction,
    pub target_dir: Direction,
    /// Pipe hops between `source_pos` and `target_pos`.
    pub distance: u32,
}

impl Node {
    /// The container this node delivers to or draws from.
    pub fn target(&self) -> Attachment {
        Attachment::facing(self.target_pos, self.target_dir)
    }
}
