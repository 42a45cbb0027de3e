//! Grid positions, the six block faces, and container attachment points.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A cell on the 3D block grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The adjacent cell on the given side.
    pub fn offset(&self, dir: Direction) -> GridPos {
        let (dx, dy, dz) = dir.offset();
        GridPos::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// All six face-adjacent cells, paired with the side they lie on.
    pub fn neighbors(&self) -> impl Iterator<Item = (Direction, GridPos)> + '_ {
        Direction::all().into_iter().map(move |d| (d, self.offset(d)))
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPos) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

/// The six faces of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// All six directions, in canonical order.
    pub fn all() -> [Direction; 6] {
        [
            Direction::Down,
            Direction::Up,
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East,
        ]
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    /// Unit offset for this direction as `(dx, dy, dz)`.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of directions packed into one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, dir: Direction) -> bool {
        let had = self.contains(dir);
        self.0 |= dir.bit();
        !had
    }

    pub fn remove(&mut self, dir: Direction) -> bool {
        let had = self.contains(dir);
        self.0 &= !dir.bit();
        had
    }

    pub fn contains(&self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate members in [`Direction::all`] order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::all().into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::empty();
        for dir in iter {
            set.insert(dir);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// A container cell as seen from one of its faces.
///
/// Endpoint configuration and filters are keyed by attachment, so one
/// container can behave differently on each side it touches a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attachment {
    pub pos: GridPos,
    pub side: Direction,
}

impl Attachment {
    pub fn new(pos: GridPos, side: Direction) -> Self {
        Self { pos, side }
    }

    /// The container next to `pipe` in direction `dir`, seen from the pipe.
    pub fn facing(pipe: GridPos, dir: Direction) -> Self {
        Self {
            pos: pipe.offset(dir),
            side: dir.opposite(),
        }
    }

    /// The pipe cell this attachment faces.
    pub fn pipe_pos(&self) -> GridPos {
        self.pos.offset(self.side)
    }
}
