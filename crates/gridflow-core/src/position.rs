//! Block positions and the six axis-aligned directions.

use serde::{Deserialize, Serialize};

/// A block position in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring position one block away in `dir`.
    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.delta();
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
            z: self.z.wrapping_add(dz),
        }
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &Position) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }
}

/// One of the six block faces.
///
/// The declaration order is the fixed scan order used everywhere a
/// deterministic walk over neighbours is needed.
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
    /// All six directions in scan order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Index into per-direction arrays (`0..6`).
    pub fn index(self) -> usize {
        self as usize
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

    /// Unit offset `(dx, dy, dz)`. North is -z, as on a map.
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }
}

/// A set of directions packed into six bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const EMPTY: DirectionSet = DirectionSet(0);
    pub const ALL: DirectionSet = DirectionSet(0b11_1111);

    pub fn only(dir: Direction) -> Self {
        DirectionSet(1 << dir.index())
    }

    pub fn with(self, dir: Direction) -> Self {
        DirectionSet(self.0 | (1 << dir.index()))
    }

    pub fn without(self, dir: Direction) -> Self {
        DirectionSet(self.0 & !(1 << dir.index()))
    }

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & (1 << dir.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate the members in scan order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter().fold(DirectionSet::EMPTY, DirectionSet::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn offset_and_back_returns_origin() {
        let origin = Position::new(4, -2, 9);
        for dir in Direction::ALL {
            assert_eq!(origin.offset(dir).offset(dir.opposite()), origin);
            assert_eq!(origin.manhattan_distance(&origin.offset(dir)), 1);
        }
    }

    #[test]
    fn indices_follow_scan_order() {
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
        }
    }

    #[test]
    fn direction_set_membership() {
        let set = DirectionSet::only(Direction::Down).with(Direction::East);
        assert!(set.contains(Direction::Down));
        assert!(set.contains(Direction::East));
        assert!(!set.contains(Direction::Up));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Direction::Down, Direction::East]
        );
        assert!(set.without(Direction::Down).without(Direction::East).is_empty());
    }

    #[test]
    fn direction_set_from_iter() {
        let set: DirectionSet = Direction::ALL.into_iter().collect();
        assert_eq!(set, DirectionSet::ALL);
    }
}
