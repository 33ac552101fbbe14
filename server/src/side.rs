//! Player sides and the four walls of the field.

use pong_shared::vec2::{QuarterTurn, Vec2};

/// A player's slot for the lifetime of a session. Sides are handed out in join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Zero,
    One,
    Two,
    Three,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Zero, Side::One, Side::Two, Side::Three];

    pub fn from_index(index: usize) -> Option<Side> {
        Side::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire representation
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// One of the four walls. Each wall is tested in its canonical frame, where it lies at +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    /// +x
    East,
    /// +y
    North,
    /// -x
    West,
    /// -y
    South,
}

impl Wall {
    /// Rotation that brings this wall onto +x
    pub fn turn(self) -> QuarterTurn {
        match self {
            Wall::East => QuarterTurn::Deg0,
            Wall::North => QuarterTurn::Deg90,
            Wall::West => QuarterTurn::Deg180,
            Wall::South => QuarterTurn::Deg270,
        }
    }

    /// Side whose paddle guards this wall. The first two sides face each other
    /// across the x axis, so the 90 and 180 degree walls swap owners.
    pub fn owner(self) -> Side {
        match self {
            Wall::East => Side::Zero,
            Wall::North => Side::Two,
            Wall::West => Side::One,
            Wall::South => Side::Three,
        }
    }

    /// Order in which walls are resolved. The axis the ball is further along is
    /// handled first so near-corner crossings are attributed to the right wall.
    pub fn collision_order(ball_pos: Vec2) -> [Wall; 4] {
        if ball_pos.x.abs() >= ball_pos.y.abs() {
            [Wall::East, Wall::West, Wall::North, Wall::South]
        } else {
            [Wall::North, Wall::South, Wall::East, Wall::West]
        }
    }
}
