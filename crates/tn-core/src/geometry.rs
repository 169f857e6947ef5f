//! Grid geometry
//!
//! Facing directions and the rectangle type used for viewport/AoI math.
//! Maps are byte-addressable; anything outside `0..=255` on either axis is
//! off the map and must be skipped by callers, not clamped.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Cardinal facing direction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum Direction {
    #[default]
    North = 0,
    South = 1,
    East = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit offset for one step in this direction
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Directions perpendicular to this one, used for sidestep fallbacks
    pub fn laterals(self) -> [Direction; 2] {
        match self {
            Direction::North | Direction::South => [Direction::East, Direction::West],
            Direction::East | Direction::West => [Direction::North, Direction::South],
        }
    }

    /// 90 degrees counterclockwise
    pub fn left(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    /// 90 degrees clockwise
    pub fn right(self) -> Direction {
        self.left().opposite()
    }

    /// Facing that points from `(x, y)` toward `(tx, ty)`, preferring the
    /// axis with the larger delta
    pub fn toward(x: i32, y: i32, tx: i32, ty: i32) -> Direction {
        let dx = tx - x;
        let dy = ty - y;
        if dx.abs() > dy.abs() {
            if dx > 0 { Direction::East } else { Direction::West }
        } else if dy > 0 {
            Direction::South
        } else {
            Direction::North
        }
    }
}

/// Axis-aligned tile rectangle (origin + extent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square rect centered on a point with the given half-extent
    pub fn centered(x: i32, y: i32, radius: i32) -> Self {
        Self {
            x: x - radius,
            y: y - radius,
            width: radius * 2 + 1,
            height: radius * 2 + 1,
        }
    }

    /// The viewport rect around a point
    pub fn viewport(x: i32, y: i32) -> Self {
        let half = crate::consts::VIEWPORT_SIZE / 2;
        Self {
            x: x - half,
            y: y - half,
            width: crate::consts::VIEWPORT_SIZE,
            height: crate::consts::VIEWPORT_SIZE,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Chebyshev (king-move) distance between two points
pub fn chebyshev(x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    (x1 - x2).abs().max((y1 - y2).abs())
}

/// Manhattan distance between two points
pub fn manhattan(x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    (x1 - x2).abs() + (y1 - y2).abs()
}

/// Whether a coordinate pair fits on a byte-addressable map
pub fn on_map(x: i32, y: i32) -> bool {
    (0..=255).contains(&x) && (0..=255).contains(&y)
}
