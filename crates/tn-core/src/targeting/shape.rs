//! Shape expansion
//!
//! Turns an intent shape into the tile set it covers, relative to an origin
//! and the caster's facing. Tiles may land off-map; the resolver skips
//! those rather than clamping.

use crate::ability::{IntentDirection, Shape};
use crate::consts::VIEWPORT_SIZE;
use crate::geometry::Direction;

/// Resolve a facing-relative intent direction to a cardinal direction.
/// `None` aims where the caster faces, same as `Front`.
pub fn resolve_direction(facing: Direction, direction: IntentDirection) -> Direction {
    match direction {
        IntentDirection::None | IntentDirection::Front => facing,
        IntentDirection::Back => facing.opposite(),
        IntentDirection::Left => facing.left(),
        IntentDirection::Right => facing.right(),
    }
}

/// Expand a shape into covered tiles
pub fn expand(shape: &Shape, origin: (i32, i32), facing: Direction) -> Vec<(i32, i32)> {
    let (ox, oy) = origin;
    match shape {
        Shape::Cross { radius } => {
            let mut tiles = vec![origin];
            for direction in Direction::ALL {
                let (dx, dy) = direction.offset();
                for i in 1..=*radius {
                    tiles.push((ox + dx * i, oy + dy * i));
                }
            }
            tiles
        }
        Shape::Line { direction, length } => {
            let (dx, dy) = resolve_direction(facing, *direction).offset();
            let mut tiles = vec![origin];
            for i in 1..=*length {
                tiles.push((ox + dx * i, oy + dy * i));
            }
            tiles
        }
        Shape::Square { side } => {
            let radius = (side - 1) / 2;
            let mut tiles = Vec::with_capacity((side * side) as usize);
            for y in (oy - radius)..=(oy + radius) {
                for x in (ox - radius)..=(ox + radius) {
                    tiles.push((x, y));
                }
            }
            tiles
        }
        Shape::Tile {
            direction,
            rel_x,
            rel_y,
        } => {
            if *direction != IntentDirection::None {
                let (dx, dy) = resolve_direction(facing, *direction).offset();
                vec![(ox + dx, oy + dy)]
            } else if *rel_x == 0 && *rel_y == 0 {
                // No direction and no offset names no tile at all
                Vec::new()
            } else {
                vec![(ox + rel_x, oy + rel_y)]
            }
        }
        Shape::Cone { direction, radius } => {
            let radius = (*radius).min(VIEWPORT_SIZE / 2);
            let cardinal = resolve_direction(facing, *direction);
            let (dx, dy) = cardinal.offset();
            // Perpendicular strip widens by one tile per side each step out
            let (px, py) = cardinal.laterals()[0].offset();
            let mut tiles = Vec::new();
            for i in 1..=radius {
                let cx = ox + dx * i;
                let cy = oy + dy * i;
                for w in -(i - 1)..=(i - 1) {
                    tiles.push((cx + px * w, cy + py * w));
                }
            }
            tiles
        }
    }
}
