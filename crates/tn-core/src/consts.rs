//! Engine constants
//!
//! Tuning values for combat, AI, and stat clamping. These mirror the
//! server's configured defaults; maps and abilities cannot override them.

/// Viewport (area-of-interest) edge length in tiles.
pub const VIEWPORT_SIZE: i32 = 24;

/// Seconds before a monster's first-hitter tag may be reassigned.
pub const MONSTER_TAGGING_TIMEOUT_SECS: u64 = 300;

/// Maximum tiles a path search will expand before giving up.
pub const PATHFIND_MAX_EXPANSIONS: usize = 1024;

/// Distance (Chebyshev) at which a pursuing monster re-checks its path
/// against target movement.
pub const PATH_REFRESH_RANGE: i32 = 5;

/// Status category whose expiry triggers death handling.
pub const COMA_CATEGORY: &str = "coma";

/// Stat clamp ranges
pub const MIN_STAT: i64 = 0;
pub const MAX_STAT: i64 = 255;
pub const MIN_BASE_HPMP: i64 = 1;
pub const MAX_BASE_HPMP: i64 = u32::MAX as i64;
pub const MIN_AC: i64 = -90;
pub const MAX_AC: i64 = 100;
pub const MIN_MR: i64 = -100;
pub const MAX_MR: i64 = 100;
pub const MIN_DMG: i64 = -100;
pub const MAX_DMG: i64 = 255;
pub const MIN_HIT: i64 = 0;
pub const MAX_HIT: i64 = 255;
