//! Creature instances
//!
//! A `Creature` is shared across threads as `Arc<Creature>`. Movement,
//! HP-zero transition and tagging live under the state lock; stats and
//! condition each sit behind their own lock; the active-status map is a
//! concurrent map so tick iteration tolerates point insert/remove from
//! other call sites.

pub mod condition;
pub mod scratch;
pub mod stats;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::geometry::{Direction, chebyshev, on_map};
use crate::monster::MonsterAi;
use crate::status::CreatureStatus;
use crate::world::WorldQuery;
use condition::ConditionInfo;
use scratch::ScratchMap;
use stats::StatInfo;

/// Unique identifier for creature instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureId(pub u32);

impl CreatureId {
    pub const NONE: CreatureId = CreatureId(0);
}

/// Identifier of the map a creature stands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MapId(pub u16);

/// Identifier of a player group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// Closed set of creature kinds; targeting semantics branch on this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum CreatureKind {
    Player,
    Monster,
    /// Non-combatant NPC; never a valid target
    Merchant,
}

/// Status immunity carried by a creature definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Immunity {
    Status(String),
    Category(String),
}

/// XP/gold granted when a monster dies
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LootSpec {
    pub xp: u32,
    pub gold: u32,
}

impl LootSpec {
    /// Combine two optional loot sources by independent coalescing
    pub fn combined(a: Option<&LootSpec>, b: Option<&LootSpec>) -> LootSpec {
        let a = a.copied().unwrap_or_default();
        let b = b.copied().unwrap_or_default();
        LootSpec {
            xp: a.xp.saturating_add(b.xp),
            gold: a.gold.saturating_add(b.gold),
        }
    }
}

/// Mutable position/combat-transition state, guarded by the creature lock
#[derive(Debug, Clone)]
pub struct CreatureState {
    pub x: u8,
    pub y: u8,
    pub direction: Direction,
    pub last_hit: Option<Instant>,
    pub first_hitter: Option<CreatureId>,
    pub last_hitter: Option<CreatureId>,
}

/// A creature in the world
pub struct Creature {
    pub id: CreatureId,
    pub name: String,
    pub map: MapId,
    pub kind: CreatureKind,
    pub group: Option<GroupId>,
    pub immunities: Vec<Immunity>,

    /// Creature-definition loot plus spawn-specific bonus loot
    pub base_loot: Option<LootSpec>,
    pub bonus_loot: Option<LootSpec>,

    state: Mutex<CreatureState>,
    stats: RwLock<StatInfo>,
    condition: RwLock<ConditionInfo>,
    statuses: DashMap<u16, CreatureStatus>,
    scratch: Mutex<ScratchMap>,
    death_processed: AtomicBool,

    /// Present only for monsters
    ai: Option<Mutex<MonsterAi>>,
}

impl std::fmt::Debug for Creature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creature")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Creature {
    pub fn new(
        id: CreatureId,
        kind: CreatureKind,
        name: impl Into<String>,
        map: MapId,
        x: u8,
        y: u8,
    ) -> Arc<Creature> {
        let ai = match kind {
            CreatureKind::Monster => Some(Mutex::new(MonsterAi::new())),
            _ => None,
        };
        Arc::new(Creature {
            id,
            name: name.into(),
            map,
            kind,
            group: None,
            immunities: Vec::new(),
            base_loot: None,
            bonus_loot: None,
            state: Mutex::new(CreatureState {
                x,
                y,
                direction: Direction::South,
                last_hit: None,
                first_hitter: None,
                last_hitter: None,
            }),
            stats: RwLock::new(StatInfo::default()),
            condition: RwLock::new(ConditionInfo::default()),
            statuses: DashMap::new(),
            scratch: Mutex::new(ScratchMap::new()),
            death_processed: AtomicBool::new(false),
            ai,
        })
    }

    pub fn player(id: CreatureId, name: impl Into<String>, map: MapId, x: u8, y: u8) -> Arc<Creature> {
        Self::new(id, CreatureKind::Player, name, map, x, y)
    }

    pub fn monster(id: CreatureId, name: impl Into<String>, map: MapId, x: u8, y: u8) -> Arc<Creature> {
        Self::new(id, CreatureKind::Monster, name, map, x, y)
    }

    pub fn is_monster(&self) -> bool {
        self.kind == CreatureKind::Monster
    }

    pub fn is_player(&self) -> bool {
        self.kind == CreatureKind::Player
    }

    /// Lock accessors. Callers must not hold two different creatures'
    /// state locks at once.
    pub fn state(&self) -> MutexGuard<'_, CreatureState> {
        self.state.lock()
    }

    pub fn stats(&self) -> RwLockReadGuard<'_, StatInfo> {
        self.stats.read()
    }

    pub fn stats_mut(&self) -> RwLockWriteGuard<'_, StatInfo> {
        self.stats.write()
    }

    pub fn condition(&self) -> RwLockReadGuard<'_, ConditionInfo> {
        self.condition.read()
    }

    pub fn condition_mut(&self) -> RwLockWriteGuard<'_, ConditionInfo> {
        self.condition.write()
    }

    pub fn statuses(&self) -> &DashMap<u16, CreatureStatus> {
        &self.statuses
    }

    pub fn scratch(&self) -> MutexGuard<'_, ScratchMap> {
        self.scratch.lock()
    }

    /// The monster AI lock; `None` for players and merchants
    pub fn ai(&self) -> Option<MutexGuard<'_, MonsterAi>> {
        self.ai.as_ref().map(|m| m.lock())
    }

    pub fn position(&self) -> (u8, u8) {
        let state = self.state.lock();
        (state.x, state.y)
    }

    pub fn direction(&self) -> Direction {
        self.state.lock().direction
    }

    pub fn hp(&self) -> u32 {
        self.stats.read().hp
    }

    pub fn alive(&self) -> bool {
        self.condition.read().alive()
    }

    /// Chebyshev distance to another creature
    pub fn distance(&self, other: &Creature) -> i32 {
        let (x1, y1) = self.position();
        let (x2, y2) = other.position();
        chebyshev(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    pub fn is_adjacent(&self, other: &Creature) -> bool {
        self.distance(other) == 1
    }

    pub fn same_group(&self, other: &Creature) -> bool {
        matches!((self.group, other.group), (Some(a), Some(b)) if a == b)
    }

    /// Whether hostile abilities may affect this creature at all
    pub fn is_attackable(&self) -> bool {
        match self.kind {
            CreatureKind::Player => self.condition.read().pvp_enabled(),
            CreatureKind::Monster => true,
            CreatureKind::Merchant => false,
        }
    }

    /// Turn in place
    pub fn turn(&self, direction: Direction) {
        self.state.lock().direction = direction;
    }

    /// Step one tile in the given direction. Fails without moving when the
    /// creature cannot move, the tile is off-map, a wall, or occupied.
    pub fn walk(&self, world: &dyn WorldQuery, direction: Direction) -> bool {
        if !self.condition.read().can_move() {
            return false;
        }
        let mut state = self.state.lock();
        let (dx, dy) = direction.offset();
        let nx = state.x as i32 + dx;
        let ny = state.y as i32 + dy;
        if !on_map(nx, ny) || !world.is_walkable(self.map, nx, ny) {
            return false;
        }
        if world.is_occupied(self.map, nx, ny) {
            return false;
        }
        state.x = nx as u8;
        state.y = ny as u8;
        state.direction = direction;
        true
    }

    /// First caller wins; later callers learn death was already handled
    pub fn mark_death_processed(&self) -> bool {
        !self.death_processed.swap(true, Ordering::SeqCst)
    }

    pub fn death_processed(&self) -> bool {
        self.death_processed.load(Ordering::SeqCst)
    }
}
