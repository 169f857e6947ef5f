//! World collaborator seams
//!
//! The engine never owns the spatial index, ability data, rotations or
//! downstream event handling; it reaches them through these traits. Test
//! fixtures and the real server both implement them.

use std::sync::Arc;

use crate::ability::Ability;
use crate::combat::damage_type::DamageType;
use crate::combat::element::Element;
use crate::creature::{Creature, CreatureId, LootSpec, MapId};
use crate::geometry::Rect;
use crate::status::StatusDef;
use crate::threat::TargetPriority;

/// Spatial and data queries answered by the map/world collaborator
pub trait WorldQuery {
    /// Look up a creature by id; dead or despawned creatures return None
    fn get(&self, id: CreatureId) -> Option<Arc<Creature>>;

    /// All creatures intersecting a tile rectangle on a map
    fn creatures_in(&self, map: MapId, rect: Rect) -> Vec<Arc<Creature>>;

    /// Creatures standing on a single tile
    fn creatures_at(&self, map: MapId, x: i32, y: i32) -> Vec<Arc<Creature>>;

    /// Tile is on the map and not a wall
    fn is_walkable(&self, map: MapId, x: i32, y: i32) -> bool;

    /// Tile is blocked by a creature
    fn is_occupied(&self, map: MapId, x: i32, y: i32) -> bool {
        !self.creatures_at(map, x, y).is_empty()
    }

    /// Connected members of the creature's group, excluding itself
    fn group_members(&self, id: CreatureId) -> Vec<Arc<Creature>> {
        let _ = id;
        Vec::new()
    }

    /// Status definition lookup; None means the data does not exist
    fn status_def(&self, name: &str) -> Option<Arc<StatusDef>>;
}

/// Why a status instance ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEndReason {
    Expired,
    Removed,
}

/// Events the core emits for downstream handling (loot distribution,
/// client notification, logging). The core never performs these itself.
#[derive(Debug, Clone)]
pub enum WorldEvent {
    Damage {
        target: CreatureId,
        attacker: Option<CreatureId>,
        amount: u32,
        element: Element,
        damage_type: DamageType,
    },
    Heal {
        target: CreatureId,
        healer: Option<CreatureId>,
        amount: u32,
    },
    /// Dodge cue for the client
    Dodge {
        target: CreatureId,
        attacker: Option<CreatureId>,
    },
    /// User-facing combat message (rejections, immunities)
    Message {
        target: CreatureId,
        text: String,
    },
    StatusApplied {
        target: CreatureId,
        name: String,
        icon: u16,
    },
    StatusEnded {
        target: CreatureId,
        name: String,
        icon: u16,
        reason: StatusEndReason,
    },
    Death {
        victim: CreatureId,
        killer: Option<CreatureId>,
        first_hitter: Option<CreatureId>,
        loot: LootSpec,
    },
}

/// Consumer of engine events
pub trait EventSink {
    fn post(&self, event: WorldEvent);
}

/// External scripting hooks; a false result vetoes default handling
pub trait ScriptHook {
    fn on_spawn(&self, creature: &Arc<Creature>) -> bool {
        let _ = creature;
        true
    }

    fn on_death(&self, victim: &Arc<Creature>, killer: Option<&Arc<Creature>>) -> bool {
        let _ = (victim, killer);
        true
    }

    fn on_aoi_entry(&self, creature: &Arc<Creature>, entrant: &Arc<Creature>) -> bool {
        let _ = (creature, entrant);
        true
    }
}

/// The next castable a monster's configured rotation offers
#[derive(Debug, Clone)]
pub struct RotationCast {
    pub ability: Arc<Ability>,
    pub priority: TargetPriority,
}

/// Casting-rotation collaborator; owns rotation configuration and ordering
pub trait RotationSelector {
    /// Next castable for this monster, or None to fall back to assail
    fn next_castable(&self, monster: &Arc<Creature>) -> Option<RotationCast>;
}
