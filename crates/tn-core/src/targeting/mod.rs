//! Target resolution
//!
//! Resolves an ability's intents into a deduplicated, ordered list of
//! affected creatures: shape expansion, kind filtering, and the
//! relationship flags, which branch on the *actor's* kind.

pub mod shape;

use std::sync::Arc;

use hashbrown::HashSet;
use tracing::{debug, error};

use crate::ability::{Ability, Intent, IntentFlags, UseType};
use crate::creature::{Creature, CreatureKind};
use crate::geometry::on_map;
use crate::world::WorldQuery;

/// Resolve every intent of an ability into one target list. Intents are
/// evaluated in order and unioned; the first occurrence of a creature wins.
pub fn resolve_targets(
    world: &dyn WorldQuery,
    actor: &Arc<Creature>,
    ability: &Ability,
    explicit: Option<&Arc<Creature>>,
) -> Vec<Arc<Creature>> {
    let mut resolved: Vec<Arc<Creature>> = Vec::new();

    for intent in &ability.intents {
        resolve_intent(world, actor, ability, intent, explicit, &mut resolved);
    }

    let mut seen = HashSet::new();
    resolved.retain(|c| seen.insert(c.id));
    resolved
}

fn resolve_intent(
    world: &dyn WorldQuery,
    actor: &Arc<Creature>,
    ability: &Ability,
    intent: &Intent,
    explicit: Option<&Arc<Creature>>,
    resolved: &mut Vec<Arc<Creature>>,
) {
    let mut candidates: Vec<Arc<Creature>> = Vec::new();

    let origin = match intent.use_type {
        UseType::Target => match explicit {
            Some(target) => Some(target.clone()),
            None => {
                error!(
                    ability = %ability.name,
                    "intent wants an explicit target but none was passed"
                );
                None
            }
        },
        UseType::NoTarget => {
            if intent.flags.contains(IntentFlags::GROUP) {
                candidates.extend(world.group_members(actor.id));
            }
            Some(actor.clone())
        }
        // Prompt targeting is resolved by the UI collaborator
        UseType::Prompt => None,
    };
    let Some(origin) = origin else {
        return;
    };

    if intent.shapes.is_empty() {
        candidates.push(origin.clone());
    } else {
        let (ox, oy) = origin.position();
        let facing = actor.direction();
        let mut tiles: Vec<(i32, i32)> = Vec::new();
        for s in &intent.shapes {
            tiles.extend(shape::expand(s, (ox as i32, oy as i32), facing));
        }
        let mut seen_tiles = HashSet::new();
        tiles.retain(|t| seen_tiles.insert(*t));
        for (x, y) in tiles {
            if !on_map(x, y) {
                continue;
            }
            // The caster is never a spatial candidate; only the Self flag
            // puts it back.
            candidates.extend(
                world
                    .creatures_at(actor.map, x, y)
                    .into_iter()
                    .filter(|c| c.id != actor.id),
            );
        }
        if candidates.is_empty() {
            debug!(ability = %ability.name, "intent shapes found no candidates");
        }
    }

    if intent.max_targets > 0 {
        candidates.truncate(intent.max_targets);
    }

    // Only players and monsters are ever affected
    candidates.retain(|c| c.kind != CreatureKind::Merchant);

    let charmed = actor.condition().charmed();
    candidates.retain(|t| keep_by_flags(world, actor, t, intent.flags, charmed));

    // Self flag re-adds the actor regardless of the filters above
    if intent.flags.contains(IntentFlags::SELF) {
        candidates.push(actor.clone());
    }

    resolved.extend(candidates);
}

/// Relationship filter. Flags union: a candidate survives if any set flag
/// keeps it.
fn keep_by_flags(
    world: &dyn WorldQuery,
    actor: &Arc<Creature>,
    target: &Arc<Creature>,
    flags: IntentFlags,
    actor_charmed: bool,
) -> bool {
    match actor.kind {
        CreatureKind::Monster if actor_charmed => {
            // A charmed monster fights alongside players
            (flags.contains(IntentFlags::HOSTILE) && target.is_monster())
                || (flags.contains(IntentFlags::FRIENDLY) && target.is_player())
        }
        CreatureKind::Monster => {
            (flags.contains(IntentFlags::HOSTILE) && target.is_player())
                || (flags.contains(IntentFlags::FRIENDLY) && target.is_monster())
        }
        CreatureKind::Player => {
            let is_self = target.id == actor.id;
            (flags.contains(IntentFlags::HOSTILE) && target.is_monster())
                || (flags.contains(IntentFlags::FRIENDLY)
                    && target.is_player()
                    && !target.condition().pvp_enabled()
                    && !is_self)
                || (flags.contains(IntentFlags::PVP)
                    && target.is_player()
                    && target.condition().pvp_enabled()
                    && !is_self)
                || (flags.contains(IntentFlags::GROUP)
                    && world
                        .group_members(actor.id)
                        .iter()
                        .any(|m| m.id == target.id))
        }
        CreatureKind::Merchant => false,
    }
}

/// The creature standing on the tile the actor faces, if any
pub fn directional_target(
    world: &dyn WorldQuery,
    actor: &Arc<Creature>,
) -> Option<Arc<Creature>> {
    let (x, y) = actor.position();
    let (dx, dy) = actor.direction().offset();
    let (tx, ty) = (x as i32 + dx, y as i32 + dy);
    if !on_map(tx, ty) {
        return None;
    }
    world
        .creatures_at(actor.map, tx, ty)
        .into_iter()
        .find(|c| c.kind != CreatureKind::Merchant)
}
