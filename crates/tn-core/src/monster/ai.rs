//! Monster decision loop
//!
//! `next_action` fills the action queue once per AI tick; `process_actions`
//! executes exactly one queued action. Both run on the world tick thread
//! and serialize against damage threads on the monster's AI lock, which is
//! never held across a cast or a walk.

use std::sync::Arc;

use tracing::debug;

use crate::combat::{self, CastError, CombatContext};
use crate::consts::PATH_REFRESH_RANGE;
use crate::creature::{Creature, CreatureId};
use crate::geometry::{Direction, chebyshev};
use crate::world::{RotationSelector, WorldQuery};
use super::pathfind;
use super::Action;

/// Decide the next action for a monster and queue it.
pub fn next_action(ctx: &mut CombatContext<'_>, monster: &Arc<Creature>) {
    let hp = monster.hp();
    let (feared, charmed) = {
        let condition = monster.condition();
        (condition.feared(), condition.charmed())
    };
    let Some(mut ai) = monster.ai() else {
        return;
    };

    if hp == 0 {
        ai.clear_queue();
        ai.enqueue(Action::Death);
        return;
    }
    if feared {
        ai.enqueue(Action::Flee);
        return;
    }

    let target_id = if charmed {
        ai.charm_target
    } else {
        ai.threat.highest_threat()
    };
    let target = target_id
        .and_then(|id| ctx.world.get(id))
        .filter(|t| t.alive());

    match target {
        Some(target) => {
            ai.should_wander = false;
            if monster.is_adjacent(&target) {
                ai.enqueue(Action::Attack);
            } else if ctx.rng.coin() {
                ai.enqueue(Action::Move);
            } else {
                // Evaluate casting from range
                ai.enqueue(Action::Attack);
            }
        }
        None => {
            ai.should_wander = true;
            ai.enqueue(Action::Move);
        }
    }
}

/// Execute one queued action, if any.
pub fn process_actions(
    ctx: &mut CombatContext<'_>,
    selector: &dyn RotationSelector,
    monster: &Arc<Creature>,
) {
    let action = match monster.ai() {
        Some(mut ai) => ai.pop_action(),
        None => return,
    };
    let Some(action) = action else {
        return;
    };
    debug!(monster = %monster.name, action = %action, "processing action");

    match action {
        Action::Idle => {}
        Action::Death => {
            if let Some(mut ai) = monster.ai() {
                ai.clear_queue();
            }
        }
        Action::Flee => flee(ctx, monster),
        Action::Attack => attack(ctx, selector, monster),
        Action::Move => do_move(ctx, monster),
    }
}

/// The target the monster currently wants dead
fn current_target(
    world: &dyn WorldQuery,
    monster: &Arc<Creature>,
) -> Option<Arc<Creature>> {
    let charmed = monster.condition().charmed();
    let target_id = {
        let ai = monster.ai()?;
        if charmed {
            ai.charm_target
        } else {
            ai.threat.highest_threat()
        }
    };
    target_id.and_then(|id| world.get(id)).filter(|t| t.alive())
}

/// Turn away from whatever is feared and try to put a tile between them;
/// blocked monsters sidestep, cornered monsters stay put.
fn flee(ctx: &mut CombatContext<'_>, monster: &Arc<Creature>) {
    let source_id = {
        let Some(ai) = monster.ai() else { return };
        ai.flee_from.or_else(|| ai.threat.highest_threat())
    };
    let away = match source_id.and_then(|id| ctx.world.get(id)) {
        Some(source) => {
            let (mx, my) = monster.position();
            let (sx, sy) = source.position();
            Direction::toward(mx as i32, my as i32, sx as i32, sy as i32).opposite()
        }
        None => monster.direction(),
    };
    monster.turn(away);
    if monster.walk(ctx.world, away) {
        return;
    }
    let [a, b] = away.laterals();
    let (first, second) = if ctx.rng.coin() { (a, b) } else { (b, a) };
    if !monster.walk(ctx.world, first) {
        let _ = monster.walk(ctx.world, second);
    }
}

/// Cast from the rotation when it offers something; otherwise melee the
/// current target, closing distance first if needed.
fn attack(ctx: &mut CombatContext<'_>, selector: &dyn RotationSelector, monster: &Arc<Creature>) {
    let rotation = selector.next_castable(monster).filter(|cast| {
        monster
            .ai()
            .is_some_and(|ai| !ai.on_cooldown(&cast.ability))
    });

    if let Some(cast) = rotation.filter(|c| !c.ability.is_assail) {
        let target_id = {
            let Some(ai) = monster.ai() else { return };
            if monster.condition().charmed() {
                ai.charm_target
            } else {
                ai.threat
                    .targets_for(cast.priority, monster.id, ctx.rng)
                    .first()
                    .copied()
            }
        };
        let explicit = target_id.and_then(|id| ctx.world.get(id));
        match combat::use_ability(ctx, monster, &cast.ability, explicit.as_ref()) {
            Ok(_) => {
                if let Some(mut ai) = monster.ai() {
                    ai.mark_used(&cast.ability.name);
                }
            }
            Err(CastError::NoTargets) => {
                debug!(monster = %monster.name, ability = %cast.ability.name, "cast found no targets");
            }
            Err(err) => {
                debug!(monster = %monster.name, ability = %cast.ability.name, %err, "cast failed");
            }
        }
        return;
    }

    // Melee path
    let Some(target) = current_target(ctx.world, monster) else {
        return;
    };

    if monster.condition().disarmed() {
        // Swing nothing, but let the rotation advance past the basic attack
        if let Some(mut ai) = monster.ai() {
            if let Some(assail) = ai.assail.clone() {
                ai.mark_used(&assail.name);
            }
        }
        return;
    }

    if monster.is_adjacent(&target) {
        let (mx, my) = monster.position();
        let (tx, ty) = target.position();
        monster.turn(Direction::toward(mx as i32, my as i32, tx as i32, ty as i32));
        let assail = monster.ai().and_then(|ai| ai.assail.clone());
        if let Some(assail) = assail {
            let _ = combat::use_ability(ctx, monster, &assail, Some(&target));
            if let Some(mut ai) = monster.ai() {
                ai.mark_used(&assail.name);
            }
        }
    } else {
        pursue_step(ctx, monster, &target);
    }
}

/// Move one tile: roam when idle or blind, otherwise follow the pursuit
/// path toward the current target.
fn do_move(ctx: &mut CombatContext<'_>, monster: &Arc<Creature>) {
    if !monster.condition().can_move() {
        return;
    }
    let blinded = monster.condition().blinded();
    let wandering = monster.ai().map(|ai| ai.should_wander).unwrap_or(true);
    if wandering || blinded {
        random_step(ctx, monster);
        return;
    }
    match current_target(ctx.world, monster) {
        Some(target) => pursue_step(ctx, monster, &target),
        None => random_step(ctx, monster),
    }
}

/// Roaming step: about a third of the time just reorient, otherwise walk
/// the way the monster faces.
fn random_step(ctx: &mut CombatContext<'_>, monster: &Arc<Creature>) {
    if ctx.rng.one_in(3) {
        let direction = *ctx
            .rng
            .pick(&Direction::ALL)
            .unwrap_or(&Direction::South);
        monster.turn(direction);
    } else {
        let _ = monster.walk(ctx.world, monster.direction());
    }
}

fn step_blocked(
    world: &dyn WorldQuery,
    monster: &Arc<Creature>,
    target: &Arc<Creature>,
    x: u8,
    y: u8,
) -> bool {
    if !world.is_walkable(monster.map, x as i32, y as i32) {
        return true;
    }
    world
        .creatures_at(monster.map, x as i32, y as i32)
        .iter()
        .any(|c| c.id != monster.id && c.id != target.id)
}

/// Advance one tile along the A* path, recomputing when there is no path,
/// the path is blocked, or the target moved while close by.
fn pursue_step(ctx: &mut CombatContext<'_>, monster: &Arc<Creature>, target: &Arc<Creature>) {
    let (mx, my) = monster.position();
    let (tx, ty) = target.position();

    let needs_recompute = {
        let Some(ai) = monster.ai() else { return };
        match ai.path() {
            None => true,
            Some(path) => match path.next_step_from(mx, my) {
                None => true,
                Some((nx, ny)) => {
                    step_blocked(ctx.world, monster, target, nx, ny)
                        || (chebyshev(mx as i32, my as i32, tx as i32, ty as i32)
                            <= PATH_REFRESH_RANGE
                            && ai.path_target() != Some((tx, ty)))
                }
            },
        }
    };

    if needs_recompute {
        let path = pathfind::find_path(
            ctx.world,
            monster.map,
            (mx, my),
            (tx, ty),
            monster.id,
            target.id,
        );
        if path.is_none() {
            debug!(monster = %monster.name, "no route to target; wandering");
        }
        if let Some(mut ai) = monster.ai() {
            ai.set_path(path, Some((tx, ty)));
        }
    }

    let step = monster
        .ai()
        .and_then(|ai| ai.path().and_then(|p| p.next_step_from(mx, my)));
    match step {
        Some((nx, ny)) => {
            let direction = Direction::toward(mx as i32, my as i32, nx as i32, ny as i32);
            if !monster.walk(ctx.world, direction) {
                // Something moved into the step since the check; replan
                // next tick.
                if let Some(mut ai) = monster.ai() {
                    ai.clear_path();
                }
            }
        }
        None => random_step(ctx, monster),
    }
}

/// AoI entry: hostile players earn a nominal threat entry when the monster
/// is unengaged or when they are grouped with its current top threat.
pub fn on_range_enter(world: &dyn WorldQuery, monster: &Arc<Creature>, entrant: &Arc<Creature>) {
    if !monster.is_monster() || !entrant.is_player() || !entrant.alive() {
        return;
    }
    let Some(mut ai) = monster.ai() else {
        return;
    };
    let grouped_with_top = ai
        .threat
        .highest_threat()
        .and_then(|id| world.get(id))
        .is_some_and(|top| top.same_group(entrant));
    ai.threat.on_range_enter(entrant.id, grouped_with_top);
}

/// AoI exit prunes the entry so stale attackers can never win targeting.
pub fn on_range_exit(monster: &Arc<Creature>, departed: CreatureId) {
    if let Some(mut ai) = monster.ai() {
        ai.threat.on_range_exit(departed);
    }
}

/// Charm-mechanic redirection toward a new threat owner.
pub fn force_threat_change(
    world: &dyn WorldQuery,
    monster: &Arc<Creature>,
    new_threat: &Arc<Creature>,
) {
    let Some(mut ai) = monster.ai() else {
        return;
    };
    let grouped_with_top = ai
        .threat
        .highest_threat()
        .and_then(|id| world.get(id))
        .is_some_and(|top| top.same_group(new_threat));
    ai.threat.force_threat_change(new_threat.id, grouped_with_top);
}
