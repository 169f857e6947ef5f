//! Combat orchestration
//!
//! `use_ability` is the single entry point for every cast — player-triggered
//! or AI-driven. It resolves targets, runs the damage or heal pipeline per
//! target, applies status lists, and defers death handling until all
//! targets are processed so multi-target kills resolve uniformly.

pub mod damage;
pub mod damage_type;
pub mod element;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::creature::{Creature, CreatureId, LootSpec};
use crate::rng::CombatRng;
use crate::status;
use crate::targeting;
use crate::world::{EventSink, ScriptHook, WorldEvent, WorldQuery};
use crate::{ability::Ability, geometry::Rect};
pub use damage::{DamageOutcome, DamageParams, DamageResult};
use element::Element;

/// Everything a combat code path needs from the rest of the server
pub struct CombatContext<'a> {
    pub world: &'a dyn WorldQuery,
    pub sink: &'a dyn EventSink,
    pub hook: Option<&'a dyn ScriptHook>,
    pub rng: &'a mut CombatRng,
}

/// Reasons a cast never starts. Per-target outcomes (dodge, immunity,
/// status rejection) are not errors and do not abort the cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CastError {
    #[error("casting is not allowed right now")]
    CastingProhibited,
    #[error("not enough resources to cast")]
    InsufficientResources,
    #[error("no valid targets")]
    NoTargets,
}

/// Summary of one completed cast
#[derive(Debug, Clone, Default)]
pub struct CastOutcome {
    pub targets: usize,
    pub total_damage: u64,
    pub total_healed: u64,
    pub deaths: Vec<CreatureId>,
}

/// Cast an ability. The empty-target abort happens before any side effect;
/// assail casts are allowed to whiff.
pub fn use_ability(
    ctx: &mut CombatContext<'_>,
    actor: &Arc<Creature>,
    ability: &Ability,
    explicit: Option<&Arc<Creature>>,
) -> Result<CastOutcome, CastError> {
    if !actor.alive() || !actor.condition().can_cast() {
        return Err(CastError::CastingProhibited);
    }

    let targets = targeting::resolve_targets(ctx.world, actor, ability, explicit);
    if targets.is_empty() && !ability.is_assail {
        return Err(CastError::NoTargets);
    }

    if !ability.cost.is_free() {
        let mut stats = actor.stats_mut();
        if stats.hp <= ability.cost.hp || stats.mp < ability.cost.mp {
            return Err(CastError::InsufficientResources);
        }
        stats.hp -= ability.cost.hp;
        stats.mp -= ability.cost.mp;
    }

    actor.condition_mut().set_casting(true);
    debug!(
        actor = %actor.name,
        ability = %ability.name,
        targets = targets.len(),
        "casting"
    );

    let mut outcome = CastOutcome {
        targets: targets.len(),
        ..Default::default()
    };
    let mut dead: Vec<Arc<Creature>> = Vec::new();

    for target in &targets {
        // Damage or heal, never both; abilities defining both are data
        // errors resolved in favor of damage.
        if let Some(effect) = ability.damage.as_ref().filter(|d| !d.quantity.is_empty()) {
            let element = resolve_cast_element(ctx, actor, ability.element);
            let amount = effect.quantity.roll(ctx.rng);
            let result = damage::damage(
                ctx,
                DamageParams {
                    attacker: Some(actor),
                    defender: target,
                    amount,
                    element,
                    damage_type: effect.damage_type,
                    flags: effect.flags,
                    is_assail: ability.is_assail,
                    suppress_death: true,
                },
            );
            outcome.total_damage += u64::from(result.hp_loss);
            if result.killed {
                dead.push(target.clone());
            }
            note_hostile_cast(ctx.world, actor, target, ability);
        } else if let Some(effect) = ability.heal.as_ref().filter(|h| !h.quantity.is_empty()) {
            let amount = effect.quantity.roll(ctx.rng);
            let healed = damage::heal(ctx, Some(actor), target, amount);
            outcome.total_healed += u64::from(healed);
            if healed > 0 {
                note_nearby_heal(ctx, actor, target, healed);
            }
        }

        apply_status_lists(ctx, actor, target, ability);
    }

    for victim in &dead {
        handle_death(ctx, victim, Some(actor));
        outcome.deaths.push(victim.id);
    }

    actor.condition_mut().set_casting(false);
    Ok(outcome)
}

/// A `Random`-element cast picks per use; an unelemental cast falls back
/// to the caster's offensive element.
fn resolve_cast_element(
    ctx: &mut CombatContext<'_>,
    actor: &Arc<Creature>,
    element: Element,
) -> Element {
    match element {
        Element::Random => element.resolve(ctx.rng),
        Element::None => actor.stats().offensive_element(),
        fixed => fixed,
    }
}

/// Status add/remove lists. A missing status definition is logged and
/// skipped; the rest of the ability still lands.
fn apply_status_lists(
    ctx: &mut CombatContext<'_>,
    actor: &Arc<Creature>,
    target: &Arc<Creature>,
    ability: &Ability,
) {
    for add in &ability.add_statuses {
        match ctx.world.status_def(&add.name) {
            Some(def) => {
                status::apply_status(
                    ctx,
                    target,
                    def,
                    Some(actor),
                    add.intensity,
                    add.duration_secs,
                );
            }
            None => error!(
                ability = %ability.name,
                status = %add.name,
                "ability references a status that does not exist"
            ),
        }
    }
    for name in &ability.remove_statuses {
        if ctx.world.status_def(name).is_some() {
            status::remove_status_by_name(ctx, target, name);
        } else {
            error!(
                ability = %ability.name,
                status = %name,
                "ability removes a status that does not exist"
            );
        }
    }
}

/// Non-damage aggro bookkeeping for a hostile cast against a monster
fn note_hostile_cast(
    world: &dyn WorldQuery,
    actor: &Arc<Creature>,
    target: &Arc<Creature>,
    ability: &Ability,
) {
    if !target.is_monster() || ability.is_assail {
        return;
    }
    let Some(mut ai) = target.ai() else {
        return;
    };
    let grouped = world
        .group_members(actor.id)
        .iter()
        .any(|m| ai.threat.contains(m.id));
    ai.threat.on_cast(actor.id, 0, grouped);
}

/// Healing an engaged target earns threat with every monster that has the
/// healer (or a groupmate) on its table and the target in view.
fn note_nearby_heal(
    ctx: &mut CombatContext<'_>,
    healer: &Arc<Creature>,
    target: &Arc<Creature>,
    healed: u32,
) {
    if !healer.is_player() {
        return;
    }
    let (x, y) = target.position();
    let viewport = Rect::viewport(x as i32, y as i32);
    for monster in ctx
        .world
        .creatures_in(target.map, viewport)
        .iter()
        .filter(|c| c.is_monster() && c.alive())
    {
        let Some(mut ai) = monster.ai() else {
            continue;
        };
        let grouped = ctx
            .world
            .group_members(healer.id)
            .iter()
            .any(|m| ai.threat.contains(m.id));
        ai.threat.on_nearby_heal(healer.id, healed, grouped);
    }
}

/// Process a death exactly once. A panic inside the hook or event handling
/// is caught and logged, and the death still counts as processed so it can
/// never loop.
pub fn handle_death(
    ctx: &mut CombatContext<'_>,
    victim: &Arc<Creature>,
    killer: Option<&Arc<Creature>>,
) {
    if !victim.mark_death_processed() {
        return;
    }

    let result = catch_unwind(AssertUnwindSafe(|| {
        victim.condition_mut().set_alive(false);
        status::remove_all_statuses(victim);

        if let Some(mut ai) = victim.ai() {
            ai.on_death();
        }

        if let Some(hook) = ctx.hook {
            if !hook.on_death(victim, killer) {
                debug!(victim = %victim.name, "death handling overridden by script");
                return;
            }
        }

        let mut loot = LootSpec::combined(victim.base_loot.as_ref(), victim.bonus_loot.as_ref());
        let first_hitter = victim.state().first_hitter;
        if let Some(first) = first_hitter.and_then(|id| ctx.world.get(id)) {
            let stats = first.stats();
            loot.xp = (loot.xp as f64 * (1.0 + stats.extra_xp())).round() as u32;
            loot.gold = (loot.gold as f64 * (1.0 + stats.extra_gold())).round() as u32;
        }

        ctx.sink.post(WorldEvent::Death {
            victim: victim.id,
            killer: killer.map(|k| k.id),
            first_hitter,
            loot,
        });
    }));

    if result.is_err() {
        warn!(victim = %victim.name, "death processing panicked; marked processed anyway");
    }
}
