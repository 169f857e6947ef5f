//! Damage and heal pipelines
//!
//! `damage` runs a fixed stage order over current stats; any stage may end
//! the pipeline early. All randomness comes through the context RNG so
//! outcomes replay under a fixed seed. The defender's stats are snapshotted
//! once up front; commit happens under the stats write lock so concurrent
//! hits never underflow HP.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::combat::damage_type::{DamageFlags, DamageType};
use crate::combat::element::{Element, interaction_multiplier};
use crate::combat::{CombatContext, handle_death};
use crate::consts::MONSTER_TAGGING_TIMEOUT_SECS;
use crate::creature::Creature;
use crate::world::WorldEvent;

/// Inputs to one damage application
#[derive(Debug)]
pub struct DamageParams<'a> {
    pub attacker: Option<&'a Arc<Creature>>,
    pub defender: &'a Arc<Creature>,
    /// Pre-rolled base amount, before mitigation
    pub amount: f64,
    pub element: Element,
    pub damage_type: DamageType,
    pub flags: DamageFlags,
    /// Basic melee attack; drives threat bookkeeping
    pub is_assail: bool,
    /// Caller handles death itself (e.g. control-message deferral)
    pub suppress_death: bool,
}

/// How the pipeline ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    Applied,
    /// Defender was already dead; nothing happened
    AlreadyDead,
    Dodged,
    /// Non-first-hitter attacker rejected by monster tagging
    Rejected,
    /// Negative dodge voided the attack and hurt the attacker instead
    SelfHarm,
    Immune,
}

/// What one damage application did
#[derive(Debug, Clone, Copy)]
pub struct DamageOutcome {
    pub result: DamageResult,
    pub hp_loss: u32,
    pub shield_absorbed: u32,
    pub killed: bool,
}

impl DamageOutcome {
    fn ended(result: DamageResult) -> Self {
        Self {
            result,
            hp_loss: 0,
            shield_absorbed: 0,
            killed: false,
        }
    }
}

/// Apply damage to a defender through the full mitigation pipeline.
pub fn damage(ctx: &mut CombatContext<'_>, p: DamageParams<'_>) -> DamageOutcome {
    let defender = p.defender;
    let mitigated = !matches!(p.damage_type, DamageType::Direct);

    // Dead monsters take nothing; a queued hit landing after death is a
    // normal race, not an error.
    if defender.is_monster() && !defender.alive() {
        return DamageOutcome::ended(DamageResult::AlreadyDead);
    }

    let mut amount = p.amount;

    // Defender snapshot; commit re-reads under the write lock.
    let (dodge, magic_dodge, ac, mr, defensive_element, resist, inbound_mod, inbound_to_mp) = {
        let stats = defender.stats();
        (
            stats.dodge(),
            stats.magic_dodge(),
            stats.ac(),
            stats.mr_modifier(),
            stats.defensive_element(),
            stats.element_resist(p.element),
            stats.inbound_damage_modifier(),
            stats.inbound_damage_to_mp(),
        )
    };

    // Dodge
    let type_dodge = match p.damage_type {
        DamageType::Physical => dodge,
        DamageType::Magical => magic_dodge,
        DamageType::Direct => 0.0,
    };
    if type_dodge > 0.0 && !p.flags.contains(DamageFlags::NO_DODGE) {
        let hit = p.attacker.map_or(0.0, |a| a.stats().hit());
        if ctx.rng.percent(type_dodge * hit) {
            ctx.sink.post(WorldEvent::Dodge {
                target: defender.id,
                attacker: p.attacker.map(|a| a.id),
            });
            return DamageOutcome::ended(DamageResult::Dodged);
        }
    }

    // Monster tagging: the first player to land a hit owns the kill; only
    // that player and their group may keep hitting until the tag goes stale.
    if let Some(attacker) = p.attacker {
        if attacker.is_player() && defender.is_monster() {
            let mut state = defender.state();
            let stale = state
                .last_hit
                .is_none_or(|t| t.elapsed().as_secs() > MONSTER_TAGGING_TIMEOUT_SECS);
            let first = state.first_hitter.and_then(|id| ctx.world.get(id));
            match first {
                Some(first) if !stale => {
                    if first.id != attacker.id && !first.same_group(attacker) {
                        return DamageOutcome::ended(DamageResult::Rejected);
                    }
                }
                _ => state.first_hitter = Some(attacker.id),
            }
            state.last_hit = Some(Instant::now());
        } else if defender.is_monster() {
            defender.state().last_hit = Some(Instant::now());
        }
    }

    // Armor mitigation
    if mitigated && !p.flags.contains(DamageFlags::NO_RESISTANCE) {
        let armor = ac as f64 + 100.0;
        amount -= amount * armor / (armor + 50.0);
    }

    // Element interaction
    if mitigated && !p.flags.contains(DamageFlags::NO_ELEMENT) {
        amount *= interaction_multiplier(p.element, defensive_element);
    }

    // Attacker Dmg% bonus
    if mitigated {
        if let Some(attacker) = p.attacker {
            amount += amount * attacker.stats().dmg_modifier();
        }
    }

    // Magic resistance
    if p.damage_type == DamageType::Magical && !p.flags.contains(DamageFlags::NO_RESISTANCE) {
        amount += amount * mr;
    }

    // Crits
    if !p.flags.contains(DamageFlags::NO_CRIT) {
        if let Some(attacker) = p.attacker {
            match p.damage_type {
                DamageType::Physical => {
                    if ctx.rng.percent(attacker.stats().crit()) {
                        amount *= 1.5;
                    }
                }
                DamageType::Magical => {
                    if ctx.rng.percent(attacker.stats().magic_crit()) {
                        amount += amount * 2.0;
                    }
                }
                DamageType::Direct => {}
            }
        }
    }

    // Negative dodge: the attack itself is voided and a quarter of it
    // lands on the attacker.
    if type_dodge < 0.0 && ctx.rng.percent(type_dodge.abs()) {
        if let Some(attacker) = p.attacker {
            let backlash = (amount * 0.25).max(0.0) as u32;
            apply_raw(ctx, attacker, backlash, p.suppress_death);
        }
        return DamageOutcome::ended(DamageResult::SelfHarm);
    }

    // Defender elemental resistance, attacker elemental augment
    amount -= amount * resist / 100.0;
    if let Some(attacker) = p.attacker {
        amount += amount * attacker.stats().element_augment(p.element) / 100.0;
    }

    // Inbound/outbound modifiers, both against the same base
    let base = amount;
    amount += base * inbound_mod;
    if let Some(attacker) = p.attacker {
        amount += base * attacker.stats().outbound_damage_modifier();
    }

    // Floor
    if amount < 0.0 {
        amount = 1.0;
    }

    // Immortality vetoes application after all the math
    {
        let condition = defender.condition();
        let immune = condition.invulnerable()
            || condition.absolute_immortal
            || (p.damage_type == DamageType::Physical && condition.physical_immortal)
            || (p.damage_type == DamageType::Magical && condition.magical_immortal);
        if immune {
            return DamageOutcome::ended(DamageResult::Immune);
        }
    }

    // Shield absorption, normalization, and commit under the write lock
    let (hp_loss, shield_absorbed, killed) = {
        let mut stats = defender.stats_mut();
        let absorbed = (stats.shield as f64).min(amount).max(0.0) as u32;
        stats.shield -= absorbed;
        amount -= absorbed as f64;

        let mut normalized = if amount >= u32::MAX as f64 {
            u32::MAX
        } else {
            amount as u32
        };
        if normalized > stats.hp {
            normalized = if p.flags.contains(DamageFlags::NONLETHAL) {
                stats.hp.saturating_sub(1)
            } else {
                stats.hp
            };
        }
        stats.hp -= normalized;
        (normalized, absorbed, stats.hp == 0)
    };

    if let Some(attacker) = p.attacker {
        defender.state().last_hitter = Some(attacker.id);
    }

    ctx.sink.post(WorldEvent::Damage {
        target: defender.id,
        attacker: p.attacker.map(|a| a.id),
        amount: hp_loss,
        element: p.element,
        damage_type: p.damage_type,
    });

    // Aggression: the defender remembers who hurt it
    if defender.is_monster() {
        if let (Some(attacker), Some(mut ai)) = (p.attacker, defender.ai()) {
            ai.threat.increase(attacker.id, hp_loss);
            if p.is_assail {
                ai.threat.note_melee(attacker.id);
            }
        }
    }

    attacker_side_effects(ctx, &p, hp_loss, inbound_to_mp);

    debug!(
        defender = %defender.name,
        hp_loss,
        shield_absorbed,
        killed,
        damage_type = %p.damage_type,
        "damage applied"
    );

    if killed && !p.suppress_death {
        handle_death(ctx, defender, p.attacker);
    }

    DamageOutcome {
        result: DamageResult::Applied,
        hp_loss,
        shield_absorbed,
        killed,
    }
}

/// Reflect, steals, and damage-to-MP redirection. Each is an independent
/// unsigned delta on the attacker, gated on the relevant stat.
fn attacker_side_effects(
    ctx: &mut CombatContext<'_>,
    p: &DamageParams<'_>,
    hp_loss: u32,
    inbound_to_mp: f64,
) {
    let Some(attacker) = p.attacker else {
        return;
    };
    if hp_loss == 0 {
        return;
    }
    let dealt = hp_loss as f64;

    let reflect = {
        let stats = p.defender.stats();
        match p.damage_type {
            DamageType::Physical => stats.reflect_physical(),
            DamageType::Magical => stats.reflect_magical(),
            DamageType::Direct => 0.0,
        }
    };
    if reflect > 0.0 {
        let returned = (dealt * reflect) as u32;
        apply_raw(ctx, attacker, returned, p.suppress_death);
    }

    let (life_steal, mana_steal, outbound_to_mp) = {
        let stats = attacker.stats();
        (
            stats.life_steal(),
            stats.mana_steal(),
            stats.outbound_damage_to_mp(),
        )
    };
    if life_steal > 0.0 {
        let stolen = (dealt * life_steal) as u32;
        let mut stats = attacker.stats_mut();
        stats.hp = stats.max_hp().min(stats.hp.saturating_add(stolen));
    }
    if mana_steal > 0.0 {
        let stolen = (dealt * mana_steal) as u32;
        let mut stats = attacker.stats_mut();
        stats.mp = stats.max_mp().min(stats.mp.saturating_add(stolen));
    }

    let redirect = dealt * inbound_to_mp.max(0.0) + dealt * outbound_to_mp.max(0.0);
    if redirect > 0.0 {
        let mut stats = attacker.stats_mut();
        stats.mp = stats.max_mp().min(stats.mp.saturating_add(redirect as u32));
    }
}

/// Subtract HP without re-entering the pipeline; used for backlash and
/// reflect so a reflect can never reflect again.
fn apply_raw(ctx: &mut CombatContext<'_>, creature: &Arc<Creature>, amount: u32, suppress_death: bool) {
    if amount == 0 {
        return;
    }
    let killed = {
        let mut stats = creature.stats_mut();
        let loss = amount.min(stats.hp);
        stats.hp -= loss;
        stats.hp == 0
    };
    ctx.sink.post(WorldEvent::Damage {
        target: creature.id,
        attacker: None,
        amount,
        element: Element::None,
        damage_type: DamageType::Direct,
    });
    if killed && !suppress_death {
        handle_death(ctx, creature, None);
    }
}

/// Heal a target. Immortal and already-full defenders are no-ops.
pub fn heal(
    ctx: &mut CombatContext<'_>,
    healer: Option<&Arc<Creature>>,
    target: &Arc<Creature>,
    amount: f64,
) -> u32 {
    {
        let condition = target.condition();
        if condition.absolute_immortal || condition.physical_immortal {
            return 0;
        }
    }
    let base = amount;
    let mut amount = amount;
    amount += base * target.stats().inbound_heal_modifier();
    if let Some(healer) = healer {
        amount += base * healer.stats().outbound_heal_modifier();
    }
    if amount <= 0.0 {
        return 0;
    }

    let healed = {
        let mut stats = target.stats_mut();
        if stats.hp == stats.max_hp() {
            return 0;
        }
        let headroom = stats.max_hp() - stats.hp;
        let healed = (amount as u32).min(headroom);
        stats.hp += healed;
        healed
    };

    ctx.sink.post(WorldEvent::Heal {
        target: target.id,
        healer: healer.map(|h| h.id),
        amount: healed,
    });
    healed
}

/// Restore MP outside the heal pipeline (regen ticks, mana potions)
pub fn restore_mp(target: &Arc<Creature>, amount: f64) -> u32 {
    if target.condition().absolute_immortal {
        return 0;
    }
    let mut stats = target.stats_mut();
    if stats.mp == stats.max_mp() || amount <= 0.0 {
        return 0;
    }
    let headroom = stats.max_mp() - stats.mp;
    let restored = (amount as u32).min(headroom);
    stats.mp += restored;
    restored
}
