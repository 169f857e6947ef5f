//! Status effects
//!
//! A status definition is read-only data; a `CreatureStatus` is one applied
//! instance living in its owner's concurrent status map, keyed by icon.
//! Application enforces immunity and category exclusivity; the world tick
//! drives expiry and periodic tick effects.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ability::Quantity;
use crate::combat::damage_type::{DamageFlags, DamageType};
use crate::combat::element::Element;
use crate::combat::{self, CombatContext, DamageParams};
use crate::consts::COMA_CATEGORY;
use crate::creature::condition::CreatureCondition;
use crate::creature::stats::StatModifiers;
use crate::creature::{Creature, CreatureId, Immunity};
use crate::world::{StatusEndReason, WorldEvent};

/// Damage dealt by one phase of a status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusDamage {
    pub quantity: Quantity,
    pub damage_type: DamageType,
    pub element: Element,
    pub flags: DamageFlags,
}

/// Effects fired during one phase of a status's lifecycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseEffect {
    pub damage: Option<StatusDamage>,
    pub heal: Option<Quantity>,
    pub set_conditions: CreatureCondition,
    pub unset_conditions: CreatureCondition,
    /// User-facing message sent to the target
    pub message: Option<String>,
}

/// A status effect definition (read-only record)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusDef {
    pub name: String,
    pub icon: u16,
    /// Statuses sharing a category are mutually exclusive per creature
    pub category: String,
    pub duration_secs: f64,
    pub tick_secs: f64,
    /// Bonus-stat deltas held for the lifetime of the status
    pub modifiers: Option<StatModifiers>,
    pub on_apply: PhaseEffect,
    pub on_tick: PhaseEffect,
    pub on_remove: PhaseEffect,
    pub on_expire: PhaseEffect,
}

/// One applied status instance
#[derive(Debug, Clone)]
pub struct CreatureStatus {
    pub def: Arc<StatusDef>,
    pub start: Instant,
    pub duration: Duration,
    pub tick: Duration,
    pub intensity: f64,
    /// Weak reference to the applying creature; resolved per use
    pub source: Option<CreatureId>,
    last_tick: Option<Instant>,
}

impl CreatureStatus {
    pub fn new(
        def: Arc<StatusDef>,
        source: Option<CreatureId>,
        intensity: f64,
        duration_override: Option<f64>,
    ) -> Self {
        let duration = Duration::from_secs_f64(duration_override.unwrap_or(def.duration_secs));
        let tick = Duration::from_secs_f64(def.tick_secs);
        Self {
            def,
            start: Instant::now(),
            duration,
            tick,
            intensity,
            source,
            last_tick: None,
        }
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.start.elapsed())
    }

    /// Time since the last tick fired, measured from application before the
    /// first tick
    pub fn elapsed_since_tick(&self) -> Duration {
        self.last_tick.unwrap_or(self.start).elapsed()
    }

    pub fn due_for_tick(&self) -> bool {
        !self.tick.is_zero() && self.elapsed_since_tick() >= self.tick
    }
}

/// Result of a status application attempt. Rejections are expected combat
/// outcomes carrying a user-facing message, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Applied,
    Immune(String),
    /// Another status of the same category (or icon) is already active
    Conflict(String),
}

fn is_immune(creature: &Creature, def: &StatusDef) -> bool {
    creature.immunities.iter().any(|immunity| match immunity {
        Immunity::Status(name) => name.eq_ignore_ascii_case(&def.name),
        Immunity::Category(category) => category.eq_ignore_ascii_case(&def.category),
    })
}

/// Apply a status to a creature.
///
/// Rejected when the target is immune by name or category, or when an
/// active status of the same category (or icon slot) already exists.
pub fn apply_status(
    ctx: &mut CombatContext<'_>,
    target: &Arc<Creature>,
    def: Arc<StatusDef>,
    source: Option<&Arc<Creature>>,
    intensity: f64,
    duration_override: Option<f64>,
) -> StatusOutcome {
    if is_immune(target, &def) {
        debug!(creature = %target.name, status = %def.name, "status rejected: immune");
        let message = format!("{} has no effect.", def.name);
        ctx.sink.post(WorldEvent::Message {
            target: target.id,
            text: message.clone(),
        });
        return StatusOutcome::Immune(message);
    }

    if !def.category.is_empty()
        && target
            .statuses()
            .iter()
            .any(|s| s.def.category.eq_ignore_ascii_case(&def.category))
    {
        debug!(creature = %target.name, status = %def.name, "status rejected: category active");
        let message = format!("Another {} effect is already active.", def.category);
        ctx.sink.post(WorldEvent::Message {
            target: target.id,
            text: message.clone(),
        });
        return StatusOutcome::Conflict(message);
    }

    let status = CreatureStatus::new(
        def.clone(),
        source.map(|s| s.id),
        intensity,
        duration_override,
    );
    match target.statuses().entry(def.icon) {
        dashmap::mapref::entry::Entry::Occupied(_) => {
            let message = format!("{} is already in effect.", def.name);
            return StatusOutcome::Conflict(message);
        }
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(status);
        }
    }

    // OnStart: condition changes, stat recompute, then numeric effects
    apply_phase_conditions(target, &def.on_apply);
    if let Some(modifiers) = &def.modifiers {
        target.stats_mut().apply(modifiers, intensity);
    }
    run_phase_numeric(ctx, target, &def, &def.on_apply, source.map(|s| s.id), intensity);

    ctx.sink.post(WorldEvent::StatusApplied {
        target: target.id,
        name: def.name.clone(),
        icon: def.icon,
    });
    StatusOutcome::Applied
}

/// Process one world tick for a status-bearing creature: expire what has
/// run out, fire tick effects that have come due.
pub fn process_status_ticks(ctx: &mut CombatContext<'_>, creature: &Arc<Creature>) {
    let mut expired: Vec<u16> = Vec::new();
    let mut due: Vec<u16> = Vec::new();
    for entry in creature.statuses().iter() {
        if entry.expired() {
            expired.push(*entry.key());
        } else if entry.due_for_tick() {
            due.push(*entry.key());
        }
    }

    for icon in expired {
        remove_status(ctx, creature, icon, StatusEndReason::Expired, true);
    }

    for icon in due {
        // Stamp the tick inside the map, then run effects without holding
        // a map reference; the pipeline may remove statuses reentrantly.
        let ticked = match creature.statuses().get_mut(&icon) {
            Some(mut entry) => {
                entry.last_tick = Some(Instant::now());
                Some((entry.def.clone(), entry.source, entry.intensity))
            }
            None => None,
        };
        if let Some((def, source, intensity)) = ticked {
            run_phase_numeric(ctx, creature, &def, &def.on_tick, source, intensity);
        }
    }
}

/// Remove a status by icon. `run_hooks` fires the remove/expire phase;
/// death processing clears without hooks.
pub fn remove_status(
    ctx: &mut CombatContext<'_>,
    creature: &Arc<Creature>,
    icon: u16,
    reason: StatusEndReason,
    run_hooks: bool,
) -> bool {
    let Some((_, status)) = creature.statuses().remove(&icon) else {
        return false;
    };
    let def = status.def.clone();

    if let Some(modifiers) = &def.modifiers {
        creature.stats_mut().remove(modifiers, status.intensity);
    }

    if run_hooks {
        let phase = match reason {
            StatusEndReason::Expired => &def.on_expire,
            StatusEndReason::Removed => &def.on_remove,
        };
        apply_phase_conditions(creature, phase);
        run_phase_numeric(ctx, creature, &def, phase, status.source, status.intensity);
    }

    ctx.sink.post(WorldEvent::StatusEnded {
        target: creature.id,
        name: def.name.clone(),
        icon,
        reason,
    });

    // A coma running out is the point of no return
    if reason == StatusEndReason::Expired && def.category.eq_ignore_ascii_case(COMA_CATEGORY) {
        combat::handle_death(ctx, creature, None);
    }
    true
}

/// Remove a status by definition name
pub fn remove_status_by_name(
    ctx: &mut CombatContext<'_>,
    creature: &Arc<Creature>,
    name: &str,
) -> bool {
    let icon = creature
        .statuses()
        .iter()
        .find(|s| s.def.name.eq_ignore_ascii_case(name))
        .map(|s| *s.key());
    match icon {
        Some(icon) => remove_status(ctx, creature, icon, StatusEndReason::Removed, true),
        None => false,
    }
}

/// Clear every status without running end hooks; used during death
/// processing. Stat modifiers and phase-applied conditions are still
/// reverted so a revived creature starts clean.
pub fn remove_all_statuses(creature: &Arc<Creature>) {
    let icons: Vec<u16> = creature.statuses().iter().map(|s| *s.key()).collect();
    for icon in icons {
        if let Some((_, status)) = creature.statuses().remove(&icon) {
            if let Some(modifiers) = &status.def.modifiers {
                creature.stats_mut().remove(modifiers, status.intensity);
            }
            let mut condition = creature.condition_mut();
            condition.conditions.remove(status.def.on_apply.set_conditions);
        }
    }
}

fn apply_phase_conditions(creature: &Arc<Creature>, phase: &PhaseEffect) {
    if phase.set_conditions.is_empty() && phase.unset_conditions.is_empty() {
        return;
    }
    let mut condition = creature.condition_mut();
    condition.conditions.insert(phase.set_conditions);
    condition.conditions.remove(phase.unset_conditions);
}

fn run_phase_numeric(
    ctx: &mut CombatContext<'_>,
    target: &Arc<Creature>,
    def: &StatusDef,
    phase: &PhaseEffect,
    source: Option<CreatureId>,
    intensity: f64,
) {
    if let Some(text) = &phase.message {
        ctx.sink.post(WorldEvent::Message {
            target: target.id,
            text: text.clone(),
        });
    }

    let attacker = source.and_then(|id| ctx.world.get(id));
    if let Some(status_damage) = &phase.damage {
        if !status_damage.quantity.is_empty() {
            let amount = status_damage.quantity.roll(ctx.rng) * intensity;
            if amount > 0.0 {
                let outcome = combat::damage::damage(
                    ctx,
                    DamageParams {
                        attacker: attacker.as_ref(),
                        defender: target,
                        amount,
                        element: status_damage.element,
                        damage_type: status_damage.damage_type,
                        flags: status_damage.flags,
                        is_assail: false,
                        suppress_death: false,
                    },
                );
                debug!(
                    status = %def.name,
                    creature = %target.name,
                    hp_loss = outcome.hp_loss,
                    "status damage tick"
                );
            }
        }
    }
    if let Some(heal) = &phase.heal {
        if !heal.is_empty() {
            let amount = heal.roll(ctx.rng) * intensity;
            if amount > 0.0 {
                combat::damage::heal(ctx, attacker.as_ref(), target, amount);
            }
        }
    }
}
