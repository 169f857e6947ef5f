//! Cross-module combat behavior: targeting, the damage pipeline, statuses,
//! and death handling, driven through the public API against the shared
//! test world.

mod common;

use std::sync::Arc;

use common::TestWorld;
use tn_core::CombatRng;
use tn_core::ability::{
    Ability, CastCost, DamageEffect, Intent, IntentFlags, Quantity, Shape, StatusAdd, UseType,
};
use tn_core::combat::damage_type::{DamageFlags, DamageType};
use tn_core::combat::element::Element;
use tn_core::combat::{self, CastError, CombatContext, DamageParams, DamageResult};
use tn_core::creature::{Creature, CreatureId, GroupId, Immunity, LootSpec, MapId};
use tn_core::status::{self, StatusDef, StatusOutcome};
use tn_core::targeting;
use tn_core::world::WorldEvent;

fn ctx<'a>(world: &'a TestWorld, rng: &'a mut CombatRng) -> CombatContext<'a> {
    CombatContext {
        world,
        sink: world,
        hook: None,
        rng,
    }
}

fn set_hp(creature: &Arc<Creature>, hp: u32) {
    let mut stats = creature.stats_mut();
    stats.base_hp = hp as i64;
    stats.hp = hp;
}

fn direct_hit(amount: f64) -> DamageEffect {
    DamageEffect {
        quantity: Quantity::fixed(amount as u32),
        damage_type: DamageType::Direct,
        flags: DamageFlags::empty(),
    }
}

fn hostile_cross(radius: i32, flags: IntentFlags) -> Ability {
    Ability {
        name: "test-cross".into(),
        intents: vec![Intent {
            use_type: UseType::NoTarget,
            flags,
            max_targets: 0,
            shapes: vec![Shape::Cross { radius }],
        }],
        damage: Some(direct_hit(10.0)),
        ..Default::default()
    }
}

// --- Targeting ---

#[test]
fn test_cross_with_self_flag_targets_actor_once() {
    let world = TestWorld::new(30, 30);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    world.add(Creature::monster(CreatureId(2), "rat", MapId(0), 10, 8));
    world.add(Creature::monster(CreatureId(3), "rat", MapId(0), 12, 10));

    let ability = hostile_cross(2, IntentFlags::HOSTILE | IntentFlags::SELF);
    let targets = targeting::resolve_targets(&world, &actor, &ability, None);

    let self_count = targets.iter().filter(|t| t.id == actor.id).count();
    assert_eq!(self_count, 1);
    assert_eq!(targets.len(), 3);
}

#[test]
fn test_hostile_only_never_includes_caster() {
    let world = TestWorld::new(30, 30);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    world.add(Creature::monster(CreatureId(2), "rat", MapId(0), 11, 10));

    let ability = hostile_cross(2, IntentFlags::HOSTILE);
    let targets = targeting::resolve_targets(&world, &actor, &ability, None);

    assert!(targets.iter().all(|t| t.id != actor.id));
    assert_eq!(targets.len(), 1);
}

#[test]
fn test_overlapping_intents_dedupe_first_wins() {
    let world = TestWorld::new(30, 30);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    world.add(Creature::monster(CreatureId(2), "rat", MapId(0), 10, 9));

    let mut ability = hostile_cross(1, IntentFlags::HOSTILE);
    ability.intents.push(Intent {
        use_type: UseType::NoTarget,
        flags: IntentFlags::HOSTILE,
        max_targets: 0,
        shapes: vec![Shape::Square { side: 3 }],
    });
    let targets = targeting::resolve_targets(&world, &actor, &ability, None);
    assert_eq!(targets.len(), 1);
}

#[test]
fn test_player_flag_branches() {
    let world = TestWorld::new(30, 30);
    let mut actor = Creature::player(CreatureId(1), "caster", MapId(0), 10, 10);
    Arc::get_mut(&mut actor).unwrap().group = Some(GroupId(5));
    let actor = world.add(actor);

    let pvp_player = world.add(Creature::player(CreatureId(2), "duelist", MapId(0), 11, 10));
    pvp_player.condition_mut().set_pvp(true);
    let peaceful = world.add(Creature::player(CreatureId(3), "bystander", MapId(0), 9, 10));
    let mut mate = Creature::player(CreatureId(4), "groupmate", MapId(0), 10, 11);
    Arc::get_mut(&mut mate).unwrap().group = Some(GroupId(5));
    let mate = world.add(mate);
    let monster = world.add(Creature::monster(CreatureId(5), "rat", MapId(0), 10, 9));

    let pick = |flags: IntentFlags| {
        let ability = hostile_cross(2, flags);
        targeting::resolve_targets(&world, &actor, &ability, None)
            .iter()
            .map(|t| t.id)
            .collect::<Vec<_>>()
    };

    assert_eq!(pick(IntentFlags::HOSTILE), vec![monster.id]);
    let friendly = pick(IntentFlags::FRIENDLY);
    assert!(friendly.contains(&peaceful.id) && friendly.contains(&mate.id));
    assert!(!friendly.contains(&pvp_player.id) && !friendly.contains(&actor.id));
    assert_eq!(pick(IntentFlags::PVP), vec![pvp_player.id]);
    assert_eq!(pick(IntentFlags::GROUP), vec![mate.id]);
}

#[test]
fn test_max_targets_truncates_raw_candidates() {
    let world = TestWorld::new(30, 30);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    world.add(Creature::monster(CreatureId(2), "a", MapId(0), 10, 9));
    world.add(Creature::monster(CreatureId(3), "b", MapId(0), 10, 11));
    world.add(Creature::monster(CreatureId(4), "c", MapId(0), 9, 10));

    let mut ability = hostile_cross(1, IntentFlags::HOSTILE);
    ability.intents[0].max_targets = 2;
    let targets = targeting::resolve_targets(&world, &actor, &ability, None);
    assert!(targets.len() <= 2);
}

#[test]
fn test_merchants_are_never_targets() {
    let world = TestWorld::new(30, 30);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    world.add(Creature::new(
        CreatureId(2),
        tn_core::creature::CreatureKind::Merchant,
        "shopkeep",
        MapId(0),
        10,
        9,
    ));

    let ability = hostile_cross(2, IntentFlags::HOSTILE | IntentFlags::FRIENDLY);
    let targets = targeting::resolve_targets(&world, &actor, &ability, None);
    assert!(targets.is_empty());
}

#[test]
fn test_charmed_monster_flag_inversion() {
    let world = TestWorld::new(30, 30);
    let actor = world.add(Creature::monster(CreatureId(1), "charmed", MapId(0), 10, 10));
    actor
        .condition_mut()
        .conditions
        .insert(tn_core::creature::condition::CreatureCondition::CHARM);
    let other_monster = world.add(Creature::monster(CreatureId(2), "rat", MapId(0), 11, 10));
    let player = world.add(Creature::player(CreatureId(3), "ally", MapId(0), 9, 10));

    let hostile = hostile_cross(2, IntentFlags::HOSTILE);
    let targets = targeting::resolve_targets(&world, &actor, &hostile, None);
    assert_eq!(
        targets.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![other_monster.id]
    );

    let friendly = hostile_cross(2, IntentFlags::FRIENDLY);
    let targets = targeting::resolve_targets(&world, &actor, &friendly, None);
    assert_eq!(
        targets.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![player.id]
    );
}

#[test]
fn test_directional_target_respects_facing() {
    let world = TestWorld::new(20, 20);
    let actor = world.add(Creature::player(CreatureId(1), "seeker", MapId(0), 5, 5));
    let north = world.add(Creature::monster(CreatureId(2), "rat", MapId(0), 5, 4));

    actor.turn(tn_core::geometry::Direction::North);
    let found = targeting::directional_target(&world, &actor).unwrap();
    assert_eq!(found.id, north.id);

    actor.turn(tn_core::geometry::Direction::South);
    assert!(targeting::directional_target(&world, &actor).is_none());
}

// --- Damage pipeline ---

#[test]
fn test_shield_absorbs_before_hp() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let defender = world.add(Creature::monster(CreatureId(1), "golem", MapId(0), 5, 5));
    set_hp(&defender, 200);
    defender.stats_mut().shield = 100;

    let mut c = ctx(&world, &mut rng);
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: None,
            defender: &defender,
            amount: 60.0,
            element: Element::None,
            damage_type: DamageType::Direct,
            flags: DamageFlags::empty(),
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(outcome.shield_absorbed, 60);
    assert_eq!(outcome.hp_loss, 0);
    assert_eq!(defender.stats().shield, 40);
    assert_eq!(defender.hp(), 200);

    defender.stats_mut().shield = 100;
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: None,
            defender: &defender,
            amount: 150.0,
            element: Element::None,
            damage_type: DamageType::Direct,
            flags: DamageFlags::empty(),
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(outcome.shield_absorbed, 100);
    assert_eq!(outcome.hp_loss, 50);
    assert_eq!(defender.stats().shield, 0);
    assert_eq!(defender.hp(), 150);
}

#[test]
fn test_ac_mitigation_monotonic() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let mut last_loss = u32::MAX;
    for (id, ac) in [(1u32, 0i64), (2, 25), (3, 50)] {
        let defender = world.add(Creature::monster(CreatureId(id), "dummy", MapId(0), 5, 5));
        set_hp(&defender, 10_000);
        defender.stats_mut().base_ac = ac;
        let mut c = ctx(&world, &mut rng);
        let outcome = combat::damage::damage(
            &mut c,
            DamageParams {
                attacker: None,
                defender: &defender,
                amount: 3000.0,
                element: Element::None,
                damage_type: DamageType::Physical,
                flags: DamageFlags::empty(),
                is_assail: false,
                suppress_death: false,
            },
        );
        assert!(
            outcome.hp_loss < last_loss,
            "ac {ac} should mitigate more than the previous step"
        );
        last_loss = outcome.hp_loss;
    }
}

#[test]
fn test_nonlethal_leaves_one_hp() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let defender = world.add(Creature::monster(CreatureId(1), "rat", MapId(0), 5, 5));
    set_hp(&defender, 30);

    let mut c = ctx(&world, &mut rng);
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: None,
            defender: &defender,
            amount: 500.0,
            element: Element::None,
            damage_type: DamageType::Direct,
            flags: DamageFlags::NONLETHAL,
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(outcome.hp_loss, 29);
    assert_eq!(defender.hp(), 1);
    assert!(!outcome.killed);
    assert_eq!(world.death_count(), 0);
}

#[test]
fn test_immortality_vetoes_application() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let defender = world.add(Creature::monster(CreatureId(1), "avatar", MapId(0), 5, 5));
    set_hp(&defender, 100);
    defender.condition_mut().physical_immortal = true;

    let mut c = ctx(&world, &mut rng);
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: None,
            defender: &defender,
            amount: 50.0,
            element: Element::None,
            damage_type: DamageType::Physical,
            flags: DamageFlags::empty(),
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(outcome.result, DamageResult::Immune);
    assert_eq!(defender.hp(), 100);

    // Magic still lands
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: None,
            defender: &defender,
            amount: 50.0,
            element: Element::None,
            damage_type: DamageType::Direct,
            flags: DamageFlags::empty(),
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(outcome.result, DamageResult::Applied);
}

#[test]
fn test_dodge_zeroes_the_hit() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let attacker = world.add(Creature::player(CreatureId(1), "rogue", MapId(0), 4, 5));
    let defender = world.add(Creature::monster(CreatureId(2), "wisp", MapId(0), 5, 5));
    set_hp(&defender, 100);
    defender.stats_mut().base_dodge = 200.0;

    let mut c = ctx(&world, &mut rng);
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: Some(&attacker),
            defender: &defender,
            amount: 50.0,
            element: Element::None,
            damage_type: DamageType::Physical,
            flags: DamageFlags::empty(),
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(outcome.result, DamageResult::Dodged);
    assert_eq!(defender.hp(), 100);
    assert!(
        world
            .events()
            .iter()
            .any(|e| matches!(e, WorldEvent::Dodge { .. }))
    );

    // NoDodge flag disables the stage entirely
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: Some(&attacker),
            defender: &defender,
            amount: 50.0,
            element: Element::None,
            damage_type: DamageType::Physical,
            flags: DamageFlags::NO_DODGE,
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(outcome.result, DamageResult::Applied);
}

#[test]
fn test_negative_dodge_voids_and_backlashes() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let attacker = world.add(Creature::player(CreatureId(1), "knight", MapId(0), 4, 5));
    set_hp(&attacker, 100);
    let defender = world.add(Creature::monster(CreatureId(2), "thorns", MapId(0), 5, 5));
    set_hp(&defender, 100);
    defender.stats_mut().base_dodge = -100.0;

    let mut c = ctx(&world, &mut rng);
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: Some(&attacker),
            defender: &defender,
            amount: 100.0,
            element: Element::None,
            damage_type: DamageType::Physical,
            flags: DamageFlags::empty(),
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(outcome.result, DamageResult::SelfHarm);
    assert_eq!(defender.hp(), 100);
    // A quarter of the post-armor damage lands on the attacker
    assert!(attacker.hp() < 100);
}

#[test]
fn test_monster_tagging_rejects_outsiders() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let first = world.add(Creature::player(CreatureId(1), "tagger", MapId(0), 4, 5));
    let outsider = world.add(Creature::player(CreatureId(2), "thief", MapId(0), 6, 5));
    let monster = world.add(Creature::monster(CreatureId(3), "boar", MapId(0), 5, 5));
    set_hp(&monster, 1000);

    let hit = |c: &mut CombatContext<'_>, attacker: &Arc<Creature>| {
        combat::damage::damage(
            c,
            DamageParams {
                attacker: Some(attacker),
                defender: &monster,
                amount: 50.0,
                element: Element::None,
                damage_type: DamageType::Direct,
                flags: DamageFlags::empty(),
                is_assail: false,
                suppress_death: false,
            },
        )
    };

    let mut c = ctx(&world, &mut rng);
    assert_eq!(hit(&mut c, &first).result, DamageResult::Applied);
    assert_eq!(hit(&mut c, &outsider).result, DamageResult::Rejected);
    // The owner can keep hitting
    assert_eq!(hit(&mut c, &first).result, DamageResult::Applied);
}

#[test]
fn test_damage_feeds_threat() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let attacker = world.add(Creature::player(CreatureId(1), "fighter", MapId(0), 4, 5));
    let monster = world.add(Creature::monster(CreatureId(2), "boar", MapId(0), 5, 5));
    set_hp(&monster, 1000);

    let mut c = ctx(&world, &mut rng);
    combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: Some(&attacker),
            defender: &monster,
            amount: 75.0,
            element: Element::None,
            damage_type: DamageType::Direct,
            flags: DamageFlags::empty(),
            is_assail: true,
            suppress_death: false,
        },
    );
    let ai = monster.ai().unwrap();
    assert_eq!(ai.threat.threat(attacker.id), 75);
    assert_eq!(ai.threat.highest_threat(), Some(attacker.id));
}

#[test]
fn test_lifesteal_and_reflect() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let attacker = world.add(Creature::player(CreatureId(1), "leech", MapId(0), 4, 5));
    set_hp(&attacker, 100);
    attacker.stats_mut().hp = 50;
    attacker.stats_mut().base_life_steal = 0.5;
    let defender = world.add(Creature::monster(CreatureId(2), "mirror", MapId(0), 5, 5));
    set_hp(&defender, 1000);
    defender.stats_mut().base_reflect_physical = 0.2;

    let mut c = ctx(&world, &mut rng);
    let outcome = combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: Some(&attacker),
            defender: &defender,
            amount: 100.0,
            element: Element::None,
            damage_type: DamageType::Physical,
            flags: DamageFlags::empty(),
            is_assail: false,
            suppress_death: false,
        },
    );
    let dealt = outcome.hp_loss;
    assert!(dealt > 0);
    let stolen = (dealt as f64 * 0.5) as u32;
    let reflected = (dealt as f64 * 0.2) as u32;
    assert_eq!(attacker.hp(), 50 + stolen - reflected);
}

// --- Heal pipeline ---

#[test]
fn test_heal_noop_at_full_hp_and_for_immortals() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let target = world.add(Creature::player(CreatureId(1), "full", MapId(0), 5, 5));
    let mut c = ctx(&world, &mut rng);
    assert_eq!(combat::damage::heal(&mut c, None, &target, 50.0), 0);

    let hurt = world.add(Creature::player(CreatureId(2), "hurt", MapId(0), 6, 5));
    set_hp(&hurt, 100);
    hurt.stats_mut().hp = 40;
    hurt.condition_mut().absolute_immortal = true;
    assert_eq!(combat::damage::heal(&mut c, None, &hurt, 50.0), 0);
    assert_eq!(hurt.hp(), 40);
}

#[test]
fn test_heal_modifiers_apply() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let healer = world.add(Creature::player(CreatureId(1), "priest", MapId(0), 5, 5));
    healer.stats_mut().base_outbound_heal_modifier = 0.5;
    let target = world.add(Creature::player(CreatureId(2), "tank", MapId(0), 6, 5));
    set_hp(&target, 1000);
    target.stats_mut().hp = 100;
    target.stats_mut().base_inbound_heal_modifier = 1.0;

    let mut c = ctx(&world, &mut rng);
    // Both modifiers scale the base roll: 100 + 100*1.0 + 100*0.5
    let healed = combat::damage::heal(&mut c, Some(&healer), &target, 100.0);
    assert_eq!(healed, 250);
    assert_eq!(target.hp(), 350);
}

#[test]
fn test_restore_mp_caps_at_maximum() {
    let world = TestWorld::new(20, 20);
    let target = world.add(Creature::player(CreatureId(1), "mage", MapId(0), 5, 5));
    target.stats_mut().mp = 10;

    assert_eq!(combat::damage::restore_mp(&target, 30.0), 30);
    assert_eq!(target.stats().mp, 40);
    // Only the headroom is restored
    assert_eq!(combat::damage::restore_mp(&target, 100.0), 10);
    assert_eq!(target.stats().mp, 50);
    assert_eq!(combat::damage::restore_mp(&target, 5.0), 0);
}

// --- Statuses ---

fn poison_def(name: &str, icon: u16) -> StatusDef {
    StatusDef {
        name: name.into(),
        icon,
        category: "Poison".into(),
        duration_secs: 60.0,
        tick_secs: 5.0,
        ..Default::default()
    }
}

#[test]
fn test_status_category_exclusivity() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let target = world.add(Creature::player(CreatureId(1), "victim", MapId(0), 5, 5));
    let a = Arc::new(poison_def("Weak Venom", 1));
    let b = Arc::new(poison_def("Strong Venom", 2));

    let mut c = ctx(&world, &mut rng);
    assert_eq!(
        status::apply_status(&mut c, &target, a.clone(), None, 1.0, None),
        StatusOutcome::Applied
    );
    assert!(matches!(
        status::apply_status(&mut c, &target, b.clone(), None, 1.0, None),
        StatusOutcome::Conflict(_)
    ));

    assert!(status::remove_status_by_name(&mut c, &target, "Weak Venom"));
    assert_eq!(
        status::apply_status(&mut c, &target, b, None, 1.0, None),
        StatusOutcome::Applied
    );
}

#[test]
fn test_status_immunity_rejects() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let mut target = Creature::monster(CreatureId(1), "construct", MapId(0), 5, 5);
    Arc::get_mut(&mut target).unwrap().immunities = vec![Immunity::Category("Poison".into())];
    let target = world.add(target);

    let mut c = ctx(&world, &mut rng);
    let outcome = status::apply_status(
        &mut c,
        &target,
        Arc::new(poison_def("Weak Venom", 1)),
        None,
        1.0,
        None,
    );
    assert!(matches!(outcome, StatusOutcome::Immune(_)));
    assert_eq!(target.statuses().len(), 0);
}

#[test]
fn test_status_modifiers_apply_and_revert() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let target = world.add(Creature::player(CreatureId(1), "buffed", MapId(0), 5, 5));
    let baseline = target.stats().strength();

    let mut def = StatusDef {
        name: "Battle Fury".into(),
        icon: 9,
        category: "Buff".into(),
        duration_secs: 30.0,
        ..Default::default()
    };
    def.modifiers = Some(tn_core::creature::stats::StatModifiers {
        strength: 10,
        ..Default::default()
    });

    let mut c = ctx(&world, &mut rng);
    status::apply_status(&mut c, &target, Arc::new(def), None, 1.0, None);
    assert_eq!(target.stats().strength(), baseline + 10);

    status::remove_status_by_name(&mut c, &target, "Battle Fury");
    assert_eq!(target.stats().strength(), baseline);
}

// --- Cast orchestration ---

#[test]
fn test_empty_target_set_aborts_before_side_effects() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));

    let ability = Ability {
        name: "srad".into(),
        intents: vec![Intent {
            use_type: UseType::Target,
            flags: IntentFlags::HOSTILE,
            max_targets: 1,
            shapes: vec![],
        }],
        damage: Some(direct_hit(10.0)),
        cost: CastCost { hp: 0, mp: 10 },
        ..Default::default()
    };
    actor.stats_mut().mp = 50;

    let mut c = ctx(&world, &mut rng);
    let result = combat::use_ability(&mut c, &actor, &ability, None);
    assert_eq!(result.unwrap_err(), CastError::NoTargets);
    assert_eq!(actor.stats().mp, 50);
    assert!(world.events().is_empty());
}

#[test]
fn test_cast_cost_deduction_and_shortfall() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    let victim = world.add(Creature::monster(CreatureId(2), "rat", MapId(0), 11, 10));
    set_hp(&victim, 100);

    let mut ability = hostile_cross(1, IntentFlags::HOSTILE);
    ability.cost = CastCost { hp: 0, mp: 30 };

    actor.stats_mut().mp = 20;
    let mut c = ctx(&world, &mut rng);
    assert_eq!(
        combat::use_ability(&mut c, &actor, &ability, None).unwrap_err(),
        CastError::InsufficientResources
    );

    actor.stats_mut().mp = 50;
    let outcome = combat::use_ability(&mut c, &actor, &ability, None).unwrap();
    assert_eq!(outcome.targets, 1);
    assert_eq!(actor.stats().mp, 20);
    assert!(victim.hp() < 100);
}

#[test]
fn test_missing_status_reference_does_not_abort_cast() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    let victim = world.add(Creature::monster(CreatureId(2), "rat", MapId(0), 11, 10));
    set_hp(&victim, 100);

    let mut ability = hostile_cross(1, IntentFlags::HOSTILE);
    ability.add_statuses = vec![StatusAdd {
        name: "does-not-exist".into(),
        intensity: 1.0,
        duration_secs: None,
    }];

    let mut c = ctx(&world, &mut rng);
    let outcome = combat::use_ability(&mut c, &actor, &ability, None).unwrap();
    assert_eq!(outcome.total_damage, 10);
    assert!(victim.hp() < 100);
    assert_eq!(victim.statuses().len(), 0);
}

#[test]
fn test_cast_applies_statuses_to_targets() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    world.add_status(poison_def("Weak Venom", 1));
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    let victim = world.add(Creature::monster(CreatureId(2), "rat", MapId(0), 11, 10));
    set_hp(&victim, 100);

    let mut ability = hostile_cross(1, IntentFlags::HOSTILE);
    ability.add_statuses = vec![StatusAdd {
        name: "Weak Venom".into(),
        intensity: 1.0,
        duration_secs: None,
    }];

    let mut c = ctx(&world, &mut rng);
    combat::use_ability(&mut c, &actor, &ability, None).unwrap();
    assert_eq!(victim.statuses().len(), 1);
    assert!(
        world
            .events()
            .iter()
            .any(|e| matches!(e, WorldEvent::StatusApplied { name, .. } if name == "Weak Venom"))
    );
}

#[test]
fn test_frozen_caster_cannot_cast() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let actor = world.add(Creature::player(CreatureId(1), "caster", MapId(0), 10, 10));
    actor
        .condition_mut()
        .conditions
        .insert(tn_core::creature::condition::CreatureCondition::FREEZE);

    let ability = hostile_cross(1, IntentFlags::HOSTILE);
    let mut c = ctx(&world, &mut rng);
    assert_eq!(
        combat::use_ability(&mut c, &actor, &ability, None).unwrap_err(),
        CastError::CastingProhibited
    );
}

// --- Death handling ---

#[test]
fn test_death_grants_loot_exactly_once() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let killer = world.add(Creature::player(CreatureId(1), "slayer", MapId(0), 4, 5));
    let mut monster = Creature::monster(CreatureId(2), "boar", MapId(0), 5, 5);
    {
        let m = Arc::get_mut(&mut monster).unwrap();
        m.base_loot = Some(LootSpec { xp: 100, gold: 40 });
        m.bonus_loot = Some(LootSpec { xp: 25, gold: 10 });
    }
    let monster = world.add(monster);
    set_hp(&monster, 10);

    let lethal = |c: &mut CombatContext<'_>| {
        combat::damage::damage(
            c,
            DamageParams {
                attacker: Some(&killer),
                defender: &monster,
                amount: 500.0,
                element: Element::None,
                damage_type: DamageType::Direct,
                flags: DamageFlags::empty(),
                is_assail: false,
                suppress_death: false,
            },
        )
    };

    let mut c = ctx(&world, &mut rng);
    let first = lethal(&mut c);
    assert!(first.killed);
    // A racing second lethal hit finds a dead monster
    let second = lethal(&mut c);
    assert_eq!(second.result, DamageResult::AlreadyDead);

    // And a direct double-invocation of the death handler is also safe
    combat::handle_death(&mut c, &monster, Some(&killer));

    assert_eq!(world.death_count(), 1);
    let loot = world
        .events()
        .iter()
        .find_map(|e| match e {
            WorldEvent::Death { loot, first_hitter, .. } => Some((*loot, *first_hitter)),
            _ => None,
        })
        .unwrap();
    assert_eq!(loot.0.xp, 125);
    assert_eq!(loot.0.gold, 50);
    assert_eq!(loot.1, Some(killer.id));
    assert!(!monster.alive());
}

#[test]
fn test_death_clears_statuses_and_threat() {
    let world = TestWorld::new(20, 20);
    let mut rng = CombatRng::new(1);
    let killer = world.add(Creature::player(CreatureId(1), "slayer", MapId(0), 4, 5));
    let monster = world.add(Creature::monster(CreatureId(2), "boar", MapId(0), 5, 5));
    set_hp(&monster, 10);

    let mut c = ctx(&world, &mut rng);
    status::apply_status(
        &mut c,
        &monster,
        Arc::new(poison_def("Weak Venom", 1)),
        None,
        1.0,
        None,
    );
    monster.ai().unwrap().threat.add(killer.id, 50);

    combat::damage::damage(
        &mut c,
        DamageParams {
            attacker: Some(&killer),
            defender: &monster,
            amount: 500.0,
            element: Element::None,
            damage_type: DamageType::Direct,
            flags: DamageFlags::empty(),
            is_assail: false,
            suppress_death: false,
        },
    );
    assert_eq!(monster.statuses().len(), 0);
    assert!(monster.ai().unwrap().threat.is_empty());
}
