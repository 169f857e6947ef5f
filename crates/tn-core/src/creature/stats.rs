//! Creature attributes
//!
//! Every combat attribute is a base + bonus pair; derived values are
//! `base + bonus` clamped to the configured range. Base values come from
//! the creature definition, bonus values from equipment and statuses.
//! `StatInfo` is owned by exactly one creature and guarded by that
//! creature's stats lock.

use hashbrown::HashMap;

use crate::combat::element::Element;
use crate::consts::*;

fn bind(value: i64, min: i64, max: i64) -> i64 {
    value.clamp(min, max)
}

fn ceil_scaled(value: i64, intensity: f64) -> i64 {
    (value as f64 * intensity).ceil() as i64
}

/// Attribute set for a creature
#[derive(Debug, Clone)]
pub struct StatInfo {
    pub level: u8,

    /// Current pools; never exceed the derived maximums
    pub hp: u32,
    pub mp: u32,

    /// Remaining absorption pool, consumed before HP
    pub shield: u32,

    pub base_hp: i64,
    pub bonus_hp: i64,
    pub base_mp: i64,
    pub bonus_mp: i64,
    pub base_str: i64,
    pub bonus_str: i64,
    pub base_int: i64,
    pub bonus_int: i64,
    pub base_wis: i64,
    pub bonus_wis: i64,
    pub base_con: i64,
    pub bonus_con: i64,
    pub base_dex: i64,
    pub bonus_dex: i64,

    /// Percent chance per roll
    pub base_crit: i64,
    pub bonus_crit: i64,
    pub base_magic_crit: i64,
    pub bonus_magic_crit: i64,

    /// Percent points, consumed as `value / 100`
    pub base_dmg: i64,
    pub bonus_dmg: i64,
    pub base_hit: i64,
    pub bonus_hit: i64,
    pub base_ac: i64,
    pub bonus_ac: i64,
    pub base_mr: i64,
    pub bonus_mr: i64,
    pub base_regen: i64,
    pub bonus_regen: i64,

    /// Percent chance; negative values self-harm the attacker instead
    pub base_dodge: f64,
    pub bonus_dodge: f64,
    pub base_magic_dodge: f64,
    pub bonus_magic_dodge: f64,

    /// Fractions of final damage returned to / drained from the attacker
    pub base_reflect_physical: f64,
    pub bonus_reflect_physical: f64,
    pub base_reflect_magical: f64,
    pub bonus_reflect_magical: f64,
    pub base_life_steal: f64,
    pub bonus_life_steal: f64,
    pub base_mana_steal: f64,
    pub bonus_mana_steal: f64,

    /// Additive fractions applied late in the damage/heal pipelines
    pub base_inbound_damage_modifier: f64,
    pub bonus_inbound_damage_modifier: f64,
    pub base_outbound_damage_modifier: f64,
    pub bonus_outbound_damage_modifier: f64,
    pub base_inbound_heal_modifier: f64,
    pub bonus_inbound_heal_modifier: f64,
    pub base_outbound_heal_modifier: f64,
    pub bonus_outbound_heal_modifier: f64,

    /// Fractions of dealt damage redirected to the attacker's MP
    pub base_inbound_damage_to_mp: f64,
    pub bonus_inbound_damage_to_mp: f64,
    pub base_outbound_damage_to_mp: f64,
    pub bonus_outbound_damage_to_mp: f64,

    pub base_extra_xp: f64,
    pub bonus_extra_xp: f64,
    pub base_extra_gold: f64,
    pub bonus_extra_gold: f64,
    pub base_extra_item_find: f64,
    pub bonus_extra_item_find: f64,

    pub base_offensive_element: Element,
    pub base_defensive_element: Element,
    pub offensive_element_override: Element,
    pub defensive_element_override: Element,

    /// Per-element resist/augment percentages (points, additive)
    pub element_resist: HashMap<Element, f64>,
    pub element_augment: HashMap<Element, f64>,
}

impl Default for StatInfo {
    fn default() -> Self {
        Self {
            level: 1,
            hp: 50,
            mp: 50,
            shield: 0,
            base_hp: 50,
            bonus_hp: 0,
            base_mp: 50,
            bonus_mp: 0,
            base_str: 3,
            bonus_str: 0,
            base_int: 3,
            bonus_int: 0,
            base_wis: 3,
            bonus_wis: 0,
            base_con: 3,
            bonus_con: 0,
            base_dex: 3,
            bonus_dex: 0,
            base_crit: 0,
            bonus_crit: 0,
            base_magic_crit: 0,
            bonus_magic_crit: 0,
            base_dmg: 0,
            bonus_dmg: 0,
            // An ordinary attacker neither amplifies nor suppresses
            // defender dodge; see the dodge stage of the pipeline.
            base_hit: 1,
            bonus_hit: 0,
            base_ac: 0,
            bonus_ac: 0,
            base_mr: 0,
            bonus_mr: 0,
            base_regen: 0,
            bonus_regen: 0,
            base_dodge: 0.0,
            bonus_dodge: 0.0,
            base_magic_dodge: 0.0,
            bonus_magic_dodge: 0.0,
            base_reflect_physical: 0.0,
            bonus_reflect_physical: 0.0,
            base_reflect_magical: 0.0,
            bonus_reflect_magical: 0.0,
            base_life_steal: 0.0,
            bonus_life_steal: 0.0,
            base_mana_steal: 0.0,
            bonus_mana_steal: 0.0,
            base_inbound_damage_modifier: 0.0,
            bonus_inbound_damage_modifier: 0.0,
            base_outbound_damage_modifier: 0.0,
            bonus_outbound_damage_modifier: 0.0,
            base_inbound_heal_modifier: 0.0,
            bonus_inbound_heal_modifier: 0.0,
            base_outbound_heal_modifier: 0.0,
            bonus_outbound_heal_modifier: 0.0,
            base_inbound_damage_to_mp: 0.0,
            bonus_inbound_damage_to_mp: 0.0,
            base_outbound_damage_to_mp: 0.0,
            bonus_outbound_damage_to_mp: 0.0,
            base_extra_xp: 0.0,
            bonus_extra_xp: 0.0,
            base_extra_gold: 0.0,
            bonus_extra_gold: 0.0,
            base_extra_item_find: 0.0,
            bonus_extra_item_find: 0.0,
            base_offensive_element: Element::None,
            base_defensive_element: Element::None,
            offensive_element_override: Element::None,
            defensive_element_override: Element::None,
            element_resist: HashMap::new(),
            element_augment: HashMap::new(),
        }
    }
}

impl StatInfo {
    pub fn max_hp(&self) -> u32 {
        bind(self.base_hp + self.bonus_hp, MIN_BASE_HPMP, MAX_BASE_HPMP) as u32
    }

    pub fn max_mp(&self) -> u32 {
        bind(self.base_mp + self.bonus_mp, MIN_BASE_HPMP, MAX_BASE_HPMP) as u32
    }

    pub fn strength(&self) -> u8 {
        bind(self.base_str + self.bonus_str, MIN_STAT, MAX_STAT) as u8
    }

    pub fn intellect(&self) -> u8 {
        bind(self.base_int + self.bonus_int, MIN_STAT, MAX_STAT) as u8
    }

    pub fn wisdom(&self) -> u8 {
        bind(self.base_wis + self.bonus_wis, MIN_STAT, MAX_STAT) as u8
    }

    pub fn constitution(&self) -> u8 {
        bind(self.base_con + self.bonus_con, MIN_STAT, MAX_STAT) as u8
    }

    pub fn dexterity(&self) -> u8 {
        bind(self.base_dex + self.bonus_dex, MIN_STAT, MAX_STAT) as u8
    }

    /// Percent chance of a physical critical hit
    pub fn crit(&self) -> f64 {
        (self.base_crit + self.bonus_crit).clamp(0, 100) as f64
    }

    /// Percent chance of a magical critical hit
    pub fn magic_crit(&self) -> f64 {
        (self.base_magic_crit + self.bonus_magic_crit).clamp(0, 100) as f64
    }

    /// Outbound damage bonus as a fraction (Dmg 25 == +25%)
    pub fn dmg_modifier(&self) -> f64 {
        bind(self.base_dmg + self.bonus_dmg, MIN_DMG, MAX_DMG) as f64 / 100.0
    }

    /// Hit factor multiplied into defender dodge rolls
    pub fn hit(&self) -> f64 {
        bind(self.base_hit + self.bonus_hit, MIN_HIT, MAX_HIT) as f64
    }

    /// Armor class; higher mitigates more, with a small level floor
    pub fn ac(&self) -> i64 {
        bind(
            self.level as i64 / 3 + self.base_ac + self.bonus_ac,
            MIN_AC,
            MAX_AC,
        )
    }

    /// Magic resistance as a signed fraction added to incoming magical
    /// damage; negative values resist
    pub fn mr_modifier(&self) -> f64 {
        bind(self.base_mr + self.bonus_mr, MIN_MR, MAX_MR) as f64 / 100.0
    }

    pub fn regen(&self) -> i64 {
        self.base_regen + self.bonus_regen
    }

    pub fn dodge(&self) -> f64 {
        self.base_dodge + self.bonus_dodge
    }

    pub fn magic_dodge(&self) -> f64 {
        self.base_magic_dodge + self.bonus_magic_dodge
    }

    pub fn reflect_physical(&self) -> f64 {
        self.base_reflect_physical + self.bonus_reflect_physical
    }

    pub fn reflect_magical(&self) -> f64 {
        self.base_reflect_magical + self.bonus_reflect_magical
    }

    pub fn life_steal(&self) -> f64 {
        self.base_life_steal + self.bonus_life_steal
    }

    pub fn mana_steal(&self) -> f64 {
        self.base_mana_steal + self.bonus_mana_steal
    }

    pub fn inbound_damage_modifier(&self) -> f64 {
        self.base_inbound_damage_modifier + self.bonus_inbound_damage_modifier
    }

    pub fn outbound_damage_modifier(&self) -> f64 {
        self.base_outbound_damage_modifier + self.bonus_outbound_damage_modifier
    }

    pub fn inbound_heal_modifier(&self) -> f64 {
        self.base_inbound_heal_modifier + self.bonus_inbound_heal_modifier
    }

    pub fn outbound_heal_modifier(&self) -> f64 {
        self.base_outbound_heal_modifier + self.bonus_outbound_heal_modifier
    }

    pub fn inbound_damage_to_mp(&self) -> f64 {
        self.base_inbound_damage_to_mp + self.bonus_inbound_damage_to_mp
    }

    pub fn outbound_damage_to_mp(&self) -> f64 {
        self.base_outbound_damage_to_mp + self.bonus_outbound_damage_to_mp
    }

    pub fn extra_xp(&self) -> f64 {
        self.base_extra_xp + self.bonus_extra_xp
    }

    pub fn extra_gold(&self) -> f64 {
        self.base_extra_gold + self.bonus_extra_gold
    }

    pub fn extra_item_find(&self) -> f64 {
        self.base_extra_item_find + self.bonus_extra_item_find
    }

    /// Element used for outgoing damage; an override (status-granted) wins
    /// over the creature's base element
    pub fn offensive_element(&self) -> Element {
        if self.offensive_element_override != Element::None {
            self.offensive_element_override
        } else {
            self.base_offensive_element
        }
    }

    /// Element used for incoming damage interaction
    pub fn defensive_element(&self) -> Element {
        if self.defensive_element_override != Element::None {
            self.defensive_element_override
        } else {
            self.base_defensive_element
        }
    }

    /// Percent resistance against a specific incoming element
    pub fn element_resist(&self, element: Element) -> f64 {
        self.element_resist.get(&element).copied().unwrap_or(0.0)
    }

    /// Percent augmentation for a specific outgoing element
    pub fn element_augment(&self, element: Element) -> f64 {
        self.element_augment.get(&element).copied().unwrap_or(0.0)
    }

    /// Apply a modifier set (equipment or status), scaled by intensity.
    /// Only bonus fields are touched; current pools are re-clamped.
    pub fn apply(&mut self, m: &StatModifiers, intensity: f64) {
        self.bonus_hp += ceil_scaled(m.hp, intensity);
        self.bonus_mp += ceil_scaled(m.mp, intensity);
        self.bonus_str += ceil_scaled(m.strength, intensity);
        self.bonus_int += ceil_scaled(m.intellect, intensity);
        self.bonus_wis += ceil_scaled(m.wisdom, intensity);
        self.bonus_con += ceil_scaled(m.constitution, intensity);
        self.bonus_dex += ceil_scaled(m.dexterity, intensity);
        self.bonus_crit += ceil_scaled(m.crit, intensity);
        self.bonus_magic_crit += ceil_scaled(m.magic_crit, intensity);
        self.bonus_dmg += ceil_scaled(m.dmg, intensity);
        self.bonus_hit += ceil_scaled(m.hit, intensity);
        self.bonus_ac += ceil_scaled(m.ac, intensity);
        self.bonus_mr += ceil_scaled(m.mr, intensity);
        self.bonus_regen += ceil_scaled(m.regen, intensity);
        self.bonus_dodge += m.dodge * intensity;
        self.bonus_magic_dodge += m.magic_dodge * intensity;
        self.bonus_reflect_physical += m.reflect_physical * intensity;
        self.bonus_reflect_magical += m.reflect_magical * intensity;
        self.bonus_life_steal += m.life_steal * intensity;
        self.bonus_mana_steal += m.mana_steal * intensity;
        self.bonus_inbound_damage_modifier += m.inbound_damage_modifier * intensity;
        self.bonus_outbound_damage_modifier += m.outbound_damage_modifier * intensity;
        self.bonus_inbound_heal_modifier += m.inbound_heal_modifier * intensity;
        self.bonus_outbound_heal_modifier += m.outbound_heal_modifier * intensity;
        self.bonus_inbound_damage_to_mp += m.inbound_damage_to_mp * intensity;
        self.bonus_outbound_damage_to_mp += m.outbound_damage_to_mp * intensity;
        self.bonus_extra_xp += m.extra_xp * intensity;
        self.bonus_extra_gold += m.extra_gold * intensity;
        self.bonus_extra_item_find += m.extra_item_find * intensity;
        for (element, pct) in &m.element_resist {
            *self.element_resist.entry(*element).or_insert(0.0) += pct * intensity;
        }
        for (element, pct) in &m.element_augment {
            *self.element_augment.entry(*element).or_insert(0.0) += pct * intensity;
        }
        if let Some(element) = m.offensive_element {
            self.offensive_element_override = element;
        }
        if let Some(element) = m.defensive_element {
            self.defensive_element_override = element;
        }
        self.reclamp();
    }

    /// Reverse a previously applied modifier set
    pub fn remove(&mut self, m: &StatModifiers, intensity: f64) {
        self.bonus_hp -= ceil_scaled(m.hp, intensity);
        self.bonus_mp -= ceil_scaled(m.mp, intensity);
        self.bonus_str -= ceil_scaled(m.strength, intensity);
        self.bonus_int -= ceil_scaled(m.intellect, intensity);
        self.bonus_wis -= ceil_scaled(m.wisdom, intensity);
        self.bonus_con -= ceil_scaled(m.constitution, intensity);
        self.bonus_dex -= ceil_scaled(m.dexterity, intensity);
        self.bonus_crit -= ceil_scaled(m.crit, intensity);
        self.bonus_magic_crit -= ceil_scaled(m.magic_crit, intensity);
        self.bonus_dmg -= ceil_scaled(m.dmg, intensity);
        self.bonus_hit -= ceil_scaled(m.hit, intensity);
        self.bonus_ac -= ceil_scaled(m.ac, intensity);
        self.bonus_mr -= ceil_scaled(m.mr, intensity);
        self.bonus_regen -= ceil_scaled(m.regen, intensity);
        self.bonus_dodge -= m.dodge * intensity;
        self.bonus_magic_dodge -= m.magic_dodge * intensity;
        self.bonus_reflect_physical -= m.reflect_physical * intensity;
        self.bonus_reflect_magical -= m.reflect_magical * intensity;
        self.bonus_life_steal -= m.life_steal * intensity;
        self.bonus_mana_steal -= m.mana_steal * intensity;
        self.bonus_inbound_damage_modifier -= m.inbound_damage_modifier * intensity;
        self.bonus_outbound_damage_modifier -= m.outbound_damage_modifier * intensity;
        self.bonus_inbound_heal_modifier -= m.inbound_heal_modifier * intensity;
        self.bonus_outbound_heal_modifier -= m.outbound_heal_modifier * intensity;
        self.bonus_inbound_damage_to_mp -= m.inbound_damage_to_mp * intensity;
        self.bonus_outbound_damage_to_mp -= m.outbound_damage_to_mp * intensity;
        self.bonus_extra_xp -= m.extra_xp * intensity;
        self.bonus_extra_gold -= m.extra_gold * intensity;
        self.bonus_extra_item_find -= m.extra_item_find * intensity;
        for (element, pct) in &m.element_resist {
            *self.element_resist.entry(*element).or_insert(0.0) -= pct * intensity;
        }
        for (element, pct) in &m.element_augment {
            *self.element_augment.entry(*element).or_insert(0.0) -= pct * intensity;
        }
        if m.offensive_element.is_some() {
            self.offensive_element_override = Element::None;
        }
        if m.defensive_element.is_some() {
            self.defensive_element_override = Element::None;
        }
        self.reclamp();
    }

    /// Current pools may not exceed the (possibly shrunken) maximums
    fn reclamp(&mut self) {
        self.hp = self.hp.min(self.max_hp());
        self.mp = self.mp.min(self.max_mp());
    }
}

/// A delta set applied to bonus stats by equipment or a status effect
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StatModifiers {
    pub hp: i64,
    pub mp: i64,
    pub strength: i64,
    pub intellect: i64,
    pub wisdom: i64,
    pub constitution: i64,
    pub dexterity: i64,
    pub crit: i64,
    pub magic_crit: i64,
    pub dmg: i64,
    pub hit: i64,
    pub ac: i64,
    pub mr: i64,
    pub regen: i64,
    pub dodge: f64,
    pub magic_dodge: f64,
    pub reflect_physical: f64,
    pub reflect_magical: f64,
    pub life_steal: f64,
    pub mana_steal: f64,
    pub inbound_damage_modifier: f64,
    pub outbound_damage_modifier: f64,
    pub inbound_heal_modifier: f64,
    pub outbound_heal_modifier: f64,
    pub inbound_damage_to_mp: f64,
    pub outbound_damage_to_mp: f64,
    pub extra_xp: f64,
    pub extra_gold: f64,
    pub extra_item_find: f64,
    pub offensive_element: Option<Element>,
    pub defensive_element: Option<Element>,
    pub element_resist: Vec<(Element, f64)>,
    pub element_augment: Vec<(Element, f64)>,
}
