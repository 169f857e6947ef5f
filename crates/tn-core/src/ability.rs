//! Ability definitions
//!
//! Read-only records describing castables: targeting intents, damage/heal
//! formulas, status lists, costs. The data-loading collaborator
//! deserializes these; the engine never mutates them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::combat::damage_type::{DamageFlags, DamageType};
use crate::combat::element::Element;
use crate::rng::CombatRng;

/// How an intent picks its origin
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum UseType {
    /// Origin is the explicit clicked target
    Target,
    /// Origin is the caster
    #[default]
    NoTarget,
    /// Target chosen through a UI prompt; resolved outside the engine
    Prompt,
}

bitflags::bitflags! {
    /// Relationship filters applied to an intent's candidates
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct IntentFlags: u8 {
        const HOSTILE  = 0x01;
        const FRIENDLY = 0x02;
        const PVP      = 0x04;
        const GROUP    = 0x08;
        /// Re-adds the caster regardless of the other filters
        const SELF     = 0x10;
    }
}

/// Facing-relative direction used by directional shapes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum IntentDirection {
    #[default]
    None,
    Front,
    Back,
    Left,
    Right,
}

/// Spatial pattern gathering candidate tiles around an origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// All four cardinal rays of the given radius, plus the origin
    Cross { radius: i32 },
    /// A ray in one resolved direction, plus the origin
    Line { direction: IntentDirection, length: i32 },
    /// Axis-aligned square centered on the origin; side is odd
    Square { side: i32 },
    /// A single tile, facing-relative or coordinate-relative
    Tile {
        direction: IntentDirection,
        rel_x: i32,
        rel_y: i32,
    },
    /// Widening strip per step of distance in the resolved direction
    Cone { direction: IntentDirection, radius: i32 },
}

/// One targeting rule within an ability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Intent {
    pub use_type: UseType,
    pub flags: IntentFlags,
    /// 0 means unbounded
    pub max_targets: usize,
    pub shapes: Vec<Shape>,
}

/// Fixed or min/max rolled quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quantity {
    pub value: u32,
    pub min: u32,
    pub max: u32,
}

impl Quantity {
    pub fn fixed(value: u32) -> Self {
        Self {
            value,
            min: 0,
            max: 0,
        }
    }

    pub fn range(min: u32, max: u32) -> Self {
        Self { value: 0, min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.min == 0 && self.max == 0
    }

    /// Roll the quantity; fixed values short-circuit
    pub fn roll(&self, rng: &mut CombatRng) -> f64 {
        if self.value != 0 {
            self.value as f64
        } else {
            rng.between(self.min, self.max) as f64
        }
    }
}

/// Damage half of an ability's effects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageEffect {
    pub quantity: Quantity,
    pub damage_type: DamageType,
    pub flags: DamageFlags,
}

/// Heal half of an ability's effects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealEffect {
    pub quantity: Quantity,
}

/// A status the ability applies on hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusAdd {
    pub name: String,
    pub intensity: f64,
    /// Overrides the status definition's duration when set
    pub duration_secs: Option<f64>,
}

/// Resources deducted from the caster before any effect lands
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CastCost {
    pub hp: u32,
    pub mp: u32,
}

impl CastCost {
    pub fn is_free(&self) -> bool {
        self.hp == 0 && self.mp == 0
    }
}

/// A castable skill or spell definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ability {
    pub name: String,
    /// Basic melee attack, as opposed to a learned skill/spell
    pub is_assail: bool,
    pub element: Element,
    pub cooldown_secs: f64,
    pub intents: Vec<Intent>,
    pub damage: Option<DamageEffect>,
    pub heal: Option<HealEffect>,
    pub add_statuses: Vec<StatusAdd>,
    pub remove_statuses: Vec<String>,
    pub cost: CastCost,
}

impl Ability {
    pub fn has_damage(&self) -> bool {
        self.damage
            .as_ref()
            .is_some_and(|d| !d.quantity.is_empty())
    }

    pub fn has_heal(&self) -> bool {
        self.heal.as_ref().is_some_and(|h| !h.quantity.is_empty())
    }
}
