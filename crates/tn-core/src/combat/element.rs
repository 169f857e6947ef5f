//! Elements and the interaction table
//!
//! Damage carries an element; defenders have a defensive element. The
//! interaction table scales damage for advantaged/disadvantaged pairings
//! and falls back to 1.0 for anything unlisted.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::rng::CombatRng;

/// Combat element
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum Element {
    #[default]
    None = 0,
    Fire = 1,
    Water = 2,
    Wind = 3,
    Earth = 4,
    Light = 5,
    Dark = 6,
    /// Ability marker only; resolved to a concrete element at cast time
    Random = 7,
}

impl Element {
    const BASE: [Element; 4] = [Element::Fire, Element::Water, Element::Wind, Element::Earth];

    /// Resolve `Random` to a concrete base element; other values pass through
    pub fn resolve(self, rng: &mut CombatRng) -> Element {
        match self {
            Element::Random => *rng
                .pick(&Self::BASE)
                .unwrap_or(&Element::None),
            other => other,
        }
    }
}

/// Multiplier applied to damage for an (attack element, defensive element)
/// pairing. Unlisted pairings are neutral.
pub fn interaction_multiplier(attack: Element, defense: Element) -> f64 {
    use Element::*;
    match (attack, defense) {
        // Attacking into the element you beat
        (Fire, Wind) | (Wind, Earth) | (Earth, Water) | (Water, Fire) => 1.5,
        (Light, Dark) | (Dark, Light) => 1.75,
        // Attacking into the element that beats you
        (Wind, Fire) | (Earth, Wind) | (Water, Earth) | (Fire, Water) => 0.5,
        // Same element resists itself
        (a, d) if a == d && a != None => 0.5,
        _ => 1.0,
    }
}
