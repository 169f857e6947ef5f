//! Damage classification
//!
//! Direct damage skips mitigation entirely (scripted/true damage);
//! Physical and Magical run the full pipeline against the matching
//! defensive stats.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// How a quantity of damage interacts with mitigation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum DamageType {
    /// Unmitigated; armor, elements and Dmg% are all skipped
    Direct = 0,
    #[default]
    Physical = 1,
    Magical = 2,
}

bitflags! {
    /// Per-ability switches that disable individual pipeline stages
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct DamageFlags: u16 {
        /// Defender dodge stage is skipped
        const NO_DODGE      = 0x01;
        /// Armor and magic resistance stages are skipped
        const NO_RESISTANCE = 0x02;
        /// Element interaction stage is skipped
        const NO_ELEMENT    = 0x04;
        /// Crit stages are skipped
        const NO_CRIT       = 0x08;
        /// Damage is clamped to leave the defender at 1 HP
        const NONLETHAL     = 0x10;
    }
}
