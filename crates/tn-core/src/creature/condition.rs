//! Creature condition state
//!
//! Two independent bit-sets: conditions (applied by statuses and combat)
//! and player flags (session-ish state that still gates combat). Derived
//! booleans are pure reads; mutation happens through the owning creature's
//! condition lock.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Conditions a creature can be under, set/unset by status effects
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct CreatureCondition: u32 {
        const FREEZE       = 0x0001;
        const SLEEP        = 0x0002;
        const PARALYZE     = 0x0004;
        const BLIND        = 0x0008;
        const POISON       = 0x0010;
        const COMA         = 0x0020;
        const CHARM        = 0x0040;
        const FEAR         = 0x0080;
        const DISARM       = 0x0100;
        const MUTE         = 0x0200;
        const INVISIBLE    = 0x0400;
        const SIGHT        = 0x0800;
        const INVULNERABLE = 0x1000;
    }
}

bitflags! {
    /// Player-only flags; monsters keep the defaults
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PlayerFlags: u16 {
        const ALIVE         = 0x01;
        const PVP           = 0x02;
        const CASTING       = 0x04;
        const IN_DIALOG     = 0x08;
        const IN_EXCHANGE   = 0x10;
        const PROHIBIT_CAST = 0x20;
    }
}

impl Default for PlayerFlags {
    fn default() -> Self {
        PlayerFlags::ALIVE
    }
}

/// Condition flags plus immortality toggles for one creature
#[derive(Debug, Clone, Default)]
pub struct ConditionInfo {
    pub conditions: CreatureCondition,
    pub flags: PlayerFlags,

    /// Immunity to everything / physical damage / magical damage
    pub absolute_immortal: bool,
    pub physical_immortal: bool,
    pub magical_immortal: bool,
}

impl ConditionInfo {
    pub fn alive(&self) -> bool {
        self.flags.contains(PlayerFlags::ALIVE)
    }

    pub fn set_alive(&mut self, alive: bool) {
        self.flags.set(PlayerFlags::ALIVE, alive);
    }

    pub fn frozen(&self) -> bool {
        self.conditions.contains(CreatureCondition::FREEZE)
    }

    pub fn asleep(&self) -> bool {
        self.conditions.contains(CreatureCondition::SLEEP)
    }

    pub fn paralyzed(&self) -> bool {
        self.conditions.contains(CreatureCondition::PARALYZE)
    }

    pub fn blinded(&self) -> bool {
        self.conditions.contains(CreatureCondition::BLIND)
    }

    pub fn comatose(&self) -> bool {
        self.conditions.contains(CreatureCondition::COMA)
    }

    pub fn charmed(&self) -> bool {
        self.conditions.contains(CreatureCondition::CHARM)
    }

    pub fn feared(&self) -> bool {
        self.conditions.contains(CreatureCondition::FEAR)
    }

    pub fn disarmed(&self) -> bool {
        self.conditions.contains(CreatureCondition::DISARM)
    }

    pub fn invulnerable(&self) -> bool {
        self.conditions.contains(CreatureCondition::INVULNERABLE)
    }

    pub fn pvp_enabled(&self) -> bool {
        self.flags.contains(PlayerFlags::PVP)
    }

    pub fn set_pvp(&mut self, enabled: bool) {
        self.flags.set(PlayerFlags::PVP, enabled);
    }

    pub fn casting(&self) -> bool {
        self.flags.contains(PlayerFlags::CASTING)
    }

    pub fn set_casting(&mut self, casting: bool) {
        self.flags.set(PlayerFlags::CASTING, casting);
    }

    pub fn can_cast(&self) -> bool {
        !(self.asleep()
            || self.frozen()
            || self.comatose()
            || self.flags.contains(PlayerFlags::PROHIBIT_CAST))
    }

    pub fn can_move(&self) -> bool {
        !(self.asleep() || self.frozen() || self.paralyzed() || self.comatose())
    }
}
