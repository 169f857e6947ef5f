//! Monster aggression ledger
//!
//! Each monster tracks accumulated threat per hostile creature. Entries are
//! created on first hostile contact or AoI entry and removed on AoI exit or
//! death. Mutation from a damage thread and consumption from the AI thread
//! serialize on the owning monster's AI lock; the table itself is plain.

use std::time::Instant;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::creature::CreatureId;
use crate::rng::CombatRng;

/// Which threat entry a rotation cast wants aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TargetPriority {
    HighThreat,
    LowThreat,
    /// Melee attacker who has gone longest without swinging
    Attacker,
    /// Caster who has gone longest without casting
    AttackingCaster,
    /// Healer who has gone longest without healing
    AttackingHealer,
    RandomAttacker,
    /// The monster itself (self-buffs)
    Self_,
}

/// One attacker's ledger entry
#[derive(Debug, Clone)]
pub struct ThreatEntry {
    pub target: CreatureId,
    pub threat: u32,
    pub total_heals: u32,
    pub total_casts: u32,
    pub last_melee: Option<Instant>,
    pub last_heal: Option<Instant>,
    pub last_cast: Option<Instant>,
}

impl ThreatEntry {
    fn new(target: CreatureId, threat: u32) -> Self {
        Self {
            target,
            threat,
            total_heals: 0,
            total_casts: 0,
            last_melee: None,
            last_heal: None,
            last_cast: None,
        }
    }

    pub fn is_healer(&self) -> bool {
        self.total_heals > 0
    }

    pub fn is_caster(&self) -> bool {
        self.total_casts > 0
    }
}

/// Per-monster threat table. Entry order is insertion order, which makes
/// tie-breaking deterministic.
#[derive(Debug, Clone, Default)]
pub struct ThreatTable {
    entries: Vec<ThreatEntry>,
    index: HashMap<CreatureId, usize>,
}

impl ThreatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: CreatureId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn threat(&self, id: CreatureId) -> u32 {
        self.index
            .get(&id)
            .map_or(0, |&i| self.entries[i].threat)
    }

    pub fn entry(&self, id: CreatureId) -> Option<&ThreatEntry> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    /// Insert an entry with the given starting threat; existing entries
    /// are left untouched
    pub fn add(&mut self, id: CreatureId, threat: u32) {
        if self.contains(id) {
            return;
        }
        self.index.insert(id, self.entries.len());
        self.entries.push(ThreatEntry::new(id, threat));
    }

    /// Add threat, creating the entry on first hostile contact
    pub fn increase(&mut self, id: CreatureId, amount: u32) {
        match self.index.get(&id) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.threat = entry.threat.saturating_add(amount);
            }
            None => self.add(id, amount),
        }
    }

    pub fn decrease(&mut self, id: CreatureId, amount: u32) {
        if let Some(&i) = self.index.get(&id) {
            let entry = &mut self.entries[i];
            entry.threat = entry.threat.saturating_sub(amount);
        }
    }

    pub fn remove(&mut self, id: CreatureId) {
        let Some(removed) = self.index.remove(&id) else {
            return;
        };
        self.entries.remove(removed);
        for slot in self.index.values_mut() {
            if *slot > removed {
                *slot -= 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Entry with the maximum threat; ties resolve to the earliest
    /// insertion, stable across repeated calls
    pub fn highest_entry(&self) -> Option<&ThreatEntry> {
        let mut best: Option<&ThreatEntry> = None;
        for entry in &self.entries {
            match best {
                Some(b) if entry.threat <= b.threat => {}
                _ => best = Some(entry),
            }
        }
        best
    }

    pub fn highest_threat(&self) -> Option<CreatureId> {
        self.highest_entry().map(|e| e.target)
    }

    pub fn lowest_entry(&self) -> Option<&ThreatEntry> {
        let mut best: Option<&ThreatEntry> = None;
        for entry in &self.entries {
            match best {
                Some(b) if entry.threat >= b.threat => {}
                _ => best = Some(entry),
            }
        }
        best
    }

    /// Record a melee hit for priority bookkeeping
    pub fn note_melee(&mut self, id: CreatureId) {
        if let Some(&i) = self.index.get(&id) {
            self.entries[i].last_melee = Some(Instant::now());
        }
    }

    /// Record a hostile cast; entries are created for grouped newcomers
    pub fn on_cast(&mut self, id: CreatureId, amount: u32, grouped_with_existing: bool) {
        if self.contains(id) {
            self.increase(id, amount);
        } else if grouped_with_existing {
            self.add(id, amount);
        } else {
            return;
        }
        if let Some(&i) = self.index.get(&id) {
            let entry = &mut self.entries[i];
            entry.total_casts += 1;
            entry.last_cast = Some(Instant::now());
        }
    }

    /// Record a heal cast near this monster; healing an engaged target
    /// earns threat even without direct contact
    pub fn on_nearby_heal(&mut self, id: CreatureId, amount: u32, grouped_with_existing: bool) {
        if self.contains(id) {
            self.increase(id, amount);
        } else if grouped_with_existing {
            self.add(id, amount);
        } else {
            return;
        }
        if let Some(&i) = self.index.get(&id) {
            let entry = &mut self.entries[i];
            entry.total_heals += 1;
            entry.last_heal = Some(Instant::now());
        }
    }

    /// AoI entry: a hostile player gets a nominal entry when the monster
    /// has no current target, or when the entrant is grouped with it
    pub fn on_range_enter(&mut self, id: CreatureId, grouped_with_top: bool) {
        if self.is_empty() || grouped_with_top {
            self.add(id, 1);
        }
    }

    /// AoI exit prunes the entry entirely
    pub fn on_range_exit(&mut self, id: CreatureId) {
        self.remove(id);
    }

    /// Charm-mechanic redirection: a newcomer grouped with the current top
    /// outbids it; anyone else wipes the slate
    pub fn force_threat_change(&mut self, id: CreatureId, grouped_with_top: bool) {
        if self.highest_threat() == Some(id) {
            return;
        }
        if grouped_with_top {
            let boosted = self
                .highest_entry()
                .map_or(1, |top| (top.threat as f64 * 1.10).ceil() as u32);
            match self.index.get(&id) {
                Some(&i) => self.entries[i].threat = boosted,
                None => self.add(id, boosted),
            }
        } else {
            self.clear();
            self.add(id, 1);
        }
    }

    /// Pick targets for a rotation cast's priority. `self_id` is the
    /// owning monster.
    pub fn targets_for(
        &self,
        priority: TargetPriority,
        self_id: CreatureId,
        rng: &mut CombatRng,
    ) -> Vec<CreatureId> {
        let picked = match priority {
            TargetPriority::HighThreat => self.highest_entry().map(|e| e.target),
            TargetPriority::LowThreat => self.lowest_entry().map(|e| e.target),
            TargetPriority::Attacker => self
                .entries
                .iter()
                .filter(|e| e.last_melee.is_some())
                .min_by_key(|e| e.last_melee)
                .map(|e| e.target),
            TargetPriority::AttackingCaster => self
                .entries
                .iter()
                .filter(|e| e.is_caster())
                .min_by_key(|e| e.last_cast)
                .map(|e| e.target),
            TargetPriority::AttackingHealer => self
                .entries
                .iter()
                .filter(|e| e.is_healer())
                .min_by_key(|e| e.last_heal)
                .map(|e| e.target),
            TargetPriority::RandomAttacker => {
                let ids: Vec<CreatureId> = self.entries.iter().map(|e| e.target).collect();
                rng.pick(&ids).copied()
            }
            TargetPriority::Self_ => Some(self_id),
        };
        picked.into_iter().collect()
    }
}
