//! Monster state and AI
//!
//! Per-monster aggression, the single-slot action queue, the current
//! pursuit path and cast cooldowns all live in `MonsterAi`, behind the
//! monster's AI lock. Damage threads mutate threat through the same lock
//! the AI thread consumes it from.

pub mod ai;
pub mod pathfind;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use strum::Display;

use crate::ability::Ability;
use crate::creature::CreatureId;
use crate::threat::ThreatTable;
use pathfind::PathTile;

/// One queued monster action; transient, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Action {
    Attack,
    Move,
    Flee,
    Idle,
    Death,
}

/// Queue capacity; the scheduler refills once per tick so one pending
/// action plus one in flight is all that ever accumulates.
const ACTION_QUEUE_DEPTH: usize = 2;

/// AI-side state for one monster
pub struct MonsterAi {
    pub threat: ThreatTable,

    /// Basic melee attack used when the rotation offers nothing
    pub assail: Option<Arc<Ability>>,

    /// Explicit target while charmed
    pub charm_target: Option<CreatureId>,

    /// Who the monster is currently running from
    pub flee_from: Option<CreatureId>,

    /// No target engaged; roam instead of pursue
    pub should_wander: bool,

    queue: VecDeque<Action>,
    current_path: Option<PathTile>,
    /// Target position at the time the path was computed
    path_target: Option<(u8, u8)>,
    cooldowns: HashMap<String, Instant>,
}

impl Default for MonsterAi {
    fn default() -> Self {
        Self::new()
    }
}

impl MonsterAi {
    pub fn new() -> Self {
        Self {
            threat: ThreatTable::new(),
            assail: None,
            charm_target: None,
            flee_from: None,
            should_wander: true,
            queue: VecDeque::with_capacity(ACTION_QUEUE_DEPTH),
            current_path: None,
            path_target: None,
            cooldowns: HashMap::new(),
        }
    }

    pub fn enqueue(&mut self, action: Action) {
        if self.queue.len() >= ACTION_QUEUE_DEPTH {
            self.queue.pop_front();
        }
        self.queue.push_back(action);
    }

    pub fn pop_action(&mut self) -> Option<Action> {
        self.queue.pop_front()
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Death clears everything; no further actions run
    pub fn on_death(&mut self) {
        self.clear_queue();
        self.threat.clear();
        self.current_path = None;
        self.path_target = None;
    }

    pub fn path(&self) -> Option<&PathTile> {
        self.current_path.as_ref()
    }

    pub fn path_target(&self) -> Option<(u8, u8)> {
        self.path_target
    }

    pub fn set_path(&mut self, path: Option<PathTile>, target: Option<(u8, u8)>) {
        self.current_path = path;
        self.path_target = target;
    }

    pub fn clear_path(&mut self) {
        self.current_path = None;
        self.path_target = None;
    }

    /// Stamp an ability as just used
    pub fn mark_used(&mut self, name: &str) {
        self.cooldowns.insert(name.to_string(), Instant::now());
    }

    pub fn on_cooldown(&self, ability: &Ability) -> bool {
        if ability.cooldown_secs <= 0.0 {
            return false;
        }
        self.cooldowns
            .get(&ability.name)
            .is_some_and(|used| used.elapsed().as_secs_f64() < ability.cooldown_secs)
    }
}
