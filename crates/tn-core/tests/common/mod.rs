//! Shared test world: an in-memory spatial index, status directory and
//! event recorder standing in for the server collaborators.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tn_core::creature::{Creature, CreatureId, MapId};
use tn_core::geometry::Rect;
use tn_core::status::StatusDef;
use tn_core::world::{EventSink, RotationCast, RotationSelector, WorldEvent, WorldQuery};

pub struct TestWorld {
    pub width: i32,
    pub height: i32,
    creatures: Mutex<Vec<Arc<Creature>>>,
    walls: Mutex<HashSet<(i32, i32)>>,
    status_defs: Mutex<HashMap<String, Arc<StatusDef>>>,
    events: Mutex<Vec<WorldEvent>>,
}

impl TestWorld {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            creatures: Mutex::new(Vec::new()),
            walls: Mutex::new(HashSet::new()),
            status_defs: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, creature: Arc<Creature>) -> Arc<Creature> {
        self.creatures.lock().unwrap().push(creature.clone());
        creature
    }

    pub fn add_wall(&self, x: i32, y: i32) {
        self.walls.lock().unwrap().insert((x, y));
    }

    pub fn add_status(&self, def: StatusDef) {
        self.status_defs
            .lock()
            .unwrap()
            .insert(def.name.to_lowercase(), Arc::new(def));
    }

    pub fn events(&self) -> Vec<WorldEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn death_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, WorldEvent::Death { .. }))
            .count()
    }
}

impl WorldQuery for TestWorld {
    fn get(&self, id: CreatureId) -> Option<Arc<Creature>> {
        self.creatures
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    fn creatures_in(&self, map: MapId, rect: Rect) -> Vec<Arc<Creature>> {
        self.creatures
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                let (x, y) = c.position();
                c.map == map && rect.contains(x as i32, y as i32)
            })
            .cloned()
            .collect()
    }

    fn creatures_at(&self, map: MapId, x: i32, y: i32) -> Vec<Arc<Creature>> {
        self.creatures
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.map == map && c.position() == (x as u8, y as u8))
            .cloned()
            .collect()
    }

    fn is_walkable(&self, _map: MapId, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && !self.walls.lock().unwrap().contains(&(x, y))
    }

    fn group_members(&self, id: CreatureId) -> Vec<Arc<Creature>> {
        let creatures = self.creatures.lock().unwrap();
        let Some(me) = creatures.iter().find(|c| c.id == id) else {
            return Vec::new();
        };
        let Some(group) = me.group else {
            return Vec::new();
        };
        creatures
            .iter()
            .filter(|c| c.id != id && c.group == Some(group))
            .cloned()
            .collect()
    }

    fn status_def(&self, name: &str) -> Option<Arc<StatusDef>> {
        self.status_defs
            .lock()
            .unwrap()
            .get(&name.to_lowercase())
            .cloned()
    }
}

impl EventSink for TestWorld {
    fn post(&self, event: WorldEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Rotation that never offers anything; monsters fall back to assail
pub struct NoRotation;

impl RotationSelector for NoRotation {
    fn next_castable(&self, _monster: &Arc<Creature>) -> Option<RotationCast> {
        None
    }
}

/// Rotation that always offers the same cast
pub struct FixedRotation(pub RotationCast);

impl RotationSelector for FixedRotation {
    fn next_castable(&self, _monster: &Arc<Creature>) -> Option<RotationCast> {
        Some(self.0.clone())
    }
}
