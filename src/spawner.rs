use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Non-owning handle to a spawner. Stale handles (their spawner was removed)
/// are detected through the generation counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SpawnerId {
    index: u32,
    generation: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Spawner {
    pub name: String,
    /// Maximum number of simultaneously alive children; `None` is unbounded.
    pub limit: Option<u32>,
    pub alive: u32,
    pub spawned: u32,
    pub deaths: u32,
}

struct Slot {
    generation: u32,
    spawner: Option<Spawner>,
}

#[derive(Resource, Default)]
pub struct SpawnerRegistry {
    slots: Vec<Slot>,
}

impl SpawnerRegistry {
    pub fn register(&mut self, name: impl Into<String>, limit: Option<u32>) -> SpawnerId {
        let spawner = Spawner {
            name: name.into(),
            limit,
            alive: 0,
            spawned: 0,
            deaths: 0,
        };
        if let Some(index) = self.slots.iter().position(|slot| slot.spawner.is_none()) {
            let slot = &mut self.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.spawner = Some(spawner);
            return SpawnerId {
                index: index as u32,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            spawner: Some(spawner),
        });
        SpawnerId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    pub fn remove(&mut self, id: SpawnerId) -> Option<Spawner> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.spawner.take()
    }

    pub fn get(&self, id: SpawnerId) -> Option<&Spawner> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.spawner.as_ref()
    }

    fn get_mut(&mut self, id: SpawnerId) -> Option<&mut Spawner> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.spawner.as_mut()
    }

    pub fn can_spawn(&self, id: SpawnerId) -> bool {
        self.get(id)
            .is_some_and(|s| s.limit.map_or(true, |limit| s.alive < limit))
    }

    pub fn record_spawn(&mut self, id: SpawnerId) -> bool {
        let Some(spawner) = self.get_mut(id) else {
            return false;
        };
        spawner.alive += 1;
        spawner.spawned += 1;
        true
    }

    /// A child of `id` died. Returns false when the spawner no longer exists.
    pub fn notify_dead(&mut self, id: SpawnerId) -> bool {
        let Some(spawner) = self.get_mut(id) else {
            debug!("[Badguy] Death notification for a removed spawner ignored");
            return false;
        };
        spawner.alive = spawner.alive.saturating_sub(1);
        spawner.deaths += 1;
        true
    }
}
