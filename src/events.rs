use std::collections::{HashMap, VecDeque};

use bevy::prelude::*;
use serde::Serialize;

const MAX_EVENTS: usize = 500;

pub const ENEMY_KILLED: &str = "enemy_killed";
pub const ENEMY_REMOVED: &str = "enemy_removed";
pub const ENEMY_SPAWNED: &str = "enemy_spawned";
pub const EFFECT_SPAWNED: &str = "effect_spawned";
pub const SFX: &str = "sfx";

#[derive(Serialize, Clone, Debug)]
pub struct GameEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub frame: u64,
    /// `Entity::to_bits` of the emitter, when an entity emitted it.
    pub source_entity: Option<u64>,
}

/// Gameplay events of the last [`MAX_EVENTS`] emissions, stamped with the
/// fixed-step frame. Per-name totals survive eviction.
#[derive(Resource, Default)]
pub struct GameEventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    totals: HashMap<String, u64>,
    last_overflow_log_frame: u64,
}

impl GameEventBus {
    pub fn emit(
        &mut self,
        name: impl Into<String>,
        data: serde_json::Value,
        source_entity: Option<u64>,
    ) {
        let name = name.into();
        *self.totals.entry(name.clone()).or_default() += 1;
        self.recent.push_back(GameEvent {
            name,
            data,
            frame: self.frame,
            source_entity,
        });

        let excess = self.recent.len().saturating_sub(MAX_EVENTS);
        if excess == 0 {
            return;
        }
        self.recent.drain(..excess);
        self.dropped_events = self.dropped_events.saturating_add(excess as u64);
        if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
            self.last_overflow_log_frame = self.frame;
            warn!(
                "[Badguy events] Event buffer full, {} events dropped so far",
                self.dropped_events
            );
        }
    }

    /// Buffered events called `name`.
    pub fn count(&self, name: &str) -> usize {
        self.recent.iter().filter(|ev| ev.name == name).count()
    }

    /// Every event called `name` ever emitted, evicted ones included.
    pub fn total(&self, name: &str) -> u64 {
        self.totals.get(name).copied().unwrap_or(0)
    }

    pub fn since(&self, frame: u64) -> impl Iterator<Item = &GameEvent> {
        self.recent.iter().filter(move |ev| ev.frame >= frame)
    }
}

pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameEventBus>()
            .add_systems(FixedPreUpdate, advance_event_frame);
    }
}

fn advance_event_frame(mut bus: ResMut<GameEventBus>) {
    bus.frame = bus.frame.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn overflow_evicts_oldest_but_keeps_totals() {
        let mut bus = GameEventBus::default();
        for i in 0..(MAX_EVENTS + 25) {
            bus.emit(SFX, serde_json::json!({ "i": i }), None);
        }
        assert_eq!(bus.recent.len(), MAX_EVENTS);
        assert_eq!(bus.dropped_events, 25);
        assert_eq!(bus.recent.front().map(|ev| ev.data["i"].clone()), Some(serde_json::json!(25)));
        assert_eq!(bus.count(SFX), MAX_EVENTS);
        assert_eq!(bus.total(SFX), (MAX_EVENTS + 25) as u64);
    }

    #[test]
    fn count_filters_by_name() {
        let mut bus = GameEventBus::default();
        bus.emit(ENEMY_KILLED, serde_json::json!({}), Some(1));
        bus.emit(SFX, serde_json::json!({ "name": "fall" }), Some(1));
        bus.emit(ENEMY_KILLED, serde_json::json!({}), Some(2));
        assert_eq!(bus.count(ENEMY_KILLED), 2);
        assert_eq!(bus.count(ENEMY_REMOVED), 0);
        assert_eq!(bus.total(ENEMY_REMOVED), 0);
    }

    #[test]
    fn frame_stamps_follow_the_fixed_step() {
        let mut world = World::new();
        world.init_resource::<GameEventBus>();
        world.resource_mut::<GameEventBus>().emit(SFX, serde_json::json!({}), None);
        world
            .run_system_once(advance_event_frame)
            .expect("advance frame");
        world.resource_mut::<GameEventBus>().emit(ENEMY_KILLED, serde_json::json!({}), None);

        let bus = world.resource::<GameEventBus>();
        assert_eq!(bus.frame, 1);
        let later: Vec<&str> = bus.since(1).map(|ev| ev.name.as_str()).collect();
        assert_eq!(later, vec![ENEMY_KILLED]);
    }
}
