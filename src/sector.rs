use bevy::prelude::*;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::audio::SoundCue;
use crate::spawner::SpawnerId;

/// Render layer of ordinary game objects.
pub const LAYER_OBJECTS: i32 = 50;

/// Auxiliary entity requested by an enemy.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectSpawn {
    /// Falling water drop left behind by a melting enemy.
    WaterDrop {
        position: Vec2,
        sprite: String,
        velocity: Vec2,
    },
    /// Short-lived decorative particle.
    SpriteParticle {
        sprite: String,
        action: String,
        position: Vec2,
        velocity: Vec2,
        acceleration: Vec2,
        layer: i32,
    },
    Explosion {
        position: Vec2,
        hurts: bool,
        pushes: bool,
    },
}

impl EffectSpawn {
    pub fn label(&self) -> &'static str {
        match self {
            EffectSpawn::WaterDrop { .. } => "water_drop",
            EffectSpawn::SpriteParticle { .. } => "sprite_particle",
            EffectSpawn::Explosion { .. } => "explosion",
        }
    }
}

/// The world an enemy lives in, as far as the enemy core needs it.
pub trait Sector {
    /// Whether `bbox` still lies within the playable area.
    fn contains(&self, bbox: &Rect) -> bool;
    fn nearest_player(&self, bbox: &Rect) -> Option<Rect>;
    fn editor_active(&self) -> bool;
    fn camera_center(&self) -> Vec2;
    /// Downward acceleration in world units per second squared.
    fn gravity(&self) -> f32;
    fn foremost_layer(&self) -> i32;
    fn is_free_of_statics(&self, area: &Rect) -> bool;
    fn spawn_effect(&mut self, effect: EffectSpawn);
    fn play_sound(&mut self, cue: SoundCue, position: Option<Vec2>);
    fn run_script(&mut self, script: &str, source: &str);
    fn record_kill(&mut self);
    fn notify_spawner(&mut self, spawner: SpawnerId);
    fn rng(&mut self) -> &mut SmallRng;
}
