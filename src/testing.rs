//! In-memory collaborators for unit tests.

use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::audio::SoundCue;
use crate::collision::{BonusKind, BulletHandle, CollisionHit, PlayerHandle};
use crate::sector::{EffectSpawn, Sector};
use crate::spawner::SpawnerId;

pub struct TestSector {
    pub bounds: Rect,
    pub player: Option<Rect>,
    pub editor: bool,
    pub camera: Vec2,
    pub gravity: f32,
    pub foremost_layer: i32,
    pub solid_areas: Vec<Rect>,
    pub effects: Vec<EffectSpawn>,
    pub sounds: Vec<SoundCue>,
    pub scripts: Vec<(String, String)>,
    pub kills: u32,
    pub spawner_notifications: Vec<SpawnerId>,
    pub(crate) rng: SmallRng,
}

impl Default for TestSector {
    fn default() -> Self {
        Self {
            bounds: Rect::new(-10_000.0, -10_000.0, 10_000.0, 10_000.0),
            player: None,
            editor: false,
            camera: Vec2::ZERO,
            gravity: 1000.0,
            foremost_layer: 100,
            solid_areas: Vec::new(),
            effects: Vec::new(),
            sounds: Vec::new(),
            scripts: Vec::new(),
            kills: 0,
            spawner_notifications: Vec::new(),
            rng: SmallRng::seed_from_u64(7),
        }
    }
}

impl Sector for TestSector {
    fn contains(&self, bbox: &Rect) -> bool {
        !self.bounds.intersect(*bbox).is_empty()
    }

    fn nearest_player(&self, _bbox: &Rect) -> Option<Rect> {
        self.player
    }

    fn editor_active(&self) -> bool {
        self.editor
    }

    fn camera_center(&self) -> Vec2 {
        self.camera
    }

    fn gravity(&self) -> f32 {
        self.gravity
    }

    fn foremost_layer(&self) -> i32 {
        self.foremost_layer
    }

    fn is_free_of_statics(&self, area: &Rect) -> bool {
        !self
            .solid_areas
            .iter()
            .any(|solid| !solid.intersect(*area).is_empty())
    }

    fn spawn_effect(&mut self, effect: EffectSpawn) {
        self.effects.push(effect);
    }

    fn play_sound(&mut self, cue: SoundCue, _position: Option<Vec2>) {
        self.sounds.push(cue);
    }

    fn run_script(&mut self, script: &str, source: &str) {
        self.scripts.push((script.to_string(), source.to_string()));
    }

    fn record_kill(&mut self) {
        self.kills += 1;
    }

    fn notify_spawner(&mut self, spawner: SpawnerId) {
        self.spawner_notifications.push(spawner);
    }

    fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

#[derive(Default)]
pub struct TestPlayer {
    pub bbox: Rect,
    pub invincible: bool,
    pub stone: bool,
    pub buttjump: bool,
    pub killed: bool,
    pub bounces: u32,
}

impl TestPlayer {
    pub fn at(bbox: Rect) -> Self {
        Self {
            bbox,
            ..Default::default()
        }
    }
}

impl PlayerHandle for TestPlayer {
    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn is_invincible(&self) -> bool {
        self.invincible
    }

    fn is_stone(&self) -> bool {
        self.stone
    }

    fn does_buttjump(&self) -> bool {
        self.buttjump
    }

    fn kill(&mut self, _completely: bool) {
        self.killed = true;
    }

    fn bounce(&mut self, _enemy_bbox: Rect) {
        self.bounces += 1;
    }
}

pub struct TestBullet {
    pub kind: BonusKind,
    pub removed: bool,
    pub ricochets: u32,
}

impl TestBullet {
    pub fn new(kind: BonusKind) -> Self {
        Self {
            kind,
            removed: false,
            ricochets: 0,
        }
    }
}

impl BulletHandle for TestBullet {
    fn kind(&self) -> BonusKind {
        self.kind
    }

    fn remove(&mut self) {
        self.removed = true;
    }

    fn ricochet(&mut self, _target: Rect, _hit: &CollisionHit) {
        self.ricochets += 1;
    }
}
