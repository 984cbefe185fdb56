use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::collision::{BonusKind, BulletHandle, CollisionHit, PlayerHandle};
use crate::config::EnemyConfig;
use crate::enemy::{DrawRequest, Enemy};
use crate::sector::EffectSpawn;
use crate::spawner::SpawnerId;

/// Upward speed given to a player that stomps an enemy.
pub const BOUNCE_SPEED: f32 = 450.0;

/// An enemy living in the ECS world.
#[derive(Component)]
pub struct EnemyActor(pub Enemy);

/// Player avatar as seen by enemies. Movement is driven elsewhere.
#[derive(Component, Clone, Debug, Default)]
pub struct PlayerActor {
    pub bbox: Rect,
    pub velocity: Vec2,
    pub invincible: bool,
    pub stone: bool,
    pub buttjump: bool,
    pub killed: bool,
    pub bounces: u32,
}

impl PlayerActor {
    pub fn at(bbox: Rect) -> Self {
        Self {
            bbox,
            ..Default::default()
        }
    }
}

impl PlayerHandle for PlayerActor {
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

    fn kill(&mut self, completely: bool) {
        if self.killed {
            return;
        }
        info!("[Badguy] Player hit by enemy (completely: {completely})");
        self.killed = true;
    }

    fn bounce(&mut self, _enemy_bbox: Rect) {
        self.velocity.y = -BOUNCE_SPEED;
        self.bounces += 1;
    }
}

/// A bonus projectile (fireball, iceball, ...).
#[derive(Component, Clone, Debug)]
pub struct Bullet {
    pub bbox: Rect,
    pub velocity: Vec2,
    pub kind: BonusKind,
    pub removed: bool,
    pub ricochets: u32,
}

impl Bullet {
    pub fn new(kind: BonusKind, bbox: Rect, velocity: Vec2) -> Self {
        Self {
            bbox,
            velocity,
            kind,
            removed: false,
            ricochets: 0,
        }
    }
}

impl BulletHandle for Bullet {
    fn kind(&self) -> BonusKind {
        self.kind
    }

    fn remove(&mut self) {
        self.removed = true;
    }

    fn ricochet(&mut self, _target: Rect, hit: &CollisionHit) {
        if hit.left || hit.right {
            self.velocity.x = -self.velocity.x;
        } else {
            self.velocity.y = -self.velocity.y;
        }
        self.ricochets += 1;
    }
}

/// Live instance of a spawned effect.
#[derive(Component, Clone, Debug)]
pub struct EffectInstance {
    pub effect: EffectSpawn,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub age: f32,
    pub lifetime: f32,
}

/// Periodically spawns copies of `template`, bounded by its spawner limit.
#[derive(Component, Clone, Debug)]
pub struct Dispenser {
    pub id: SpawnerId,
    pub template: EnemyConfig,
    pub interval: f32,
    pub timer: f32,
}

#[derive(Resource, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SectorSettings {
    /// World units per second squared.
    pub gravity: f32,
    pub foremost_layer: i32,
}

impl Default for SectorSettings {
    fn default() -> Self {
        Self {
            gravity: 1000.0,
            foremost_layer: 100,
        }
    }
}

#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct EditorMode(pub bool);

/// Camera centre. Replaces the player as the culling anchor in editor mode.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct CameraFocus(pub Vec2);

#[derive(Resource, Clone, Debug, Default, Serialize)]
pub struct LevelStats {
    pub kills: u32,
    /// Enemies that count towards the level's kill total.
    pub counted_enemies: u32,
}

#[derive(Resource)]
pub struct LevelRng(pub SmallRng);

impl LevelRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

impl Default for LevelRng {
    fn default() -> Self {
        Self::seeded(0x5eed)
    }
}

/// Effects requested during the current tick, spawned by a later system.
#[derive(Resource, Default)]
pub struct PendingEffects(pub Vec<EffectSpawn>);

/// This tick's draw output, ordered by layer.
#[derive(Resource, Default)]
pub struct DrawList(pub Vec<(Entity, DrawRequest)>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_ricochet_reflects_along_hit_axis() {
        let mut bullet = Bullet::new(BonusKind::Fire, Rect::new(0.0, 0.0, 8.0, 8.0), Vec2::new(200.0, -50.0));
        bullet.ricochet(Rect::default(), &CollisionHit::side(true));
        assert_eq!(bullet.velocity, Vec2::new(-200.0, -50.0));
        bullet.ricochet(Rect::default(), &CollisionHit::bottom());
        assert_eq!(bullet.velocity, Vec2::new(-200.0, 50.0));
        assert_eq!(bullet.ricochets, 2);
    }

    #[test]
    fn player_is_killed_once_and_bounces_upwards() {
        let mut player = PlayerActor::at(Rect::new(0.0, 0.0, 32.0, 32.0));
        player.bounce(Rect::default());
        assert_eq!(player.velocity.y, -BOUNCE_SPEED);
        player.kill(false);
        player.kill(true);
        assert!(player.killed);
        assert_eq!(player.bounces, 1);
    }
}
