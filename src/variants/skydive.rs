use bevy::prelude::*;

use crate::collision::{
    CollisionGroup, CollisionHit, HitResponse, PlayerHandle, RivalView, TileAttributes,
};
use crate::config::Direction;
use crate::enemy::{EnemyBehavior, EnemyCore};
use crate::sector::{EffectSpawn, Sector};

/// Fixed simulation rate used to turn a carried displacement into velocity.
const LOGICAL_FPS: f32 = 64.0;

/// A bomb the player can carry. Blows up on any landing.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkyDive {
    grabbed: bool,
}

impl SkyDive {
    fn explode(&mut self, core: &mut EnemyCore, sector: &mut dyn Sector) {
        if core.is_removed() {
            return;
        }
        let bbox = core.bbox();
        sector.spawn_effect(EffectSpawn::Explosion {
            position: Vec2::new(bbox.center().x, bbox.max.y),
            hurts: true,
            pushes: false,
        });
        core.ledger_mut().notify(sector);
        core.remove_me();
    }
}

impl EnemyBehavior for SkyDive {
    fn name(&self) -> &'static str {
        "skydive"
    }

    fn active_update(&mut self, core: &mut EnemyCore, sector: &mut dyn Sector, dt: f32) {
        if !self.grabbed {
            core.default_active_update(sector, dt);
        }
    }

    fn collision_solid(&mut self, core: &mut EnemyCore, sector: &mut dyn Sector, hit: &CollisionHit) {
        if hit.bottom {
            self.explode(core, sector);
            return;
        }
        if hit.left || hit.right {
            core.physic.set_velocity_x(0.0);
        }
    }

    fn collision_badguy(
        &mut self,
        core: &mut EnemyCore,
        sector: &mut dyn Sector,
        _other: &RivalView,
        hit: &CollisionHit,
    ) -> HitResponse {
        if hit.bottom {
            self.explode(core, sector);
            return HitResponse::AbortMove;
        }
        HitResponse::ForceMove
    }

    fn collision_player(
        &mut self,
        core: &mut EnemyCore,
        sector: &mut dyn Sector,
        _player: &mut dyn PlayerHandle,
        hit: &CollisionHit,
    ) -> HitResponse {
        if hit.bottom {
            self.explode(core, sector);
            return HitResponse::AbortMove;
        }
        HitResponse::ForceMove
    }

    /// Players bounce off without squishing it.
    fn collision_squished(
        &mut self,
        core: &mut EnemyCore,
        _sector: &mut dyn Sector,
        player: &mut dyn PlayerHandle,
    ) -> bool {
        player.bounce(core.bbox());
        false
    }

    fn collision_tile(
        &mut self,
        core: &mut EnemyCore,
        sector: &mut dyn Sector,
        attributes: TileAttributes,
    ) {
        if attributes.contains(TileAttributes::HURTS) {
            self.explode(core, sector);
        }
    }

    fn is_portable(&self) -> bool {
        true
    }

    fn grab(&mut self, core: &mut EnemyCore, position: Vec2, direction: Direction) {
        let movement = position - core.position();
        core.set_movement(movement);
        core.set_direction(direction);
        self.grabbed = true;

        core.physic.set_velocity_x(movement.x * LOGICAL_FPS);
        core.physic.set_velocity_y(0.0);
        core.physic.set_acceleration_y(0.0);
        core.physic.enable_gravity(false);
        core.set_colgroup_active(CollisionGroup::Disabled);
    }

    fn ungrab(&mut self, core: &mut EnemyCore, _direction: Direction) {
        self.grabbed = false;
        core.physic.set_velocity_y(0.0);
        core.physic.set_acceleration_y(0.0);
        core.physic.enable_gravity(true);
        core.set_colgroup_active(CollisionGroup::Moving);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Counterpart;
    use crate::config::{EnemyConfig, EnemyKind};
    use crate::enemy::Enemy;
    use crate::sprite::SpriteDef;
    use crate::testing::{TestPlayer, TestSector};

    fn skydive() -> (Enemy, TestSector) {
        let mut cfg = EnemyConfig::at(0.0, 0.0);
        cfg.kind = EnemyKind::SkyDive;
        let enemy = Enemy::new(&cfg, SpriteDef::with_actions(&["left"], 1, 10.0), Box::new(SkyDive::default()));
        let mut sector = TestSector {
            player: Some(Rect::new(100.0, 0.0, 132.0, 32.0)),
            ..Default::default()
        };
        let mut enemy = enemy;
        enemy.update(&mut sector, 0.1);
        enemy.update(&mut sector, 0.1);
        (enemy, sector)
    }

    #[test]
    fn landing_explodes_once() {
        let (mut enemy, mut sector) = skydive();
        enemy.collision_solid(&mut sector, &CollisionHit::bottom());
        enemy.collision_solid(&mut sector, &CollisionHit::bottom());
        assert!(enemy.is_removed());
        assert_eq!(sector.effects.len(), 1);
        assert_eq!(
            sector.effects[0],
            EffectSpawn::Explosion {
                position: Vec2::new(16.0, 32.0),
                hurts: true,
                pushes: false,
            }
        );
        assert_eq!(sector.kills, 1);
    }

    #[test]
    fn grabbed_bomb_follows_carrier_and_disables_collisions() {
        let (mut enemy, mut sector) = skydive();
        assert!(enemy.is_portable());
        enemy.grab(Vec2::new(4.0, -2.0), Direction::Right);
        assert_eq!(enemy.core().group(), CollisionGroup::Disabled);
        assert_eq!(enemy.core().movement(), Vec2::new(4.0, -2.0));
        assert_eq!(enemy.core().physic.velocity(), Vec2::new(4.0 * LOGICAL_FPS, 0.0));
        assert_eq!(enemy.core().direction(), Direction::Right);

        enemy.update(&mut sector, 0.1);
        assert_eq!(enemy.core().movement(), Vec2::new(4.0, -2.0));

        enemy.ungrab(Direction::Right);
        assert_eq!(enemy.core().group(), CollisionGroup::Moving);
        assert!(enemy.core().physic.gravity_enabled());
    }

    #[test]
    fn stomping_player_bounces_and_bomb_stays() {
        let (mut enemy, mut sector) = skydive();
        let mut player = TestPlayer::at(Rect::new(0.0, -30.0, 32.0, 2.0));
        let response = enemy.on_collision(
            &mut sector,
            Counterpart::Player(&mut player),
            &CollisionHit::default(),
        );
        assert_eq!(response, HitResponse::ForceMove);
        assert_eq!(player.bounces, 1);
        assert!(!player.killed);
        assert!(!enemy.is_removed());
    }

    #[test]
    fn hurting_tile_detonates() {
        let (mut enemy, mut sector) = skydive();
        enemy.on_tile_collision(&mut sector, TileAttributes::HURTS | TileAttributes::FIRE);
        assert!(enemy.is_removed());
        assert_eq!(sector.effects[0].label(), "explosion");
    }
}
