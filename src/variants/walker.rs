use crate::collision::{CollisionHit, HitResponse, PlayerHandle, RivalView};
use crate::config::Direction;
use crate::enemy::{Capabilities, EnemyBehavior, EnemyCore};
use crate::sector::Sector;

const WALK_SPEED: f32 = 80.0;
/// Drop height that makes a walker turn back at a ledge.
const MAX_DROP_HEIGHT: i32 = 16;

/// Patrols left and right, turning at walls, rivals and ledges.
#[derive(Clone, Copy, Debug)]
pub struct Walker {
    pub walk_speed: f32,
    /// `None` walks off ledges.
    pub max_drop_height: Option<i32>,
}

impl Default for Walker {
    fn default() -> Self {
        Self {
            walk_speed: WALK_SPEED,
            max_drop_height: Some(MAX_DROP_HEIGHT),
        }
    }
}

impl Walker {
    fn walk_action(core: &EnemyCore) -> &'static str {
        match core.direction() {
            Direction::Right => "right",
            _ => "left",
        }
    }

    fn start_walking(&self, core: &mut EnemyCore) {
        let speed = match core.direction() {
            Direction::Right => self.walk_speed,
            _ => -self.walk_speed,
        };
        core.physic.set_velocity_x(speed);
        let action = Self::walk_action(core);
        core.sprite.set_action(action, -1);
    }

    fn turn_around(&self, core: &mut EnemyCore) {
        if core.is_frozen() {
            return;
        }
        let turned = core.direction().opposite();
        core.set_direction(turned);
        self.start_walking(core);
    }
}

impl EnemyBehavior for Walker {
    fn name(&self) -> &'static str {
        "walker"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            freezable: true,
            ..Default::default()
        }
    }

    fn initialize(&mut self, core: &mut EnemyCore) {
        self.start_walking(core);
    }

    fn active_update(&mut self, core: &mut EnemyCore, sector: &mut dyn Sector, dt: f32) {
        if core.is_frozen() {
            core.physic.set_velocity_x(0.0);
        } else if core.physic.velocity().x == 0.0 {
            // Thawed, or stopped by a wall last tick.
            self.start_walking(core);
        }

        if let Some(height) = self.max_drop_height {
            if core.on_ground() && !core.is_frozen() && core.might_fall(sector, height) {
                self.turn_around(core);
            }
        }

        core.default_active_update(sector, dt);
    }

    fn collision_solid(&mut self, core: &mut EnemyCore, _sector: &mut dyn Sector, hit: &CollisionHit) {
        core.update_on_ground_flag(hit);
        if hit.top || hit.bottom {
            core.physic.set_velocity_y(0.0);
        }
        let facing_left = core.direction() == Direction::Left;
        if (hit.left && facing_left) || (hit.right && !facing_left) {
            self.turn_around(core);
        }
    }

    fn collision_badguy(
        &mut self,
        core: &mut EnemyCore,
        _sector: &mut dyn Sector,
        _other: &RivalView,
        hit: &CollisionHit,
    ) -> HitResponse {
        let facing_left = core.direction() == Direction::Left;
        if (hit.left && facing_left) || (hit.right && !facing_left) {
            self.turn_around(core);
        }
        HitResponse::ForceMove
    }

    fn collision_squished(
        &mut self,
        core: &mut EnemyCore,
        sector: &mut dyn Sector,
        player: &mut dyn PlayerHandle,
    ) -> bool {
        if core.is_frozen() {
            return core.default_collision_squished(sector, player);
        }
        let action = core.direction().action("squished");
        core.sprite.set_action(&action, -1);
        core.kill_squished(sector, Some(player));
        true
    }
}
