use bevy::prelude::*;
use rand::Rng;

use crate::audio::SoundCue;
use crate::collision::{
    hit_from_above, BulletHandle, CollisionGroup, CollisionHit, Counterpart, HitResponse,
    PlayerHandle, RivalView, TileAttributes,
};
use crate::config::{Direction, EnemyConfig, EnemySave};
use crate::culling::{self, ViewAnchor};
use crate::lifecycle::DeathLedger;
use crate::physics::Physic;
use crate::sector::{EffectSpawn, Sector, LAYER_OBJECTS};
use crate::sprite::{AnimatedSprite, SpriteDef, FROZEN_TINT};
use crate::state::{rule_for, EnemyState, ExitRule, GroupOnEnter, StateTimer, TickAction};

/// A player whose bottom edge is less than this far below an enemy's top
/// edge is landing on it.
pub const SQUISH_MARGIN: f32 = 16.0;
const ICE_SHARD_SPACING: f32 = 16.0;

pub const WATER_DROP_SPRITE: &str = "images/objects/water_drop/water_drop.sprite";
pub const ICE_SHARD_SPRITE: &str = "images/particles/ice_piece1.sprite";
pub const LIGHT_SPRITE: &str = "images/objects/lightmap_light/lightmap_light-medium.sprite";

/// What a variant is susceptible to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub freezable: bool,
    pub flammable: bool,
    pub hurtable: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            freezable: false,
            flammable: true,
            hurtable: true,
        }
    }
}

/// Rendering request produced by [`Enemy::draw`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawRequest {
    Sprite {
        action: String,
        frame: usize,
        position: Vec2,
        layer: i32,
        flip_vertical: bool,
        color: Color,
    },
    /// Additive light drawn into the lightmap.
    Light { sprite: &'static str, position: Vec2 },
}

/// Per-variant policy. Every hook has the shared default, so a variant only
/// overrides what it does differently.
pub trait EnemyBehavior: Send + Sync {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    fn water_sprite(&self) -> &'static str {
        WATER_DROP_SPRITE
    }

    /// Runs once, on the first activation.
    fn initialize(&mut self, _core: &mut EnemyCore) {}

    /// Runs on every activation.
    fn activate(&mut self, _core: &mut EnemyCore) {}

    fn deactivate(&mut self, _core: &mut EnemyCore) {}

    fn active_update(&mut self, core: &mut EnemyCore, sector: &mut dyn Sector, dt: f32) {
        core.default_active_update(sector, dt);
    }

    fn inactive_update(&mut self, _core: &mut EnemyCore, _dt: f32) {}

    fn collision_solid(&mut self, core: &mut EnemyCore, _sector: &mut dyn Sector, hit: &CollisionHit) {
        core.default_collision_solid(hit);
    }

    fn collision_badguy(
        &mut self,
        _core: &mut EnemyCore,
        _sector: &mut dyn Sector,
        _other: &RivalView,
        _hit: &CollisionHit,
    ) -> HitResponse {
        HitResponse::ForceMove
    }

    fn collision_player(
        &mut self,
        core: &mut EnemyCore,
        sector: &mut dyn Sector,
        player: &mut dyn PlayerHandle,
        _hit: &CollisionHit,
    ) -> HitResponse {
        core.default_collision_player(sector, player)
    }

    /// A player landed on top. Returns true when the landing was handled.
    fn collision_squished(
        &mut self,
        core: &mut EnemyCore,
        sector: &mut dyn Sector,
        player: &mut dyn PlayerHandle,
    ) -> bool {
        core.default_collision_squished(sector, player)
    }

    fn collision_tile(
        &mut self,
        core: &mut EnemyCore,
        sector: &mut dyn Sector,
        attributes: TileAttributes,
    ) {
        core.default_collision_tile(sector, attributes, self.capabilities());
    }

    fn collision_bullet(
        &mut self,
        core: &mut EnemyCore,
        sector: &mut dyn Sector,
        bullet: &mut dyn BulletHandle,
        hit: &CollisionHit,
    ) -> HitResponse {
        default_collision_bullet(self, core, sector, bullet, hit)
    }

    /// Reverses an ignition, for variants that can be put out.
    fn extinguish(&mut self, _core: &mut EnemyCore, _sector: &mut dyn Sector) {}

    /// Whether a player can pick this enemy up and carry it.
    fn is_portable(&self) -> bool {
        false
    }

    fn grab(&mut self, _core: &mut EnemyCore, _position: Vec2, _direction: Direction) {}

    fn ungrab(&mut self, _core: &mut EnemyCore, _direction: Direction) {}
}

/// Elemental projectile matrix shared by all variants.
pub fn default_collision_bullet<B: EnemyBehavior + ?Sized>(
    behavior: &mut B,
    core: &mut EnemyCore,
    sector: &mut dyn Sector,
    bullet: &mut dyn BulletHandle,
    hit: &CollisionHit,
) -> HitResponse {
    use crate::collision::BonusKind;

    let caps = behavior.capabilities();
    let kind = bullet.kind();
    if core.frozen {
        if kind == BonusKind::Fire {
            core.unfreeze();
            bullet.remove();
            HitResponse::AbortMove
        } else {
            bullet.ricochet(core.bbox, hit);
            HitResponse::ForceMove
        }
    } else if core.ignited {
        if kind == BonusKind::Ice {
            behavior.extinguish(core, sector);
            bullet.remove();
            HitResponse::AbortMove
        } else {
            bullet.remove();
            HitResponse::ForceMove
        }
    } else if kind == BonusKind::Fire && caps.flammable {
        core.ignite(sector, caps);
        bullet.remove();
        HitResponse::AbortMove
    } else if kind == BonusKind::Ice && caps.freezable {
        core.freeze(caps);
        bullet.remove();
        HitResponse::AbortMove
    } else {
        bullet.ricochet(core.bbox, hit);
        HitResponse::ForceMove
    }
}

/// State shared by every enemy variant.
#[derive(Clone, Debug)]
pub struct EnemyCore {
    bbox: Rect,
    start_position: Vec2,
    start_direction: Direction,
    direction: Direction,
    state: EnemyState,
    is_active_flag: bool,
    initialized: bool,
    frozen: bool,
    ignited: bool,
    in_water: bool,
    glowing: bool,
    removed: bool,
    colgroup_active: CollisionGroup,
    group: CollisionGroup,
    ledger: DeathLedger,
    state_timer: StateTimer,
    movement: Vec2,
    on_ground_flag: bool,
    floor_normal: Vec2,
    layer: i32,
    pub physic: Physic,
    pub sprite: AnimatedSprite,
}

impl EnemyCore {
    pub fn new(config: &EnemyConfig, sprite: SpriteDef) -> Self {
        let bbox = config.bbox();
        let start_direction = Direction::parse(&config.direction);
        let direction = match start_direction {
            Direction::Auto => Direction::Left,
            dir => dir,
        };
        Self {
            bbox,
            start_position: bbox.min,
            start_direction,
            direction,
            state: EnemyState::Init,
            is_active_flag: false,
            initialized: false,
            frozen: false,
            ignited: false,
            in_water: false,
            glowing: false,
            removed: false,
            colgroup_active: CollisionGroup::Moving,
            group: CollisionGroup::Disabled,
            ledger: DeathLedger::new(config.counted, config.dead_script.clone(), config.spawner),
            state_timer: StateTimer::default(),
            movement: Vec2::ZERO,
            on_ground_flag: false,
            floor_normal: Vec2::ZERO,
            layer: LAYER_OBJECTS,
            physic: Physic::default(),
            sprite: AnimatedSprite::new(sprite),
        }
    }

    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    pub fn position(&self) -> Vec2 {
        self.bbox.min
    }

    pub fn start_position(&self) -> Vec2 {
        self.start_position
    }

    pub fn set_pos(&mut self, position: Vec2) {
        let size = self.bbox.size();
        self.bbox = Rect::from_corners(position, position + size);
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.bbox.min += delta;
        self.bbox.max += delta;
    }

    pub fn movement(&self) -> Vec2 {
        self.movement
    }

    pub fn set_movement(&mut self, movement: Vec2) {
        self.movement = movement;
    }

    pub fn start_direction(&self) -> Direction {
        self.start_direction
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// `Auto` is a configuration value only and is ignored here.
    pub fn set_direction(&mut self, direction: Direction) {
        if direction != Direction::Auto {
            self.direction = direction;
        }
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.is_active_flag && !self.removed
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_ignited(&self) -> bool {
        self.ignited
    }

    pub fn is_in_water(&self) -> bool {
        self.in_water
    }

    pub fn is_glowing(&self) -> bool {
        self.glowing
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground_flag
    }

    pub fn floor_normal(&self) -> Vec2 {
        self.floor_normal
    }

    pub fn group(&self) -> CollisionGroup {
        self.group
    }

    pub fn colgroup_active(&self) -> CollisionGroup {
        self.colgroup_active
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn ledger(&self) -> &DeathLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut DeathLedger {
        &mut self.ledger
    }

    pub fn state_timer(&self) -> &StateTimer {
        &self.state_timer
    }

    /// Changes the group used while active, applying it at once when active.
    pub fn set_colgroup_active(&mut self, group: CollisionGroup) {
        self.colgroup_active = group;
        if self.state == EnemyState::Active {
            self.group = group;
        }
    }

    /// Removes the enemy from the simulation. There is no way back.
    pub fn remove_me(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        self.is_active_flag = false;
        self.movement = Vec2::ZERO;
        self.state_timer.stop();
    }

    pub fn set_state(&mut self, state: EnemyState) {
        if self.state == state {
            return;
        }
        if state == EnemyState::Init {
            warn!("[Badguy] Refusing to move an enemy back to Init");
            return;
        }
        let last = self.state;
        self.state = state;
        let rule = rule_for(state);
        match rule.timer {
            Some(period) => self.state_timer.start(period),
            None => self.state_timer.stop(),
        }
        match rule.group {
            GroupOnEnter::Keep => {}
            GroupOnEnter::ActiveGroup => self.group = self.colgroup_active,
            GroupOnEnter::Set(group) => self.group = group,
        }
        if rule.reaps_from.contains(&last) {
            self.remove_me();
        }
    }

    pub fn is_offscreen(&self, sector: &dyn Sector) -> bool {
        let Some(player) = sector.nearest_player(&self.bbox) else {
            return false;
        };
        let anchor = if sector.editor_active() {
            ViewAnchor::Camera(sector.camera_center())
        } else {
            ViewAnchor::Player(player)
        };
        culling::is_offscreen(&self.bbox, Some(anchor))
    }

    /// True when there is no static terrain in a `height`-tall column just
    /// below the leading bottom corner.
    pub fn might_fall(&self, sector: &dyn Sector, height: i32) -> bool {
        assert!(height > 0, "might_fall needs a positive probe height");
        let y1 = self.bbox.max.y + 1.0;
        let y2 = y1 + height as f32;
        let (x1, x2) = if self.direction == Direction::Left {
            (self.bbox.min.x - 1.0, self.bbox.min.x)
        } else {
            (self.bbox.max.x, self.bbox.max.x + 1.0)
        };
        sector.is_free_of_statics(&Rect::new(x1, y1, x2, y2))
    }

    pub fn update_on_ground_flag(&mut self, hit: &CollisionHit) {
        if hit.bottom {
            self.on_ground_flag = true;
            self.floor_normal = hit.slope_normal;
        }
    }

    pub fn default_active_update(&mut self, sector: &mut dyn Sector, dt: f32) {
        self.movement = self.physic.get_movement(dt, sector.gravity());
        if self.frozen {
            self.sprite.stop_animation();
        }
    }

    pub fn default_collision_solid(&mut self, hit: &CollisionHit) {
        self.physic.set_velocity(0.0, 0.0);
        self.update_on_ground_flag(hit);
    }

    pub fn default_collision_player(
        &mut self,
        sector: &mut dyn Sector,
        player: &mut dyn PlayerHandle,
    ) -> HitResponse {
        if player.is_invincible() {
            self.kill_fall(sector);
            return HitResponse::AbortMove;
        }
        if self.frozen {
            return HitResponse::ForceMove;
        }
        player.kill(false);
        HitResponse::ForceMove
    }

    /// Frozen enemies shatter under a butt-jump; anything else is refused.
    pub fn default_collision_squished(
        &mut self,
        sector: &mut dyn Sector,
        player: &mut dyn PlayerHandle,
    ) -> bool {
        if self.frozen && player.does_buttjump() {
            player.bounce(self.bbox);
            self.kill_fall(sector);
            return true;
        }
        false
    }

    pub fn default_collision_tile(
        &mut self,
        sector: &mut dyn Sector,
        attributes: TileAttributes,
        caps: Capabilities,
    ) {
        if !self.is_active() {
            return;
        }

        let water = attributes.contains(TileAttributes::WATER);
        if water && !self.in_water {
            self.in_water = true;
            sector.play_sound(SoundCue::Splash, Some(self.position()));
        } else if !water && self.in_water {
            self.in_water = false;
        }

        if attributes.contains(TileAttributes::HURTS) && caps.hurtable {
            if attributes.contains(TileAttributes::FIRE) {
                if caps.flammable {
                    self.ignite(sector, caps);
                }
            } else if attributes.contains(TileAttributes::ICE) {
                if caps.freezable {
                    self.freeze(caps);
                }
            } else {
                self.kill_fall(sector);
            }
        }
    }

    pub fn kill_squished(&mut self, sector: &mut dyn Sector, player: Option<&mut dyn PlayerHandle>) {
        if !self.is_active() {
            return;
        }
        sector.play_sound(SoundCue::Squish, Some(self.position()));
        self.physic.enable_gravity(true);
        self.physic.set_velocity(0.0, 0.0);
        self.set_state(EnemyState::Squished);
        self.group = CollisionGroup::MovingOnlyStatic;
        if let Some(player) = player {
            player.bounce(self.bbox);
        }
        self.ledger.notify(sector);
    }

    pub fn kill_fall(&mut self, sector: &mut dyn Sector) {
        if !self.is_active() {
            return;
        }
        if self.frozen {
            sector.play_sound(SoundCue::Brick, None);
            self.shatter(sector);
            self.ledger.notify(sector);
            self.remove_me();
        } else {
            sector.play_sound(SoundCue::Fall, Some(self.position()));
            self.physic.set_velocity_y(0.0);
            self.physic.set_acceleration_y(0.0);
            self.physic.enable_gravity(true);
            self.set_state(EnemyState::Falling);
            // Stay in front of everything so hidden tilemaps are not revealed.
            self.layer = sector.foremost_layer() + 1;
            self.ledger.notify(sector);
        }
    }

    fn shatter(&mut self, sector: &mut dyn Sector) {
        let size = self.bbox.size();
        let center = size / 2.0;
        let gravity = sector.gravity();
        let mut x = 0.0;
        while x < size.x {
            let mut y = 0.0;
            while y < size.y {
                let offset = Vec2::new(x, y);
                sector.spawn_effect(EffectSpawn::SpriteParticle {
                    sprite: ICE_SHARD_SPRITE.to_string(),
                    action: "default".to_string(),
                    position: self.bbox.min + offset,
                    velocity: Vec2::new((x - center.x) * 8.0, (y - center.y) * 8.0 + 100.0),
                    acceleration: Vec2::new(0.0, gravity),
                    layer: LAYER_OBJECTS + 1,
                });
                y += ICE_SHARD_SPACING;
            }
            x += ICE_SHARD_SPACING;
        }
    }

    /// Freezes the enemy when its variant allows it. Burning enemies stay
    /// burning.
    pub fn freeze(&mut self, caps: Capabilities) {
        if !caps.freezable || self.ignited {
            return;
        }
        self.group = CollisionGroup::MovingStatic;
        self.frozen = true;

        if self.sprite.has_action("iced-left") {
            let action = self.direction.action("iced");
            self.sprite.set_action(&action, 1);
        } else if self.sprite.has_action("iced") {
            self.sprite.set_action("iced", 1);
        } else {
            self.sprite.set_color(FROZEN_TINT);
            self.sprite.stop_animation();
        }
    }

    pub fn unfreeze(&mut self) {
        self.group = self.colgroup_active;
        self.frozen = false;

        if !self.sprite.has_action("iced-left") && !self.sprite.has_action("iced") {
            self.sprite.set_color(Color::WHITE);
            self.sprite.set_animation_loops(-1);
        }
    }

    /// Sets the enemy on fire. The visual branch depends on which actions
    /// the sprite offers; without any of them the enemy just falls. Frozen
    /// enemies have to be thawed first.
    pub fn ignite(&mut self, sector: &mut dyn Sector, caps: Capabilities) {
        if !caps.flammable || self.ignited || self.frozen {
            return;
        }

        self.physic.enable_gravity(true);
        self.physic.set_velocity(0.0, 0.0);
        self.group = CollisionGroup::MovingOnlyStatic;
        self.sprite.stop_animation();
        self.ignited = true;

        let pos = Some(self.position());
        if self.sprite.has_action("melting-left") {
            if self.sprite.has_action("ground-melting-left") && self.on_ground() {
                let action = self.direction.action("ground-melting");
                self.sprite.set_action(&action, 1);
                sector.play_sound(SoundCue::Splash, pos);
                self.set_state(EnemyState::GroundMelting);
            } else {
                let action = self.direction.action("melting");
                self.sprite.set_action(&action, 1);
                sector.play_sound(SoundCue::Sizzle, pos);
                self.set_state(EnemyState::Melting);
            }
            self.ledger.notify(sector);
        } else if self.sprite.has_action("burning-left") {
            self.glowing = true;
            sector.play_sound(SoundCue::Fire, pos);
            let action = self.direction.action("burning");
            self.sprite.set_action(&action, 1);
            self.set_state(EnemyState::Burning);
            self.ledger.notify(sector);
        } else if self.sprite.has_action("inside-melting-left") {
            sector.play_sound(SoundCue::Splash, pos);
            let action = self.direction.action("inside-melting");
            self.sprite.set_action(&action, 1);
            self.set_state(EnemyState::InsideMelting);
            self.ledger.notify(sector);
        } else {
            self.kill_fall(sector);
        }
    }

    fn tick_dying(&mut self, exit: ExitRule, sector: &mut dyn Sector, water_sprite: &str, dt: f32) {
        self.state_timer.tick(dt);
        if exit == ExitRule::TimerExpired && self.state_timer.check() {
            self.remove_me();
            return;
        }
        self.movement = self.physic.get_movement(dt, sector.gravity());

        match exit {
            ExitRule::External | ExitRule::TimerExpired => {}
            ExitRule::AnimationDone => {
                if self.sprite.animation_done() {
                    self.remove_me();
                }
            }
            ExitRule::AnimationDoneOrGround => {
                if self.sprite.animation_done() || self.on_ground() {
                    sector.spawn_effect(EffectSpawn::WaterDrop {
                        position: self.bbox.min,
                        sprite: water_sprite.to_string(),
                        velocity: self.physic.velocity(),
                    });
                    self.remove_me();
                }
            }
            ExitRule::GroundedAnimationThenGear => {
                if self.on_ground() && self.sprite.animation_done() {
                    let action = self.direction.action("gear");
                    self.sprite.set_action(&action, 1);
                    self.set_state(EnemyState::Gear);
                }
                self.spawn_droplet(sector, water_sprite);
            }
        }
    }

    fn spawn_droplet(&mut self, sector: &mut dyn Sector, water_sprite: &str) {
        let gravity = sector.gravity();
        let bbox = self.bbox;
        let rng = sector.rng();
        let index: u32 = rng.gen_range(0..3);
        let position = Vec2::new(
            bbox.min.x + rng.gen::<f32>() * bbox.width(),
            bbox.min.y + rng.gen::<f32>() * bbox.height(),
        );
        sector.spawn_effect(EffectSpawn::SpriteParticle {
            sprite: water_sprite.to_string(),
            action: format!("particle_{index}"),
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::new(0.0, gravity),
            layer: LAYER_OBJECTS - 1,
        });
    }
}

/// A hostile entity: shared core state plus its variant's behaviour.
pub struct Enemy {
    core: EnemyCore,
    behavior: Box<dyn EnemyBehavior>,
}

impl Enemy {
    pub fn new(config: &EnemyConfig, sprite: SpriteDef, behavior: Box<dyn EnemyBehavior>) -> Self {
        Self {
            core: EnemyCore::new(config, sprite),
            behavior,
        }
    }

    pub fn core(&self) -> &EnemyCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EnemyCore {
        &mut self.core
    }

    pub fn behavior_name(&self) -> &'static str {
        self.behavior.name()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.behavior.capabilities()
    }

    pub fn state(&self) -> EnemyState {
        self.core.state
    }

    pub fn is_active(&self) -> bool {
        self.core.is_active()
    }

    pub fn is_removed(&self) -> bool {
        self.core.removed
    }

    pub fn rival_view(&self) -> RivalView {
        RivalView {
            bbox: self.core.bbox,
            active: self.core.is_active(),
            group: self.core.group,
            frozen: self.core.frozen,
        }
    }

    /// One simulation tick.
    pub fn update(&mut self, sector: &mut dyn Sector, dt: f32) {
        let Self { core, behavior } = self;
        if core.removed {
            return;
        }

        if !sector.contains(&core.bbox) {
            if core.ledger.counted() {
                let start = core.start_position();
                warn!("[Badguy] Counted {} starting at ({}, {}) has left the sector", behavior.name(), start.x, start.y);
            }
            core.ledger.notify(sector);
            core.remove_me();
            return;
        }

        if core.state != EnemyState::Inactive && core.is_offscreen(sector) {
            if core.state == EnemyState::Active {
                behavior.deactivate(core);
            }
            core.set_state(EnemyState::Inactive);
            if core.removed {
                return;
            }
        }

        if !matches!(core.state, EnemyState::Init | EnemyState::Inactive) {
            core.sprite.advance(dt);
        }

        let rule = rule_for(core.state);
        match rule.tick {
            TickAction::Behave => {
                let editing = sector.editor_active();
                core.is_active_flag = !editing;
                if !editing {
                    behavior.active_update(core, sector, dt);
                }
            }
            TickAction::Dormant => {
                core.is_active_flag = false;
                behavior.inactive_update(core, dt);
                try_activate(core, behavior.as_mut(), sector);
            }
            TickAction::Integrate => {
                core.is_active_flag = false;
                let water_sprite = behavior.water_sprite();
                core.tick_dying(rule.exit, sector, water_sprite, dt);
            }
        }

        core.on_ground_flag = false;
    }

    pub fn on_collision(
        &mut self,
        sector: &mut dyn Sector,
        other: Counterpart<'_>,
        hit: &CollisionHit,
    ) -> HitResponse {
        let Self { core, behavior } = self;
        if !core.is_active() {
            return HitResponse::AbortMove;
        }

        match other {
            Counterpart::Enemy(rival) => {
                if rival.active && rival.group == CollisionGroup::Moving {
                    behavior.collision_badguy(core, sector, &rival, hit)
                } else {
                    HitResponse::ForceMove
                }
            }
            Counterpart::Player(player) => {
                if hit_from_above(&player.bbox(), &core.bbox, SQUISH_MARGIN) {
                    if player.is_stone() {
                        core.kill_fall(sector);
                        return HitResponse::ForceMove;
                    }
                    if behavior.collision_squished(core, sector, &mut *player) {
                        return HitResponse::ForceMove;
                    }
                }
                if player.is_stone() {
                    behavior.collision_solid(core, sector, hit);
                    return HitResponse::ForceMove;
                }
                behavior.collision_player(core, sector, player, hit)
            }
            Counterpart::Bullet(bullet) => behavior.collision_bullet(core, sector, bullet, hit),
            Counterpart::Other => HitResponse::ForceMove,
        }
    }

    pub fn collision_solid(&mut self, sector: &mut dyn Sector, hit: &CollisionHit) {
        if self.core.removed {
            return;
        }
        self.behavior.collision_solid(&mut self.core, sector, hit);
    }

    pub fn on_tile_collision(&mut self, sector: &mut dyn Sector, attributes: TileAttributes) {
        if self.core.removed {
            return;
        }
        self.behavior.collision_tile(&mut self.core, sector, attributes);
    }

    pub fn collision_bullet(
        &mut self,
        sector: &mut dyn Sector,
        bullet: &mut dyn BulletHandle,
        hit: &CollisionHit,
    ) -> HitResponse {
        self.behavior
            .collision_bullet(&mut self.core, sector, bullet, hit)
    }

    pub fn freeze(&mut self) {
        let caps = self.behavior.capabilities();
        self.core.freeze(caps);
    }

    pub fn unfreeze(&mut self) {
        self.core.unfreeze();
    }

    pub fn ignite(&mut self, sector: &mut dyn Sector) {
        let caps = self.behavior.capabilities();
        self.core.ignite(sector, caps);
    }

    pub fn extinguish(&mut self, sector: &mut dyn Sector) {
        self.behavior.extinguish(&mut self.core, sector);
    }

    pub fn kill_fall(&mut self, sector: &mut dyn Sector) {
        self.core.kill_fall(sector);
    }

    pub fn is_portable(&self) -> bool {
        self.behavior.is_portable() && !self.core.removed
    }

    /// Carries the enemy to `position`; ignored for non-portable variants.
    pub fn grab(&mut self, position: Vec2, direction: Direction) {
        if self.is_portable() {
            self.behavior.grab(&mut self.core, position, direction);
        }
    }

    pub fn ungrab(&mut self, direction: Direction) {
        if self.is_portable() {
            self.behavior.ungrab(&mut self.core, direction);
        }
    }

    pub fn kill_squished(&mut self, sector: &mut dyn Sector, player: Option<&mut dyn PlayerHandle>) {
        self.core.kill_squished(sector, player);
    }

    pub fn might_fall(&self, sector: &dyn Sector, height: i32) -> bool {
        self.core.might_fall(sector, height)
    }

    pub fn draw(&self) -> Vec<DrawRequest> {
        let core = &self.core;
        if core.removed || matches!(core.state, EnemyState::Init | EnemyState::Inactive) {
            return Vec::new();
        }
        let mut out = vec![DrawRequest::Sprite {
            action: core.sprite.action().to_string(),
            frame: core.sprite.frame(),
            position: core.position(),
            layer: core.layer,
            flip_vertical: core.state == EnemyState::Falling,
            color: core.sprite.color(),
        }];
        if core.glowing {
            out.push(DrawRequest::Light {
                sprite: LIGHT_SPRITE,
                position: core.bbox.center(),
            });
        }
        out
    }

    pub fn save(&self) -> EnemySave {
        EnemySave {
            x: self.core.bbox.min.x,
            y: self.core.bbox.min.y,
            direction: self.core.direction.as_str(),
            dead_script: self.core.ledger().dead_script().to_string(),
        }
    }
}

fn try_activate(core: &mut EnemyCore, behavior: &mut dyn EnemyBehavior, sector: &mut dyn Sector) {
    let Some(player) = sector.nearest_player(&core.bbox) else {
        return;
    };
    if core.is_offscreen(sector) {
        return;
    }

    core.set_state(EnemyState::Active);
    if !core.initialized {
        if core.start_direction == Direction::Auto {
            core.direction = if player.min.x > core.bbox.max.x {
                Direction::Right
            } else {
                Direction::Left
            };
        }
        behavior.initialize(core);
        core.initialized = true;
    }
    behavior.activate(core);
}
