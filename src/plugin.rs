use bevy::ecs::schedule::SystemConfigs;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand::rngs::SmallRng;

use crate::audio::SoundCue;
use crate::collision::{CollisionGroup, CollisionHit, Counterpart, PlayerHandle, RivalView};
use crate::components::{
    Bullet, CameraFocus, Dispenser, DrawList, EditorMode, EffectInstance, EnemyActor, LevelRng,
    LevelStats, PendingEffects, PlayerActor, SectorSettings,
};
use crate::enemy::DrawRequest;
use crate::events::{
    GameEventBus, EFFECT_SPAWNED, ENEMY_KILLED, ENEMY_REMOVED, ENEMY_SPAWNED, SFX,
};
use crate::level::build_enemy;
use crate::scripting::{run_pending_scripts, LevelScripts};
use crate::sector::{EffectSpawn, Sector};
use crate::spawner::{SpawnerId, SpawnerRegistry};
use crate::sprite::SpriteLibrary;
use crate::tilemap::Tilemap;

/// Half-extent of the area an explosion damages.
pub const EXPLOSION_RADIUS: f32 = 48.0;
const EXPLOSION_LIFETIME: f32 = 0.5;
const PARTICLE_LIFETIME: f32 = 1.0;
const WATER_DROP_LIFETIME: f32 = 2.0;

/// Resources an enemy reaches through [`Sector`].
#[derive(SystemParam)]
pub struct SectorCtx<'w> {
    tilemap: Res<'w, Tilemap>,
    settings: Res<'w, SectorSettings>,
    editor: Res<'w, EditorMode>,
    camera: Res<'w, CameraFocus>,
    stats: ResMut<'w, LevelStats>,
    spawners: ResMut<'w, SpawnerRegistry>,
    scripts: ResMut<'w, LevelScripts>,
    bus: ResMut<'w, GameEventBus>,
    rng: ResMut<'w, LevelRng>,
    effects: ResMut<'w, PendingEffects>,
}

impl<'w> SectorCtx<'w> {
    fn sector<'a>(&'a mut self, players: &'a [Rect], source: Entity) -> EcsSector<'a> {
        EcsSector {
            tilemap: &self.tilemap,
            settings: *self.settings,
            editor: self.editor.0,
            camera: self.camera.0,
            stats: &mut *self.stats,
            spawners: &mut *self.spawners,
            scripts: &mut *self.scripts,
            bus: &mut *self.bus,
            rng: &mut self.rng.0,
            effects: &mut self.effects.0,
            players,
            source: Some(source.to_bits()),
        }
    }
}

/// [`Sector`] backed by the ECS world, scoped to a single enemy.
pub struct EcsSector<'a> {
    pub tilemap: &'a Tilemap,
    pub settings: SectorSettings,
    pub editor: bool,
    pub camera: Vec2,
    pub stats: &'a mut LevelStats,
    pub spawners: &'a mut SpawnerRegistry,
    pub scripts: &'a mut LevelScripts,
    pub bus: &'a mut GameEventBus,
    pub rng: &'a mut SmallRng,
    pub effects: &'a mut Vec<EffectSpawn>,
    pub players: &'a [Rect],
    pub source: Option<u64>,
}

impl Sector for EcsSector<'_> {
    /// The top of the level is open: enemies may leave the screen upwards.
    fn contains(&self, bbox: &Rect) -> bool {
        let bounds = self.tilemap.bounds();
        bbox.min.x < bounds.max.x && bbox.max.x > bounds.min.x && bbox.min.y < bounds.max.y
    }

    fn nearest_player(&self, bbox: &Rect) -> Option<Rect> {
        let center = bbox.center();
        self.players.iter().copied().min_by(|a, b| {
            a.center()
                .distance_squared(center)
                .total_cmp(&b.center().distance_squared(center))
        })
    }

    fn editor_active(&self) -> bool {
        self.editor
    }

    fn camera_center(&self) -> Vec2 {
        self.camera
    }

    fn gravity(&self) -> f32 {
        self.settings.gravity
    }

    fn foremost_layer(&self) -> i32 {
        self.settings.foremost_layer
    }

    fn is_free_of_statics(&self, area: &Rect) -> bool {
        self.tilemap.is_free_of_statics(area)
    }

    fn spawn_effect(&mut self, effect: EffectSpawn) {
        self.bus.emit(
            EFFECT_SPAWNED,
            serde_json::json!({ "effect": effect.label() }),
            self.source,
        );
        self.effects.push(effect);
    }

    fn play_sound(&mut self, cue: SoundCue, position: Option<Vec2>) {
        let data = match position {
            Some(p) => serde_json::json!({ "name": cue.name(), "position": [p.x, p.y] }),
            None => serde_json::json!({ "name": cue.name() }),
        };
        self.bus.emit(SFX, data, self.source);
    }

    fn run_script(&mut self, script: &str, source: &str) {
        self.scripts.request(script, source);
    }

    fn record_kill(&mut self) {
        self.stats.kills += 1;
        self.bus.emit(
            ENEMY_KILLED,
            serde_json::json!({ "kills": self.stats.kills }),
            self.source,
        );
    }

    fn notify_spawner(&mut self, spawner: SpawnerId) {
        self.spawners.notify_dead(spawner);
    }

    fn rng(&mut self) -> &mut SmallRng {
        self.rng
    }
}

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Tilemap>()
            .init_resource::<SectorSettings>()
            .init_resource::<EditorMode>()
            .init_resource::<CameraFocus>()
            .init_resource::<LevelStats>()
            .init_resource::<SpawnerRegistry>()
            .init_resource::<LevelRng>()
            .init_resource::<PendingEffects>()
            .init_resource::<DrawList>()
            .init_resource::<SpriteLibrary>()
            .add_systems(FixedUpdate, enemy_tick_systems())
            .add_observer(forget_despawned_dispenser);
    }
}

/// One fixed step of the enemy simulation, in order.
pub fn enemy_tick_systems() -> SystemConfigs {
    (
        tick_dispensers,
        move_enemies,
        resolve_contacts,
        update_enemies,
        move_bullets,
        spawn_pending_effects,
        update_effects,
        despawn_removed_enemies,
        collect_draw_requests,
        run_pending_scripts,
    )
        .chain()
}

fn live_players<'a>(players: impl Iterator<Item = &'a PlayerActor>) -> Vec<Rect> {
    players.filter(|p| !p.killed).map(|p| p.bbox).collect()
}

fn overlaps(a: &Rect, b: &Rect) -> bool {
    !a.intersect(*b).is_empty()
}

/// Describes where `other` touches `own`, from `own`'s point of view. The
/// shallower overlap axis decides the side.
fn contact_hit(own: &Rect, other: &Rect) -> CollisionHit {
    let overlap = own.intersect(*other).size();
    let delta = other.center() - own.center();
    let mut hit = CollisionHit::default();
    if overlap.x < overlap.y {
        if delta.x < 0.0 {
            hit.left = true;
        } else {
            hit.right = true;
        }
    } else if delta.y < 0.0 {
        hit.top = true;
    } else {
        hit.bottom = true;
        hit.slope_normal = Vec2::new(0.0, -1.0);
    }
    hit
}

/// Spawns dispenser children while their spawner has room.
pub fn tick_dispensers(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    sprites: Res<SpriteLibrary>,
    mut registry: ResMut<SpawnerRegistry>,
    mut stats: ResMut<LevelStats>,
    mut bus: ResMut<GameEventBus>,
    mut dispensers: Query<&mut Dispenser>,
) {
    let dt = time.delta_secs();
    for mut dispenser in dispensers.iter_mut() {
        dispenser.timer -= dt;
        if dispenser.timer > 0.0 || !registry.can_spawn(dispenser.id) {
            continue;
        }
        let mut config = dispenser.template.clone();
        config.spawner = Some(dispenser.id);
        if !registry.record_spawn(dispenser.id) {
            continue;
        }
        if config.counted {
            stats.counted_enemies += 1;
        }
        let entity = commands.spawn(EnemyActor(build_enemy(&config, &sprites))).id();
        bus.emit(
            ENEMY_SPAWNED,
            serde_json::json!({ "kind": config.kind, "position": [config.x, config.y] }),
            Some(entity.to_bits()),
        );
        dispenser.timer = dispenser.interval;
    }
}

/// Unregisters the spawner of a despawned dispenser. Children still alive
/// keep a stale handle, so their deaths no longer reach the registry.
pub fn forget_despawned_dispenser(
    trigger: Trigger<OnRemove, Dispenser>,
    dispensers: Query<&Dispenser>,
    registry: Option<ResMut<SpawnerRegistry>>,
) {
    let (Ok(dispenser), Some(mut registry)) = (dispensers.get(trigger.entity()), registry) else {
        return;
    };
    if let Some(spawner) = registry.remove(dispenser.id) {
        debug!(
            "[Badguy] Spawner '{}' removed with {} children alive",
            spawner.name, spawner.alive
        );
    }
}

/// Applies each enemy's planned movement against the tile grid and reports
/// solid and tile contacts.
pub fn move_enemies(
    mut ctx: SectorCtx,
    players: Query<&PlayerActor>,
    mut enemies: Query<(Entity, &mut EnemyActor)>,
) {
    let boxes = live_players(players.iter());
    for (entity, mut actor) in enemies.iter_mut() {
        let enemy = &mut actor.0;
        if enemy.is_removed() {
            continue;
        }
        let movement = enemy.core().movement();
        if enemy.core().group() == CollisionGroup::Disabled {
            enemy.core_mut().move_by(movement);
            enemy.core_mut().set_movement(Vec2::ZERO);
            continue;
        }

        let result = ctx.tilemap.resolve_motion(enemy.core().bbox(), movement);
        let probe = Rect::from_corners(result.bbox.min - Vec2::ONE, result.bbox.max + Vec2::ONE);
        let touched = ctx.tilemap.touched_attributes(&probe);
        enemy.core_mut().set_pos(result.bbox.min);
        enemy.core_mut().set_movement(Vec2::ZERO);

        let mut sector = ctx.sector(&boxes, entity);
        if result.blocked {
            enemy.collision_solid(&mut sector, &result.hit);
        }
        if !touched.is_empty() {
            enemy.on_tile_collision(&mut sector, touched);
        }
    }
}

/// Overlap tests against other enemies, players and bullets.
pub fn resolve_contacts(
    mut ctx: SectorCtx,
    mut players: Query<&mut PlayerActor>,
    mut bullets: Query<&mut Bullet>,
    mut enemies: Query<(Entity, &mut EnemyActor)>,
) {
    let boxes = live_players(players.iter());
    let rivals: Vec<(Entity, RivalView)> = enemies
        .iter()
        .filter(|(_, actor)| !actor.0.is_removed())
        .map(|(entity, actor)| (entity, actor.0.rival_view()))
        .collect();

    for (entity, mut actor) in enemies.iter_mut() {
        let enemy = &mut actor.0;
        if enemy.is_removed() || enemy.core().group() == CollisionGroup::Disabled {
            continue;
        }

        for (other, view) in &rivals {
            if *other == entity || view.group == CollisionGroup::Disabled {
                continue;
            }
            let own = enemy.core().bbox();
            if !overlaps(&own, &view.bbox) {
                continue;
            }
            let hit = contact_hit(&own, &view.bbox);
            let mut sector = ctx.sector(&boxes, entity);
            enemy.on_collision(&mut sector, Counterpart::Enemy(*view), &hit);
        }

        for mut player in players.iter_mut() {
            let own = enemy.core().bbox();
            if player.killed || !overlaps(&own, &player.bbox) {
                continue;
            }
            let hit = contact_hit(&own, &player.bbox);
            let mut sector = ctx.sector(&boxes, entity);
            enemy.on_collision(&mut sector, Counterpart::Player(&mut *player), &hit);
        }

        for mut bullet in bullets.iter_mut() {
            let own = enemy.core().bbox();
            if bullet.removed || !overlaps(&own, &bullet.bbox) {
                continue;
            }
            let hit = contact_hit(&own, &bullet.bbox);
            let mut sector = ctx.sector(&boxes, entity);
            enemy.on_collision(&mut sector, Counterpart::Bullet(&mut *bullet), &hit);
        }
    }
}

pub fn update_enemies(
    time: Res<Time<Fixed>>,
    mut ctx: SectorCtx,
    players: Query<&PlayerActor>,
    mut enemies: Query<(Entity, &mut EnemyActor)>,
) {
    let dt = time.delta_secs();
    let boxes = live_players(players.iter());
    for (entity, mut actor) in enemies.iter_mut() {
        let mut sector = ctx.sector(&boxes, entity);
        actor.0.update(&mut sector, dt);
    }
}

/// Bullets fly straight and vanish on solid tiles or outside the level.
pub fn move_bullets(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    tilemap: Res<Tilemap>,
    mut bullets: Query<(Entity, &mut Bullet)>,
) {
    let dt = time.delta_secs();
    let bounds = tilemap.bounds();
    for (entity, mut bullet) in bullets.iter_mut() {
        if bullet.removed {
            commands.entity(entity).despawn();
            continue;
        }
        let step = bullet.velocity * dt;
        bullet.bbox = Rect::from_corners(bullet.bbox.min + step, bullet.bbox.max + step);
        if !tilemap.is_free_of_statics(&bullet.bbox) || !overlaps(&bullet.bbox, &bounds) {
            commands.entity(entity).despawn();
        }
    }
}

/// Turns this tick's effect requests into entities. Harmful explosions
/// knock out enemies and players within [`EXPLOSION_RADIUS`].
pub fn spawn_pending_effects(
    mut commands: Commands,
    mut ctx: SectorCtx,
    mut players: Query<&mut PlayerActor>,
    mut enemies: Query<(Entity, &mut EnemyActor)>,
) {
    let requested = std::mem::take(&mut ctx.effects.0);
    if requested.is_empty() {
        return;
    }
    let boxes = live_players(players.iter());

    for effect in requested {
        let (position, velocity, acceleration, lifetime) = match &effect {
            EffectSpawn::WaterDrop {
                position, velocity, ..
            } => (
                *position,
                *velocity,
                Vec2::new(0.0, ctx.settings.gravity),
                WATER_DROP_LIFETIME,
            ),
            EffectSpawn::SpriteParticle {
                position,
                velocity,
                acceleration,
                ..
            } => (*position, *velocity, *acceleration, PARTICLE_LIFETIME),
            EffectSpawn::Explosion { position, hurts, .. } => {
                if *hurts {
                    let area = Rect::from_center_half_size(*position, Vec2::splat(EXPLOSION_RADIUS));
                    for (entity, mut actor) in enemies.iter_mut() {
                        if actor.0.is_removed() || !overlaps(&area, &actor.0.core().bbox()) {
                            continue;
                        }
                        let mut sector = ctx.sector(&boxes, entity);
                        actor.0.kill_fall(&mut sector);
                    }
                    for mut player in players.iter_mut() {
                        if overlaps(&area, &player.bbox) {
                            player.kill(false);
                        }
                    }
                }
                (*position, Vec2::ZERO, Vec2::ZERO, EXPLOSION_LIFETIME)
            }
        };
        commands.spawn(EffectInstance {
            effect,
            position,
            velocity,
            acceleration,
            age: 0.0,
            lifetime,
        });
    }
}

pub fn update_effects(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut effects: Query<(Entity, &mut EffectInstance)>,
) {
    let dt = time.delta_secs();
    for (entity, mut effect) in effects.iter_mut() {
        effect.age += dt;
        if effect.age >= effect.lifetime {
            commands.entity(entity).despawn();
            continue;
        }
        let acceleration = effect.acceleration;
        effect.velocity += acceleration * dt;
        let velocity = effect.velocity;
        effect.position += velocity * dt;
    }
}

pub fn despawn_removed_enemies(
    mut commands: Commands,
    mut bus: ResMut<GameEventBus>,
    enemies: Query<(Entity, &EnemyActor)>,
) {
    for (entity, actor) in enemies.iter() {
        if !actor.0.is_removed() {
            continue;
        }
        bus.emit(
            ENEMY_REMOVED,
            serde_json::json!({
                "kind": actor.0.behavior_name(),
                "state": actor.0.state(),
            }),
            Some(entity.to_bits()),
        );
        commands.entity(entity).despawn();
    }
}

pub fn collect_draw_requests(mut list: ResMut<DrawList>, enemies: Query<(Entity, &EnemyActor)>) {
    list.0.clear();
    for (entity, actor) in enemies.iter() {
        list.0
            .extend(actor.0.draw().into_iter().map(|request| (entity, request)));
    }
    list.0.sort_by_key(|(_, request)| match request {
        DrawRequest::Sprite { layer, .. } => *layer,
        DrawRequest::Light { .. } => i32::MAX,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::BonusKind;
    use crate::config::{EnemyConfig, EnemyKind};
    use crate::scripting::RhaiRuntime;
    use crate::sprite::SpriteDef;
    use crate::state::EnemyState;
    use std::time::Duration;

    const FLOOR_Y: f32 = 160.0;

    /// 20x6 level whose bottom row is solid floor.
    fn floor_map() -> Tilemap {
        let mut map = Tilemap::new(20, 6, 32.0);
        for x in 0..20 {
            map.set_tile(x, 5, 1);
        }
        map
    }

    fn test_world(map: Tilemap) -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(Time::<Fixed>::from_hz(60.0));
        world.insert_resource(map);
        world.init_resource::<SectorSettings>();
        world.init_resource::<EditorMode>();
        world.init_resource::<CameraFocus>();
        world.init_resource::<LevelStats>();
        world.init_resource::<SpawnerRegistry>();
        world.init_resource::<LevelScripts>();
        world.init_resource::<GameEventBus>();
        world.init_resource::<LevelRng>();
        world.init_resource::<PendingEffects>();
        world.init_resource::<DrawList>();
        let mut sprites = SpriteLibrary::default();
        sprites.sprites.insert(
            "torch".to_string(),
            SpriteDef::with_actions(&["left", "right", "burning-left", "burning-right"], 4, 10.0),
        );
        world.insert_resource(sprites);
        world.init_non_send_resource::<RhaiRuntime>();

        let mut schedule = Schedule::default();
        schedule.add_systems(enemy_tick_systems());
        (world, schedule)
    }

    fn step(world: &mut World, schedule: &mut Schedule, ticks: usize) {
        for _ in 0..ticks {
            world
                .resource_mut::<Time<Fixed>>()
                .advance_by(Duration::from_secs_f64(1.0 / 60.0));
            schedule.run(world);
        }
    }

    fn spawn_enemy(world: &mut World, config: EnemyConfig) -> Entity {
        let enemy = build_enemy(&config, world.resource::<SpriteLibrary>());
        world.spawn(EnemyActor(enemy)).id()
    }

    fn enemy_on_floor(kind: EnemyKind, x: f32) -> EnemyConfig {
        let mut config = EnemyConfig::at(x, FLOOR_Y - 32.0);
        config.kind = kind;
        config.direction = "left".to_string();
        config
    }

    fn state_of(world: &World, entity: Entity) -> Option<EnemyState> {
        world.get::<EnemyActor>(entity).map(|actor| actor.0.state())
    }

    fn enemy_count(world: &mut World) -> usize {
        world.query::<&EnemyActor>().iter(world).count()
    }

    #[test]
    fn contact_hit_picks_shallow_axis() {
        let own = Rect::new(0.0, 0.0, 32.0, 32.0);
        let hit = contact_hit(&own, &Rect::new(28.0, 4.0, 60.0, 30.0));
        assert!(hit.right && !hit.left && !hit.bottom);
        let hit = contact_hit(&own, &Rect::new(4.0, 28.0, 30.0, 60.0));
        assert!(hit.bottom);
        assert_eq!(hit.slope_normal, Vec2::new(0.0, -1.0));
        let hit = contact_hit(&own, &Rect::new(-20.0, 2.0, 4.0, 30.0));
        assert!(hit.left);
    }

    #[test]
    fn sector_is_open_at_the_top() {
        let tilemap = floor_map();
        let mut stats = LevelStats::default();
        let mut spawners = SpawnerRegistry::default();
        let mut scripts = LevelScripts::default();
        let mut bus = GameEventBus::default();
        let mut rng = LevelRng::default();
        let mut effects = Vec::new();
        let players = [Rect::new(400.0, 0.0, 432.0, 32.0), Rect::new(40.0, 0.0, 72.0, 32.0)];
        let mut sector = EcsSector {
            tilemap: &tilemap,
            settings: SectorSettings::default(),
            editor: false,
            camera: Vec2::ZERO,
            stats: &mut stats,
            spawners: &mut spawners,
            scripts: &mut scripts,
            bus: &mut bus,
            rng: &mut rng.0,
            effects: &mut effects,
            players: &players,
            source: None,
        };
        assert!(sector.contains(&Rect::new(10.0, -500.0, 42.0, -468.0)));
        assert!(!sector.contains(&Rect::new(10.0, 200.0, 42.0, 232.0)));
        assert!(!sector.contains(&Rect::new(-40.0, 10.0, -8.0, 42.0)));
        let nearest = sector.nearest_player(&Rect::new(0.0, 0.0, 32.0, 32.0));
        assert_eq!(nearest, Some(players[1]));

        sector.play_sound(SoundCue::Fall, Some(Vec2::new(3.0, 4.0)));
        sector.record_kill();
        assert_eq!(stats.kills, 1);
        let sfx = bus.recent.iter().find(|ev| ev.name == SFX).expect("sfx event");
        assert_eq!(sfx.data["position"], serde_json::json!([3.0, 4.0]));
    }

    #[test]
    fn enemy_settles_on_floor_and_walks() {
        let (mut world, mut schedule) = test_world(floor_map());
        world.spawn(PlayerActor::at(Rect::new(400.0, 128.0, 432.0, 160.0)));
        let mut config = enemy_on_floor(EnemyKind::Walker, 200.0);
        config.y -= 20.0;
        let walker = spawn_enemy(&mut world, config);

        step(&mut world, &mut schedule, 60);
        let actor = world.get::<EnemyActor>(walker).expect("walker alive");
        assert_eq!(actor.0.state(), EnemyState::Active);
        let bbox = actor.0.core().bbox();
        assert!((bbox.max.y - FLOOR_Y).abs() < 0.5, "bottom at {}", bbox.max.y);
        assert!(bbox.min.x < 200.0);
        assert!(!world.resource::<DrawList>().0.is_empty());
    }

    #[test]
    fn stomped_walker_is_squished_counted_and_despawned() {
        let (mut world, mut schedule) = test_world(floor_map());
        let mut config = enemy_on_floor(EnemyKind::Walker, 200.0);
        config.dead_script = "set_var(\"door\", \"open\");".to_string();
        let walker = spawn_enemy(&mut world, config);
        let player = world
            .spawn(PlayerActor::at(Rect::new(150.0, 100.0, 182.0, 132.0)))
            .id();

        step(&mut world, &mut schedule, 3);
        let bbox = world.get::<EnemyActor>(walker).expect("walker").0.core().bbox();
        world.get_mut::<PlayerActor>(player).expect("player").bbox =
            Rect::new(bbox.min.x, bbox.min.y - 28.0, bbox.max.x, bbox.min.y + 4.0);

        step(&mut world, &mut schedule, 1);
        assert_eq!(state_of(&world, walker), Some(EnemyState::Squished));
        let player_state = world.get::<PlayerActor>(player).expect("player");
        assert_eq!(player_state.bounces, 1);
        assert!(!player_state.killed);
        assert_eq!(world.resource::<LevelStats>().kills, 1);
        assert_eq!(
            world.resource::<LevelScripts>().vars.get("door"),
            Some(&serde_json::json!("open"))
        );
        assert!(world.resource::<GameEventBus>().count(SFX) >= 1);

        step(&mut world, &mut schedule, 125);
        assert_eq!(state_of(&world, walker), None);
        assert_eq!(world.resource::<GameEventBus>().count(ENEMY_REMOVED), 1);
        assert_eq!(world.resource::<LevelStats>().kills, 1);
    }

    #[test]
    fn lava_sends_enemy_tumbling_out_of_the_level() {
        let mut map = floor_map();
        for x in 5..10 {
            map.set_tile(x, 5, 2);
        }
        let (mut world, mut schedule) = test_world(map);
        world.spawn(PlayerActor::at(Rect::new(500.0, 128.0, 532.0, 160.0)));
        let enemy = spawn_enemy(&mut world, enemy_on_floor(EnemyKind::Plain, 224.0));

        step(&mut world, &mut schedule, 30);
        assert_eq!(state_of(&world, enemy), Some(EnemyState::Falling));
        assert_eq!(world.resource::<LevelStats>().kills, 1);

        step(&mut world, &mut schedule, 120);
        assert_eq!(state_of(&world, enemy), None);
        assert_eq!(world.resource::<LevelStats>().kills, 1);
        assert_eq!(world.resource::<GameEventBus>().count(ENEMY_KILLED), 1);
    }

    #[test]
    fn fire_bullet_sets_torch_burning() {
        let (mut world, mut schedule) = test_world(floor_map());
        world.spawn(PlayerActor::at(Rect::new(500.0, 128.0, 532.0, 160.0)));
        let mut config = enemy_on_floor(EnemyKind::Plain, 200.0);
        config.sprite = "torch".to_string();
        let torch = spawn_enemy(&mut world, config);
        step(&mut world, &mut schedule, 3);

        world.spawn(Bullet::new(
            BonusKind::Fire,
            Rect::new(226.0, 136.0, 234.0, 144.0),
            Vec2::ZERO,
        ));
        step(&mut world, &mut schedule, 1);
        assert_eq!(state_of(&world, torch), Some(EnemyState::Burning));
        assert_eq!(world.query::<&Bullet>().iter(&world).count(), 0);
        let glowing = world
            .resource::<DrawList>()
            .0
            .iter()
            .any(|(_, request)| matches!(request, DrawRequest::Light { .. }));
        assert!(glowing);
    }

    #[test]
    fn skydive_landing_blows_up_its_neighbour() {
        let (mut world, mut schedule) = test_world(floor_map());
        world.spawn(PlayerActor::at(Rect::new(500.0, 128.0, 532.0, 160.0)));
        let mut bomb = enemy_on_floor(EnemyKind::SkyDive, 100.0);
        bomb.y -= 8.0;
        let bomb = spawn_enemy(&mut world, bomb);
        let neighbour = spawn_enemy(&mut world, enemy_on_floor(EnemyKind::Plain, 140.0));

        step(&mut world, &mut schedule, 60);
        assert_eq!(state_of(&world, bomb), None);
        assert_ne!(state_of(&world, neighbour), Some(EnemyState::Active));
        assert_eq!(world.resource::<LevelStats>().kills, 2);
        assert!(world.resource::<GameEventBus>().count(EFFECT_SPAWNED) >= 1);

        step(&mut world, &mut schedule, 120);
        assert_eq!(enemy_count(&mut world), 0);
        assert_eq!(world.query::<&EffectInstance>().iter(&world).count(), 0);
    }

    #[test]
    fn dispenser_refills_after_its_child_dies() {
        let mut map = floor_map();
        for x in 5..10 {
            map.set_tile(x, 5, 2);
        }
        let (mut world, mut schedule) = test_world(map);
        world.spawn(PlayerActor::at(Rect::new(500.0, 128.0, 532.0, 160.0)));
        let id = world
            .resource_mut::<SpawnerRegistry>()
            .register("lava_feeder", Some(1));
        world.spawn(Dispenser {
            id,
            template: enemy_on_floor(EnemyKind::Plain, 224.0),
            interval: 0.5,
            timer: 0.0,
        });

        step(&mut world, &mut schedule, 2);
        assert_eq!(enemy_count(&mut world), 1);

        step(&mut world, &mut schedule, 240);
        let registry = world.resource::<SpawnerRegistry>();
        let spawner = registry.get(id).expect("spawner registered");
        assert!(spawner.spawned >= 2);
        assert!(spawner.deaths >= 1);
        assert!(spawner.alive <= 1);
        assert_eq!(
            world.resource::<GameEventBus>().total(ENEMY_SPAWNED),
            u64::from(spawner.spawned)
        );
    }

    #[test]
    fn despawned_dispenser_releases_its_spawner() {
        let (mut world, mut schedule) = test_world(floor_map());
        world.add_observer(forget_despawned_dispenser);
        world.spawn(PlayerActor::at(Rect::new(500.0, 128.0, 532.0, 160.0)));
        let id = world
            .resource_mut::<SpawnerRegistry>()
            .register("feeder", Some(2));
        let dispenser = world
            .spawn(Dispenser {
                id,
                template: enemy_on_floor(EnemyKind::Plain, 224.0),
                interval: 10.0,
                timer: 0.0,
            })
            .id();

        step(&mut world, &mut schedule, 2);
        assert_eq!(enemy_count(&mut world), 1);
        assert!(world.despawn(dispenser));
        assert!(world.resource::<SpawnerRegistry>().get(id).is_none());

        let reused = world
            .resource_mut::<SpawnerRegistry>()
            .register("replacement", None);
        assert_ne!(reused, id);
        step(&mut world, &mut schedule, 30);
        assert_eq!(enemy_count(&mut world), 1);
        assert_eq!(world.resource::<GameEventBus>().total(ENEMY_SPAWNED), 1);
    }

    #[test]
    fn editor_mode_keeps_enemies_passive() {
        let (mut world, mut schedule) = test_world(floor_map());
        world.insert_resource(EditorMode(true));
        world.spawn(PlayerActor::at(Rect::new(200.0, 128.0, 232.0, 160.0)));
        let walker = spawn_enemy(&mut world, enemy_on_floor(EnemyKind::Walker, 100.0));

        step(&mut world, &mut schedule, 30);
        let actor = world.get::<EnemyActor>(walker).expect("walker");
        assert_eq!(actor.0.state(), EnemyState::Active);
        assert!(!actor.0.is_active());
        assert_eq!(actor.0.core().bbox().min.x, 100.0);
    }
}
