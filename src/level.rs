use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{
    Dispenser, EditorMode, EnemyActor, LevelRng, LevelStats, PlayerActor, SectorSettings,
};
use crate::config::{EnemyConfig, EnemyKind};
use crate::enemy::Enemy;
use crate::scripting::LevelScripts;
use crate::spawner::SpawnerRegistry;
use crate::sprite::{SpriteDef, SpriteLibrary};
use crate::tilemap::Tilemap;
use crate::variants::{behavior_for, default_sprite};

const EMBEDDED_LEVEL: &str = include_str!(concat!(env!("OUT_DIR"), "/badguy_embedded_level.json"));

fn default_player_size() -> f32 {
    32.0
}

fn default_interval() -> f32 {
    2.0
}

fn default_seed() -> u64 {
    0x5eed
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSpawn {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_player_size")]
    pub width: f32,
    #[serde(default = "default_player_size")]
    pub height: f32,
    #[serde(default)]
    pub invincible: bool,
    #[serde(default)]
    pub stone: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispenserConfig {
    pub name: String,
    /// Simultaneously alive children; absent means unbounded.
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default = "default_interval")]
    pub interval: f32,
    pub enemy: EnemyConfig,
}

/// A level file: terrain, actors and the scripts they may trigger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelFile {
    #[serde(default)]
    pub name: String,
    pub tilemap: Tilemap,
    #[serde(default)]
    pub settings: SectorSettings,
    #[serde(default)]
    pub players: Vec<PlayerSpawn>,
    #[serde(default)]
    pub enemies: Vec<EnemyConfig>,
    #[serde(default)]
    pub dispensers: Vec<DispenserConfig>,
    #[serde(default)]
    pub scripts: HashMap<String, String>,
    #[serde(default)]
    pub sprites: HashMap<String, SpriteDef>,
    #[serde(default)]
    pub editor: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl LevelFile {
    pub fn from_json(text: &str) -> Result<Self, String> {
        let level: LevelFile = serde_json::from_str(text).map_err(|e| e.to_string())?;
        level.tilemap.validate()?;
        Ok(level)
    }

    pub fn load(path: &str) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
        Self::from_json(&text).map_err(|e| format!("{path}: {e}"))
    }

    /// Level baked in by `build.rs`, if one was configured.
    pub fn embedded() -> Option<Result<Self, String>> {
        let text = EMBEDDED_LEVEL.trim();
        if text.is_empty() || text == "{}" {
            return None;
        }
        Some(Self::from_json(text))
    }

    /// Patrol corridor with a lava pit, a pond, a bomb and a dispenser.
    pub fn builtin() -> Self {
        let tilemap = Tilemap::test_level();
        let floor_top = (tilemap.height as f32 - 1.0) * tilemap.tile_size;

        let mut walker = EnemyConfig::at(320.0, floor_top - 32.0);
        walker.dead_script = "walker_down".to_string();
        let mut skydive = EnemyConfig::at(600.0, floor_top - 160.0);
        skydive.kind = EnemyKind::SkyDive;
        let mut snowman = EnemyConfig::at(820.0, floor_top - 64.0);
        snowman.direction = "right".to_string();
        let mut feeder = EnemyConfig::at(420.0, floor_top - 32.0);
        feeder.direction = "right".to_string();
        feeder.counted = false;

        let mut scripts = HashMap::new();
        scripts.insert(
            "walker_down".to_string(),
            r#"
                let downs = get_var("walkers_down");
                if type_of(downs) == "()" { downs = 0; }
                set_var("walkers_down", downs + 1);
                emit("walker_down", #{ total: downs + 1, source: SOURCE });
            "#
            .to_string(),
        );

        let mut sprites = HashMap::new();
        sprites.insert(
            default_sprite(EnemyKind::Walker).to_string(),
            SpriteDef::with_actions(
                &[
                    "left",
                    "right",
                    "squished-left",
                    "squished-right",
                    "iced-left",
                    "iced-right",
                    "melting-left",
                    "melting-right",
                ],
                4,
                10.0,
            ),
        );
        sprites.insert(
            default_sprite(EnemyKind::SkyDive).to_string(),
            SpriteDef::with_actions(&["left", "right"], 2, 8.0),
        );
        sprites.insert(
            default_sprite(EnemyKind::Plain).to_string(),
            SpriteDef::with_actions(&["left", "right", "burning-left", "burning-right"], 4, 12.0),
        );

        Self {
            name: "builtin".to_string(),
            tilemap,
            settings: SectorSettings::default(),
            players: vec![PlayerSpawn {
                x: 96.0,
                y: floor_top - 32.0,
                width: default_player_size(),
                height: default_player_size(),
                invincible: false,
                stone: false,
            }],
            enemies: vec![walker, skydive, snowman],
            dispensers: vec![DispenserConfig {
                name: "lava_feeder".to_string(),
                limit: Some(1),
                interval: 3.0,
                enemy: feeder,
            }],
            scripts,
            sprites,
            editor: false,
            seed: default_seed(),
        }
    }

    /// Inserts the level's resources and spawns its actors into `world`.
    pub fn install(self, world: &mut World) {
        let library = SpriteLibrary {
            sprites: self.sprites,
        };

        let mut scripts = LevelScripts::default();
        for (name, source) in self.scripts {
            scripts.load_script(name, source);
        }

        let mut stats = LevelStats::default();
        for config in &self.enemies {
            if config.counted {
                stats.counted_enemies += 1;
            }
            world.spawn(EnemyActor(build_enemy(config, &library)));
        }

        let mut registry = SpawnerRegistry::default();
        let dispenser_count = self.dispensers.len();
        for dispenser in self.dispensers {
            let id = registry.register(dispenser.name, dispenser.limit);
            world.spawn(Dispenser {
                id,
                template: dispenser.enemy,
                interval: dispenser.interval.max(0.0),
                timer: 0.0,
            });
        }

        for player in &self.players {
            let mut actor = PlayerActor::at(Rect::new(
                player.x,
                player.y,
                player.x + player.width,
                player.y + player.height,
            ));
            actor.invincible = player.invincible;
            actor.stone = player.stone;
            world.spawn(actor);
        }

        info!(
            "[Badguy] Level '{}' installed: {} enemies, {} dispensers, {} players",
            self.name,
            self.enemies.len(),
            dispenser_count,
            self.players.len()
        );

        world.insert_resource(self.tilemap);
        world.insert_resource(self.settings);
        world.insert_resource(EditorMode(self.editor));
        world.insert_resource(LevelRng::seeded(self.seed));
        world.insert_resource(library);
        world.insert_resource(scripts);
        world.insert_resource(stats);
        world.insert_resource(registry);
    }
}

/// Builds an enemy from its configuration, resolving the sprite by name.
pub fn build_enemy(config: &EnemyConfig, sprites: &SpriteLibrary) -> Enemy {
    let name = if config.sprite.is_empty() {
        default_sprite(config.kind)
    } else {
        config.sprite.as_str()
    };
    let sprite = sprites.get(name).cloned().unwrap_or_else(|| {
        debug!("[Badguy] No sprite definition '{name}', using a bare left/right sprite");
        SpriteDef::with_actions(&["left", "right"], 1, 10.0)
    });
    Enemy::new(config, sprite, behavior_for(config.kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::collect_draw_requests;
    use crate::components::DrawList;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn builtin_level_is_valid_and_round_trips_through_json() {
        let level = LevelFile::builtin();
        assert!(level.tilemap.validate().is_ok());
        let text = serde_json::to_string(&level).expect("serialize level");
        let parsed = LevelFile::from_json(&text).expect("parse level");
        assert_eq!(parsed.enemies.len(), level.enemies.len());
        assert_eq!(parsed.enemies[0].dead_script, "walker_down");
        assert_eq!(parsed.dispensers[0].limit, Some(1));
    }

    #[test]
    fn minimal_level_fills_defaults() {
        let level = LevelFile::from_json(
            r#"{
                "tilemap": { "width": 2, "height": 1, "tiles": [0, 1] },
                "enemies": [{ "x": 0, "y": 0, "direction": "right" }]
            }"#,
        )
        .expect("parse level");
        assert_eq!(level.settings.gravity, 1000.0);
        assert_eq!(level.tilemap.tile_size, 32.0);
        assert!(level.players.is_empty());
        assert_eq!(level.seed, default_seed());
    }

    #[test]
    fn invalid_grid_is_reported() {
        let err = LevelFile::from_json(r#"{ "tilemap": { "width": 3, "height": 1, "tiles": [0] } }"#)
            .unwrap_err();
        assert!(err.contains("expected 3x1"));
        assert!(LevelFile::from_json("not json").is_err());
        assert!(LevelFile::load("/nonexistent/level.json").is_err());
    }

    #[test]
    fn install_spawns_actors_and_resources() {
        let mut world = World::new();
        world.init_resource::<DrawList>();
        LevelFile::builtin().install(&mut world);

        assert_eq!(world.query::<&EnemyActor>().iter(&world).count(), 3);
        assert_eq!(world.query::<&Dispenser>().iter(&world).count(), 1);
        assert_eq!(world.query::<&PlayerActor>().iter(&world).count(), 1);
        assert_eq!(world.resource::<LevelStats>().counted_enemies, 3);
        assert!(world.resource::<LevelScripts>().sources.contains_key("walker_down"));

        world
            .run_system_once(collect_draw_requests)
            .expect("collect draw requests");
        // Nothing has been activated yet.
        assert!(world.resource::<DrawList>().0.is_empty());
    }

    #[test]
    fn unknown_sprite_falls_back_to_bare_actions() {
        let mut config = EnemyConfig::at(0.0, 0.0);
        config.sprite = "missing".to_string();
        let enemy = build_enemy(&config, &SpriteLibrary::default());
        assert_eq!(enemy.behavior_name(), "walker");
        assert!(enemy.core().sprite.has_action("left"));
        assert!(!enemy.core().sprite.has_action("melting-left"));
    }
}
