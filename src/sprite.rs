use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

/// Tint applied to enemies frozen without a dedicated iced action.
pub const FROZEN_TINT: Color = Color::srgb(0.60, 0.72, 0.88);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ActionDef {
    #[serde(default = "default_frame_count")]
    pub frame_count: usize,
    #[serde(default = "default_fps")]
    pub fps: f32,
}

fn default_frame_count() -> usize {
    1
}

fn default_fps() -> f32 {
    10.0
}

impl ActionDef {
    pub fn new(frame_count: usize, fps: f32) -> Self {
        Self { frame_count, fps }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SpriteDef {
    #[serde(default)]
    pub default_action: String,
    #[serde(default)]
    pub actions: HashMap<String, ActionDef>,
}

impl SpriteDef {
    /// Builds a definition where every named action shares one timing.
    pub fn with_actions(names: &[&str], frame_count: usize, fps: f32) -> Self {
        let actions = names
            .iter()
            .map(|name| (name.to_string(), ActionDef::new(frame_count, fps)))
            .collect();
        Self {
            default_action: names.first().map(|n| n.to_string()).unwrap_or_default(),
            actions,
        }
    }
}

/// Named sprite definitions available to a level.
#[derive(Resource, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SpriteLibrary {
    pub sprites: HashMap<String, SpriteDef>,
}

impl SpriteLibrary {
    pub fn get(&self, name: &str) -> Option<&SpriteDef> {
        self.sprites.get(name)
    }
}

/// Playback state of one enemy's sprite.
///
/// `loops` follows the usual convention: negative plays forever, zero means
/// the current action has finished (or playback was stopped).
#[derive(Clone, Debug)]
pub struct AnimatedSprite {
    def: Arc<SpriteDef>,
    action: String,
    frame: usize,
    timer: f32,
    loops: i32,
    color: Color,
}

impl AnimatedSprite {
    pub fn new(def: SpriteDef) -> Self {
        let action = def.default_action.clone();
        Self {
            def: Arc::new(def),
            action,
            frame: 0,
            timer: 0.0,
            loops: -1,
            color: Color::WHITE,
        }
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.def.actions.contains_key(name)
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_action(&mut self, name: &str, loops: i32) {
        if !self.has_action(name) {
            debug!("[Badguy] Sprite has no action '{name}', keeping '{}'", self.action);
            return;
        }
        if self.action != name {
            self.action = name.to_string();
            self.frame = 0;
            self.timer = 0.0;
        }
        self.loops = loops;
    }

    pub fn animation_done(&self) -> bool {
        self.loops == 0
    }

    pub fn stop_animation(&mut self) {
        self.loops = 0;
    }

    pub fn set_animation_loops(&mut self, loops: i32) {
        self.loops = loops;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn advance(&mut self, dt: f32) {
        if self.loops == 0 {
            return;
        }
        let Some(clip) = self.def.actions.get(&self.action) else {
            return;
        };
        if clip.fps <= 0.0 || clip.frame_count == 0 {
            return;
        }
        self.timer += dt;
        let frame_time = 1.0 / clip.fps;
        while self.timer >= frame_time {
            self.timer -= frame_time;
            if self.frame + 1 < clip.frame_count {
                self.frame += 1;
                continue;
            }
            if self.loops > 0 {
                self.loops -= 1;
                if self.loops == 0 {
                    self.timer = 0.0;
                    break;
                }
            }
            self.frame = 0;
        }
    }
}
