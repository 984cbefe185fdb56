use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::spawner::SpawnerId;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    /// Configuration-only: resolved against the nearest player on first
    /// activation.
    Auto,
}

impl Direction {
    /// Parses a level-file direction. Unknown values fall back to `Auto`.
    pub fn parse(value: &str) -> Self {
        match value {
            "auto" => Direction::Auto,
            "left" => Direction::Left,
            "right" => Direction::Right,
            other => {
                warn!("[Badguy] Unknown direction \"{other}\", using \"auto\"");
                Direction::Auto
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Auto => "auto",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Auto => Direction::Auto,
        }
    }

    /// Picks the `-left`/`-right` flavour of a sprite action.
    pub fn action(self, base: &str) -> String {
        match self {
            Direction::Right => format!("{base}-right"),
            _ => format!("{base}-left"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    #[default]
    Walker,
    #[serde(rename = "skydive")]
    SkyDive,
    /// No movement policy of its own; only the shared core behaviour.
    Plain,
}

fn default_size() -> f32 {
    32.0
}

fn default_direction() -> String {
    "auto".to_string()
}

fn default_counted() -> bool {
    true
}

/// Enemy entry of a level file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnemyConfig {
    #[serde(default)]
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_size")]
    pub width: f32,
    #[serde(default = "default_size")]
    pub height: f32,
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default, rename = "dead-script")]
    pub dead_script: String,
    #[serde(default)]
    pub sprite: String,
    #[serde(default = "default_counted")]
    pub counted: bool,
    #[serde(skip)]
    pub spawner: Option<SpawnerId>,
}

impl EnemyConfig {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            kind: EnemyKind::default(),
            x,
            y,
            width: default_size(),
            height: default_size(),
            direction: default_direction(),
            dead_script: String::new(),
            sprite: String::new(),
            counted: true,
            spawner: None,
        }
    }

    pub fn bbox(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Persisted form of an enemy.
#[derive(Clone, Debug, Serialize)]
pub struct EnemySave {
    pub x: f32,
    pub y: f32,
    pub direction: &'static str,
    #[serde(rename = "dead-script", skip_serializing_if = "String::is_empty")]
    pub dead_script: String,
}
