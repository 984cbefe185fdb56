use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::{GameEvent, GameEventBus, SFX};

const MAX_AUDIO_EVENTS: usize = 256;

fn default_volume() -> f32 {
    1.0
}

/// Sound effects an enemy can trigger.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Squish,
    Fall,
    Splash,
    Fire,
    Sizzle,
    Brick,
}

impl SoundCue {
    pub const ALL: [SoundCue; 6] = [
        SoundCue::Squish,
        SoundCue::Fall,
        SoundCue::Splash,
        SoundCue::Fire,
        SoundCue::Sizzle,
        SoundCue::Brick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundCue::Squish => "squish",
            SoundCue::Fall => "fall",
            SoundCue::Splash => "splash",
            SoundCue::Fire => "fire",
            SoundCue::Sizzle => "sizzle",
            SoundCue::Brick => "brick",
        }
    }

    pub fn default_path(self) -> &'static str {
        match self {
            SoundCue::Squish => "sounds/squish.wav",
            SoundCue::Fall => "sounds/fall.wav",
            SoundCue::Splash => "sounds/splash.ogg",
            SoundCue::Fire => "sounds/fire.ogg",
            SoundCue::Sizzle => "sounds/sizzle.ogg",
            SoundCue::Brick => "sounds/brick.wav",
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SfxDefinition {
    pub path: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AudioEventLog {
    pub frame: u64,
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 2]>,
}

/// Resolves enemy sound cues to files and keeps a log of what played.
#[derive(Resource)]
pub struct AudioManager {
    pub sfx: HashMap<String, SfxDefinition>,
    pub sfx_volume: f32,
    pub recent_events: Vec<AudioEventLog>,
}

impl Default for AudioManager {
    fn default() -> Self {
        let sfx = SoundCue::ALL
            .into_iter()
            .map(|cue| {
                (
                    cue.name().to_string(),
                    SfxDefinition {
                        path: cue.default_path().to_string(),
                        volume: 1.0,
                    },
                )
            })
            .collect();
        Self {
            sfx,
            sfx_volume: 1.0,
            recent_events: Vec::new(),
        }
    }
}

impl AudioManager {
    pub fn play_sfx(
        &mut self,
        name: &str,
        frame: u64,
        position: Option<Vec2>,
    ) -> Result<(), String> {
        let Some(def) = self.sfx.get(name) else {
            return Err(format!("Unknown sfx: {name}"));
        };
        let event = AudioEventLog {
            frame,
            name: name.to_string(),
            path: def.path.clone(),
            volume: Some(def.volume * self.sfx_volume),
            position: position.map(|p| [p.x, p.y]),
        };
        self.push_event(event);
        Ok(())
    }

    fn push_event(&mut self, event: AudioEventLog) {
        self.recent_events.push(event);
        if self.recent_events.len() > MAX_AUDIO_EVENTS {
            let excess = self.recent_events.len() - MAX_AUDIO_EVENTS;
            self.recent_events.drain(0..excess);
        }
    }
}

/// How many `sfx` events have been handed to the [`AudioManager`].
#[derive(Resource, Default)]
struct SfxCursor {
    seen: u64,
}

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioManager>()
            .init_resource::<SfxCursor>()
            .add_systems(Update, play_sfx_from_events);
    }
}

/// Plays the `sfx` events emitted since the last run. Events evicted from the
/// bus before this ran are skipped.
fn play_sfx_from_events(
    mut audio: ResMut<AudioManager>,
    bus: Res<GameEventBus>,
    mut cursor: ResMut<SfxCursor>,
) {
    let total = bus.total(SFX);
    let fresh = total.saturating_sub(cursor.seen) as usize;
    cursor.seen = total;
    if fresh == 0 {
        return;
    }
    let buffered: Vec<&GameEvent> = bus.recent.iter().filter(|ev| ev.name == SFX).collect();
    let skip = buffered.len().saturating_sub(fresh);
    for ev in &buffered[skip..] {
        handle_sfx_event(&mut audio, ev);
    }
}

fn handle_sfx_event(audio: &mut AudioManager, ev: &GameEvent) {
    let Some(name) = ev.data.get("name").and_then(|v| v.as_str()) else {
        return;
    };
    let position = ev.data.get("position").and_then(|v| {
        let x = v.get(0)?.as_f64()? as f32;
        let y = v.get(1)?.as_f64()? as f32;
        Some(Vec2::new(x, y))
    });
    if let Err(err) = audio.play_sfx(name, ev.frame, position) {
        warn!("[Badguy audio] {err}");
    }
}
