mod plain;
mod skydive;
mod walker;

pub use plain::Plain;
pub use skydive::SkyDive;
pub use walker::Walker;

use crate::config::EnemyKind;
use crate::enemy::EnemyBehavior;

pub fn behavior_for(kind: EnemyKind) -> Box<dyn EnemyBehavior> {
    match kind {
        EnemyKind::Walker => Box::new(Walker::default()),
        EnemyKind::SkyDive => Box::new(SkyDive::default()),
        EnemyKind::Plain => Box::new(Plain::default()),
    }
}

/// Sprite a variant uses when the level entry names none.
pub fn default_sprite(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Walker => "images/creatures/snowball/snowball.sprite",
        EnemyKind::SkyDive => "images/creatures/skydive/skydive.sprite",
        EnemyKind::Plain => "images/creatures/mrbomb/mrbomb.sprite",
    }
}
