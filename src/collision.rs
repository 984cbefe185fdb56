use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Which other objects may physically interact with an object.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionGroup {
    /// No collisions at all.
    #[default]
    Disabled,
    /// Static terrain.
    Static,
    /// Moves and collides with statics only.
    MovingOnlyStatic,
    /// Moves, and other movers treat it as a static.
    MovingStatic,
    /// Regular moving object.
    Moving,
    /// Triggers contacts but never pushes.
    Touchable,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HitResponse {
    AbortMove,
    ForceMove,
}

/// Contact description produced by the solid/contact pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollisionHit {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
    pub crush: bool,
    pub slope_normal: Vec2,
}

impl CollisionHit {
    pub fn bottom() -> Self {
        Self {
            bottom: true,
            slope_normal: Vec2::new(0.0, -1.0),
            ..default()
        }
    }

    pub fn side(left: bool) -> Self {
        Self {
            left,
            right: !left,
            ..default()
        }
    }
}

bitflags::bitflags! {
    /// Terrain flags reported when an entity overlaps a tile.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TileAttributes: u32 {
        const SOLID     = 0x0001;
        const UNISOLID  = 0x0002;
        const SLOPE     = 0x0010;
        const HURTS     = 0x0020;
        const FIRE      = 0x0040;
        const ICE       = 0x0100;
        const WATER     = 0x0200;
    }
}

/// Elemental type carried by a projectile.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    Fire,
    Ice,
    Other,
}

/// Player as seen by an enemy during a contact.
pub trait PlayerHandle {
    fn bbox(&self) -> Rect;
    fn is_invincible(&self) -> bool;
    fn is_stone(&self) -> bool;
    fn does_buttjump(&self) -> bool;
    fn kill(&mut self, completely: bool);
    fn bounce(&mut self, enemy_bbox: Rect);
}

/// Projectile as seen by an enemy during a contact.
pub trait BulletHandle {
    fn kind(&self) -> BonusKind;
    fn remove(&mut self);
    fn ricochet(&mut self, target: Rect, hit: &CollisionHit);
}

/// Read-only snapshot of another enemy involved in a contact.
#[derive(Clone, Copy, Debug)]
pub struct RivalView {
    pub bbox: Rect,
    pub active: bool,
    pub group: CollisionGroup,
    pub frozen: bool,
}

/// The other side of a contact, classified once by the contact pass.
pub enum Counterpart<'a> {
    Enemy(RivalView),
    Player(&'a mut dyn PlayerHandle),
    Bullet(&'a mut dyn BulletHandle),
    Other,
}

/// True when `upper` sits on top of `lower` within the squish margin.
pub fn hit_from_above(upper: &Rect, lower: &Rect, margin: f32) -> bool {
    upper.max.y < lower.min.y + margin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_above_uses_margin_below_top_edge() {
        let enemy = Rect::new(0.0, 100.0, 32.0, 132.0);
        let resting = Rect::new(0.0, 70.0, 32.0, 110.0);
        let beside = Rect::new(40.0, 90.0, 72.0, 130.0);
        assert!(hit_from_above(&resting, &enemy, 16.0));
        assert!(!hit_from_above(&beside, &enemy, 16.0));
    }

    #[test]
    fn tile_attributes_combine() {
        let lava = TileAttributes::HURTS | TileAttributes::FIRE;
        assert!(lava.contains(TileAttributes::HURTS));
        assert!(!lava.contains(TileAttributes::ICE));
    }
}
