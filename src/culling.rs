use bevy::prelude::*;

/// Horizontal center distance beyond which an enemy counts as off-screen.
/// Tuned to a wide-screen viewport of roughly 1066x600 plus margin.
pub const X_OFFSCREEN_DISTANCE: f32 = 1280.0;
pub const Y_OFFSCREEN_DISTANCE: f32 = 800.0;

/// What the off-screen test measures against.
#[derive(Clone, Copy, Debug)]
pub enum ViewAnchor {
    /// Bounding box of the nearest player.
    Player(Rect),
    /// Camera center, used while the level editor is running.
    Camera(Vec2),
}

impl ViewAnchor {
    pub fn center(&self) -> Vec2 {
        match self {
            ViewAnchor::Player(bbox) => bbox.center(),
            ViewAnchor::Camera(center) => *center,
        }
    }
}

/// Returns true when `bbox` is too far from the anchor to simulate.
///
/// No anchor (no player in the sector) reports on-screen so that nothing
/// deactivates against an absent reference.
pub fn is_offscreen(bbox: &Rect, anchor: Option<ViewAnchor>) -> bool {
    let Some(anchor) = anchor else {
        return false;
    };
    let dist = anchor.center() - bbox.center();
    dist.x.abs() > X_OFFSCREEN_DISTANCE || dist.y.abs() > Y_OFFSCREEN_DISTANCE
}
