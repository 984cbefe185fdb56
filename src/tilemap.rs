use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionHit, TileAttributes};

/// Gap left between a blocked box and the tile it ran into.
const SKIN: f32 = 0.01;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileDef {
    pub name: String,
    /// Raw [`TileAttributes`] bits.
    #[serde(default)]
    pub attributes: u32,
}

impl TileDef {
    fn new(name: &str, attributes: TileAttributes) -> Self {
        Self {
            name: name.to_string(),
            attributes: attributes.bits(),
        }
    }

    pub fn attributes(&self) -> TileAttributes {
        TileAttributes::from_bits_truncate(self.attributes)
    }
}

fn default_palette() -> Vec<TileDef> {
    vec![
        TileDef::new("empty", TileAttributes::empty()),
        TileDef::new("solid", TileAttributes::SOLID),
        TileDef::new("lava", TileAttributes::HURTS | TileAttributes::FIRE),
        TileDef::new("frost", TileAttributes::HURTS | TileAttributes::ICE),
        TileDef::new("water", TileAttributes::WATER),
        TileDef::new("spikes", TileAttributes::SOLID | TileAttributes::HURTS),
        TileDef::new("ice_block", TileAttributes::SOLID | TileAttributes::ICE),
    ]
}

fn default_tile_size() -> f32 {
    32.0
}

/// Row-major tile grid; row 0 is the top of the level.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
pub struct Tilemap {
    pub width: usize,
    pub height: usize,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    pub tiles: Vec<u8>,
    #[serde(default = "default_palette")]
    pub palette: Vec<TileDef>,
}

impl Default for Tilemap {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            tile_size: default_tile_size(),
            tiles: Vec::new(),
            palette: default_palette(),
        }
    }
}

/// Outcome of moving a box through the tile grid.
#[derive(Clone, Copy, Debug)]
pub struct MotionResult {
    pub bbox: Rect,
    pub hit: CollisionHit,
    pub blocked: bool,
}

impl Tilemap {
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![0; width * height],
            palette: default_palette(),
        }
    }

    /// Checks the grid against its declared size.
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles.len() != self.width * self.height {
            return Err(format!(
                "tile grid has {} entries, expected {}x{}",
                self.tiles.len(),
                self.width,
                self.height
            ));
        }
        if self.tile_size <= 0.0 {
            return Err(format!("tile size must be positive, got {}", self.tile_size));
        }
        if let Some(id) = self
            .tiles
            .iter()
            .find(|id| **id as usize >= self.palette.len())
        {
            return Err(format!("tile id {id} has no palette entry"));
        }
        Ok(())
    }

    /// World-space area covered by the grid.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    pub fn get_tile(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.tiles[y as usize * self.width + x as usize]
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile_id: u8) {
        if x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32 {
            self.tiles[y as usize * self.width + x as usize] = tile_id;
        }
    }

    pub fn attributes(&self, x: i32, y: i32) -> TileAttributes {
        self.palette
            .get(self.get_tile(x, y) as usize)
            .map(TileDef::attributes)
            .unwrap_or_default()
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.attributes(x, y).contains(TileAttributes::SOLID)
    }

    fn tile_range(&self, area: &Rect) -> (i32, i32, i32, i32) {
        let ts = self.tile_size;
        let min_tx = (area.min.x / ts).floor() as i32;
        let max_tx = ((area.max.x - SKIN) / ts).floor() as i32;
        let min_ty = (area.min.y / ts).floor() as i32;
        let max_ty = ((area.max.y - SKIN) / ts).floor() as i32;
        (min_tx, max_tx, min_ty, max_ty)
    }

    fn collides_solid(&self, area: &Rect) -> bool {
        let (min_tx, max_tx, min_ty, max_ty) = self.tile_range(area);
        for ty in min_ty..=max_ty {
            for tx in min_tx..=max_tx {
                if self.is_solid(tx, ty) {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_free_of_statics(&self, area: &Rect) -> bool {
        !self.collides_solid(area)
    }

    /// Union of the attributes of every tile overlapping `area`.
    pub fn touched_attributes(&self, area: &Rect) -> TileAttributes {
        let (min_tx, max_tx, min_ty, max_ty) = self.tile_range(area);
        let mut attributes = TileAttributes::empty();
        for ty in min_ty..=max_ty {
            for tx in min_tx..=max_tx {
                attributes |= self.attributes(tx, ty);
            }
        }
        attributes
    }

    /// Moves `bbox` by `movement`, one axis at a time, stopping at solid
    /// tiles. The hit flags describe which sides were blocked.
    pub fn resolve_motion(&self, bbox: Rect, movement: Vec2) -> MotionResult {
        let ts = self.tile_size;
        let size = bbox.size();
        let mut hit = CollisionHit::default();
        let mut out = bbox;

        if movement.x != 0.0 {
            let moved = Rect::from_corners(out.min + Vec2::new(movement.x, 0.0), out.max + Vec2::new(movement.x, 0.0));
            if self.collides_solid(&moved) {
                let min_x = if movement.x > 0.0 {
                    hit.right = true;
                    let tile_x = ((moved.max.x - SKIN) / ts).floor();
                    tile_x * ts - size.x - SKIN
                } else {
                    hit.left = true;
                    let tile_x = (moved.min.x / ts).floor();
                    (tile_x + 1.0) * ts + SKIN
                };
                out = Rect::from_corners(Vec2::new(min_x, out.min.y), Vec2::new(min_x + size.x, out.max.y));
            } else {
                out = moved;
            }
        }

        if movement.y != 0.0 {
            let moved = Rect::from_corners(out.min + Vec2::new(0.0, movement.y), out.max + Vec2::new(0.0, movement.y));
            if self.collides_solid(&moved) {
                let min_y = if movement.y > 0.0 {
                    hit.bottom = true;
                    hit.slope_normal = Vec2::new(0.0, -1.0);
                    let tile_y = ((moved.max.y - SKIN) / ts).floor();
                    tile_y * ts - size.y - SKIN
                } else {
                    hit.top = true;
                    let tile_y = (moved.min.y / ts).floor();
                    (tile_y + 1.0) * ts + SKIN
                };
                out = Rect::from_corners(Vec2::new(out.min.x, min_y), Vec2::new(out.max.x, min_y + size.y));
            } else {
                out = moved;
            }
        }

        MotionResult {
            bbox: out,
            hit,
            blocked: hit.left || hit.right || hit.top || hit.bottom,
        }
    }

    /// Small level used by the demo when no level file is given.
    pub fn test_level() -> Self {
        let width = 40;
        let height = 12;
        let mut map = Tilemap::new(width, height, 32.0);
        let floor = height as i32 - 1;

        for x in 0..width as i32 {
            map.set_tile(x, floor, 1);
        }
        // Lava pit.
        for x in 14..17 {
            map.set_tile(x, floor, 2);
        }
        // Pond.
        for x in 24..28 {
            map.set_tile(x, floor - 1, 4);
        }
        // Walls bounding a patrol corridor.
        for y in floor - 3..floor {
            map.set_tile(2, y, 1);
            map.set_tile(37, y, 1);
        }
        // Floating ledge.
        for x in 6..11 {
            map.set_tile(x, floor - 4, 1);
        }
        map
    }
}
