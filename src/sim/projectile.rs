//! Free-flying projectiles: boss shells and serpent venom

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::Rect;
use crate::consts::BLOCK;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub lifetime: u32,
}

impl Projectile {
    pub fn new(pos: Vec2, vel: Vec2, lifetime: u32) -> Self {
        Self { pos, vel, lifetime }
    }

    /// Advance one tick; returns false once spent
    pub fn tick(&mut self) -> bool {
        self.pos += self.vel;
        self.lifetime = self.lifetime.saturating_sub(1);
        self.lifetime > 0
    }

    /// Tile-sized rect centred on the projectile, used for hit tests
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.pos.x as i32 - BLOCK / 2,
            self.pos.y as i32 - BLOCK / 2,
            BLOCK,
            BLOCK,
        )
    }
}
