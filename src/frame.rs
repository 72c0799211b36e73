//! Per-tick snapshot for an external renderer
//!
//! The simulation never draws; each tick it can be asked for a `RenderFrame`
//! describing everything on screen. Snapshots are plain data and serialize,
//! which the headless runner uses to dump frames for inspection.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::cutscene::CutsceneFrame;
use crate::sim::food::Food;
use crate::sim::grid::Rect;
use crate::sim::level::Biome;
use crate::sim::obstacle::ObstacleKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleView {
    pub kind: ObstacleKind,
    pub rect: Rect,
    /// Extra rects for multi-part obstacles (tree trunk, river segments)
    pub parts: Vec<Rect>,
    /// 0 while idle, approaching 1 as destruction completes
    pub progress: f32,
    pub palette: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpentView {
    pub body: Vec<(i32, i32)>,
    pub head: (i32, i32),
    pub velocity: (i32, i32),
    pub is_powered_up: bool,
    pub is_dead: bool,
    pub is_flashing: bool,
    pub palette: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BossView {
    pub pos: Vec2,
    pub body_angle: f32,
    pub turret_angle: f32,
    pub hp: i32,
    pub damage_flash: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HudCounters {
    pub food_count: u32,
    pub required_food: u32,
    pub buildings_destroyed: u32,
    pub required_buildings: u32,
    pub planets_destroyed: u32,
    pub required_planets: u32,
    pub boss_hp: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFrame {
    pub level_name: String,
    pub biome: Biome,
    /// Play-area bounds in pixels
    pub bounds: Rect,
    pub obstacles: Vec<ObstacleView>,
    pub serpent: SerpentView,
    pub food: Vec<Food>,
    pub boss: Option<BossView>,
    /// Boss shells, position and velocity
    pub shells: Vec<(Vec2, Vec2)>,
    /// Player venom, position and velocity
    pub venom: Vec<(Vec2, Vec2)>,
    pub hud: HudCounters,
    pub cutscene: Option<CutsceneFrame>,
}
