//! Level state
//!
//! A `Level` owns its obstacles, food and boss exclusively; the serpent
//! outlives it. Construction runs the layout generator, picks the safe
//! spawn and places the first food.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::boss::Boss;
use super::cutscene::CutsceneScript;
use super::food::{self, Food};
use super::grid::PlayArea;
use super::levelgen;
use super::obstacle::Obstacle;
use super::serpent::Serpent;
use crate::GameConfig;
use crate::consts::BLOCK;
use crate::levels::LevelSpec;

/// Themed biome tag; drives layout, food rules and the completion predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Desert,
    Forest,
    City,
    Mountains,
    Sky,
    Space,
}

#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub biome: Biome,
    pub is_boss: bool,
    pub play: PlayArea,
    pub obstacles: Vec<Obstacle>,
    pub food: Vec<Food>,
    pub food_count: u32,
    pub buildings_destroyed: u32,
    pub planets_destroyed: u32,
    pub required_food: u32,
    pub required_buildings: u32,
    pub required_planets: u32,
    /// Critter names prey is drawn from, straight from the descriptor
    pub critters: Vec<String>,
    pub boss: Option<Boss>,
    pub intro: Option<CutsceneScript>,
    pub ending: Option<CutsceneScript>,
    pub eagle_spawned: bool,
    pub eagle_eaten: bool,
    pub ending_cutscene_done: bool,
    /// Where the serpent starts this level
    pub spawn: (i32, i32),
    next_obstacle_id: u32,
}

impl Level {
    pub fn new(spec: &LevelSpec, config: &GameConfig, rng: &mut impl Rng) -> Self {
        let play = PlayArea::new(config.width, spec.play_area.top, spec.play_area.bottom);
        let mut next_obstacle_id = 1;
        let obstacles = levelgen::generate_obstacles(
            spec.biome,
            &play,
            spec.is_boss,
            &spec.obstacles,
            rng,
            &mut next_obstacle_id,
        );
        let spawn = levelgen::safe_spawn(spec.biome, &play, &obstacles, rng);

        let boss = spec.is_boss.then(|| {
            Boss::new(Vec2::new(
                play.width as f32 / 2.0,
                play.top as f32 + 6.0 * BLOCK as f32,
            ))
        });

        let mut level = Self {
            name: spec.name.clone(),
            biome: spec.biome,
            is_boss: spec.is_boss,
            play,
            obstacles,
            food: Vec::new(),
            food_count: 0,
            buildings_destroyed: 0,
            planets_destroyed: 0,
            required_food: spec.required_food,
            required_buildings: spec.required_buildings,
            required_planets: spec.required_planets,
            critters: spec.critters.clone(),
            boss,
            intro: spec.cutscenes.intro.clone(),
            ending: spec.cutscenes.ending.clone(),
            eagle_spawned: false,
            eagle_eaten: false,
            ending_cutscene_done: false,
            spawn,
            next_obstacle_id,
        };

        // At construction a serpent sits on the spawn; place the first food
        // relative to that.
        let probe = Serpent::new(config, spawn.0, spawn.1);
        level.place_food(&probe, rng);
        level
    }

    pub fn alloc_obstacle_id(&mut self) -> u32 {
        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        id
    }

    pub fn place_food(&mut self, serpent: &Serpent, rng: &mut impl Rng) {
        let f = food::place_food(
            self.biome,
            &self.play,
            &self.obstacles,
            serpent,
            self.critters.len().max(1) as u8,
            rng,
        );
        self.food.push(f);
    }

    /// Whether the biome's victory condition (short of any ending cutscene)
    /// is satisfied
    pub fn goal_met(&self) -> bool {
        if self.is_boss {
            return self.boss.as_ref().is_none_or(|b| b.is_dead());
        }
        match self.biome {
            Biome::Desert | Biome::Forest | Biome::Sky => self.food_count >= self.required_food,
            Biome::City => self.buildings_destroyed >= self.required_buildings,
            Biome::Mountains => self.eagle_eaten,
            Biome::Space => self.planets_destroyed >= self.required_planets,
        }
    }

    /// Complete once the goal is met and the ending cutscene (if any) ran
    pub fn is_complete(&self) -> bool {
        self.goal_met() && (self.ending.is_none() || self.ending_cutscene_done)
    }

    /// Gameplay freezes while the defeated boss plays out its death
    pub fn boss_dying(&self) -> bool {
        self.is_boss && self.boss.as_ref().is_some_and(|b| b.is_dead())
    }

    /// Current asteroid population, for the hard cap
    pub fn asteroid_count(&self) -> usize {
        self.obstacles
            .iter()
            .filter(|o| o.kind == super::obstacle::ObstacleKind::Asteroid)
            .count()
    }
}
