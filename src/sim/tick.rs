//! The level engine
//!
//! One `Engine::tick` call advances the whole simulation by one fixed step.
//! Within a tick the phase order is fixed and observable: input drain,
//! player propose, collision resolve, body update, food consume, boss
//! update, projectiles (boss then player), obstacle destruction timers,
//! completion check. Mid-tick spawns and removals go through deferred
//! buffers so no list is mutated while it is walked.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision;
use super::cutscene::Cutscene;
use super::food;
use super::grid::Rect;
use super::level::{Biome, Level};
use super::levelgen::pick_variation;
use super::obstacle::{Obstacle, ObstacleFate, ObstacleKind};
use super::serpent::{Dir, Serpent};
use crate::audio::Sound;
use crate::consts::*;
use crate::frame::{BossView, HudCounters, ObstacleView, RenderFrame, SerpentView};
use crate::levels::{DescriptorError, LevelSpec};
use crate::{GameConfig, floor_snap};

/// Chance per tick of a comet entering the space level
const COMET_CHANCE: f64 = 0.015;

/// Boss hull footprint for hit tests, centred on its position
const BOSS_HULL: i32 = 3 * BLOCK;

/// Everything the player can press, already decoded from raw key events
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub direction: Option<Dir>,
    /// Space
    pub spit: bool,
    /// Enter
    pub confirm: bool,
    /// Shift+P developer toggle
    pub toggle_power: bool,
    /// Escape
    pub quit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    GameOver,
    Won,
}

/// Whether the active cutscene opens or closes the level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneSlot {
    Intro,
    Ending,
}

pub struct Engine {
    config: GameConfig,
    specs: Vec<LevelSpec>,
    level_index: usize,
    pub level: Level,
    pub serpent: Serpent,
    rng: Pcg32,
    pub frame_count: u64,
    current_cutscene: Option<(Cutscene, SceneSlot)>,
    sounds: Vec<Sound>,
    pub exit_requested: bool,
    pub phase: Phase,
}

impl Engine {
    pub fn new(
        config: GameConfig,
        specs: Vec<LevelSpec>,
        seed: u64,
    ) -> Result<Self, DescriptorError> {
        if specs.is_empty() {
            return Err(DescriptorError::Empty);
        }
        let mut rng = Pcg32::seed_from_u64(seed);
        let level = Level::new(&specs[0], &config, &mut rng);
        let serpent = Serpent::new(&config, level.spawn.0, level.spawn.1);
        let current_cutscene = level
            .intro
            .clone()
            .map(|script| (Cutscene::new(script), SceneSlot::Intro));
        log::info!("engine start: level {:?}, seed {seed}", level.name);
        Ok(Self {
            config,
            specs,
            level_index: 0,
            level,
            serpent,
            rng,
            frame_count: 0,
            current_cutscene,
            sounds: Vec::new(),
            exit_requested: false,
            phase: Phase::Playing,
        })
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn in_cutscene(&self) -> bool {
        self.current_cutscene.is_some()
    }

    /// Drain the sounds emitted since the last call
    pub fn take_sounds(&mut self) -> Vec<Sound> {
        std::mem::take(&mut self.sounds)
    }

    /// Advance one fixed step
    pub fn tick(&mut self, input: TickInput) {
        if input.quit {
            self.exit_requested = true;
            return;
        }

        match self.phase {
            Phase::Won => return,
            Phase::GameOver => {
                if input.confirm {
                    self.restart_level();
                }
                return;
            }
            Phase::Playing => {}
        }

        // Cutscenes suspend gameplay entirely
        if let Some((scene, slot)) = self.current_cutscene.as_mut() {
            if scene.tick(input.confirm) {
                if *slot == SceneSlot::Ending {
                    self.level.ending_cutscene_done = true;
                }
                self.current_cutscene = None;
                self.check_completion();
            }
            return;
        }

        if self.serpent.is_dead {
            if self.serpent.death_frames > 0 {
                self.serpent.death_frames -= 1;
            } else {
                self.phase = Phase::GameOver;
            }
            return;
        }

        self.frame_count += 1;
        let frame = self.frame_count;

        // Input drain
        if input.toggle_power {
            self.serpent.is_powered_up = !self.serpent.is_powered_up;
            self.sounds.push(if self.serpent.is_powered_up {
                Sound::PowerUp
            } else {
                Sound::PowerDown
            });
        }
        if let Some(dir) = input.direction {
            self.serpent.steer(dir, frame);
        }
        self.serpent.begin_tick(frame);
        if input.spit && self.level.is_boss && self.serpent.spit_venom() {
            self.sounds.push(Sound::Spit);
        }

        // Player propose + collision resolve + body update. Movement freezes
        // while a defeated boss plays out its death.
        if self.serpent.is_moving() && !self.level.boss_dying() {
            self.move_serpent();
            if self.serpent.is_dead {
                return;
            }
        }

        self.consume_food();
        self.update_boss();
        self.update_boss_shells();
        self.update_venom();
        self.update_obstacles();
        self.crush_check();
        self.check_completion();
    }

    /// Free-drifting obstacles can reach a serpent that never moved. A
    /// powered-up serpent smashes them; otherwise the collision is fatal.
    fn crush_check(&mut self) {
        if self.serpent.is_dead {
            return;
        }
        let head = collision::shrunk_rect(self.serpent.x, self.serpent.y);
        let Some(i) = collision::first_blocking(&head, &self.level.obstacles) else {
            return;
        };
        if self.serpent.is_powered_up {
            self.level.obstacles[i].start_destruction();
            self.serpent.consume_power_up();
            self.sounds.push(Sound::Destruction);
            self.sounds.push(Sound::PowerDown);
        } else {
            self.serpent.die();
            self.sounds.push(Sound::Death);
        }
    }

    fn move_serpent(&mut self) {
        let prev = (self.serpent.x, self.serpent.y);
        let proposed = self.serpent.proposed_step();
        let res = collision::resolve_head(
            proposed,
            prev,
            (self.serpent.dx, self.serpent.dy),
            self.serpent.is_powered_up,
            self.serpent.input_buffer.has_entries(),
            self.level.biome == Biome::City,
            &self.level.play,
            &self.level.obstacles,
        );

        if res.fatal {
            self.serpent.die();
            self.sounds.push(Sound::Death);
            return;
        }
        if let Some(i) = res.destroy {
            self.level.obstacles[i].start_destruction();
            self.serpent.consume_power_up();
            self.sounds.push(Sound::Destruction);
            self.sounds.push(Sound::PowerDown);
        }
        if res.hit_wall {
            self.serpent.start_bounce(res.clamped_x, res.clamped_y);
            self.sounds.push(Sound::Bounce);
        }
        self.serpent.commit_head(res.x, res.y);

        if self.serpent.self_hit() {
            self.serpent.die();
            self.sounds.push(Sound::Death);
            return;
        }

        // Powered headbutt against the boss hull
        if self.serpent.is_powered_up
            && let Some(boss) = self.level.boss.as_mut()
            && !boss.is_dead()
            && boss_hull_rect(boss.pos).intersects(&Rect::tile(self.serpent.x, self.serpent.y))
        {
            boss.take_damage(POWERED_HIT_DAMAGE);
            self.serpent.consume_power_up();
            self.sounds.push(Sound::Hit);
            if boss.is_dead() {
                self.sounds.push(Sound::BossDefeated);
            }
        }
    }

    fn consume_food(&mut self) {
        // Rect intersection, not tile equality: the grace nudge can leave the
        // head half a tile off-grid and it still has to eat.
        let head = Rect::tile(self.serpent.x, self.serpent.y);
        let Some(i) = self.level.food.iter().position(|f| f.rect().intersects(&head)) else {
            return;
        };
        let eaten = self.level.food.remove(i);

        let was_powered = self.serpent.is_powered_up;
        self.serpent.handle_food_eaten();
        self.sounds.push(Sound::Eat);
        if !was_powered && self.serpent.is_powered_up {
            self.sounds.push(Sound::PowerUp);
        }

        if eaten.is_eagle {
            self.level.eagle_eaten = true;
        } else {
            self.level.food_count += 1;
        }

        if !self.level.goal_met() {
            let level = &mut self.level;
            level.place_food(&self.serpent, &mut self.rng);
        }
    }

    fn update_boss(&mut self) {
        let Some(boss) = self.level.boss.as_mut() else {
            return;
        };
        if boss.is_dead() {
            return;
        }
        let before = boss.shells.len();
        boss.tick(
            self.serpent.head_vec(),
            self.serpent.vel_vec(),
            &self.level.play,
            &mut self.rng,
        );
        if boss.shells.len() > before {
            self.sounds.push(Sound::ShellFired);
        }
    }

    /// Boss shells fly, then test against the serpent head and body. A hit
    /// removes the shell; segment damage is skipped during the hit flash.
    fn update_boss_shells(&mut self) {
        let Some(boss) = self.level.boss.as_mut() else {
            return;
        };
        let serpent = &mut self.serpent;
        let sounds = &mut self.sounds;
        boss.shells.retain_mut(|shell| {
            if !shell.tick() {
                return false;
            }
            let rect = shell.rect();
            let hit = serpent
                .body
                .iter()
                .any(|&(x, y)| rect.intersects(&Rect::tile(x, y)));
            if !hit {
                return true;
            }
            if !serpent.is_flashing() {
                serpent.take_shell_hit();
                sounds.push(if serpent.is_dead {
                    Sound::Death
                } else {
                    Sound::Hit
                });
            }
            false
        });
    }

    /// Venom flies, then tests against the boss hull and idle obstacles
    fn update_venom(&mut self) {
        let boss = self.level.boss.as_mut();
        let obstacles = &self.level.obstacles;
        let sounds = &mut self.sounds;

        let mut boss_rect = None;
        let mut boss_ref = None;
        if let Some(b) = boss
            && !b.is_dead()
        {
            boss_rect = Some(boss_hull_rect(b.pos));
            boss_ref = Some(b);
        }

        let mut boss_died = false;
        self.serpent.venom.retain_mut(|p| {
            if !p.tick() {
                return false;
            }
            let rect = p.rect();
            if let (Some(br), Some(b)) = (boss_rect, boss_ref.as_deref_mut())
                && br.intersects(&rect)
            {
                b.take_damage(VENOM_DAMAGE);
                sounds.push(Sound::Hit);
                boss_died = b.is_dead();
                return false;
            }
            // Venom stops on terrain
            !obstacles
                .iter()
                .any(|o| o.is_idle() && o.hitbox().intersects(&rect))
        });
        if boss_died {
            self.sounds.push(Sound::BossDefeated);
        }
    }

    /// Run destruction timers and drift, then fan removals out to the
    /// biome-specific hooks
    fn update_obstacles(&mut self) {
        let play = self.level.play;
        let mut removed: Vec<Obstacle> = Vec::new();
        let mut i = 0;
        while i < self.level.obstacles.len() {
            match self.level.obstacles[i].tick(&play) {
                ObstacleFate::Alive => i += 1,
                ObstacleFate::Remove => removed.push(self.level.obstacles.remove(i)),
            }
        }

        for gone in removed {
            match gone.kind {
                ObstacleKind::Building => self.on_building_destroyed(&gone),
                ObstacleKind::MountainPeak => self.on_peak_destroyed(&gone),
                ObstacleKind::Planet => self.on_planet_destroyed(&gone),
                _ => {}
            }
        }

        if self.level.biome == Biome::Space && self.rng.random_bool(COMET_CHANCE) {
            self.spawn_comet();
        }
    }

    /// City: the cell the building stood in fills with rubble
    fn on_building_destroyed(&mut self, gone: &Obstacle) {
        let cell = match gone.top {
            Some(top) => Rect::new(gone.base.x, top.y, gone.base.w, top.h + gone.base.h),
            None => gone.base,
        };
        let id = self.level.alloc_obstacle_id();
        self.level
            .obstacles
            .push(Obstacle::rubble(id, cell, gone.palette));
        self.level.buildings_destroyed += 1;
    }

    /// Mountains: child rivers dry up in the same batch; the eagle appears
    /// once the last peak has fallen
    fn on_peak_destroyed(&mut self, gone: &Obstacle) {
        let peak_id = gone.id;
        self.level
            .obstacles
            .retain(|o| o.source_peak != Some(peak_id));

        let peaks_left = self
            .level
            .obstacles
            .iter()
            .any(|o| o.kind == ObstacleKind::MountainPeak);
        if peaks_left || self.level.eagle_spawned {
            return;
        }
        let (cx, cy) = gone.base.center();
        let x = floor_snap(cx, BLOCK).clamp(0, self.level.play.width - BLOCK);
        let y = floor_snap(cy, BLOCK).clamp(self.level.play.top, self.level.play.bottom - BLOCK);
        self.level.food.push(food::eagle(x, y));
        self.level.eagle_spawned = true;
        log::info!("eagle descends at ({x},{y})");
    }

    /// Space: the planet bursts into drifting asteroids, up to the cap
    fn on_planet_destroyed(&mut self, gone: &Obstacle) {
        self.level.planets_destroyed += 1;
        let burst = self
            .rng
            .random_range(ASTEROIDS_PER_PLANET_MIN..=ASTEROIDS_PER_PLANET_MAX);
        let room = ASTEROID_CAP.saturating_sub(self.level.asteroid_count());
        let origin = gone.pos;
        for _ in 0..(burst as usize).min(room) {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.random_range(2.0..6.0_f32);
            let var = pick_variation(ObstacleKind::Asteroid, &mut self.rng);
            let id = self.level.alloc_obstacle_id();
            self.level.obstacles.push(Obstacle::asteroid(
                id,
                origin,
                Vec2::from_angle(angle) * speed,
                var,
            ));
        }
    }

    fn spawn_comet(&mut self) {
        let play = self.level.play;
        let from_left = self.rng.random_bool(0.5);
        let y = self
            .rng
            .random_range(play.top as f32..(play.bottom - BLOCK) as f32);
        let (x, vx) = if from_left {
            (-(BLOCK as f32), self.rng.random_range(3.0..7.0))
        } else {
            (play.width as f32, -self.rng.random_range(3.0..7.0_f32))
        };
        let vy = self.rng.random_range(-1.5..1.5);
        let id = self.level.alloc_obstacle_id();
        self.level
            .obstacles
            .push(Obstacle::comet(id, Vec2::new(x, y), Vec2::new(vx, vy)));
    }

    fn check_completion(&mut self) {
        if !self.level.goal_met() {
            return;
        }
        if self.current_cutscene.is_none()
            && !self.level.ending_cutscene_done
            && let Some(script) = self.level.ending.clone()
        {
            self.current_cutscene = Some((Cutscene::new(script), SceneSlot::Ending));
            return;
        }
        if self.level.is_complete() {
            self.sounds.push(Sound::LevelComplete);
            self.advance_level();
        }
    }

    fn advance_level(&mut self) {
        if self.level_index + 1 >= self.specs.len() {
            log::info!("campaign complete");
            self.phase = Phase::Won;
            return;
        }
        self.level_index += 1;
        self.load_level();
    }

    fn restart_level(&mut self) {
        self.phase = Phase::Playing;
        self.load_level();
    }

    fn load_level(&mut self) {
        let spec = &self.specs[self.level_index];
        self.level = Level::new(spec, &self.config, &mut self.rng);
        self.serpent.reset_for_level(
            &self.config,
            self.level.spawn.0,
            self.level.spawn.1,
            self.config.enable_idle_animation,
        );
        self.current_cutscene = self
            .level
            .intro
            .clone()
            .map(|script| (Cutscene::new(script), SceneSlot::Intro));
        log::info!("level {:?} loaded", self.level.name);
    }

    /// Snapshot everything a renderer needs for this frame
    pub fn frame(&self) -> RenderFrame {
        let level = &self.level;
        RenderFrame {
            level_name: level.name.clone(),
            biome: level.biome,
            bounds: level.play.as_rect(),
            obstacles: level
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    kind: o.kind,
                    rect: o.base,
                    parts: o.parts.clone(),
                    progress: o.destruction_progress(),
                    palette: o.palette,
                })
                .collect(),
            serpent: SerpentView {
                body: self.serpent.body.iter().copied().collect(),
                head: (self.serpent.x, self.serpent.y),
                velocity: (self.serpent.dx, self.serpent.dy),
                is_powered_up: self.serpent.is_powered_up,
                is_dead: self.serpent.is_dead,
                is_flashing: self.serpent.is_flashing(),
                palette: self.serpent.palette,
            },
            food: level.food.clone(),
            boss: level.boss.as_ref().map(|b| BossView {
                pos: b.pos,
                body_angle: b.body_angle,
                turret_angle: b.turret_angle,
                hp: b.hp,
                damage_flash: b.damage_flash > 0,
            }),
            shells: level
                .boss
                .as_ref()
                .map(|b| b.shells.iter().map(|p| (p.pos, p.vel)).collect())
                .unwrap_or_default(),
            venom: self.serpent.venom.iter().map(|p| (p.pos, p.vel)).collect(),
            hud: HudCounters {
                food_count: level.food_count,
                required_food: level.required_food,
                buildings_destroyed: level.buildings_destroyed,
                required_buildings: level.required_buildings,
                planets_destroyed: level.planets_destroyed,
                required_planets: level.required_planets,
                boss_hp: level.boss.as_ref().map(|b| b.hp),
            },
            cutscene: self
                .current_cutscene
                .as_ref()
                .and_then(|(scene, _)| scene.frame()),
        }
    }
}

fn boss_hull_rect(pos: Vec2) -> Rect {
    Rect::new(
        pos.x as i32 - BOSS_HULL / 2,
        pos.y as i32 - BOSS_HULL / 2,
        BOSS_HULL,
        BOSS_HULL,
    )
}
