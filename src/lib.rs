//! Serpent Run - deterministic simulation core for a tile-based serpent arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, obstacles, player, boss, level engine)
//! - `levels`: Level descriptor records and the built-in campaign
//! - `frame`: Per-tick snapshot handed to an external renderer
//! - `audio`: Fire-and-forget sound events and the audio sink boundary
//!
//! Rendering, font rasterization and audio mixing live outside this crate;
//! they consume `RenderFrame` snapshots and `Sound` events.

pub mod audio;
pub mod config;
pub mod frame;
pub mod levels;
pub mod sim;

pub use config::GameConfig;
pub use frame::RenderFrame;
pub use levels::{DescriptorError, LevelSpec};

/// Game configuration constants
pub mod consts {
    /// Tile edge length in pixels; the world is quantised to this grid
    pub const BLOCK: i32 = 20;

    /// Default window dimensions
    pub const WIDTH: i32 = 800;
    pub const HEIGHT: i32 = 600;

    /// Gameplay runs at a fixed 15 Hz step; cutscenes tick at 60 Hz
    pub const GAMEPLAY_HZ: u32 = 15;
    pub const CUTSCENE_HZ: u32 = 60;

    /// Direction presses older than this many frames fall out of the buffer
    pub const INPUT_BUFFER_FRAMES: u64 = 8;
    /// Ticks of axis lock after bouncing off a wall
    pub const BOUNCE_COOLDOWN: u32 = 3;
    /// Consecutive food pickups needed for a power-up
    pub const POWER_UP_STREAK: u32 = 5;
    /// Frames a destruction or discharge effect runs
    pub const EFFECT_DURATION: u32 = 30;
    /// Frames of the (cosmetic) death animation
    pub const DEATH_ANIM_FRAMES: u32 = 30;
    /// Frames the serpent flashes after losing a segment
    pub const FLASH_FRAMES: u32 = 10;

    /// Venom travels 1.5 tiles per frame
    pub const VENOM_SPEED: f32 = BLOCK as f32 * 1.5;
    pub const VENOM_LIFETIME: u32 = 60;
    pub const SPIT_COOLDOWN: u32 = 15;
    pub const POWERED_HIT_DAMAGE: i32 = 10;
    /// Venom inflicts one fifth of a powered head hit
    pub const VENOM_DAMAGE: i32 = POWERED_HIT_DAMAGE / 5;

    /// Boss tuning
    pub const BOSS_MOVEMENT_DELAY: u32 = 180;
    pub const BOSS_ATTACK_INTERVAL: u32 = 45;
    pub const BOSS_SHELL_SPEED: f32 = 12.0;
    pub const BOSS_SHELL_LIFETIME: u32 = 90;
    pub const BOSS_VOLLEY_SIZE: u32 = 7;
    pub const BOSS_SPREAD_DEGREES: f32 = 45.0;
    pub const BOSS_BODY_TURN_DEGREES: f32 = 3.0;
    pub const BOSS_TURRET_TURN_DEGREES: f32 = 6.0;
    pub const BOSS_ACCEL: f32 = 0.2;
    pub const BOSS_MAX_SPEED: f32 = 5.0;
    pub const BOSS_CHASE_SPEED: f32 = 6.0;
    pub const BOSS_REPOSITION_DIST: f32 = 100.0;
    pub const BOSS_CHASE_DIST: f32 = 250.0;
    pub const BOSS_STANDOFF_DIST: f32 = 175.0;
    pub const BOSS_MOVE_LEAD_FRAMES: f32 = 20.0;
    pub const BOSS_TURRET_LEAD_FRAMES: f32 = 15.0;
    pub const BOSS_FIRE_CONE_DEGREES: f32 = 20.0;
    pub const BOSS_FOLLOWUP_CHANCE: f64 = 0.3;
    pub const BOSS_FOLLOWUP_DELAY: u32 = 10;
    pub const BOSS_DAMAGE_FLASH: u32 = 10;
    pub const BOSS_START_HP: i32 = 100;

    /// City layout: equal blocks carved by fixed-width roads
    pub const CITY_BLOCK: i32 = 160;
    pub const CITY_ROAD: i32 = 60;

    /// Space layout
    pub const SPACE_PLANETS: u32 = 8;
    pub const ASTEROID_CAP: usize = 120;
    pub const ASTEROIDS_PER_PLANET_MIN: u32 = 12;
    pub const ASTEROIDS_PER_PLANET_MAX: u32 = 18;

    /// Attempt budgets for rejection sampling
    pub const SPAWN_ATTEMPTS: u32 = 100;
    pub const FOOD_ATTEMPTS: u32 = 100;
    pub const FOOD_ATTEMPTS_LONG: u32 = 300;
}

/// Normalize an angle to [-pi, pi)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Snap to the nearest multiple of `step`
#[inline]
pub fn snap(v: i32, step: i32) -> i32 {
    let rem = v.rem_euclid(step);
    if rem * 2 >= step { v - rem + step } else { v - rem }
}

/// Snap down to a multiple of `step`
#[inline]
pub fn floor_snap(v: i32, step: i32) -> i32 {
    v - v.rem_euclid(step)
}

/// Snap up to a multiple of `step`
#[inline]
pub fn ceil_snap(v: i32, step: i32) -> i32 {
    let rem = v.rem_euclid(step);
    if rem == 0 { v } else { v - rem + step }
}
