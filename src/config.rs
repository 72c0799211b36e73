//! Explicit game configuration
//!
//! The original prototype stored window size, snake colours and critter
//! palettes in module globals. Everything the simulation needs is threaded
//! through this struct instead, so two engines with different configs can
//! coexist.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Simulation-wide configuration, passed to `Engine::new` and threaded into
/// `Level` and `Serpent` construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Window width in pixels; the play area spans the full width
    pub width: i32,
    /// Serpent length at level start
    pub start_length: usize,
    /// Snake body palette index (rendering only)
    pub snake_palette: u8,
    /// Whether idle critters wiggle (rendering only, carried per level)
    pub enable_idle_animation: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            start_length: 1,
            snake_palette: 0,
            enable_idle_animation: true,
        }
    }
}
