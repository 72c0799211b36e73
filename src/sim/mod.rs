//! Deterministic simulation
//!
//! Everything in this module is pure and deterministic: no wall-clock reads,
//! no global state, all randomness drawn from the engine's seeded PCG. Two
//! engines built with the same seed and fed the same inputs stay identical
//! tick for tick.

pub mod boss;
pub mod collision;
pub mod cutscene;
pub mod food;
pub mod grid;
pub mod level;
pub mod levelgen;
pub mod obstacle;
pub mod projectile;
pub mod serpent;
pub mod tick;

pub use boss::{Boss, BossState};
pub use cutscene::{Cutscene, CutsceneFrame, CutsceneScript};
pub use food::Food;
pub use grid::{PlayArea, Rect};
pub use level::{Biome, Level};
pub use obstacle::{Obstacle, ObstacleKind};
pub use serpent::{Dir, Serpent};
pub use tick::{Engine, Phase, TickInput};
