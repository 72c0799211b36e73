//! The obstacle library
//!
//! Every obstacle is one flat struct with a kind tag; kind-specific behavior
//! is a `match`, not a trait hierarchy. A few fields only matter for a few
//! kinds (orbit for planets, `source_peak` for rivers) and stay at their
//! defaults otherwise.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::{PlayArea, Rect};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    Cactus,
    Tree,
    Bush,
    Pond,
    Building,
    Park,
    Lake,
    Rubble,
    MountainPeak,
    MountainRidge,
    River,
    Sun,
    Planet,
    Comet,
    Asteroid,
}

impl ObstacleKind {
    /// Destroyables are removed after their effect; the rest discharge and
    /// revert to idle.
    pub fn can_be_destroyed(self) -> bool {
        use ObstacleKind::*;
        matches!(
            self,
            Cactus | Tree | Bush | Building | MountainPeak | MountainRidge | Planet | Comet
                | Asteroid
        )
    }

    /// Size/palette variations the generator picks from. Dimensions are tile
    /// multiples; palettes only matter to the renderer.
    pub fn variations(self) -> &'static [Variation] {
        use ObstacleKind::*;
        const CACTUS: &[Variation] = &[
            Variation::new(20, 40, 0),
            Variation::new(20, 60, 1),
            Variation::new(40, 60, 2),
        ];
        const TREE: &[Variation] = &[
            Variation::new(40, 60, 0),
            Variation::new(40, 80, 1),
            Variation::new(60, 80, 2),
        ];
        const BUSH: &[Variation] = &[Variation::new(40, 20, 0), Variation::new(40, 40, 1)];
        const POND: &[Variation] = &[Variation::new(60, 40, 0), Variation::new(80, 60, 1)];
        const PEAK: &[Variation] = &[Variation::new(80, 120, 0), Variation::new(100, 160, 1)];
        const RIDGE: &[Variation] = &[Variation::new(120, 40, 0), Variation::new(160, 60, 1)];
        const ASTEROID: &[Variation] = &[Variation::new(20, 20, 0), Variation::new(40, 40, 1)];
        const COMET: &[Variation] = &[Variation::new(20, 20, 0)];
        // City cells and orbital bodies are sized by their constructors
        const SIZED_ELSEWHERE: &[Variation] = &[Variation::new(0, 0, 0)];
        match self {
            Cactus => CACTUS,
            Tree => TREE,
            Bush => BUSH,
            Pond => POND,
            MountainPeak => PEAK,
            MountainRidge => RIDGE,
            Asteroid => ASTEROID,
            Comet => COMET,
            _ => SIZED_ELSEWHERE,
        }
    }

    /// Smallest variation, used by the forest packer as its floor
    pub fn min_variation(self) -> Variation {
        *self
            .variations()
            .iter()
            .min_by_key(|v| v.w * v.h)
            .expect("every kind has at least one variation")
    }
}

/// One entry of a kind's variations table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub w: i32,
    pub h: i32,
    pub palette: u8,
}

impl Variation {
    pub const fn new(w: i32, h: i32, palette: u8) -> Self {
        Self { w, h, palette }
    }
}

/// Destruction lifecycle. While a timer runs the obstacle still renders but
/// is skipped by player collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestructionState {
    Idle,
    Destroying { frames_left: u32 },
    Discharging { frames_left: u32 },
}

/// What becomes of an obstacle after its per-tick update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleFate {
    Alive,
    /// Destruction effect finished (or a free body left the screen)
    Remove,
}

/// Collidable region of an obstacle
#[derive(Debug, Clone, Copy)]
pub enum Hitbox<'a> {
    None,
    One(Rect),
    Many(&'a [Rect]),
}

impl Hitbox<'_> {
    pub fn intersects(&self, r: &Rect) -> bool {
        match self {
            Hitbox::None => false,
            Hitbox::One(h) => h.intersects(r),
            Hitbox::Many(hs) => hs.iter().any(|h| h.intersects(r)),
        }
    }

    pub fn for_each_rect(&self, mut f: impl FnMut(&Rect)) {
        match self {
            Hitbox::None => {}
            Hitbox::One(h) => f(h),
            Hitbox::Many(hs) => {
                for h in *hs {
                    f(h);
                }
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Hitbox::None)
    }
}

/// Elliptical orbit for planets
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Orbit {
    pub center: Vec2,
    pub semi_major: f32,
    pub semi_minor: f32,
    pub angle: f32,
    pub angular_vel: f32,
}

impl Orbit {
    pub fn position(&self) -> Vec2 {
        self.center + Vec2::new(self.semi_major * self.angle.cos(), self.semi_minor * self.angle.sin())
    }
}

/// A world obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Primary hitbox / footprint. For free bodies this tracks `pos`.
    pub base: Rect,
    /// Extra hitbox rects: tree trunk+canopy, river segments
    #[serde(default)]
    pub parts: Vec<Rect>,
    /// Tall-structure top: occludes and blocks food, never collides
    #[serde(default)]
    pub top: Option<Rect>,
    pub palette: u8,
    pub state: DestructionState,
    pub effect_duration: u32,
    /// Free-floating center (boss-level and space bodies)
    #[serde(default)]
    pub pos: Vec2,
    #[serde(default)]
    pub vel: Vec2,
    #[serde(default)]
    pub orbit: Option<Orbit>,
    /// Rivers remember the peak they spring from
    #[serde(default)]
    pub source_peak: Option<u32>,
}

impl Obstacle {
    fn with_base(id: u32, kind: ObstacleKind, base: Rect, palette: u8) -> Self {
        Self {
            id,
            kind,
            base,
            parts: Vec::new(),
            top: None,
            palette,
            state: DestructionState::Idle,
            effect_duration: EFFECT_DURATION,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            orbit: None,
            source_peak: None,
        }
    }

    pub fn cactus(id: u32, x: i32, y: i32, var: Variation) -> Self {
        Self::with_base(id, ObstacleKind::Cactus, Rect::new(x, y, var.w, var.h), var.palette)
    }

    /// Trunk plus a wider canopy; the hitbox is the two parts, the base is
    /// their bounding rect.
    pub fn tree(id: u32, x: i32, y: i32, var: Variation) -> Self {
        let canopy_h = var.h * 2 / 3;
        let canopy = Rect::new(x, y, var.w, canopy_h);
        let trunk = Rect::new(x + var.w / 2 - BLOCK / 2, y + canopy_h, BLOCK, var.h - canopy_h);
        let mut o = Self::with_base(id, ObstacleKind::Tree, Rect::new(x, y, var.w, var.h), var.palette);
        o.parts = vec![canopy, trunk];
        o
    }

    pub fn bush(id: u32, x: i32, y: i32, var: Variation) -> Self {
        Self::with_base(id, ObstacleKind::Bush, Rect::new(x, y, var.w, var.h), var.palette)
    }

    pub fn pond(id: u32, x: i32, y: i32, var: Variation) -> Self {
        Self::with_base(id, ObstacleKind::Pond, Rect::new(x, y, var.w, var.h), var.palette)
    }

    /// Buildings occupy a city cell: only the bottom strip collides, the
    /// taller rest occludes the serpent and blocks food placement.
    pub fn building(id: u32, cell: Rect, palette: u8) -> Self {
        let base_h = 3 * BLOCK;
        let base = Rect::new(cell.x, cell.bottom() - base_h, cell.w, base_h);
        let mut o = Self::with_base(id, ObstacleKind::Building, base, palette);
        o.top = Some(Rect::new(cell.x, cell.y, cell.w, cell.h - base_h));
        o
    }

    /// Parks are pass-through scenery filling a city cell
    pub fn park(id: u32, cell: Rect, palette: u8) -> Self {
        Self::with_base(id, ObstacleKind::Park, cell, palette)
    }

    /// Lakes fill a city cell with a one-tile shore margin
    pub fn lake(id: u32, cell: Rect, palette: u8) -> Self {
        Self::with_base(id, ObstacleKind::Lake, cell.expanded(-BLOCK), palette)
    }

    /// Rubble left where a building stood (or pre-placed in boss city)
    pub fn rubble(id: u32, cell: Rect, palette: u8) -> Self {
        let base_h = 2 * BLOCK;
        let base = Rect::new(cell.x, cell.bottom() - base_h, cell.w, base_h);
        Self::with_base(id, ObstacleKind::Rubble, base, palette)
    }

    pub fn mountain_peak(id: u32, x: i32, y: i32, var: Variation) -> Self {
        let base_h = var.h / 2;
        let base = Rect::new(x, y + var.h - base_h, var.w, base_h);
        let mut o = Self::with_base(id, ObstacleKind::MountainPeak, base, var.palette);
        o.top = Some(Rect::new(x, y, var.w, var.h - base_h));
        o
    }

    pub fn mountain_ridge(id: u32, x: i32, y: i32, var: Variation) -> Self {
        Self::with_base(id, ObstacleKind::MountainRidge, Rect::new(x, y, var.w, var.h), var.palette)
    }

    /// A river is a chain of segment rects flowing from a peak's foot
    pub fn river(id: u32, segments: Vec<Rect>, source_peak: u32) -> Self {
        debug_assert!(!segments.is_empty());
        let bound = segments.iter().skip(1).fold(segments[0], |acc, r| {
            let x = acc.x.min(r.x);
            let y = acc.y.min(r.y);
            let right = acc.right().max(r.right());
            let bottom = acc.bottom().max(r.bottom());
            Rect::new(x, y, right - x, bottom - y)
        });
        let mut o = Self::with_base(id, ObstacleKind::River, bound, 0);
        o.parts = segments;
        o.source_peak = Some(source_peak);
        o
    }

    pub fn sun(id: u32, center: Vec2, diameter: i32) -> Self {
        let half = diameter / 2;
        let base = Rect::new(center.x as i32 - half, center.y as i32 - half, diameter, diameter);
        let mut o = Self::with_base(id, ObstacleKind::Sun, base, 0);
        o.pos = center;
        o
    }

    pub fn planet(id: u32, orbit: Orbit, diameter: i32, palette: u8) -> Self {
        let pos = orbit.position();
        let mut o = Self::with_base(id, ObstacleKind::Planet, Rect::new(0, 0, diameter, diameter), palette);
        o.pos = pos;
        o.orbit = Some(orbit);
        o.sync_rect();
        o
    }

    pub fn comet(id: u32, pos: Vec2, vel: Vec2) -> Self {
        let var = ObstacleKind::Comet.variations()[0];
        let mut o = Self::with_base(id, ObstacleKind::Comet, Rect::new(0, 0, var.w, var.h), var.palette);
        o.pos = pos;
        o.vel = vel;
        o.sync_rect();
        o
    }

    pub fn asteroid(id: u32, pos: Vec2, vel: Vec2, var: Variation) -> Self {
        let mut o = Self::with_base(id, ObstacleKind::Asteroid, Rect::new(0, 0, var.w, var.h), var.palette);
        o.pos = pos;
        o.vel = vel;
        o.sync_rect();
        o
    }

    /// Re-center `base` on `pos` for free-floating bodies
    fn sync_rect(&mut self) {
        self.base.x = self.pos.x as i32 - self.base.w / 2;
        self.base.y = self.pos.y as i32 - self.base.h / 2;
    }

    pub fn hitbox(&self) -> Hitbox<'_> {
        match self.kind {
            ObstacleKind::Park => Hitbox::None,
            ObstacleKind::Tree | ObstacleKind::River => Hitbox::Many(&self.parts),
            _ => Hitbox::One(self.base),
        }
    }

    /// Regions the food spawner must avoid. Defaults to the hitbox; water
    /// adds a one-tile buffer on its upper edge, tall structures add their
    /// non-colliding top.
    pub fn no_spawn_rects(&self, out: &mut Vec<Rect>) {
        self.hitbox().for_each_rect(|r| out.push(*r));
        match self.kind {
            ObstacleKind::Pond | ObstacleKind::Lake => {
                out.push(Rect::new(self.base.x, self.base.y - BLOCK, self.base.w, BLOCK));
            }
            ObstacleKind::Building | ObstacleKind::MountainPeak => {
                if let Some(top) = self.top {
                    out.push(top);
                }
            }
            _ => {}
        }
    }

    pub fn can_be_destroyed(&self) -> bool {
        self.kind.can_be_destroyed()
    }

    /// Collision only applies while idle; a running effect is a free pass
    pub fn is_idle(&self) -> bool {
        matches!(self.state, DestructionState::Idle)
    }

    /// Enter the destruction (or, for indestructibles, discharge) effect.
    /// No-op if an effect is already running.
    pub fn start_destruction(&mut self) {
        if !self.is_idle() {
            return;
        }
        self.state = if self.can_be_destroyed() {
            DestructionState::Destroying { frames_left: self.effect_duration }
        } else {
            DestructionState::Discharging { frames_left: self.effect_duration }
        };
    }

    /// Effect completion in [0, 1] for the renderer
    pub fn destruction_progress(&self) -> f32 {
        match self.state {
            DestructionState::Idle => 0.0,
            DestructionState::Destroying { frames_left } | DestructionState::Discharging { frames_left } => {
                1.0 - frames_left as f32 / self.effect_duration.max(1) as f32
            }
        }
    }

    /// Advance timers and free-body motion for one tick
    pub fn tick(&mut self, play: &PlayArea) -> ObstacleFate {
        match self.state {
            DestructionState::Idle => {}
            DestructionState::Destroying { frames_left } => {
                if frames_left <= 1 {
                    return ObstacleFate::Remove;
                }
                self.state = DestructionState::Destroying { frames_left: frames_left - 1 };
            }
            DestructionState::Discharging { frames_left } => {
                if frames_left <= 1 {
                    self.state = DestructionState::Idle;
                } else {
                    self.state = DestructionState::Discharging { frames_left: frames_left - 1 };
                }
            }
        }

        match self.kind {
            ObstacleKind::Planet => {
                if let Some(orbit) = &mut self.orbit {
                    orbit.angle += orbit.angular_vel;
                    self.pos = orbit.position();
                    self.sync_rect();
                }
            }
            ObstacleKind::Comet => {
                self.pos += self.vel;
                self.sync_rect();
                // Comets are gone once fully off-screen
                let screen = play.as_rect().expanded(2 * BLOCK);
                if !self.base.intersects(&screen) {
                    return ObstacleFate::Remove;
                }
            }
            ObstacleKind::Asteroid => {
                self.pos += self.vel;
                self.vel *= 0.98;
                self.sync_rect();
                let screen = play.as_rect().expanded(2 * BLOCK);
                if !self.base.intersects(&screen) {
                    return ObstacleFate::Remove;
                }
            }
            _ => {}
        }

        ObstacleFate::Alive
    }
}
