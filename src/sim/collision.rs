//! The collision resolver
//!
//! Pure functions: given a proposed head position they answer where the head
//! actually ends up and what happened on the way. Mutation (starting
//! destruction, consuming the power-up, killing the serpent) stays with the
//! engine.

use super::grid::{PlayArea, Rect};
use super::obstacle::Obstacle;
use crate::consts::BLOCK;
use crate::snap;

/// Head rect shrunk to 80% of the tile, centred. Collision uses this so
/// brushing a corner is survivable.
pub fn shrunk_rect(x: i32, y: i32) -> Rect {
    let inset = BLOCK / 10;
    Rect::new(x + inset, y + inset, BLOCK - 2 * inset, BLOCK - 2 * inset)
}

/// City tile snap with hysteresis: sub-tile fraction below a quarter snaps
/// down, above three quarters snaps up, otherwise rounds. Keeps the serpent
/// out of building bases on diagonal-looking inputs.
pub fn city_snap(v: i32) -> i32 {
    let rem = v.rem_euclid(BLOCK);
    if rem * 4 < BLOCK {
        v - rem
    } else if rem * 4 > 3 * BLOCK {
        v - rem + BLOCK
    } else {
        snap(v, BLOCK)
    }
}

/// First idle obstacle whose hitbox intersects `rect`
pub fn first_blocking(rect: &Rect, obstacles: &[Obstacle]) -> Option<usize> {
    obstacles
        .iter()
        .position(|o| o.is_idle() && o.hitbox().intersects(rect))
}

/// Outcome of resolving one proposed head move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub x: i32,
    pub y: i32,
    pub hit_wall: bool,
    /// Which axes the wall clamp touched (feeds the bounce lock)
    pub clamped_x: bool,
    pub clamped_y: bool,
    /// Index of the obstacle a powered-up serpent smashed into
    pub destroy: Option<usize>,
    /// Grace nudge kept the serpent at (or near) its previous tile
    pub nudged: bool,
    pub fatal: bool,
}

/// Reconcile a proposed head position with walls and obstacles.
///
/// `prev` is the head tile before the move, `vel` the current velocity,
/// `buffered` whether any direction key sits in the input window.
#[allow(clippy::too_many_arguments)]
pub fn resolve_head(
    proposed: (i32, i32),
    prev: (i32, i32),
    vel: (i32, i32),
    powered: bool,
    buffered: bool,
    city: bool,
    play: &PlayArea,
    obstacles: &[Obstacle],
) -> Resolution {
    let (mut nx, mut ny) = proposed;

    if city {
        nx = city_snap(nx);
        ny = city_snap(ny);
    }

    let (cx, cy, clamped_x, clamped_y) = play.clamp_tile(nx, ny);
    let hit_wall = clamped_x || clamped_y;
    nx = cx;
    ny = cy;

    let mut out = Resolution {
        x: nx,
        y: ny,
        hit_wall,
        clamped_x,
        clamped_y,
        destroy: None,
        nudged: false,
        fatal: false,
    };

    let Some(hit) = first_blocking(&shrunk_rect(nx, ny), obstacles) else {
        return out;
    };

    if powered {
        out.destroy = Some(hit);
        return out;
    }

    // Grace nudge: with buffered input, fall back to the previous tile if it
    // was safe; a half-step along the velocity axis is taken when that rect
    // is safe too.
    if buffered && first_blocking(&shrunk_rect(prev.0, prev.1), obstacles).is_none() {
        let (hx, hy) = (prev.0 + vel.0 / 2, prev.1 + vel.1 / 2);
        if play.contains_tile(hx, hy) && first_blocking(&shrunk_rect(hx, hy), obstacles).is_none() {
            out.x = hx;
            out.y = hy;
        } else {
            out.x = prev.0;
            out.y = prev.1;
        }
        out.nudged = true;
        return out;
    }

    out.fatal = true;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacle::Variation;

    fn play() -> PlayArea {
        PlayArea::new(800, 40, 600)
    }

    #[test]
    fn test_city_snap_hysteresis() {
        // frac 4/20 < 0.25: down
        assert_eq!(city_snap(104), 100);
        // frac 16/20 > 0.75: up
        assert_eq!(city_snap(116), 120);
        // mid band rounds
        assert_eq!(city_snap(108), 100);
        assert_eq!(city_snap(112), 120);
        assert_eq!(city_snap(100), 100);
    }

    #[test]
    fn test_wall_clamp_reports_axis() {
        let r = resolve_head((-20, 300), (0, 300), (-BLOCK, 0), false, false, false, &play(), &[]);
        assert_eq!((r.x, r.y), (0, 300));
        assert!(r.hit_wall);
        assert!(r.clamped_x);
        assert!(!r.clamped_y);
        assert!(!r.fatal);
    }

    #[test]
    fn test_fatal_without_buffered_input() {
        let tree = Obstacle::tree(1, 300, 300, Variation::new(60, 80, 0));
        let r = resolve_head(
            (300, 320),
            (280, 320),
            (BLOCK, 0),
            false,
            false,
            false,
            &play(),
            &[tree],
        );
        assert!(r.fatal);
        assert_eq!((r.x, r.y), (300, 320));
    }

    #[test]
    fn test_grace_nudge_stays_at_previous_tile() {
        // Spec scenario 3: tree at (300,300,60,80), serpent at (280,320)
        // moving right with input buffered this frame
        let tree = Obstacle::tree(1, 300, 300, Variation::new(60, 80, 0));
        let r = resolve_head(
            (300, 320),
            (280, 320),
            (BLOCK, 0),
            false,
            true,
            false,
            &play(),
            &[tree],
        );
        assert!(!r.fatal);
        assert!(r.nudged);
        // Half-step (290,320) still intersects the trunk band, so we stay
        assert_eq!((r.x, r.y), (280, 320));
    }

    #[test]
    fn test_grace_half_step_when_safe() {
        // Obstacle far enough that the half-step rect clears it
        let cactus = Obstacle::cactus(1, 330, 320, Variation::new(20, 40, 0));
        let r = resolve_head(
            (320, 320),
            (300, 320),
            (BLOCK, 0),
            false,
            true,
            false,
            &play(),
            &[cactus],
        );
        assert!(r.nudged);
        assert_eq!((r.x, r.y), (310, 320));
    }

    #[test]
    fn test_powered_up_destroys_instead_of_dying() {
        let cactus = Obstacle::cactus(7, 300, 320, Variation::new(20, 40, 0));
        let r = resolve_head(
            (300, 320),
            (280, 320),
            (BLOCK, 0),
            true,
            false,
            false,
            &play(),
            &[cactus],
        );
        assert!(!r.fatal);
        assert_eq!(r.destroy, Some(0));
    }

    #[test]
    fn test_destroying_obstacle_is_skipped() {
        let mut cactus = Obstacle::cactus(7, 300, 320, Variation::new(20, 40, 0));
        cactus.start_destruction();
        let r = resolve_head(
            (300, 320),
            (280, 320),
            (BLOCK, 0),
            false,
            false,
            false,
            &play(),
            &[cactus],
        );
        assert!(!r.fatal);
        assert!(r.destroy.is_none());
    }

    #[test]
    fn test_shrunk_rect_dimensions() {
        let r = shrunk_rect(100, 200);
        assert_eq!(r, Rect::new(102, 202, 16, 16));
    }
}
