//! Tile arithmetic, rectangles and reachability
//!
//! Integer pixel space, quantised to `BLOCK`-sized tiles. The BFS here
//! answers reachability only; nothing in the game ever needs the path itself.

use serde::{Deserialize, Serialize};

use crate::consts::BLOCK;

/// Axis-aligned integer rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// One full tile anchored at `(x, y)`
    pub const fn tile(x: i32, y: i32) -> Self {
        Self::new(x, y, BLOCK, BLOCK)
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Half-open intersection test (touching edges do not intersect)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Grown by `pad` pixels on every side
    pub fn expanded(&self, pad: i32) -> Rect {
        Rect::new(self.x - pad, self.y - pad, self.w + 2 * pad, self.h + 2 * pad)
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

/// The playable region: `[0, width) x [top, bottom)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayArea {
    pub width: i32,
    pub top: i32,
    pub bottom: i32,
}

impl PlayArea {
    pub fn new(width: i32, top: i32, bottom: i32) -> Self {
        Self { width, top, bottom }
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(0, self.top, self.width, self.height())
    }

    pub fn contains_rect(&self, r: &Rect) -> bool {
        r.x >= 0 && r.right() <= self.width && r.y >= self.top && r.bottom() <= self.bottom
    }

    /// Whether a tile anchored at `(x, y)` lies fully inside
    pub fn contains_tile(&self, x: i32, y: i32) -> bool {
        x >= 0 && x + BLOCK <= self.width && y >= self.top && y + BLOCK <= self.bottom
    }

    /// Clamp a tile anchor into the area; reports which axes were clamped
    pub fn clamp_tile(&self, x: i32, y: i32) -> (i32, i32, bool, bool) {
        let cx = x.clamp(0, self.width - BLOCK);
        let cy = y.clamp(self.top, self.bottom - BLOCK);
        (cx, cy, cx != x, cy != y)
    }

    pub fn cols(&self) -> i32 {
        self.width / BLOCK
    }

    pub fn rows(&self) -> i32 {
        // Top is not necessarily tile-aligned; round the band up
        (self.height() + BLOCK - 1) / BLOCK
    }
}

/// BFS over tiles in +-BLOCK steps, visiting each tile at most once.
///
/// A tile expands iff it lies inside the play area and `blocked` rejects its
/// full-tile rect. Returns whether `to` is reachable from `from`; no path is
/// produced. The frontier is a fixed-capacity ring over the tile grid, so a
/// full traversal allocates exactly twice.
pub fn reachable(
    play: &PlayArea,
    from: (i32, i32),
    to: (i32, i32),
    mut blocked: impl FnMut(&Rect) -> bool,
) -> bool {
    let cols = play.cols().max(1) as usize;
    let rows = play.rows().max(1) as usize;
    let cap = cols * rows;

    let key = |x: i32, y: i32| -> Option<usize> {
        if !play.contains_tile(x, y) {
            return None;
        }
        let cx = (x / BLOCK) as usize;
        let cy = ((y - play.top) / BLOCK) as usize;
        let idx = cy * cols + cx;
        (idx < cap).then_some(idx)
    };

    let Some(start) = key(from.0, from.1) else {
        return false;
    };
    let Some(goal_key) = key(to.0, to.1) else {
        return false;
    };
    if start == goal_key {
        return true;
    }

    let mut visited = vec![false; cap];
    let mut ring: Vec<(i32, i32)> = vec![(0, 0); cap];
    let (mut head, mut tail) = (0usize, 0usize);

    visited[start] = true;
    ring[tail] = from;
    tail += 1;

    while head < tail {
        let (x, y) = ring[head];
        head += 1;

        for (dx, dy) in [(BLOCK, 0), (-BLOCK, 0), (0, BLOCK), (0, -BLOCK)] {
            let (nx, ny) = (x + dx, y + dy);
            let Some(k) = key(nx, ny) else { continue };
            if visited[k] {
                continue;
            }
            visited[k] = true;
            if blocked(&Rect::tile(nx, ny)) {
                continue;
            }
            if k == goal_key {
                return true;
            }
            debug_assert!(tail < cap, "BFS frontier exceeded tile count");
            ring[tail] = (nx, ny);
            tail += 1;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> PlayArea {
        PlayArea::new(200, 40, 200)
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0, 0, 20, 20);
        assert!(a.intersects(&Rect::new(10, 10, 20, 20)));
        // Touching edges do not overlap
        assert!(!a.intersects(&Rect::new(20, 0, 20, 20)));
        assert!(!a.intersects(&Rect::new(0, 20, 20, 20)));
    }

    #[test]
    fn test_clamp_tile_reports_axes() {
        let p = area();
        let (x, y, cx, cy) = p.clamp_tile(-20, 100);
        assert_eq!((x, y), (0, 100));
        assert!(cx);
        assert!(!cy);
        let (_, y, _, cy) = p.clamp_tile(0, 300);
        assert_eq!(y, 180);
        assert!(cy);
    }

    #[test]
    fn test_reachable_open_field() {
        let p = area();
        assert!(reachable(&p, (0, 40), (180, 180), |_| false));
    }

    #[test]
    fn test_reachable_blocked_by_wall() {
        let p = area();
        // Vertical wall at x = 100 spanning the full height
        let wall = Rect::new(100, 40, 20, 160);
        assert!(!reachable(&p, (0, 40), (180, 40), |r| r.intersects(&wall)));
    }

    #[test]
    fn test_reachable_around_partial_wall() {
        let p = area();
        // Wall with a gap at the bottom row
        let wall = Rect::new(100, 40, 20, 140);
        assert!(reachable(&p, (0, 40), (180, 40), |r| r.intersects(&wall)));
    }

    #[test]
    fn test_reachable_same_tile() {
        let p = area();
        assert!(reachable(&p, (60, 60), (60, 60), |_| true));
    }

    #[test]
    fn test_out_of_bounds_goal() {
        let p = area();
        assert!(!reachable(&p, (0, 40), (400, 40), |_| false));
    }
}
