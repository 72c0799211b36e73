//! Per-biome obstacle layout generation
//!
//! Every layout must come out playable on every seed: obstacles packed
//! without overlap, a safe spawn for the serpent, and (checked by the level)
//! reachable food. All randomness flows through the engine's seeded RNG.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::grid::{PlayArea, Rect};
use super::level::Biome;
use super::obstacle::{Obstacle, ObstacleKind, Orbit, Variation};
use crate::consts::*;
use crate::floor_snap;

/// How many of a kind the scatter biomes should place, straight from the
/// level descriptor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstaclePlan {
    pub kind: ObstacleKind,
    pub count: u32,
}

/// City cells left after carving fixed-width roads, row-major
pub fn city_cells(play: &PlayArea) -> Vec<Rect> {
    let period = CITY_BLOCK + CITY_ROAD;
    let mut cells = Vec::new();
    let mut y = play.top;
    while y + CITY_BLOCK <= play.bottom {
        let mut x = 0;
        while x + CITY_BLOCK <= play.width {
            cells.push(Rect::new(x, y, CITY_BLOCK, CITY_BLOCK));
            x += period;
        }
        y += period;
    }
    cells
}

/// Tile-aligned y anchor in the middle of each horizontal road
pub fn city_road_rows(play: &PlayArea) -> Vec<i32> {
    let period = CITY_BLOCK + CITY_ROAD;
    let mut rows = Vec::new();
    let mut y = play.top + CITY_BLOCK;
    while y + CITY_ROAD <= play.bottom {
        rows.push(floor_snap(y + CITY_ROAD / 2 - BLOCK / 2, BLOCK));
        y += period;
    }
    if rows.is_empty() {
        // Degenerate short play areas still need one "road" for fallbacks
        rows.push(floor_snap(play.top + play.height() / 2, BLOCK));
    }
    rows
}

fn any_hitbox_intersects(obstacles: &[Obstacle], rect: &Rect) -> bool {
    obstacles.iter().any(|o| o.hitbox().intersects(rect))
}

/// Rejection-sample a tile anchor such that a `w x h` footprint padded by
/// `pad` stays inside the play area and clear of existing hitboxes
fn sample_clear_spot(
    play: &PlayArea,
    obstacles: &[Obstacle],
    w: i32,
    h: i32,
    pad: i32,
    attempts: u32,
    rng: &mut impl Rng,
) -> Option<(i32, i32)> {
    for _ in 0..attempts {
        let max_tx = (play.width - w) / BLOCK;
        let max_ty = (play.height() - h) / BLOCK;
        if max_tx <= 0 || max_ty <= 0 {
            return None;
        }
        let x = rng.random_range(0..=max_tx) * BLOCK;
        let y = play.top + rng.random_range(0..=max_ty) * BLOCK;
        let footprint = Rect::new(x, y, w, h);
        if !play.contains_rect(&footprint) {
            continue;
        }
        if !any_hitbox_intersects(obstacles, &footprint.expanded(pad)) {
            return Some((x, y));
        }
    }
    None
}

pub fn pick_variation(kind: ObstacleKind, rng: &mut impl Rng) -> Variation {
    let vars = kind.variations();
    vars[rng.random_range(0..vars.len())]
}

/// Desert: scattered cacti with one tile of pairwise separation
fn desert(play: &PlayArea, plans: &[ObstaclePlan], rng: &mut impl Rng, next_id: &mut u32) -> Vec<Obstacle> {
    let count = plan_count(plans, ObstacleKind::Cactus, 12);
    let mut out = Vec::new();
    for _ in 0..count {
        let var = pick_variation(ObstacleKind::Cactus, rng);
        if let Some((x, y)) = sample_clear_spot(play, &out, var.w, var.h, BLOCK, SPAWN_ATTEMPTS, rng) {
            out.push(Obstacle::cactus(alloc_id(next_id), x, y, var));
        }
    }
    out
}

/// Forest: trees, bushes and ponds packed with padded hitboxes
fn forest(play: &PlayArea, plans: &[ObstaclePlan], rng: &mut impl Rng, next_id: &mut u32) -> Vec<Obstacle> {
    let mut mix: Vec<ObstacleKind> = Vec::new();
    for (kind, default) in [
        (ObstacleKind::Tree, 6),
        (ObstacleKind::Bush, 5),
        (ObstacleKind::Pond, 3),
    ] {
        for _ in 0..plan_count(plans, kind, default) {
            mix.push(kind);
        }
    }
    mix.shuffle(rng);

    let mut out = Vec::new();
    for kind in mix {
        let var = pick_variation(kind, rng);
        // Never smaller than the kind's floor variation
        let min = kind.min_variation();
        let (w, h) = (var.w.max(min.w), var.h.max(min.h));
        let Some((x, y)) = sample_clear_spot(play, &out, w, h, BLOCK, SPAWN_ATTEMPTS, rng) else {
            continue;
        };
        let var = Variation::new(w, h, var.palette);
        out.push(match kind {
            ObstacleKind::Tree => Obstacle::tree(alloc_id(next_id), x, y, var),
            ObstacleKind::Bush => Obstacle::bush(alloc_id(next_id), x, y, var),
            _ => Obstacle::pond(alloc_id(next_id), x, y, var),
        });
    }
    out
}

/// City: a deterministic road grid; every block cell becomes a building,
/// park or lake in a 2:1:1 ratio after one shuffle. The boss variant swaps
/// buildings for rubble in the same cells.
fn city(play: &PlayArea, is_boss: bool, rng: &mut impl Rng, next_id: &mut u32) -> Vec<Obstacle> {
    let cells = city_cells(play);
    let mut roles: Vec<ObstacleKind> = (0..cells.len())
        .map(|i| match i % 4 {
            0 | 1 => ObstacleKind::Building,
            2 => ObstacleKind::Park,
            _ => ObstacleKind::Lake,
        })
        .collect();
    roles.shuffle(rng);

    cells
        .iter()
        .zip(roles)
        .map(|(cell, role)| {
            let palette = rng.random_range(0..4u8);
            match role {
                ObstacleKind::Building if is_boss => Obstacle::rubble(alloc_id(next_id), *cell, palette),
                ObstacleKind::Building => Obstacle::building(alloc_id(next_id), *cell, palette),
                ObstacleKind::Park => Obstacle::park(alloc_id(next_id), *cell, palette),
                _ => Obstacle::lake(alloc_id(next_id), *cell, palette),
            }
        })
        .collect()
}

/// Mountains: peaks and ridges, and a river flowing from each peak's foot
fn mountains(play: &PlayArea, plans: &[ObstaclePlan], rng: &mut impl Rng, next_id: &mut u32) -> Vec<Obstacle> {
    let mut out = Vec::new();
    for _ in 0..plan_count(plans, ObstacleKind::MountainPeak, 4) {
        let var = pick_variation(ObstacleKind::MountainPeak, rng);
        if let Some((x, y)) = sample_clear_spot(play, &out, var.w, var.h, BLOCK, SPAWN_ATTEMPTS, rng) {
            let peak = Obstacle::mountain_peak(alloc_id(next_id), x, y, var);
            let peak_id = peak.id;
            let source = peak.base;
            out.push(peak);
            if let Some(river) = emit_river(play, source, peak_id, rng, next_id) {
                out.push(river);
            }
        }
    }
    for _ in 0..plan_count(plans, ObstacleKind::MountainRidge, 3) {
        let var = pick_variation(ObstacleKind::MountainRidge, rng);
        if let Some((x, y)) = sample_clear_spot(play, &out, var.w, var.h, BLOCK, SPAWN_ATTEMPTS, rng) {
            out.push(Obstacle::mountain_ridge(alloc_id(next_id), x, y, var));
        }
    }
    out
}

/// Trace a river from a peak's base toward the nearest screen edge in
/// right-angled runs, occasionally forking a short side arm.
fn emit_river(
    play: &PlayArea,
    peak_base: Rect,
    peak_id: u32,
    rng: &mut impl Rng,
    next_id: &mut u32,
) -> Option<Obstacle> {
    let (cx, _) = peak_base.center();
    let toward_left = cx < play.width / 2;
    let step = if toward_left { -BLOCK } else { BLOCK };

    let mut x = floor_snap(cx, BLOCK);
    let mut y = peak_base.bottom();
    let mut segments: Vec<Rect> = Vec::new();

    while x > 0 && x + BLOCK < play.width && y + BLOCK <= play.bottom {
        // Horizontal run toward the edge
        let run = rng.random_range(3..=8);
        let x0 = x;
        for _ in 0..run {
            let nx = x + step;
            if nx < 0 || nx + BLOCK > play.width {
                break;
            }
            x = nx;
        }
        let (lo, hi) = if step < 0 { (x, x0 + BLOCK) } else { (x0, x + BLOCK) };
        segments.push(Rect::new(lo, y, hi - lo, BLOCK));

        if x <= 0 || x + BLOCK >= play.width {
            break;
        }

        // Downhill jog
        let jog = rng.random_range(1..=3) * BLOCK;
        let jog = jog.min(play.bottom - BLOCK - y);
        if jog <= 0 {
            break;
        }
        segments.push(Rect::new(x, y, BLOCK, jog + BLOCK));
        y += jog;

        // Occasional fork: a short arm running the other way
        if rng.random_bool(0.25) {
            let arm = rng.random_range(2..=4) * BLOCK;
            let (ax, aw) = if step < 0 {
                (x + BLOCK, arm)
            } else {
                ((x - arm).max(0), arm.min(x))
            };
            if aw > 0 {
                segments.push(Rect::new(ax, y, aw, BLOCK));
            }
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(Obstacle::river(alloc_id(next_id), segments, peak_id))
}

/// Space: a central sun with eight planets on elliptical orbits. Comets and
/// asteroids arrive at runtime.
fn space(play: &PlayArea, rng: &mut impl Rng, next_id: &mut u32) -> Vec<Obstacle> {
    let center = Vec2::new(
        play.width as f32 / 2.0,
        (play.top + play.height() / 2) as f32,
    );
    let mut out = vec![Obstacle::sun(alloc_id(next_id), center, 6 * BLOCK)];

    // Rings sit closer together than a planet is wide, so starting phases
    // are re-rolled until each planet's rect clears everything already
    // placed, with a fixed angle sweep once sampling keeps losing.
    for i in 0..SPACE_PLANETS {
        let ring = 100.0 + 34.0 * i as f32;
        let diameter = 2 * BLOCK + BLOCK * (i as i32 % 2);
        let mut orbit = Orbit {
            center,
            semi_major: ring,
            semi_minor: ring * 0.6,
            angle: 0.0,
            angular_vel: (0.004 + 0.003 * rng.random::<f32>()) * if i % 2 == 0 { 1.0 } else { -1.0 },
        };
        let clear = |angle: f32, placed: &[Obstacle]| {
            let pos = Orbit { angle, ..orbit }.position();
            let half = diameter / 2;
            let rect = Rect::new(pos.x as i32 - half, pos.y as i32 - half, diameter, diameter);
            !placed.iter().any(|o| o.base.intersects(&rect))
        };

        let mut angle = rng.random_range(0.0..std::f32::consts::TAU);
        let mut attempts = SPAWN_ATTEMPTS;
        while !clear(angle, &out) && attempts > 0 {
            angle = rng.random_range(0.0..std::f32::consts::TAU);
            attempts -= 1;
        }
        if attempts == 0 {
            let step = std::f32::consts::TAU / 256.0;
            angle = (0..256)
                .map(|k| k as f32 * step)
                .find(|&a| clear(a, &out))
                .unwrap_or(angle);
        }
        orbit.angle = angle;
        out.push(Obstacle::planet(alloc_id(next_id), orbit, diameter, (i % 8) as u8));
    }
    out
}

fn plan_count(plans: &[ObstaclePlan], kind: ObstacleKind, default: u32) -> u32 {
    plans
        .iter()
        .find(|p| p.kind == kind)
        .map(|p| p.count)
        .unwrap_or(default)
}

fn alloc_id(next_id: &mut u32) -> u32 {
    let id = *next_id;
    *next_id += 1;
    id
}

/// Build the obstacle field for a level
pub fn generate_obstacles(
    biome: Biome,
    play: &PlayArea,
    is_boss: bool,
    plans: &[ObstaclePlan],
    rng: &mut impl Rng,
    next_id: &mut u32,
) -> Vec<Obstacle> {
    match biome {
        Biome::Desert => desert(play, plans, rng, next_id),
        Biome::Forest => forest(play, plans, rng, next_id),
        Biome::City => city(play, is_boss, rng, next_id),
        Biome::Mountains => mountains(play, plans, rng, next_id),
        Biome::Sky => Vec::new(),
        Biome::Space => space(play, rng, next_id),
    }
}

/// Pick a spawn tile whose 2-tile-padded footprint is clear of every hitbox.
/// Up to 100 tries, then a biome-specific fallback.
pub fn safe_spawn(
    biome: Biome,
    play: &PlayArea,
    obstacles: &[Obstacle],
    rng: &mut impl Rng,
) -> (i32, i32) {
    for _ in 0..SPAWN_ATTEMPTS {
        let x = rng.random_range(0..play.cols()) * BLOCK;
        let y = play.top + rng.random_range(0..play.rows().max(1)) * BLOCK;
        if !play.contains_tile(x, y) {
            continue;
        }
        let padded = Rect::tile(x, y).expanded(2 * BLOCK);
        if !any_hitbox_intersects(obstacles, &padded) {
            return (x, y);
        }
    }
    match biome {
        Biome::City => {
            let rows = city_road_rows(play);
            (floor_snap(play.width / 2, BLOCK), rows[0])
        }
        _ => (
            floor_snap(play.width / 2, BLOCK),
            floor_snap(play.top + play.height() / 2, BLOCK),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn play() -> PlayArea {
        PlayArea::new(800, 40, 600)
    }

    fn all_hitboxes(obstacles: &[Obstacle]) -> Vec<Rect> {
        let mut rects = Vec::new();
        for o in obstacles {
            o.hitbox().for_each_rect(|r| rects.push(*r));
        }
        rects
    }

    #[test]
    fn test_desert_hitboxes_inside_play_area_and_separated() {
        for seed in 0..10 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut id = 0;
            let obs = desert(&play(), &[], &mut rng, &mut id);
            assert!(!obs.is_empty());
            for o in &obs {
                o.hitbox().for_each_rect(|r| assert!(play().contains_rect(r), "{r:?} escapes"));
            }
            // Pairwise one-tile separation
            for (i, a) in obs.iter().enumerate() {
                for b in obs.iter().skip(i + 1) {
                    assert!(!a.base.expanded(BLOCK).intersects(&b.base));
                }
            }
        }
    }

    #[test]
    fn test_forest_mutual_non_overlap() {
        for seed in 0..10 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut id = 0;
            let obs = forest(&play(), &[], &mut rng, &mut id);
            let rects = all_hitboxes(&obs);
            for (i, a) in rects.iter().enumerate() {
                for b in rects.iter().skip(i + 1) {
                    assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_city_ratio_and_boss_swap() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut id = 0;
        let obs = city(&play(), false, &mut rng, &mut id);
        let cells = city_cells(&play());
        assert_eq!(obs.len(), cells.len());
        let buildings = obs.iter().filter(|o| o.kind == ObstacleKind::Building).count();
        let parks = obs.iter().filter(|o| o.kind == ObstacleKind::Park).count();
        let lakes = obs.iter().filter(|o| o.kind == ObstacleKind::Lake).count();
        assert_eq!(buildings + parks + lakes, cells.len());
        // 2:1:1 within rounding of the cell count
        assert!(buildings >= parks && buildings >= lakes);

        let mut rng = Pcg32::seed_from_u64(3);
        let mut id = 0;
        let boss = city(&play(), true, &mut rng, &mut id);
        // Same shuffle, buildings replaced by rubble in the same cells
        assert_eq!(boss.iter().filter(|o| o.kind == ObstacleKind::Rubble).count(), buildings);
        for (a, b) in obs.iter().zip(&boss) {
            if a.kind == ObstacleKind::Building {
                assert_eq!(b.kind, ObstacleKind::Rubble);
            } else {
                assert_eq!(a.kind, b.kind);
            }
        }
    }

    #[test]
    fn test_rivers_reference_their_peak() {
        for seed in 0..10 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut id = 0;
            let obs = mountains(&play(), &[], &mut rng, &mut id);
            let peak_ids: Vec<u32> = obs
                .iter()
                .filter(|o| o.kind == ObstacleKind::MountainPeak)
                .map(|o| o.id)
                .collect();
            for river in obs.iter().filter(|o| o.kind == ObstacleKind::River) {
                let src = river.source_peak.expect("river without a source peak");
                assert!(peak_ids.contains(&src));
                assert!(!river.parts.is_empty());
            }
        }
    }

    #[test]
    fn test_space_layout() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut id = 0;
        let obs = space(&play(), &mut rng, &mut id);
        assert_eq!(obs.iter().filter(|o| o.kind == ObstacleKind::Sun).count(), 1);
        assert_eq!(
            obs.iter().filter(|o| o.kind == ObstacleKind::Planet).count(),
            SPACE_PLANETS as usize
        );
        for p in obs.iter().filter(|o| o.kind == ObstacleKind::Planet) {
            assert!(p.orbit.is_some());
        }
    }

    #[test]
    fn test_space_bodies_start_disjoint() {
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut id = 0;
            let obs = space(&play(), &mut rng, &mut id);
            for (i, a) in obs.iter().enumerate() {
                for b in obs.iter().skip(i + 1) {
                    assert!(
                        !a.base.intersects(&b.base),
                        "seed {seed}: {:?} {:?} overlaps {:?} {:?}",
                        a.kind,
                        a.base,
                        b.kind,
                        b.base
                    );
                }
            }
        }
    }

    #[test]
    fn test_safe_spawn_clear_of_hitboxes() {
        for seed in 0..10 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut id = 0;
            let obs = forest(&play(), &[], &mut rng, &mut id);
            let (x, y) = safe_spawn(Biome::Forest, &play(), &obs, &mut rng);
            assert!(play().contains_tile(x, y));
            assert!(!any_hitbox_intersects(&obs, &Rect::tile(x, y)));
        }
    }

    #[test]
    fn test_city_roads_exist() {
        let rows = city_road_rows(&play());
        assert!(!rows.is_empty());
        let cells = city_cells(&play());
        // No cell covers a road row
        for row in &rows {
            let row_rect = Rect::new(0, *row, 800, BLOCK);
            for cell in &cells {
                assert!(!cell.intersects(&row_rect));
            }
        }
    }
}
