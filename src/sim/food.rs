//! Food placement and the critters that get eaten
//!
//! Placement is rejection sampling gated by no-spawn rects, the serpent's
//! body, and (outside the open desert) BFS reachability from the head. A
//! deterministic biome fallback guarantees the level never ends up foodless.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{self, PlayArea, Rect};
use super::level::Biome;
use super::levelgen;
use super::obstacle::Obstacle;
use super::serpent::Serpent;
use crate::consts::*;
use crate::floor_snap;

/// One prey item on the grid. `critter` indexes the level's critter list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Food {
    pub x: i32,
    pub y: i32,
    pub critter: u8,
    /// The mountain eagle that gates level completion
    pub is_eagle: bool,
}

impl Food {
    pub fn rect(&self) -> Rect {
        Rect::tile(self.x, self.y)
    }
}

/// Candidate must be clear one tile above itself as well, so prey never sits
/// "floating" on top of a structure.
fn candidate_zone(x: i32, y: i32) -> Rect {
    Rect::new(x, y - BLOCK, BLOCK, 2 * BLOCK)
}

fn no_spawn_conflict(x: i32, y: i32, obstacles: &[Obstacle], scratch: &mut Vec<Rect>) -> bool {
    let zone = candidate_zone(x, y);
    for o in obstacles {
        scratch.clear();
        o.no_spawn_rects(scratch);
        if scratch.iter().any(|r| r.intersects(&zone)) {
            return true;
        }
    }
    false
}

fn on_serpent(x: i32, y: i32, serpent: &Serpent) -> bool {
    serpent.body.iter().any(|&t| t == (x, y)) || (serpent.x, serpent.y) == (x, y)
}

fn reachable_from_head(play: &PlayArea, obstacles: &[Obstacle], serpent: &Serpent, to: (i32, i32)) -> bool {
    grid::reachable(play, (serpent.x, serpent.y), to, |r| {
        obstacles.iter().any(|o| o.is_idle() && o.hitbox().intersects(r))
    })
}

fn sample_candidate(biome: Biome, play: &PlayArea, rng: &mut impl Rng) -> (i32, i32) {
    match biome {
        Biome::City => {
            let rows = levelgen::city_road_rows(play);
            let y = rows[rng.random_range(0..rows.len())];
            let x = rng.random_range(0..play.cols()) * BLOCK;
            (x, y)
        }
        _ => {
            let x = rng.random_range(0..play.cols()) * BLOCK;
            let y = play.top + rng.random_range(0..play.rows().max(1)) * BLOCK;
            (x, y)
        }
    }
}

/// Deterministic last resort per biome
fn fallback(biome: Biome, play: &PlayArea) -> (i32, i32) {
    match biome {
        Biome::City => {
            let rows = levelgen::city_road_rows(play);
            (floor_snap(play.width / 2, BLOCK), rows[0])
        }
        _ => (
            floor_snap(play.width / 2, BLOCK),
            floor_snap(play.top + play.height() / 2, BLOCK),
        ),
    }
}

/// Place one food item. The dense biomes get a longer attempt budget; on
/// saturation the biome fallback is used and a warning logged.
pub fn place_food(
    biome: Biome,
    play: &PlayArea,
    obstacles: &[Obstacle],
    serpent: &Serpent,
    critter_count: u8,
    rng: &mut impl Rng,
) -> Food {
    let attempts = match biome {
        Biome::City | Biome::Mountains => FOOD_ATTEMPTS_LONG,
        _ => FOOD_ATTEMPTS,
    };
    let critter = if critter_count > 1 {
        rng.random_range(0..critter_count)
    } else {
        0
    };

    let mut scratch = Vec::new();
    for _ in 0..attempts {
        let (x, y) = sample_candidate(biome, play, rng);
        if !play.contains_tile(x, y) {
            continue;
        }
        if no_spawn_conflict(x, y, obstacles, &mut scratch) || on_serpent(x, y, serpent) {
            continue;
        }
        if biome != Biome::Desert && !reachable_from_head(play, obstacles, serpent, (x, y)) {
            continue;
        }
        return Food { x, y, critter, is_eagle: false };
    }

    let (x, y) = fallback(biome, play);
    log::warn!("food spawner saturated in {biome:?}; using fallback at ({x}, {y})");
    Food { x, y, critter, is_eagle: false }
}

/// The eagle appears at a fixed spot once enough peaks have fallen
pub fn eagle(x: i32, y: i32) -> Food {
    Food { x, y, critter: 0, is_eagle: true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (PlayArea, Serpent, Pcg32) {
        let play = PlayArea::new(800, 40, 600);
        let serpent = Serpent::new(&GameConfig::default(), 400, 400);
        (play, serpent, Pcg32::seed_from_u64(1))
    }

    #[test]
    fn test_food_lands_on_grid_inside_play_area() {
        let (play, serpent, mut rng) = setup();
        for _ in 0..20 {
            let f = place_food(Biome::Forest, &play, &[], &serpent, 3, &mut rng);
            assert!(play.contains_tile(f.x, f.y));
            assert_eq!(f.x % BLOCK, 0);
            assert!(f.critter < 3);
        }
    }

    #[test]
    fn test_food_avoids_serpent_body() {
        let (play, mut serpent, mut rng) = setup();
        serpent.length = 50;
        for i in 1..=40 {
            serpent.dx = BLOCK;
            serpent.commit_head(400 - (i % 20) * BLOCK, 400 + (i / 20) * BLOCK);
        }
        for _ in 0..30 {
            let f = place_food(Biome::Forest, &play, &[], &serpent, 1, &mut rng);
            assert!(!serpent.body.contains(&(f.x, f.y)));
        }
    }

    #[test]
    fn test_city_food_sits_on_a_road() {
        let (play, serpent, mut rng) = setup();
        let rows = levelgen::city_road_rows(&play);
        for _ in 0..20 {
            let f = place_food(Biome::City, &play, &[], &serpent, 1, &mut rng);
            assert!(rows.contains(&f.y), "{} not a road row in {rows:?}", f.y);
        }
    }

    #[test]
    fn test_saturated_city_falls_back_to_first_road() {
        let (play, serpent, mut rng) = setup();
        // A wall of cacti covering every tile makes placement impossible
        let mut obstacles = Vec::new();
        let mut id = 0;
        for ty in 0..play.rows() {
            id += 1;
            obstacles.push(Obstacle::cactus(
                id,
                0,
                play.top + ty * BLOCK,
                crate::sim::obstacle::Variation::new(play.width, BLOCK, 0),
            ));
        }
        let f = place_food(Biome::City, &play, &obstacles, &serpent, 1, &mut rng);
        let rows = levelgen::city_road_rows(&play);
        assert_eq!((f.x, f.y), (floor_snap(play.width / 2, BLOCK), rows[0]));
    }

    #[test]
    fn test_unreachable_candidates_rejected_outside_desert() {
        let (play, serpent, mut rng) = setup();
        // Box the serpent in so tightly that its own tile is the only free
        // square inside
        let walls = vec![
            Obstacle::cactus(1, 380, 380, crate::sim::obstacle::Variation::new(60, 20, 0)),
            Obstacle::cactus(2, 380, 420, crate::sim::obstacle::Variation::new(60, 20, 0)),
            Obstacle::cactus(3, 380, 400, crate::sim::obstacle::Variation::new(20, 20, 0)),
            Obstacle::cactus(4, 420, 400, crate::sim::obstacle::Variation::new(20, 20, 0)),
        ];
        // Everything outside the box is unreachable, so the spawner must
        // fall back rather than placing out there
        let f = place_food(Biome::Forest, &play, &walls, &serpent, 1, &mut rng);
        let fb = fallback(Biome::Forest, &play);
        assert_eq!((f.x, f.y), fb);
    }
}
