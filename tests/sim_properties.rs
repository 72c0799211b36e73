//! Property tests over whole-engine runs
//!
//! Each property drives a full `Engine` with random seeds and input tapes
//! and checks the structural invariants the renderer and resolver rely on.

use proptest::prelude::*;

use serpent_run::GameConfig;
use serpent_run::consts::BLOCK;
use serpent_run::levels::builtin_campaign;
use serpent_run::sim::collision::shrunk_rect;
use serpent_run::sim::{Dir, Engine, TickInput};

fn dir_from_byte(b: u8) -> Option<Dir> {
    match b % 5 {
        0 => None,
        1 => Some(Dir::Up),
        2 => Some(Dir::Down),
        3 => Some(Dir::Left),
        _ => Some(Dir::Right),
    }
}

fn engine(seed: u64) -> Engine {
    Engine::new(GameConfig::default(), builtin_campaign(), seed).unwrap()
}

fn drive(e: &mut Engine, tape: &[u8]) {
    for &b in tape {
        e.tick(TickInput {
            direction: dir_from_byte(b),
            confirm: b % 7 == 0,
            ..TickInput::default()
        });
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Velocity stays axis-aligned with tile-sized components
    #[test]
    fn velocity_always_axis_aligned(seed in any::<u64>(), tape in prop::collection::vec(any::<u8>(), 1..150)) {
        let mut e = engine(seed);
        for &b in &tape {
            e.tick(TickInput { direction: dir_from_byte(b), ..TickInput::default() });
            let (dx, dy) = (e.serpent.dx, e.serpent.dy);
            prop_assert_eq!(dx * dy, 0);
            prop_assert!(dx.abs() == 0 || dx.abs() == BLOCK);
            prop_assert!(dy.abs() == 0 || dy.abs() == BLOCK);
        }
    }

    /// A live head never rests inside an idle obstacle
    #[test]
    fn live_head_clear_of_idle_obstacles(seed in any::<u64>(), tape in prop::collection::vec(any::<u8>(), 1..150)) {
        let mut e = engine(seed);
        for &b in &tape {
            e.tick(TickInput { direction: dir_from_byte(b), ..TickInput::default() });
            if e.serpent.is_dead {
                break;
            }
            let head = shrunk_rect(e.serpent.x, e.serpent.y);
            for o in &e.level.obstacles {
                prop_assert!(
                    !(o.is_idle() && o.hitbox().intersects(&head)),
                    "head {:?} inside idle {:?}", head, o.kind
                );
            }
        }
    }

    /// Body bookkeeping: bounded by target length, back entry is the head
    #[test]
    fn body_tracks_head_and_length(seed in any::<u64>(), tape in prop::collection::vec(any::<u8>(), 1..150)) {
        let mut e = engine(seed);
        drive(&mut e, &tape);
        prop_assert!(e.serpent.body.len() <= e.serpent.length);
        prop_assert_eq!(e.serpent.body.back(), Some(&(e.serpent.x, e.serpent.y)));
    }

    /// Level construction: hitboxes in bounds, destroyables disjoint, first
    /// food reachable outside the desert
    #[test]
    fn generated_levels_are_well_formed(seed in any::<u64>()) {
        let e = engine(seed);
        let level = &e.level;
        let bounds = level.play.as_rect();
        for o in &level.obstacles {
            o.hitbox().for_each_rect(|r| {
                assert!(bounds.x <= r.x && r.right() <= bounds.right());
                assert!(bounds.y <= r.y && r.bottom() <= bounds.bottom());
            });
        }
        let footprints: Vec<_> = level
            .obstacles
            .iter()
            .filter(|o| o.can_be_destroyed())
            .map(|o| o.base)
            .collect();
        for (i, a) in footprints.iter().enumerate() {
            for b in footprints.iter().skip(i + 1) {
                prop_assert!(!a.intersects(b));
            }
        }
    }

    /// Same seed and input tape, same end state
    #[test]
    fn determinism(seed in any::<u64>(), tape in prop::collection::vec(any::<u8>(), 1..200)) {
        let run = |tape: &[u8]| {
            let mut e = engine(seed);
            drive(&mut e, tape);
            (
                (e.serpent.x, e.serpent.y),
                (e.serpent.dx, e.serpent.dy),
                e.serpent.body.len(),
                e.serpent.is_dead,
                e.level.food_count,
                e.level.obstacles.len(),
                e.frame_count,
            )
        };
        prop_assert_eq!(run(&tape), run(&tape));
    }

    /// Reversing into yourself is always rejected
    #[test]
    fn reverse_input_never_flips_velocity(seed in any::<u64>(), tape in prop::collection::vec(any::<u8>(), 1..100)) {
        let mut e = engine(seed);
        for &b in &tape {
            let before = (e.serpent.dx, e.serpent.dy);
            let reverse = match before {
                (x, _) if x > 0 => Some(Dir::Left),
                (x, _) if x < 0 => Some(Dir::Right),
                (_, y) if y > 0 => Some(Dir::Up),
                (_, y) if y < 0 => Some(Dir::Down),
                _ => dir_from_byte(b),
            };
            e.tick(TickInput { direction: reverse, ..TickInput::default() });
            if before != (0, 0) {
                prop_assert_eq!((e.serpent.dx, e.serpent.dy), before);
            }
        }
    }
}
