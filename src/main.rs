//! Serpent Run headless runner
//!
//! Drives the simulation with a greedy autopilot for a fixed number of
//! ticks, then prints where it ended up. Useful for soak-testing the
//! deterministic core without a renderer.
//!
//! Usage: serpent-run [--seed N] [--ticks N] [--levels FILE] [--dump-frame]

use anyhow::{Context, Result, bail};

use serpent_run::GameConfig;
use serpent_run::audio::{AudioSink, NullSink};
use serpent_run::levels;
use serpent_run::sim::collision::{first_blocking, shrunk_rect};
use serpent_run::sim::{Dir, Engine, Phase, TickInput};

struct Args {
    seed: u64,
    ticks: u64,
    levels_path: Option<String>,
    dump_frame: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        seed: 1,
        ticks: 10_000,
        levels_path: None,
        dump_frame: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let v = iter.next().context("--seed needs a value")?;
                args.seed = v.parse().with_context(|| format!("bad seed {v:?}"))?;
            }
            "--ticks" => {
                let v = iter.next().context("--ticks needs a value")?;
                args.ticks = v.parse().with_context(|| format!("bad tick count {v:?}"))?;
            }
            "--levels" => {
                args.levels_path = Some(iter.next().context("--levels needs a path")?);
            }
            "--dump-frame" => args.dump_frame = true,
            other => bail!("unknown argument {other:?}"),
        }
    }
    Ok(args)
}

/// Greedy food chaser: step toward the nearest food, refusing any move whose
/// landing rect sits in an obstacle or on the body.
fn autopilot(engine: &Engine) -> TickInput {
    if engine.in_cutscene() || engine.phase != Phase::Playing {
        return TickInput {
            confirm: true,
            ..TickInput::default()
        };
    }

    let serpent = &engine.serpent;
    let level = &engine.level;
    let Some(target) = level.food.first() else {
        return TickInput::default();
    };

    let mut candidates = [Dir::Right, Dir::Left, Dir::Down, Dir::Up];
    candidates.sort_by_key(|d| {
        let (dx, dy) = d.delta();
        let (nx, ny) = (serpent.x + dx, serpent.y + dy);
        (target.x - nx).abs() + (target.y - ny).abs()
    });

    for dir in candidates {
        let (dx, dy) = dir.delta();
        if serpent.is_moving() && dx == -serpent.dx && dy == -serpent.dy {
            continue;
        }
        let (nx, ny) = (serpent.x + dx, serpent.y + dy);
        if !level.play.contains_tile(nx, ny) {
            continue;
        }
        if first_blocking(&shrunk_rect(nx, ny), &level.obstacles).is_some() {
            continue;
        }
        if serpent.body.iter().any(|&t| t == (nx, ny)) {
            continue;
        }
        return TickInput {
            direction: Some(dir),
            spit: level.is_boss,
            ..TickInput::default()
        };
    }
    TickInput::default()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let specs = match &args.levels_path {
        Some(path) => levels::load_campaign(path)?,
        None => levels::builtin_campaign(),
    };

    let mut engine = Engine::new(GameConfig::default(), specs, args.seed)?;
    let mut sink = NullSink;

    for _ in 0..args.ticks {
        let input = autopilot(&engine);
        engine.tick(input);
        for sound in engine.take_sounds() {
            sink.play(sound);
        }
        if engine.exit_requested || engine.phase == Phase::Won {
            break;
        }
    }

    if args.dump_frame {
        let frame = engine.frame();
        println!("{}", serde_json::to_string_pretty(&frame)?);
    }

    println!(
        "seed {} ended after {} gameplay ticks: level {} ({:?}), length {}, phase {:?}",
        args.seed,
        engine.frame_count,
        engine.level_index() + 1,
        engine.level.biome,
        engine.serpent.length,
        engine.phase,
    );
    Ok(())
}
