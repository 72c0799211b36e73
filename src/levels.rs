//! Level descriptor records
//!
//! Levels are plain serde records, either built in (`builtin_campaign`) or
//! loaded from a JSON file. Loading validates fully up front; a bad
//! descriptor aborts startup rather than surfacing mid-run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BLOCK, HEIGHT};
use crate::sim::cutscene::{CutsceneScript, SnakePose, SpriteDecl, Step};
use crate::sim::level::Biome;
use crate::sim::levelgen::ObstaclePlan;
use crate::sim::obstacle::ObstacleKind;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("campaign has no levels")]
    Empty,
    #[error("level {name:?}: play area top {top} must sit above bottom {bottom}")]
    InvertedPlayArea { name: String, top: i32, bottom: i32 },
    #[error("level {name:?}: play area bounds must be multiples of {BLOCK}")]
    MisalignedPlayArea { name: String },
    #[error("level {name:?}: critter list is empty")]
    NoCritters { name: String },
    #[error("boss level {name:?} is missing its intro cutscene")]
    MissingBossIntro { name: String },
    #[error("level {name:?}: no completion target set")]
    NoGoal { name: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayAreaSpec {
    pub top: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CutsceneSpecs {
    #[serde(default)]
    pub intro: Option<CutsceneScript>,
    #[serde(default)]
    pub ending: Option<CutsceneScript>,
}

/// One level record, as iterated in campaign order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpec {
    pub name: String,
    pub biome: Biome,
    pub play_area: PlayAreaSpec,
    #[serde(default)]
    pub obstacles: Vec<ObstaclePlan>,
    pub critters: Vec<String>,
    #[serde(default)]
    pub required_food: u32,
    #[serde(default)]
    pub required_buildings: u32,
    #[serde(default)]
    pub required_planets: u32,
    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub cutscenes: CutsceneSpecs,
}

impl LevelSpec {
    fn validate(&self) -> Result<(), DescriptorError> {
        let name = self.name.clone();
        if self.play_area.top >= self.play_area.bottom {
            return Err(DescriptorError::InvertedPlayArea {
                name,
                top: self.play_area.top,
                bottom: self.play_area.bottom,
            });
        }
        if self.play_area.top % BLOCK != 0 || self.play_area.bottom % BLOCK != 0 {
            return Err(DescriptorError::MisalignedPlayArea { name });
        }
        if self.critters.is_empty() {
            return Err(DescriptorError::NoCritters { name });
        }
        if self.is_boss && self.cutscenes.intro.is_none() {
            return Err(DescriptorError::MissingBossIntro { name });
        }
        let has_goal = self.is_boss
            || match self.biome {
                Biome::Desert | Biome::Forest | Biome::Sky => self.required_food > 0,
                Biome::City => self.required_buildings > 0,
                Biome::Mountains => true, // gated on the eagle
                Biome::Space => self.required_planets > 0,
            };
        if !has_goal {
            return Err(DescriptorError::NoGoal { name });
        }
        Ok(())
    }
}

/// Load a campaign from a JSON file, failing fast on any bad record
pub fn load_campaign(path: impl AsRef<Path>) -> Result<Vec<LevelSpec>, DescriptorError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let specs: Vec<LevelSpec> =
        serde_json::from_str(&text).map_err(|source| DescriptorError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    if specs.is_empty() {
        return Err(DescriptorError::Empty);
    }
    for spec in &specs {
        spec.validate()?;
    }
    log::info!("loaded {} levels from {}", specs.len(), path.display());
    Ok(specs)
}

fn plan(kind: ObstacleKind, count: u32) -> ObstaclePlan {
    ObstaclePlan { kind, count }
}

fn dialogue(text: &str, focus: Option<&str>) -> Step {
    Step::Dialogue {
        text: text.to_string(),
        focus: focus.map(str::to_string),
    }
}

fn action(duration: u32, actions: &[&str]) -> Step {
    Step::Action {
        duration,
        actions: actions.iter().map(|s| s.to_string()).collect(),
    }
}

fn boss_intro() -> CutsceneScript {
    let mut sprites = BTreeMap::new();
    sprites.insert(
        "tank".to_string(),
        SpriteDecl {
            kind: "tank".to_string(),
            position: (400, 160),
        },
    );
    CutsceneScript {
        sprites,
        snake: SnakePose {
            position: (400, 500),
            state: "alert".to_string(),
        },
        sequence: vec![
            action(60, &["tank_rolls_in"]),
            dialogue("The demolition tank turns its turret toward you.", Some("tank")),
            dialogue("Spit venom with Space. It costs a segment, so keep eating.", None),
        ],
    }
}

fn boss_ending() -> CutsceneScript {
    CutsceneScript {
        sprites: BTreeMap::new(),
        snake: SnakePose {
            position: (400, 300),
            state: "victorious".to_string(),
        },
        sequence: vec![
            action(90, &["tank_explodes"]),
            dialogue("The tank grinds to a halt. The city is quiet again.", None),
        ],
    }
}

fn mountain_ending() -> CutsceneScript {
    let mut sprites = BTreeMap::new();
    sprites.insert(
        "eagle".to_string(),
        SpriteDecl {
            kind: "eagle".to_string(),
            position: (400, 100),
        },
    );
    CutsceneScript {
        sprites,
        snake: SnakePose {
            position: (400, 400),
            state: "gazing".to_string(),
        },
        sequence: vec![
            action(120, &["eagle_circles", "snow_falls"]),
            dialogue("With the eagle gone, nothing watches the passes.", Some("eagle")),
        ],
    }
}

/// The shipped campaign, in fixed order
pub fn builtin_campaign() -> Vec<LevelSpec> {
    // Two tiles of HUD strip at the top, play area down to the window edge
    let play = PlayAreaSpec {
        top: 2 * BLOCK,
        bottom: HEIGHT,
    };
    vec![
        LevelSpec {
            name: "desert".to_string(),
            biome: Biome::Desert,
            play_area: play,
            obstacles: vec![plan(ObstacleKind::Cactus, 12)],
            critters: vec!["mouse".to_string(), "lizard".to_string()],
            required_food: 8,
            required_buildings: 0,
            required_planets: 0,
            is_boss: false,
            cutscenes: CutsceneSpecs::default(),
        },
        LevelSpec {
            name: "forest".to_string(),
            biome: Biome::Forest,
            play_area: play,
            obstacles: vec![
                plan(ObstacleKind::Tree, 6),
                plan(ObstacleKind::Bush, 5),
                plan(ObstacleKind::Pond, 3),
            ],
            critters: vec!["mouse".to_string(), "frog".to_string(), "rabbit".to_string()],
            required_food: 10,
            required_buildings: 0,
            required_planets: 0,
            is_boss: false,
            cutscenes: CutsceneSpecs::default(),
        },
        LevelSpec {
            name: "city".to_string(),
            biome: Biome::City,
            play_area: play,
            obstacles: Vec::new(),
            critters: vec!["rat".to_string(), "pigeon".to_string()],
            required_food: 0,
            required_buildings: 3,
            required_planets: 0,
            is_boss: false,
            cutscenes: CutsceneSpecs::default(),
        },
        LevelSpec {
            name: "city_boss".to_string(),
            biome: Biome::City,
            play_area: play,
            obstacles: Vec::new(),
            critters: vec!["rat".to_string(), "pigeon".to_string()],
            required_food: 0,
            required_buildings: 0,
            required_planets: 0,
            is_boss: true,
            cutscenes: CutsceneSpecs {
                intro: Some(boss_intro()),
                ending: Some(boss_ending()),
            },
        },
        LevelSpec {
            name: "mountains".to_string(),
            biome: Biome::Mountains,
            play_area: play,
            obstacles: vec![
                plan(ObstacleKind::MountainPeak, 4),
                plan(ObstacleKind::MountainRidge, 3),
            ],
            critters: vec!["marmot".to_string(), "hare".to_string()],
            required_food: 0,
            required_buildings: 0,
            required_planets: 0,
            is_boss: false,
            cutscenes: CutsceneSpecs {
                intro: None,
                ending: Some(mountain_ending()),
            },
        },
        LevelSpec {
            name: "sky".to_string(),
            biome: Biome::Sky,
            play_area: play,
            obstacles: Vec::new(),
            critters: vec!["sparrow".to_string(), "swift".to_string(), "moth".to_string()],
            required_food: 12,
            required_buildings: 0,
            required_planets: 0,
            is_boss: false,
            cutscenes: CutsceneSpecs::default(),
        },
        LevelSpec {
            name: "space".to_string(),
            biome: Biome::Space,
            play_area: play,
            obstacles: Vec::new(),
            critters: vec!["starling".to_string()],
            required_food: 0,
            required_buildings: 0,
            required_planets: 8,
            is_boss: false,
            cutscenes: CutsceneSpecs::default(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_campaign_order_and_validity() {
        let specs = builtin_campaign();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["desert", "forest", "city", "city_boss", "mountains", "sky", "space"]
        );
        for spec in &specs {
            spec.validate().unwrap();
        }
    }

    #[test]
    fn test_round_trip_through_json() {
        let specs = builtin_campaign();
        let text = serde_json::to_string(&specs).unwrap();
        let back: Vec<LevelSpec> = serde_json::from_str(&text).unwrap();
        assert_eq!(back.len(), specs.len());
        assert!(back[3].is_boss);
        assert!(back[3].cutscenes.intro.is_some());
    }

    #[test]
    fn test_validation_rejects_inverted_play_area() {
        let mut spec = builtin_campaign().remove(0);
        spec.play_area = PlayAreaSpec { top: 600, bottom: 40 };
        assert!(matches!(
            spec.validate(),
            Err(DescriptorError::InvertedPlayArea { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_boss_without_intro() {
        let mut spec = builtin_campaign().remove(3);
        spec.cutscenes.intro = None;
        assert!(matches!(
            spec.validate(),
            Err(DescriptorError::MissingBossIntro { .. })
        ));
    }

    #[test]
    fn test_load_campaign_missing_file() {
        assert!(matches!(
            load_campaign("/nonexistent/levels.json"),
            Err(DescriptorError::Io { .. })
        ));
    }
}
