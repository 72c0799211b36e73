//! Scripted cutscenes between levels
//!
//! A cutscene is data (descriptor structs straight out of JSON) plus a tiny
//! cooperative runner: a sequence index and a per-step countdown. Dialogue
//! steps block on the confirm key; action steps run a fixed duration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placement of a named sprite on the cutscene stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteDecl {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: (i32, i32),
}

/// Where the serpent sits and what it is doing during the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnakePose {
    pub position: (i32, i32),
    #[serde(default)]
    pub state: String,
}

/// A single scripted step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Step {
    /// Shown until the player confirms
    Dialogue {
        text: String,
        #[serde(default)]
        focus: Option<String>,
    },
    /// Runs for a fixed number of frames
    Action {
        duration: u32,
        #[serde(default)]
        actions: Vec<String>,
    },
}

/// The full descriptor for one scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutsceneScript {
    #[serde(default)]
    pub sprites: BTreeMap<String, SpriteDecl>,
    pub snake: SnakePose,
    pub sequence: Vec<Step>,
}

/// What the renderer needs to draw the current step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutsceneFrame {
    pub sequence_index: usize,
    pub dialogue: Option<String>,
    pub focus: Option<String>,
    pub actions: Vec<String>,
}

/// Runner state over a script. `tick` returns true once the script is done.
#[derive(Debug, Clone)]
pub struct Cutscene {
    script: CutsceneScript,
    sequence_index: usize,
    countdown: u32,
}

impl Cutscene {
    pub fn new(script: CutsceneScript) -> Self {
        let countdown = match script.sequence.first() {
            Some(Step::Action { duration, .. }) => *duration,
            _ => 0,
        };
        Self { script, sequence_index: 0, countdown }
    }

    pub fn is_done(&self) -> bool {
        self.sequence_index >= self.script.sequence.len()
    }

    fn advance(&mut self) {
        self.sequence_index += 1;
        self.countdown = match self.script.sequence.get(self.sequence_index) {
            Some(Step::Action { duration, .. }) => *duration,
            _ => 0,
        };
    }

    /// Advance one frame. `confirm` is the Enter key edge.
    pub fn tick(&mut self, confirm: bool) -> bool {
        match self.script.sequence.get(self.sequence_index) {
            None => return true,
            Some(Step::Dialogue { .. }) => {
                if confirm {
                    self.advance();
                }
            }
            Some(Step::Action { .. }) => {
                if self.countdown <= 1 {
                    self.advance();
                } else {
                    self.countdown -= 1;
                }
            }
        }
        self.is_done()
    }

    pub fn frame(&self) -> Option<CutsceneFrame> {
        self.script.sequence.get(self.sequence_index).map(|step| match step {
            Step::Dialogue { text, focus } => CutsceneFrame {
                sequence_index: self.sequence_index,
                dialogue: Some(text.clone()),
                focus: focus.clone(),
                actions: Vec::new(),
            },
            Step::Action { actions, .. } => CutsceneFrame {
                sequence_index: self.sequence_index,
                dialogue: None,
                focus: None,
                actions: actions.clone(),
            },
        })
    }
}
