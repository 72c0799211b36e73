//! Sound events and the audio sink boundary
//!
//! The simulation emits fire-and-forget `Sound` events; a renderer supplies
//! an `AudioSink` to hear them. Playback failures never reach the tick loop,
//! a sink that cannot play simply drops the event.

/// Everything the simulation can ask to have played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Eat,
    PowerUp,
    PowerDown,
    Bounce,
    Spit,
    ShellFired,
    Hit,
    Destruction,
    Death,
    BossDefeated,
    LevelComplete,
}

pub trait AudioSink {
    fn play(&mut self, sound: Sound);
}

/// Headless sink: logs at debug and otherwise swallows every event
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, sound: Sound) {
        log::debug!("sound: {sound:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink;
        sink.play(Sound::Eat);
        sink.play(Sound::BossDefeated);
    }
}
