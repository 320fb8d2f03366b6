//! Completion sound playback
//!
//! Playback is best-effort: failures are logged and never reach the caller.

use std::path::PathBuf;

use tracing::{debug, warn};

use super::system::run_command;

#[derive(Debug, Clone)]
pub struct SoundPlayer {
    /// Player binary, e.g. `paplay` or `afplay`
    pub command: String,
    /// Sound file passed as the player's only argument
    pub sound: Option<PathBuf>,
}

impl SoundPlayer {
    pub fn new(command: String, sound: Option<PathBuf>) -> Self {
        Self { command, sound }
    }

    pub async fn play(&self) {
        let Some(sound) = &self.sound else {
            debug!("No completion sound configured");
            return;
        };
        let sound = sound.to_string_lossy().into_owned();
        if let Err(e) = run_command(&self.command, &[sound.as_str()]).await {
            warn!("Failed to play completion sound: {}", e);
        }
    }
}
