//! Message contract between the timer controller and the timer engine
//!
//! The two sides never share memory. Commands flow controller → engine and
//! reports flow engine → controller, each over its own ordered channel.
//! Every command carries a sequence number; the engine echoes the sequence
//! number of the last command it processed in every report so the
//! controller can discard reports that predate its latest intent.

use serde::{Deserialize, Serialize};

/// Controller → engine command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Start {
        /// Countdown length in whole seconds
        duration: u64,
    },
    Stop,
    Pause,
    Resume,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "START",
            Command::Stop => "STOP",
            Command::Pause => "PAUSE",
            Command::Resume => "RESUME",
        }
    }

    /// Commands that end or replace the current countdown
    pub fn supersedes_countdown(&self) -> bool {
        matches!(self, Command::Start { .. } | Command::Stop)
    }
}

/// A command tagged with the controller's sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub seq: u64,
    #[serde(flatten)]
    pub command: Command,
}

/// Engine → controller report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Report {
    Tick {
        #[serde(rename = "timeLeft")]
        time_left: u64,
        running: bool,
        seq: u64,
    },
    Complete {
        seq: u64,
    },
}

impl Report {
    pub fn seq(&self) -> u64 {
        match self {
            Report::Tick { seq, .. } | Report::Complete { seq } => *seq,
        }
    }
}
