//! Error types surfaced by the controller and the sync layer

use std::path::PathBuf;

use thiserror::Error;

use crate::state::TimerPhase;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("countdown duration must be greater than zero")]
    InvalidDuration,

    #[error("cannot {action} while the timer is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: TimerPhase,
    },

    #[error("timer engine is not running")]
    EngineUnavailable,

    #[error("no shared countdown to take over")]
    NoSharedTimer,

    #[error("failed to read sync record {path}")]
    ReadRecord {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write sync record {path}")]
    WriteRecord {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sync record {path} is not valid JSON")]
    ParseRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, TimerError>;
