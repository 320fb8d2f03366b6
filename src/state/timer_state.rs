//! Controller-visible countdown state

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a countdown as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Mirror of the engine's last report, truncated to whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_active: bool,
    pub seconds_remaining: u64,
    pub phase: TimerPhase,
}

impl TimerState {
    /// Create an idle timer showing `seconds_remaining`
    pub fn idle(seconds_remaining: u64) -> Self {
        Self {
            is_active: false,
            seconds_remaining,
            phase: TimerPhase::Idle,
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::idle(0)
    }
}
