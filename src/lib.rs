//! Workout timer - drift-corrected countdown daemon
//!
//! A timer engine task owns the authoritative countdown and talks to a
//! controller exclusively through message channels. The controller mirrors
//! the engine for the HTTP API, and an optional cross-device sync layer lets
//! other devices of the same user observe or take over the countdown.

pub mod api;
pub mod config;
pub mod error;
pub mod protocol;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::TimerError;
pub use state::{AppState, TimerController, TimerPhase, TimerState};
pub use utils::signals::shutdown_signal;
