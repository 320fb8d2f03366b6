//! State management module
//!
//! Engine timing state, the controller that mirrors it, the shared
//! cross-device record and the application glue.

pub mod app_state;
pub mod device_sync;
pub mod engine_state;
pub mod sync_record;
pub mod timer_controller;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use device_sync::{DeviceSync, Handoff, SyncPoll, SyncRole, SyncStatus};
pub use engine_state::{EngineState, Rejection, WakeOutcome};
pub use sync_record::SyncRecord;
pub use timer_controller::{CompletionCallback, TimerController};
pub use timer_state::{TimerPhase, TimerState};
