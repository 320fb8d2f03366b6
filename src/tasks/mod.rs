//! Background tasks module
//!
//! The timer engine and the tasks that run alongside the HTTP server.

pub mod completion_alert;
pub mod report_listener;
pub mod sync_poll;
pub mod timer_engine;

// Re-export main functions
pub use completion_alert::{completion_alert_task, CompletionAlert};
pub use report_listener::report_listener_task;
pub use sync_poll::sync_poll_task;
pub use timer_engine::{spawn_timer_engine, timer_engine_task};
