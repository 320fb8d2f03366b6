//! External capabilities module
//!
//! Sound playback, desktop notifications, shared sync storage and device
//! identity. Everything here is I/O at the edge of the timer core.

pub mod audio;
pub mod device;
pub mod notifications;
pub mod sync_store;
pub mod system;

// Re-export main types
pub use audio::SoundPlayer;
pub use device::{current_user, device_fingerprint};
pub use notifications::{NotificationPermission, Notifier};
pub use sync_store::SyncStore;
pub use system::{check_command_available, run_command};
