//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::services::{current_user, device_fingerprint, NotificationPermission, SyncStore};

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "workout-timer")]
#[command(about = "Drift-corrected workout countdown daemon with cross-device handoff")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20560")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Duration shown on the idle timer, in seconds
    #[arg(short, long, default_value = "60")]
    pub duration: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// User whose countdown is shared across devices (defaults to $USER)
    #[arg(long)]
    pub user: Option<String>,

    /// Override the derived device fingerprint
    #[arg(long)]
    pub device_id: Option<String>,

    /// Directory holding shared sync records
    #[arg(long)]
    pub sync_dir: Option<PathBuf>,

    /// Seconds between cross-device sync polls
    #[arg(long, default_value = "5")]
    pub poll_interval: u64,

    /// Run without cross-device sync
    #[arg(long)]
    pub no_sync: bool,

    /// Sound file played when a countdown completes
    #[arg(long)]
    pub sound: Option<PathBuf>,

    /// Program used to play the completion sound
    #[arg(long, default_value = "paplay")]
    pub sound_player: String,

    /// Whether completion notifications may be shown
    #[arg(long, value_enum, default_value = "granted")]
    pub notifications: NotificationPermission,

    /// Program used to post notifications
    #[arg(long, default_value = "notify-send")]
    pub notifier: String,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn user(&self) -> String {
        self.user.clone().unwrap_or_else(current_user)
    }

    pub fn device_id(&self) -> String {
        self.device_id.clone().unwrap_or_else(device_fingerprint)
    }

    pub fn sync_store(&self) -> SyncStore {
        SyncStore::new(self.sync_dir.clone().unwrap_or_else(SyncStore::default_dir))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let config = Config::try_parse_from(["workout-timer"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20560");
        assert_eq!(config.duration, 60);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.notifications, NotificationPermission::Granted);
        assert_eq!(config.log_level(), "info");
        assert!(!config.no_sync);
    }

    #[test]
    fn overrides_parse() {
        let config = Config::try_parse_from([
            "workout-timer",
            "--device-id",
            "tablet",
            "--user",
            "sam",
            "--notifications",
            "denied",
            "--poll-interval",
            "0",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.device_id(), "tablet");
        assert_eq!(config.user(), "sam");
        assert_eq!(config.notifications, NotificationPermission::Denied);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.log_level(), "debug");
    }
}
