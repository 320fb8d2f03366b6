//! Desktop notifications, gated on the user's permission setting

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::system::run_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    pub permission: NotificationPermission,
    /// Notification binary taking `<title> <body>`, e.g. `notify-send`
    pub command: String,
}

impl Notifier {
    pub fn new(permission: NotificationPermission, command: String) -> Self {
        Self {
            permission,
            command,
        }
    }

    /// Post a notification; returns whether one was attempted
    pub async fn notify(&self, title: &str, body: &str) -> bool {
        if self.permission != NotificationPermission::Granted {
            debug!("Notifications not permitted, skipping \"{}\"", title);
            return false;
        }
        if let Err(e) = run_command(&self.command, &[title, body]).await {
            warn!("Failed to post notification: {}", e);
        }
        true
    }
}
