//! Countdown completion alert task
//!
//! The controller's completion callback only enqueues a [`CompletionAlert`];
//! the sound, notification and shared-record cleanup happen here, off the
//! controller's report path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    services::{Notifier, SoundPlayer},
    state::AppState,
};

/// Enqueued once per countdown that runs to zero
#[derive(Debug, Clone, Copy)]
pub struct CompletionAlert {
    pub completed_at: DateTime<Utc>,
}

impl CompletionAlert {
    pub fn now() -> Self {
        Self {
            completed_at: Utc::now(),
        }
    }
}

pub async fn completion_alert_task(
    state: Arc<AppState>,
    mut alerts: mpsc::UnboundedReceiver<CompletionAlert>,
    player: SoundPlayer,
    notifier: Notifier,
) {
    info!("Starting completion alert task");

    while let Some(alert) = alerts.recv().await {
        info!("Countdown finished at {}", alert.completed_at.format("%H:%M:%S"));

        tokio::join!(
            player.play(),
            notifier.notify("Workout timer", "Time's up! Roll the dice for your next set."),
        );

        state.finish_countdown().await;
    }
}
