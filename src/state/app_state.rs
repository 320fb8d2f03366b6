//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{DeviceSync, SyncStatus, TimerController, TimerState};
use crate::error::{Result, TimerError};

/// How long pause and resume wait for the engine's tick before publishing
/// the controller's last known time instead
const ENGINE_REPORT_TIMEOUT: Duration = Duration::from_millis(500);

/// Shared state behind the HTTP handlers and background tasks
pub struct AppState {
    pub timer: Arc<TimerController>,
    /// `None` when cross-device sync is disabled
    pub sync: Option<DeviceSync>,
    /// Duration shown on an idle timer and restored by a bare reset
    pub default_duration: u64,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        timer: Arc<TimerController>,
        sync: Option<DeviceSync>,
        default_duration: u64,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            timer,
            sync,
            default_duration,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Start a countdown locally and claim it as this device's
    pub async fn start(&self, duration_secs: u64) -> Result<TimerState> {
        self.timer.start_timer(duration_secs)?;
        self.record_action("start");
        if let Some(sync) = &self.sync {
            if let Err(e) = sync.publish_start(duration_secs).await {
                warn!("Failed to publish countdown start: {}", e);
            }
        }
        Ok(self.timer.snapshot())
    }

    pub async fn stop(&self) -> Result<TimerState> {
        self.timer.stop_timer()?;
        self.record_action("stop");
        self.clear_shared_countdown().await;
        Ok(self.timer.snapshot())
    }

    /// Pause locally; observers get the time from the engine's pause tick
    pub async fn pause(&self) -> Result<TimerState> {
        let seq = self.timer.pause_timer()?;
        self.record_action("pause");
        if let Some(sync) = &self.sync {
            let snapshot = self.reported_state(seq, "pause").await;
            if let Err(e) = sync.publish_pause(snapshot.seconds_remaining).await {
                warn!("Failed to publish pause: {}", e);
            }
        }
        Ok(self.timer.snapshot())
    }

    pub async fn resume(&self) -> Result<TimerState> {
        let seq = self.timer.resume_timer()?;
        self.record_action("resume");
        if let Some(sync) = &self.sync {
            let snapshot = self.reported_state(seq, "resume").await;
            if let Err(e) = sync.publish_resume(snapshot.seconds_remaining).await {
                warn!("Failed to publish resume: {}", e);
            }
        }
        Ok(self.timer.snapshot())
    }

    /// Stop and show `duration_secs` (or the configured default) on an idle timer
    pub async fn reset(&self, duration_secs: Option<u64>) -> Result<TimerState> {
        let duration = duration_secs.unwrap_or(self.default_duration);
        self.timer.reset_timer_to_duration(duration)?;
        self.record_action("reset");
        self.clear_shared_countdown().await;
        Ok(self.timer.snapshot())
    }

    /// Become master of the shared countdown and drive it from here
    pub async fn take_over(&self) -> Result<TimerState> {
        let Some(sync) = &self.sync else {
            return Err(TimerError::NoSharedTimer);
        };
        let handoff = sync.take_over().await?;
        self.timer.start_timer(handoff.remaining_seconds)?;
        if handoff.paused {
            self.timer.pause_timer()?;
        }
        self.record_action("takeover");
        Ok(self.timer.snapshot())
    }

    /// Called once a countdown driven by this device has run out
    pub async fn finish_countdown(&self) {
        self.record_action("complete");
        self.clear_shared_countdown().await;
    }

    /// Another device claimed the countdown: stop driving the engine
    pub fn relinquish_master(&self) {
        info!("Another device took over the countdown, stopping local engine");
        if let Err(e) = self.timer.stop_timer() {
            warn!("Failed to stop local countdown after handoff: {}", e);
        }
        self.record_action("handoff");
    }

    pub fn sync_status(&self) -> Option<SyncStatus> {
        self.sync.as_ref().map(DeviceSync::status)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    // State after the engine's report on command `seq`
    async fn reported_state(&self, seq: u64, action: &str) -> TimerState {
        match self.timer.wait_for_report(seq, ENGINE_REPORT_TIMEOUT).await {
            Some(state) => state,
            None => {
                warn!("Engine did not report on {}; publishing last known time", action);
                self.timer.snapshot()
            }
        }
    }

    async fn clear_shared_countdown(&self) {
        if let Some(sync) = &self.sync {
            if let Err(e) = sync.publish_stop().await {
                warn!("Failed to clear shared countdown: {}", e);
            }
        }
    }
}
