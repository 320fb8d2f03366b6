//! Shared countdown record persisted for cross-device observers

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::engine_state::seconds_left;

/// One logical countdown, driven by `master_device_id` and visible to every
/// device of the same user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    pub master_device_id: String,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: u64,
    pub last_updated: DateTime<Utc>,
    /// Frozen remaining time while the master has the countdown paused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_remaining_seconds: Option<u64>,
}

impl SyncRecord {
    pub fn started(master_device_id: String, duration_seconds: u64, now: DateTime<Utc>) -> Self {
        Self {
            master_device_id,
            start_time: now,
            duration_seconds,
            last_updated: now,
            paused_remaining_seconds: None,
        }
    }

    /// Remaining whole seconds (rounded up) as an observer would display them
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        if let Some(paused) = self.paused_remaining_seconds {
            return paused;
        }
        let elapsed_ms = (now - self.start_time).num_milliseconds().max(0);
        let total_ms =
            i64::try_from(self.duration_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        seconds_left(total_ms.saturating_sub(elapsed_ms))
    }

    pub fn is_paused(&self) -> bool {
        self.paused_remaining_seconds.is_some()
    }

    pub fn mark_paused(&mut self, remaining_seconds: u64, now: DateTime<Utc>) {
        self.paused_remaining_seconds = Some(remaining_seconds);
        self.last_updated = now;
    }

    /// Back-date the start so that `remaining_seconds` continues from
    /// `remaining_seconds` as of `now`. An elapsed time chrono cannot
    /// represent restarts the record from its full duration instead.
    pub fn mark_resumed(&mut self, remaining_seconds: u64, now: DateTime<Utc>) {
        let already_elapsed = self.duration_seconds.saturating_sub(remaining_seconds);
        self.start_time = i64::try_from(already_elapsed)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|elapsed| now.checked_sub_signed(elapsed))
            .unwrap_or(now);
        self.paused_remaining_seconds = None;
        self.last_updated = now;
    }

    pub fn transfer_to(&mut self, device_id: &str, now: DateTime<Utc>) {
        self.master_device_id = device_id.to_string();
        self.last_updated = now;
    }
}
