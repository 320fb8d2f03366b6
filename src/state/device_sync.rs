//! Cross-device master/observer coordination
//!
//! Exactly one device drives the engine for a shared countdown: the one
//! named in the record's `masterDeviceId`. Every other device derives the
//! remaining time from the record read-only. Claiming master is a plain
//! overwrite; the previous master notices on its next poll.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use super::SyncRecord;
use crate::{
    error::{Result, TimerError},
    services::SyncStore,
};

/// This device's relation to the shared countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum SyncRole {
    /// No shared countdown exists
    Detached,
    Master,
    Observer { master_device_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    #[serde(flatten)]
    pub role: SyncRole,
    pub remaining_seconds: Option<u64>,
    pub paused: bool,
}

impl SyncStatus {
    fn detached() -> Self {
        Self {
            role: SyncRole::Detached,
            remaining_seconds: None,
            paused: false,
        }
    }
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPoll {
    pub status: SyncStatus,
    /// This device was master and another device has since claimed it
    pub lost_master: bool,
}

/// What a device inherits when it takes over as master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub remaining_seconds: u64,
    pub paused: bool,
}

pub struct DeviceSync {
    device_id: String,
    user: String,
    store: SyncStore,
    is_master: AtomicBool,
    status_tx: watch::Sender<SyncStatus>,
}

impl DeviceSync {
    pub fn new(device_id: String, user: String, store: SyncStore) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::detached());
        Self {
            device_id,
            user,
            store,
            is_master: AtomicBool::new(false),
            status_tx,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_master(&self) -> bool {
        self.is_master.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SyncStatus {
        self.status_tx.borrow().clone()
    }

    /// Claim master and publish a fresh countdown
    pub async fn publish_start(&self, duration_seconds: u64) -> Result<()> {
        let now = Utc::now();
        let record = SyncRecord::started(self.device_id.clone(), duration_seconds, now);
        self.store.save(&self.user, &record).await?;
        self.is_master.store(true, Ordering::SeqCst);
        self.set_status(&record, now);
        info!("Published {}s countdown as master {}", duration_seconds, self.device_id);
        Ok(())
    }

    pub async fn publish_pause(&self, remaining_seconds: u64) -> Result<()> {
        let Some(mut record) = self.owned_record().await? else {
            return Ok(());
        };
        let now = Utc::now();
        record.mark_paused(remaining_seconds, now);
        self.store.save(&self.user, &record).await?;
        self.set_status(&record, now);
        Ok(())
    }

    pub async fn publish_resume(&self, remaining_seconds: u64) -> Result<()> {
        let Some(mut record) = self.owned_record().await? else {
            return Ok(());
        };
        let now = Utc::now();
        record.mark_resumed(remaining_seconds, now);
        self.store.save(&self.user, &record).await?;
        self.set_status(&record, now);
        Ok(())
    }

    /// Remove the shared countdown if this device still owns it
    pub async fn publish_stop(&self) -> Result<()> {
        if self.owned_record().await?.is_some() {
            self.store.clear(&self.user).await?;
            info!("Cleared shared countdown");
        }
        self.is_master.store(false, Ordering::SeqCst);
        self.status_tx.send_replace(SyncStatus::detached());
        Ok(())
    }

    /// Become master of the shared countdown so the local engine can pick
    /// it up where the previous master left it
    pub async fn take_over(&self) -> Result<Handoff> {
        let Some(mut record) = self.store.load(&self.user).await? else {
            return Err(TimerError::NoSharedTimer);
        };
        let now = Utc::now();
        let remaining = record.remaining_seconds(now);
        if remaining == 0 {
            return Err(TimerError::NoSharedTimer);
        }
        let previous = record.master_device_id.clone();
        record.transfer_to(&self.device_id, now);
        self.store.save(&self.user, &record).await?;
        self.is_master.store(true, Ordering::SeqCst);
        self.set_status(&record, now);
        info!("Took over countdown from {} with {}s left", previous, remaining);
        Ok(Handoff {
            remaining_seconds: remaining,
            paused: record.is_paused(),
        })
    }

    /// Re-read the shared record and detect master handoff
    pub async fn poll(&self) -> Result<SyncPoll> {
        let now = Utc::now();
        let was_master = self.is_master();
        let (status, lost_master) = match self.store.load(&self.user).await? {
            None => {
                self.is_master.store(false, Ordering::SeqCst);
                (SyncStatus::detached(), false)
            }
            Some(record) => {
                let status = self.status_for(&record, now);
                let master_now = status.role == SyncRole::Master;
                self.is_master.store(master_now, Ordering::SeqCst);
                (status, was_master && !master_now)
            }
        };
        self.status_tx.send_replace(status.clone());
        Ok(SyncPoll { status, lost_master })
    }

    // The record, if this device is still its master
    async fn owned_record(&self) -> Result<Option<SyncRecord>> {
        match self.store.load(&self.user).await? {
            Some(record) if record.master_device_id == self.device_id => Ok(Some(record)),
            Some(record) => {
                warn!(
                    "Countdown is now driven by {}; not publishing from {}",
                    record.master_device_id, self.device_id
                );
                self.is_master.store(false, Ordering::SeqCst);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_status(&self, record: &SyncRecord, now: DateTime<Utc>) {
        self.status_tx.send_replace(self.status_for(record, now));
    }

    fn status_for(&self, record: &SyncRecord, now: DateTime<Utc>) -> SyncStatus {
        let role = if record.master_device_id == self.device_id {
            SyncRole::Master
        } else {
            SyncRole::Observer {
                master_device_id: record.master_device_id.clone(),
            }
        };
        SyncStatus {
            role,
            remaining_seconds: Some(record.remaining_seconds(now)),
            paused: record.is_paused(),
        }
    }
}
