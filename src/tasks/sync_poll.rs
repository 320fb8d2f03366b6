//! Cross-device sync polling task

use std::{sync::Arc, time::Duration};

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Poll the shared record and hand the engine over when another device
/// claims the countdown
pub async fn sync_poll_task(state: Arc<AppState>, period: Duration) {
    let Some(sync) = &state.sync else {
        debug!("Cross-device sync disabled, poll task not needed");
        return;
    };
    info!(
        "Starting sync poll task for device {} every {}s",
        sync.device_id(),
        period.as_secs()
    );

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match sync.poll().await {
            Ok(poll) if poll.lost_master => state.relinquish_master(),
            Ok(poll) => debug!("Sync status: {:?}", poll.status),
            Err(e) => warn!("Failed to poll shared countdown: {}", e),
        }
    }
}
