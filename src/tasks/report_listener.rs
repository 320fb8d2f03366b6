//! Engine report relay task

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::{protocol::Report, state::TimerController};

/// Feed engine reports to the controller one at a time, in arrival order
pub async fn report_listener_task(
    controller: Arc<TimerController>,
    mut reports: mpsc::UnboundedReceiver<Report>,
) {
    info!("Starting report listener task");

    while let Some(report) = reports.recv().await {
        controller.handle_report(report);
    }

    info!("Timer engine report stream ended");
}
