//! Timer engine background task
//!
//! The engine runs as its own task and owns its [`EngineState`] outright.
//! It talks to the controller only through the command and report
//! channels. Commands are processed one at a time in arrival order; between
//! commands the task sleeps until the next scheduled wake-up, or forever
//! while idle or paused.

use std::future::pending;

use tokio::{
    sync::mpsc,
    time::{sleep_until, Instant},
};
use tracing::{debug, error, info, warn};

use crate::{
    protocol::{Command, CommandEnvelope, Report},
    state::{EngineState, Rejection, WakeOutcome},
};

/// Spawn the engine task and return its command sender and report receiver
pub fn spawn_timer_engine() -> (
    mpsc::UnboundedSender<CommandEnvelope>,
    mpsc::UnboundedReceiver<Report>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    tokio::spawn(timer_engine_task(command_rx, report_tx));
    (command_tx, report_rx)
}

/// Engine loop; returns when the command channel closes
pub async fn timer_engine_task(
    mut commands: mpsc::UnboundedReceiver<CommandEnvelope>,
    reports: mpsc::UnboundedSender<Report>,
) {
    info!("Starting timer engine task");

    let mut engine = Engine {
        state: EngineState::new(),
        seq: 0,
        reports,
    };

    loop {
        let wake_at = engine.state.pending_wake();

        tokio::select! {
            // Commands first: a stop or pause queued before an overdue
            // wake-up cancels it before it can fire.
            biased;

            received = commands.recv() => match received {
                Some(envelope) => engine.handle_command(envelope),
                None => {
                    info!("Command channel closed, stopping timer engine");
                    break;
                }
            },

            _ = sleep_until_wake(wake_at) => engine.handle_wake(),
        }
    }
}

async fn sleep_until_wake(wake_at: Option<Instant>) {
    match wake_at {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

struct Engine {
    state: EngineState,
    /// Sequence number of the last command processed, echoed in reports
    seq: u64,
    reports: mpsc::UnboundedSender<Report>,
}

impl Engine {
    fn handle_command(&mut self, envelope: CommandEnvelope) {
        self.seq = envelope.seq;
        let now = Instant::now();
        debug!("Engine received {} (seq {})", envelope.command.name(), envelope.seq);

        let outcome = match envelope.command {
            Command::Start { duration } => self.state.start(now, duration).map(|left| (left, true)),
            Command::Stop => {
                self.state.stop();
                return;
            }
            Command::Pause => self.state.pause(now).map(|left| (left, false)),
            Command::Resume => self.state.resume(now).map(|left| (left, true)),
        };

        match outcome {
            Ok((time_left, running)) => self.emit(Report::Tick {
                time_left,
                running,
                seq: self.seq,
            }),
            Err(reason @ (Rejection::ZeroDuration | Rejection::DurationTooLong)) => {
                error!("Ignoring {}: {}", envelope.command.name(), reason);
            }
            Err(reason) => {
                warn!("Ignoring {}: {}", envelope.command.name(), reason);
            }
        }
    }

    fn handle_wake(&mut self) {
        match self.state.wake(Instant::now()) {
            WakeOutcome::Continue { time_left } => {
                debug!("Engine tick: {}s left", time_left);
                self.emit(Report::Tick {
                    time_left,
                    running: true,
                    seq: self.seq,
                });
            }
            WakeOutcome::Finished => {
                info!("Countdown reached zero");
                self.emit(Report::Tick {
                    time_left: 0,
                    running: true,
                    seq: self.seq,
                });
                self.emit(Report::Complete { seq: self.seq });
            }
            WakeOutcome::Spurious => {
                warn!("Wake-up fired with no running countdown, cancelled");
            }
        }
    }

    fn emit(&self, report: Report) {
        if self.reports.send(report).is_err() {
            debug!("Report receiver dropped, discarding {:?}", report);
        }
    }
}
