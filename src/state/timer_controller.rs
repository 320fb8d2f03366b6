//! User-facing side of the countdown
//!
//! The controller turns application intents into engine commands and
//! engine reports into [`TimerState`]. It never computes time itself: the
//! engine is the authority, the controller only mirrors it.
//!
//! Commands are tagged with a monotonically increasing sequence number and
//! the engine echoes the last one it processed. A tick that echoes an older
//! sequence number was emitted before the engine saw our latest command and
//! is dropped, so an in-flight tick can never re-activate a paused timer.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::{mpsc, watch},
    time::timeout,
};
use tracing::{debug, error, info, warn};

use super::{engine_state::MAX_DURATION_SECS, TimerPhase, TimerState};
use crate::{
    error::{Result, TimerError},
    protocol::{Command, CommandEnvelope, Report},
};

/// Invoked once each time a countdown runs to zero
pub type CompletionCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct Inner {
    state: TimerState,
    /// Sequence number of the last command sent
    last_seq: u64,
    /// Sequence number of the last command that started or ended a countdown
    countdown_seq: u64,
    degraded: bool,
}

pub struct TimerController {
    commands: mpsc::UnboundedSender<CommandEnvelope>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<TimerState>,
    /// Sequence number echoed by the last tick applied to the state
    acked_tx: watch::Sender<u64>,
    on_complete: CompletionCallback,
}

impl TimerController {
    pub fn new<F>(commands: mpsc::UnboundedSender<CommandEnvelope>, on_complete: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (state_tx, _) = watch::channel(TimerState::default());
        let (acked_tx, _) = watch::channel(0);
        Self {
            commands,
            inner: Mutex::new(Inner::default()),
            state_tx,
            acked_tx,
            on_complete: Box::new(on_complete),
        }
    }

    /// Start a countdown of `duration_secs`, between 1 and
    /// [`MAX_DURATION_SECS`]
    pub fn start_timer(&self, duration_secs: u64) -> Result<()> {
        if duration_secs == 0 || duration_secs > MAX_DURATION_SECS {
            error!("Refusing to start a countdown of {} seconds", duration_secs);
            return Err(TimerError::InvalidDuration);
        }
        let mut inner = self.lock();
        self.dispatch(&mut inner, Command::Start { duration: duration_secs })?;
        info!("Starting {}s countdown", duration_secs);
        inner.state = TimerState {
            is_active: true,
            seconds_remaining: duration_secs,
            phase: TimerPhase::Running,
        };
        self.publish(&inner);
        Ok(())
    }

    /// Stop the countdown; the displayed seconds are left as they were
    pub fn stop_timer(&self) -> Result<()> {
        let mut inner = self.lock();
        self.dispatch(&mut inner, Command::Stop)?;
        info!("Stopping countdown at {}s", inner.state.seconds_remaining);
        inner.state.is_active = false;
        inner.state.phase = TimerPhase::Idle;
        self.publish(&inner);
        Ok(())
    }

    /// Returns the sequence number of the pause command; see
    /// [`TimerController::wait_for_report`]
    pub fn pause_timer(&self) -> Result<u64> {
        let mut inner = self.lock();
        if inner.state.phase != TimerPhase::Running {
            warn!("Ignoring pause while {}", inner.state.phase);
            return Err(TimerError::InvalidTransition {
                action: "pause",
                phase: inner.state.phase,
            });
        }
        let seq = self.dispatch(&mut inner, Command::Pause)?;
        info!("Pausing countdown");
        inner.state.is_active = false;
        inner.state.phase = TimerPhase::Paused;
        self.publish(&inner);
        Ok(seq)
    }

    pub fn resume_timer(&self) -> Result<u64> {
        let mut inner = self.lock();
        if inner.state.phase != TimerPhase::Paused {
            warn!("Ignoring resume while {}", inner.state.phase);
            return Err(TimerError::InvalidTransition {
                action: "resume",
                phase: inner.state.phase,
            });
        }
        let seq = self.dispatch(&mut inner, Command::Resume)?;
        info!("Resuming countdown at {}s", inner.state.seconds_remaining);
        inner.state.is_active = true;
        inner.state.phase = TimerPhase::Running;
        self.publish(&inner);
        Ok(seq)
    }

    /// Stop the engine and show `duration_secs` on an idle timer
    pub fn reset_timer_to_duration(&self, duration_secs: u64) -> Result<()> {
        if duration_secs > MAX_DURATION_SECS {
            error!("Refusing to reset to {} seconds", duration_secs);
            return Err(TimerError::InvalidDuration);
        }
        let mut inner = self.lock();
        self.dispatch(&mut inner, Command::Stop)?;
        info!("Resetting timer to {}s", duration_secs);
        inner.state = TimerState::idle(duration_secs);
        self.publish(&inner);
        Ok(())
    }

    /// Apply one engine report. Reports must be fed in arrival order.
    pub fn handle_report(&self, report: Report) {
        let mut inner = self.lock();
        match report {
            Report::Tick {
                time_left,
                running,
                seq,
            } => {
                if seq < inner.last_seq {
                    debug!("Dropping stale tick (seq {} < {})", seq, inner.last_seq);
                    return;
                }
                debug!("Tick: {}s left", time_left);
                inner.state.seconds_remaining = time_left;
                inner.state.is_active = running;
                inner.state.phase = if running {
                    TimerPhase::Running
                } else {
                    TimerPhase::Paused
                };
                self.publish(&inner);
                self.acked_tx.send_replace(seq);
            }
            Report::Complete { seq } => {
                if seq < inner.countdown_seq {
                    debug!(
                        "Dropping completion of a superseded countdown (seq {} < {})",
                        seq, inner.countdown_seq
                    );
                    return;
                }
                info!("Countdown complete");
                inner.state = TimerState {
                    is_active: false,
                    seconds_remaining: 0,
                    phase: TimerPhase::Completed,
                };
                self.publish(&inner);
                drop(inner);
                (self.on_complete)();

                let mut inner = self.lock();
                // A command issued from the callback already moved on.
                if inner.state.phase == TimerPhase::Completed {
                    inner.state.phase = TimerPhase::Idle;
                    self.publish(&inner);
                }
            }
        }
    }

    /// Wait until the engine has reported on command `seq`, then return
    /// the state that report produced. `None` if no such report arrives
    /// within `within`.
    pub async fn wait_for_report(&self, seq: u64, within: Duration) -> Option<TimerState> {
        let mut acked = self.acked_tx.subscribe();
        let report = match timeout(within, acked.wait_for(|acked| *acked >= seq)).await {
            Ok(Ok(_)) => Some(self.snapshot()),
            _ => None,
        };
        report
    }

    pub fn snapshot(&self) -> TimerState {
        self.lock().state.clone()
    }

    /// Watch every change of the controller state
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state_tx.subscribe()
    }

    /// True once the engine has stopped accepting commands
    pub fn is_degraded(&self) -> bool {
        self.lock().degraded
    }

    fn dispatch(&self, inner: &mut Inner, command: Command) -> Result<u64> {
        let seq = inner.last_seq + 1;
        // Sent under the lock so sequence order matches channel order.
        if self.commands.send(CommandEnvelope { seq, command }).is_err() {
            if !inner.degraded {
                error!("Timer engine is gone; timer controls are disabled");
            }
            inner.degraded = true;
            return Err(TimerError::EngineUnavailable);
        }
        debug!("Sent {} (seq {})", command.name(), seq);
        inner.last_seq = seq;
        if command.supersedes_countdown() {
            inner.countdown_seq = seq;
        }
        Ok(seq)
    }

    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.state.clone());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
