//! Countdown timing state owned exclusively by the timer engine
//!
//! Remaining time is never counted down tick by tick. It is recomputed from
//! the segment start timestamp on every query:
//!
//! `remaining = total - (elapsed_before_segment + (now - segment_start))`
//!
//! Wake-ups are scheduled against absolute elapsed-time boundaries (every
//! whole second of total elapsed time), so a late wake-up never pushes the
//! following ones later.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Spacing between wake-ups in elapsed time
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Longest accepted countdown: 24 hours
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;

/// Why the engine refused a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("duration must be greater than zero")]
    ZeroDuration,
    #[error("duration exceeds {MAX_DURATION_SECS}s")]
    DurationTooLong,
    #[error("timer is not running")]
    NotRunning,
    #[error("timer is already running")]
    AlreadyRunning,
    #[error("no paused countdown with time remaining")]
    NothingToResume,
    #[error("countdown has already elapsed")]
    CountdownElapsed,
}

/// Result of a scheduled wake-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    /// Still counting down; the next wake-up has been scheduled
    Continue { time_left: u64 },
    /// Remaining time reached zero; state has been reset to idle
    Finished,
    /// Fired without a running segment; the wake-up has been cancelled
    Spurious,
}

#[derive(Debug, Default, Clone)]
pub struct EngineState {
    total_duration_ms: u64,
    segment_start: Option<Instant>,
    elapsed_before_segment_ms: u64,
    pending_wake: Option<Instant>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh countdown, discarding whatever was running before
    pub fn start(&mut self, now: Instant, duration_secs: u64) -> Result<u64, Rejection> {
        if duration_secs == 0 {
            return Err(Rejection::ZeroDuration);
        }
        if duration_secs > MAX_DURATION_SECS {
            return Err(Rejection::DurationTooLong);
        }
        self.pending_wake = None;
        self.total_duration_ms = duration_secs * 1000;
        self.elapsed_before_segment_ms = 0;
        self.segment_start = Some(now);
        self.schedule_next_wake(now);
        Ok(self.time_left(now))
    }

    /// Cancel the pending wake-up and return to idle
    pub fn stop(&mut self) {
        self.pending_wake = None;
        self.total_duration_ms = 0;
        self.segment_start = None;
        self.elapsed_before_segment_ms = 0;
    }

    /// Fold the running segment into the accumulated elapsed time
    pub fn pause(&mut self, now: Instant) -> Result<u64, Rejection> {
        let Some(segment_start) = self.segment_start.filter(|_| self.pending_wake.is_some()) else {
            return Err(Rejection::NotRunning);
        };
        // The overdue wake-up still fires and completes the countdown.
        if self.remaining_ms(now) <= 0 {
            return Err(Rejection::CountdownElapsed);
        }
        self.pending_wake = None;
        self.elapsed_before_segment_ms += millis_between(segment_start, now);
        self.segment_start = None;
        Ok(self.time_left(now))
    }

    /// Open a new running segment on a paused countdown
    pub fn resume(&mut self, now: Instant) -> Result<u64, Rejection> {
        if self.is_running() {
            return Err(Rejection::AlreadyRunning);
        }
        if self.total_duration_ms == 0 || self.elapsed_before_segment_ms >= self.total_duration_ms {
            return Err(Rejection::NothingToResume);
        }
        self.segment_start = Some(now);
        self.schedule_next_wake(now);
        Ok(self.time_left(now))
    }

    /// Handle a scheduled wake-up
    pub fn wake(&mut self, now: Instant) -> WakeOutcome {
        if self.segment_start.is_none() {
            self.pending_wake = None;
            return WakeOutcome::Spurious;
        }
        if self.remaining_ms(now) <= 0 {
            self.stop();
            return WakeOutcome::Finished;
        }
        self.schedule_next_wake(now);
        WakeOutcome::Continue {
            time_left: self.time_left(now),
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending_wake.is_some()
    }

    pub fn pending_wake(&self) -> Option<Instant> {
        self.pending_wake
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration_ms
    }

    /// Total elapsed time across all segments
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        let running = self
            .segment_start
            .map(|start| millis_between(start, now))
            .unwrap_or(0);
        self.elapsed_before_segment_ms + running
    }

    pub fn remaining_ms(&self, now: Instant) -> i64 {
        let remaining = i128::from(self.total_duration_ms) - i128::from(self.elapsed_ms(now));
        i64::try_from(remaining).unwrap_or(if remaining < 0 { i64::MIN } else { i64::MAX })
    }

    /// Remaining time in whole seconds, rounded up
    pub fn time_left(&self, now: Instant) -> u64 {
        seconds_left(self.remaining_ms(now))
    }

    // The deadline is anchored on the segment start, not on `now`, so
    // lateness of the current wake-up does not carry into the next one.
    fn schedule_next_wake(&mut self, now: Instant) {
        let Some(segment_start) = self.segment_start else {
            self.pending_wake = None;
            return;
        };
        let elapsed = self.elapsed_ms(now);
        let boundary = (elapsed / TICK_INTERVAL_MS + 1) * TICK_INTERVAL_MS;
        let into_segment = boundary - self.elapsed_before_segment_ms;
        self.pending_wake = Some(segment_start + Duration::from_millis(into_segment));
    }
}

/// `ceil(remaining_ms / 1000)`, clamped at zero
pub fn seconds_left(remaining_ms: i64) -> u64 {
    if remaining_ms <= 0 {
        0
    } else {
        (remaining_ms as u64).div_ceil(1000)
    }
}

fn millis_between(earlier: Instant, later: Instant) -> u64 {
    later.saturating_duration_since(earlier).as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn start_reports_full_duration_and_schedules_first_second() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();

        assert_eq!(engine.start(t0, 10), Ok(10));
        assert!(engine.is_running());
        assert_eq!(engine.pending_wake(), Some(t0 + ms(1000)));
    }

    #[test]
    fn zero_duration_is_rejected_without_touching_state() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();

        assert_eq!(engine.start(t0, 0), Err(Rejection::ZeroDuration));
        assert!(!engine.is_running());
        assert_eq!(engine.total_duration_ms(), 0);
    }

    #[test]
    fn duration_above_maximum_is_rejected() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();

        assert_eq!(engine.start(t0, u64::MAX), Err(Rejection::DurationTooLong));
        assert_eq!(
            engine.start(t0, MAX_DURATION_SECS + 1),
            Err(Rejection::DurationTooLong)
        );
        assert!(!engine.is_running());

        assert_eq!(engine.start(t0, MAX_DURATION_SECS), Ok(MAX_DURATION_SECS));
        assert_eq!(
            engine.wake(t0 + ms(1000)),
            WakeOutcome::Continue {
                time_left: MAX_DURATION_SECS - 1
            }
        );
    }

    #[test]
    fn late_wake_reports_actual_elapsed_and_realigns() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();
        engine.start(t0, 10).unwrap();

        // Host throttled us: the 1s wake-up fires 2.7s late.
        let outcome = engine.wake(t0 + ms(3700));

        assert_eq!(outcome, WakeOutcome::Continue { time_left: 7 });
        assert_eq!(engine.pending_wake(), Some(t0 + ms(4000)));
    }

    #[test]
    fn wake_on_exact_boundary_schedules_the_following_second() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();
        engine.start(t0, 5).unwrap();

        assert_eq!(engine.wake(t0 + ms(1000)), WakeOutcome::Continue { time_left: 4 });
        assert_eq!(engine.pending_wake(), Some(t0 + ms(2000)));
    }

    #[test]
    fn wake_at_zero_finishes_and_resets() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();
        engine.start(t0, 2).unwrap();

        assert_eq!(engine.wake(t0 + ms(2000)), WakeOutcome::Finished);
        assert!(!engine.is_running());
        assert_eq!(engine.total_duration_ms(), 0);
        assert_eq!(engine.elapsed_ms(t0 + ms(2500)), 0);
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();
        engine.start(t0, 20).unwrap();

        assert_eq!(engine.pause(t0 + ms(3000)), Ok(17));
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(t0 + ms(103_000)), 17_000);
    }

    #[test]
    fn resume_realigns_to_total_elapsed_seconds() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();
        engine.start(t0, 20).unwrap();
        engine.pause(t0 + ms(3400)).unwrap();

        let resumed_at = t0 + ms(50_000);
        assert_eq!(engine.resume(resumed_at), Ok(17));
        // 3.4s elapsed so far, next boundary at 4s total: 600ms into the segment
        assert_eq!(engine.pending_wake(), Some(resumed_at + ms(600)));
    }

    #[test]
    fn pause_while_idle_is_rejected() {
        let mut engine = EngineState::new();
        assert_eq!(engine.pause(Instant::now()), Err(Rejection::NotRunning));
        assert_eq!(engine.total_duration_ms(), 0);
    }

    #[test]
    fn pause_after_countdown_elapsed_leaves_wake_pending() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();
        engine.start(t0, 3).unwrap();

        assert_eq!(engine.pause(t0 + ms(3200)), Err(Rejection::CountdownElapsed));
        assert!(engine.is_running());
        assert_eq!(engine.wake(t0 + ms(3200)), WakeOutcome::Finished);
    }

    #[test]
    fn resume_without_countdown_is_rejected() {
        let mut engine = EngineState::new();
        assert_eq!(engine.resume(Instant::now()), Err(Rejection::NothingToResume));
        assert!(!engine.is_running());
    }

    #[test]
    fn resume_while_running_is_rejected() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();
        engine.start(t0, 10).unwrap();

        assert_eq!(engine.resume(t0 + ms(2500)), Err(Rejection::AlreadyRunning));
        assert_eq!(engine.remaining_ms(t0 + ms(2500)), 7500);
    }

    #[test]
    fn wake_without_running_segment_is_spurious() {
        let t0 = Instant::now();
        let mut engine = EngineState::new();
        engine.start(t0, 10).unwrap();
        engine.pause(t0 + ms(500)).unwrap();

        assert_eq!(engine.wake(t0 + ms(1000)), WakeOutcome::Spurious);
        assert_eq!(engine.pending_wake(), None);
        assert_eq!(engine.remaining_ms(t0 + ms(1000)), 9500);
    }

    #[test]
    fn running_time_is_conserved_across_pauses() {
        for duration in [1u64, 7, 30, 90] {
            for pause_at in (250..duration * 1000).step_by(1750) {
                let t0 = Instant::now();
                let mut engine = EngineState::new();
                engine.start(t0, duration).unwrap();
                engine.pause(t0 + ms(pause_at)).unwrap();

                let resumed_at = t0 + ms(pause_at + 600_000);
                engine.resume(resumed_at).unwrap();

                let finish = resumed_at + ms(duration * 1000 - pause_at);
                assert_eq!(engine.elapsed_ms(finish), duration * 1000);
                assert_eq!(engine.wake(finish), WakeOutcome::Finished);
            }
        }
    }

    #[test]
    fn seconds_left_rounds_up_and_clamps() {
        assert_eq!(seconds_left(4500), 5);
        assert_eq!(seconds_left(5000), 5);
        assert_eq!(seconds_left(1), 1);
        assert_eq!(seconds_left(0), 0);
        assert_eq!(seconds_left(-250), 0);
    }
}
