//! Quiz countdown timer.
//!
//! The timer does not own a thread. The host loop calls [`CountdownTimer::poll`]
//! and the timer converts elapsed wall time into one-second steps against its
//! own cadence anchor.

use std::fmt;
use std::time::{Duration, Instant};

const STEP: Duration = Duration::from_secs(1);

/// Outcome of a cadence step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second elapsed.
    Tick,
    /// Remaining time just crossed the warning threshold.
    WarningStarted,
    /// The countdown ran out. Reported once per run.
    TimedOut,
}

/// Countdown with a warning threshold.
pub struct CountdownTimer {
    duration: u32,
    warning_threshold: u32,
    remaining: u32,
    warning: bool,
    /// Time of the last cadence step; `None` while stopped.
    anchor: Option<Instant>,
    on_timeout: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("duration", &self.duration)
            .field("warning_threshold", &self.warning_threshold)
            .field("remaining", &self.remaining)
            .field("warning", &self.warning)
            .field("running", &self.anchor.is_some())
            .finish_non_exhaustive()
    }
}

impl CountdownTimer {
    /// Create a stopped timer with `duration` seconds on the clock.
    pub fn new(duration: u32, warning_threshold: u32) -> Self {
        Self {
            duration,
            warning_threshold,
            remaining: duration,
            warning: false,
            anchor: None,
            on_timeout: None,
        }
    }

    /// Register a callback invoked when the countdown runs out.
    pub fn on_timeout(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_timeout = Some(Box::new(callback));
        self
    }

    /// Start counting down. Does nothing while already running.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Start with the first step due one second after `now`.
    pub fn start_at(&mut self, now: Instant) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
        }
    }

    /// Halt without touching the remaining time.
    pub fn stop(&mut self) {
        self.anchor = None;
    }

    /// Stop and restore the full duration.
    pub fn reset(&mut self) {
        self.stop();
        self.remaining = self.duration;
        self.warning = false;
    }

    /// Advance the countdown to `now`, running every step that came due.
    ///
    /// Returns the most significant event among those steps.
    pub fn poll(&mut self, now: Instant) -> Option<TimerEvent> {
        let mut event = None;
        while let Some(anchor) = self.anchor {
            let next = anchor + STEP;
            if next > now {
                break;
            }
            self.anchor = Some(next);
            let step = self.tick_second();
            event = Some(match (event, step) {
                (_, TimerEvent::TimedOut) => TimerEvent::TimedOut,
                (Some(TimerEvent::WarningStarted), _) | (_, TimerEvent::WarningStarted) => {
                    TimerEvent::WarningStarted
                }
                _ => TimerEvent::Tick,
            });
        }
        event
    }

    /// Run one cadence step. Only reached from `poll` while running.
    ///
    /// At zero this stops the timer and signals the timeout instead of
    /// decrementing.
    fn tick_second(&mut self) -> TimerEvent {
        if self.remaining == 0 {
            self.stop();
            tracing::info!(duration = self.duration, "countdown expired");
            if let Some(callback) = self.on_timeout.as_mut() {
                callback();
            }
            return TimerEvent::TimedOut;
        }

        self.remaining -= 1;
        let was_warning = self.warning;
        self.update_warning();
        if self.warning && !was_warning {
            TimerEvent::WarningStarted
        } else {
            TimerEvent::Tick
        }
    }

    /// Restore a saved remaining time, clamped into `[0, duration]`.
    pub fn set_remaining_time(&mut self, seconds: u32) {
        self.remaining = seconds.min(self.duration);
        self.update_warning();
    }

    fn update_warning(&mut self) {
        self.warning = self.remaining <= self.warning_threshold;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    pub fn percentage_remaining(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        f64::from(self.remaining) / f64::from(self.duration) * 100.0
    }

    pub fn is_warning(&self) -> bool {
        self.warning
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_new_timer() {
        let timer = CountdownTimer::new(2700, 300);
        assert_eq!(timer.remaining(), 2700);
        assert_eq!(timer.formatted(), "45:00");
        assert_eq!(timer.percentage_remaining(), 100.0);
        assert!(!timer.is_running());
        assert!(!timer.is_warning());
    }

    #[test]
    fn test_start_is_idempotent() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(60, 10);

        timer.start_at(t0);
        timer.start_at(t0 + Duration::from_millis(900));
        timer.poll(t0 + secs(1));

        assert_eq!(timer.remaining(), 59);
    }

    #[test]
    fn test_poll_runs_due_steps() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(60, 10);
        timer.start_at(t0);

        assert_eq!(timer.poll(t0 + Duration::from_millis(999)), None);
        assert_eq!(timer.poll(t0 + secs(3)), Some(TimerEvent::Tick));
        assert_eq!(timer.remaining(), 57);
        assert_eq!(timer.elapsed(), 3);
        assert_eq!(timer.formatted(), "00:57");
    }

    #[test]
    fn test_warning_threshold() {
        let mut timer = CountdownTimer::new(20, 10);
        timer.set_remaining_time(12);

        assert_eq!(timer.tick_second(), TimerEvent::Tick);
        assert!(!timer.is_warning());
        assert_eq!(timer.tick_second(), TimerEvent::WarningStarted);
        assert_eq!(timer.remaining(), 10);
        assert!(timer.is_warning());
        assert_eq!(timer.tick_second(), TimerEvent::Tick);
    }

    #[test]
    fn test_timeout_fires_once() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(2, 1).on_timeout(move || counter.set(counter.get() + 1));
        timer.start_at(t0);

        assert_eq!(timer.poll(t0 + secs(10)), Some(TimerEvent::TimedOut));
        assert_eq!(timer.remaining(), 0);
        assert!(!timer.is_running());

        assert_eq!(timer.poll(t0 + secs(20)), None);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_stopped_timer_at_zero_stays_silent() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(60, 10).on_timeout(move || counter.set(counter.get() + 1));
        timer.set_remaining_time(0);

        assert_eq!(timer.poll(t0 + secs(5)), None);
        assert_eq!(timer.poll(t0 + secs(50)), None);
        assert_eq!(fired.get(), 0);

        timer.start_at(t0);
        assert_eq!(timer.poll(t0 + secs(5)), Some(TimerEvent::TimedOut));
        assert_eq!(timer.poll(t0 + secs(50)), None);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_dropped_timer_never_fires() {
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let mut timer = CountdownTimer::new(1, 0).on_timeout(move || flag.set(true));
        timer.start();

        drop(timer);

        assert!(!fired.get());
        assert_eq!(Rc::strong_count(&fired), 1);
    }

    #[test]
    fn test_stop_keeps_remaining() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(60, 10);
        timer.start_at(t0);
        timer.poll(t0 + secs(5));

        timer.stop();

        assert_eq!(timer.poll(t0 + secs(30)), None);
        assert_eq!(timer.remaining(), 55);
    }

    #[test]
    fn test_reset() {
        let mut timer = CountdownTimer::new(60, 10);
        timer.start();
        timer.set_remaining_time(5);
        assert!(timer.is_warning());

        timer.reset();

        assert_eq!(timer.remaining(), 60);
        assert!(!timer.is_warning());
        assert!(!timer.is_running());
    }

    #[test]
    fn test_set_remaining_time_clamps() {
        let mut timer = CountdownTimer::new(60, 10);
        timer.set_remaining_time(500);
        assert_eq!(timer.remaining(), 60);
        timer.set_remaining_time(0);
        assert_eq!(timer.remaining(), 0);
        assert_eq!(timer.percentage_remaining(), 0.0);
    }
}
