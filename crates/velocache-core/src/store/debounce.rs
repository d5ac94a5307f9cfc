//! Trailing-edge debounce state machine.
//!
//! Coalesces a burst of trigger signals into one delayed action, timed
//! from the most recent trigger. Pure state plus explicit instants, so
//! tests never touch the wall clock; the monitor's resync task drives it
//! with `tokio::time::Instant`.

use std::time::Duration;

use tokio::time::Instant;

/// Debounce with a fixed trailing window.
#[derive(Debug)]
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Record a trigger at `now`. The pending deadline, if any, moves to
    /// `now + window`; only the latest trigger's timing matters.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// The instant the pending action should fire, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the pending deadline if it has elapsed by `now`. Returns
    /// whether the action should run.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(250);

    #[test]
    fn idle_until_triggered() {
        let mut d = Debounce::new(WINDOW);
        let now = Instant::now();

        assert!(d.deadline().is_none());
        assert!(!d.fire(now));
    }

    #[test]
    fn fires_once_after_the_window() {
        let mut d = Debounce::new(WINDOW);
        let t0 = Instant::now();

        d.trigger(t0);
        assert_eq!(d.deadline(), Some(t0 + WINDOW));
        assert!(!d.fire(t0 + WINDOW / 2));
        assert!(d.fire(t0 + WINDOW));
        // Consumed: a second fire without a new trigger does nothing.
        assert!(!d.fire(t0 + WINDOW * 2));
    }

    #[test]
    fn burst_collapses_to_latest_trigger() {
        let mut d = Debounce::new(WINDOW);
        let t0 = Instant::now();

        d.trigger(t0);
        d.trigger(t0 + Duration::from_millis(100));
        d.trigger(t0 + Duration::from_millis(200));

        // Timed from the last trigger, not the first.
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(450)));
        assert!(!d.fire(t0 + WINDOW));
        assert!(d.fire(t0 + Duration::from_millis(450)));
    }

    #[test]
    fn retrigger_after_fire_starts_a_new_window() {
        let mut d = Debounce::new(WINDOW);
        let t0 = Instant::now();

        d.trigger(t0);
        assert!(d.fire(t0 + WINDOW));

        let t1 = t0 + Duration::from_secs(1);
        d.trigger(t1);
        assert_eq!(d.deadline(), Some(t1 + WINDOW));
        assert!(d.fire(t1 + WINDOW));
    }
}
