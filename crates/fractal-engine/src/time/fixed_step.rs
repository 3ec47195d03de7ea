use std::time::{Duration, Instant};

/// Converts a frequency into a period; frequencies below 1 Hz are raised to 1 Hz.
fn period(hz: f64) -> Duration {
    Duration::from_secs_f64(1.0 / hz.max(1.0))
}

/// Fixed-step update accumulator.
///
/// Rendered frames arrive at an irregular cadence; `advance` banks the elapsed
/// time and reports how many fixed update ticks are due, so per-tick behavior
/// (such as keyboard panning) does not depend on the render rate.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulated: Duration,
    max_steps: u32,
}

impl FixedStep {
    /// Default cap on ticks run for a single frame.
    pub const DEFAULT_MAX_STEPS: u32 = 5;

    pub fn new(step: Duration, max_steps: u32) -> Self {
        debug_assert!(!step.is_zero());
        Self {
            step,
            accumulated: Duration::ZERO,
            max_steps: max_steps.max(1),
        }
    }

    pub fn from_hz(hz: f64) -> Self {
        Self::new(period(hz), Self::DEFAULT_MAX_STEPS)
    }

    /// Banks `elapsed` and returns the number of ticks to run now.
    ///
    /// When more than `max_steps` ticks are owed the backlog is dropped rather
    /// than carried into later frames.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;

        let mut steps = 0;
        while self.accumulated >= self.step && steps < self.max_steps {
            self.accumulated -= self.step;
            steps += 1;
        }

        if self.accumulated >= self.step {
            log::trace!("dropping {:?} of update backlog", self.accumulated);
            self.accumulated = Duration::ZERO;
        }

        steps
    }
}

/// Redraw scheduler for a target frame rate.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    next: Instant,
}

impl Pacer {
    pub fn from_hz(hz: f64, now: Instant) -> Self {
        Self {
            interval: period(hz),
            next: now,
        }
    }

    /// Returns `true` when a frame is due at `now` and schedules the next one.
    ///
    /// A pacer that fell more than one interval behind re-anchors on `now`
    /// instead of firing back-to-back frames.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }

        self.next += self.interval;
        if self.next <= now {
            self.next = now + self.interval;
        }
        true
    }

    /// Instant at which the next frame is due.
    pub fn deadline(&self) -> Instant {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    // ── FixedStep ─────────────────────────────────────────────────────────

    #[test]
    fn partial_step_is_banked() {
        let mut fs = FixedStep::new(ms(10), 5);
        assert_eq!(fs.advance(ms(6)), 0);
        assert_eq!(fs.advance(ms(6)), 1); // 12ms banked
        assert_eq!(fs.advance(ms(8)), 1); // 2 + 8 = 10ms
    }

    #[test]
    fn several_steps_in_one_frame() {
        let mut fs = FixedStep::new(ms(10), 5);
        assert_eq!(fs.advance(ms(35)), 3);
        assert_eq!(fs.advance(ms(5)), 1);
    }

    #[test]
    fn backlog_beyond_cap_is_dropped() {
        let mut fs = FixedStep::new(ms(10), 2);
        assert_eq!(fs.advance(ms(100)), 2);
        assert_eq!(fs.advance(ms(0)), 0);
    }

    #[test]
    fn sixty_hz_ticks_once_per_period() {
        let mut fs = FixedStep::from_hz(60.0);
        let period = Duration::from_secs_f64(1.0 / 60.0);
        assert_eq!(fs.advance(period - Duration::from_micros(1)), 0);
        assert_eq!(fs.advance(Duration::from_micros(1)), 1);
    }

    // ── Pacer ─────────────────────────────────────────────────────────────

    #[test]
    fn pacer_fires_once_per_interval() {
        let start = Instant::now();
        let mut p = Pacer::from_hz(100.0, start);
        assert!(p.poll(start));
        assert!(!p.poll(start + ms(5)));
        assert!(p.poll(start + ms(10)));
        assert_eq!(p.deadline(), start + ms(20));
    }

    #[test]
    fn pacer_reanchors_after_stall() {
        let start = Instant::now();
        let mut p = Pacer::from_hz(100.0, start);
        assert!(p.poll(start));
        let late = start + ms(95);
        assert!(p.poll(late));
        assert_eq!(p.deadline(), late + ms(10));
        assert!(!p.poll(late + ms(1)));
    }
}
