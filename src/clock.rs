use std::time::{Duration, Instant};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Free-running normalized clock: `t` in [0, 1), wrapping every `period`.
#[derive(Debug, Clone, Copy)]
pub struct AnimationClock {
    start: Instant,
    period: Duration,
}

impl AnimationClock {
    pub fn new(period: Duration) -> Self {
        Self::starting_at(Instant::now(), period)
    }

    pub fn starting_at(start: Instant, period: Duration) -> Self {
        Self {
            start,
            period: period.max(MIN_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn phase_at(&self, elapsed: Duration) -> f64 {
        let period = self.period.as_nanos();
        let rem = elapsed.as_nanos() % period;
        rem as f64 / period as f64
    }

    pub fn phase_at_instant(&self, now: Instant) -> f64 {
        self.phase_at(now.saturating_duration_since(self.start))
    }

    pub fn now(&self) -> f64 {
        self.phase_at_instant(Instant::now())
    }
}
