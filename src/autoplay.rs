use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::clock::AnimationClock;

const MIN_FRAME: Duration = Duration::from_millis(1);
const MIN_ADVANCE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTimings {
    pub period: Duration,
    pub advance: Duration,
    pub frame: Duration,
}

impl Default for DriverTimings {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(2600),
            advance: Duration::from_millis(3200),
            frame: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayPhase {
    Idle,
    Advancing,
}

/// Active-play selection. Only ever moves forward, wrapping at `len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autoplay {
    pub index: usize,
    pub phase: AutoplayPhase,
    len: usize,
    pending: usize,
}

impl Autoplay {
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            phase: AutoplayPhase::Idle,
            len: len.max(1),
            pending: 0,
        }
    }

    /// Requests one step. Requests are counted, so overlapping advances are all applied.
    pub fn begin_advance(&mut self) {
        self.pending += 1;
        self.phase = AutoplayPhase::Advancing;
    }

    /// Applies every outstanding request; a no-op when nothing was requested.
    pub fn finish_advance(&mut self) {
        self.index = (self.index + self.pending) % self.len;
        self.pending = 0;
        self.phase = AutoplayPhase::Idle;
    }

    pub fn advance(&mut self) {
        self.begin_advance();
        self.finish_advance();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudSnapshot {
    pub index: usize,
    pub t: f64,
    pub phase: AutoplayPhase,
}

#[derive(Debug)]
struct Shared {
    autoplay: Autoplay,
    t: f64,
}

/// Runs the repaint clock and the play rotation on two background threads. Dropping the
/// driver stops and joins both.
pub struct HudDriver {
    shared: Arc<Mutex<Shared>>,
    stop: Vec<Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl HudDriver {
    pub fn spawn(catalog_len: usize, timings: DriverTimings) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            autoplay: Autoplay::new(catalog_len),
            t: 0.0,
        }));
        let clock = AnimationClock::new(timings.period);

        let (frame_tx, frame_rx) = mpsc::channel();
        let (advance_tx, advance_rx) = mpsc::channel();

        let frame_shared = Arc::clone(&shared);
        let frame = timings.frame.max(MIN_FRAME);
        let frame_worker = thread::spawn(move || {
            every(frame, &frame_rx, || {
                lock(&frame_shared).t = clock.now();
            });
        });

        let advance_shared = Arc::clone(&shared);
        let advance = timings.advance.max(MIN_ADVANCE);
        let advance_worker = thread::spawn(move || {
            every(advance, &advance_rx, || {
                let mut guard = lock(&advance_shared);
                guard.autoplay.advance();
                debug!(index = guard.autoplay.index, "hud advanced");
            });
        });

        info!(
            plays = catalog_len,
            period_ms = timings.period.as_millis() as u64,
            advance_ms = advance.as_millis() as u64,
            "hud driver started"
        );
        Self {
            shared,
            stop: vec![frame_tx, advance_tx],
            workers: vec![frame_worker, advance_worker],
        }
    }

    pub fn snapshot(&self) -> HudSnapshot {
        let guard = lock(&self.shared);
        HudSnapshot {
            index: guard.autoplay.index,
            t: guard.t,
            phase: guard.autoplay.phase,
        }
    }

    /// Moves to the next play immediately; the rotation timer keeps its own cadence.
    pub fn skip(&self) {
        lock(&self.shared).autoplay.advance();
    }
}

impl Drop for HudDriver {
    fn drop(&mut self) {
        // Closing the channels wakes both workers.
        self.stop.clear();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        info!("hud driver stopped");
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Calls `tick` on a fixed cadence until the paired sender goes away.
fn every(interval: Duration, stop: &Receiver<()>, mut tick: impl FnMut()) {
    let mut next = Instant::now() + interval;
    loop {
        let wait = next.saturating_duration_since(Instant::now());
        match stop.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {
                tick();
                next += interval;
                if next < Instant::now() {
                    next = Instant::now() + interval;
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autoplay_wraps() {
        let mut a = Autoplay::new(3);
        for _ in 0..4 {
            a.advance();
        }
        assert_eq!(a.index, 1);
        assert_eq!(a.phase, AutoplayPhase::Idle);
    }

    #[test]
    fn finish_without_begin_is_a_no_op() {
        let mut a = Autoplay::new(3);
        a.finish_advance();
        assert_eq!(a.index, 0);
        a.begin_advance();
        assert_eq!(a.phase, AutoplayPhase::Advancing);
        a.finish_advance();
        assert_eq!(a.index, 1);
    }

    #[test]
    fn skip_during_timer_advance_keeps_both_steps() {
        let mut a = Autoplay::new(10);
        a.begin_advance();
        a.advance();
        a.finish_advance();
        assert_eq!(a.index, 2);
        assert_eq!(a.phase, AutoplayPhase::Idle);
    }

    #[test]
    fn skips_never_lose_timer_steps_across_threads() {
        let driver = HudDriver::spawn(
            1000,
            DriverTimings {
                period: Duration::from_millis(50),
                advance: Duration::from_millis(5),
                frame: Duration::from_millis(5),
            },
        );
        let before = driver.snapshot().index;
        for _ in 0..50 {
            driver.skip();
        }
        let after = driver.snapshot().index;
        assert!(after >= before + 50, "before={before} after={after}");
        assert_eq!(driver.snapshot().phase, AutoplayPhase::Idle);
    }

    #[test]
    fn empty_catalog_len_is_floored() {
        let mut a = Autoplay::new(0);
        a.advance();
        assert_eq!(a.index, 0);
    }

    #[test]
    fn driver_advances_and_stops_on_drop() {
        let driver = HudDriver::spawn(
            4,
            DriverTimings {
                period: Duration::from_millis(50),
                advance: Duration::from_millis(20),
                frame: Duration::from_millis(2),
            },
        );
        thread::sleep(Duration::from_millis(150));
        let snap = driver.snapshot();
        assert!((0.0..1.0).contains(&snap.t));
        assert!(snap.index < 4);
        driver.skip();
        let started = Instant::now();
        drop(driver);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
