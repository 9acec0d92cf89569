use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: usize = 10;

/// Moving average of the last `window` frame durations.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    window: usize,
    durations: VecDeque<Duration>,
    started: Option<Instant>,
}

impl Default for FrameTimer {
    fn default() -> Self {
        FrameTimer::new(DEFAULT_WINDOW)
    }
}

impl FrameTimer {
    pub fn new(window: usize) -> FrameTimer {
        let window = window.max(1);
        FrameTimer {
            window,
            durations: VecDeque::with_capacity(window),
            started: None,
        }
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Records the time since `start`. Does nothing if not started.
    pub fn stop(&mut self) -> Option<Duration> {
        let elapsed = self.started.take()?.elapsed();
        self.record(elapsed);
        Some(elapsed)
    }

    pub fn record(&mut self, duration: Duration) {
        if self.durations.len() == self.window {
            self.durations.pop_front();
        }
        self.durations.push_back(duration);
    }

    pub fn average(&self) -> Option<Duration> {
        if self.durations.is_empty() {
            return None;
        }
        Some(self.durations.iter().sum::<Duration>() / self.durations.len() as u32)
    }

    /// Frames per second over the window, 0 before the first frame.
    pub fn fps(&self) -> f64 {
        match self.average() {
            Some(avg) if !avg.is_zero() => 1.0 / avg.as_secs_f64(),
            _ => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}
