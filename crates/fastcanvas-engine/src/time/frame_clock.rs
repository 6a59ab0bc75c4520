use std::time::{Duration, Instant};

/// Snapshot taken at a frame boundary.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Index of the frame that just completed, starting at 0.
    pub frame_index: u64,

    /// Time since the previous boundary, or since the context was created.
    pub dt: Duration,
}

/// Counts completed frames and measures the time between them.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    completed: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            completed: 0,
        }
    }

    /// Index the next completed frame will get.
    #[inline]
    pub fn next_index(&self) -> u64 {
        self.completed
    }

    /// Restarts delta measurement so time spent suspended is not counted.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Marks a frame boundary.
    pub fn complete_frame(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;

        let frame_index = self.completed;
        self.completed = self.completed.wrapping_add(1);

        FrameTime { frame_index, dt }
    }
}
